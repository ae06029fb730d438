//! Minimal REST client helpers for programmatic consumers.

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use std::time::Duration;

pub use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serde: {0}")]
    Serde(String),
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .tcp_keepalive(Some(Duration::from_secs(180)))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(180))
        .timeout(Duration::from_secs(180))
        .build()
        .expect("failed to build HTTP client")
});

fn mk_client() -> Result<reqwest::Client, RestError> {
    Ok(HTTP_CLIENT.clone())
}

async fn handle_json<T: for<'de> serde::Deserialize<'de>>(
    res: reqwest::Response,
) -> Result<T, RestError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(RestError::Status {
            status: status.as_u16(),
            body,
        });
    }
    res.json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

async fn get_json<T: for<'de> serde::Deserialize<'de>>(
    url: String,
    bearer: &str,
) -> Result<T, RestError> {
    let client = mk_client()?;
    let res = client
        .get(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn login(base: &str, req: &AuthReq) -> Result<AuthResp, RestError> {
    let client = mk_client()?;
    let url = ep::auth_login(base);
    let res = client
        .post(url)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn server_version(base: &str) -> Result<VersionInfoDto, RestError> {
    let client = mk_client()?;
    let url = ep::version(base);
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_students(
    base: &str,
    school_id: &str,
    bearer: &str,
) -> Result<Vec<StudentDto>, RestError> {
    get_json(ep::students(base, school_id), bearer).await
}

pub async fn student_fees(
    base: &str,
    school_id: &str,
    student_id: &str,
    bearer: &str,
) -> Result<Vec<FeeDto>, RestError> {
    get_json(ep::student_fees(base, school_id, student_id), bearer).await
}

pub async fn student_attendance(
    base: &str,
    school_id: &str,
    student_id: &str,
    date: Option<&str>,
    bearer: &str,
) -> Result<Vec<AttendanceDto>, RestError> {
    let mut url = ep::student_attendance(base, school_id, student_id);
    if let Some(d) = date {
        url = format!("{}?date={}", url, d);
    }
    get_json(url, bearer).await
}

pub async fn student_curriculum(
    base: &str,
    school_id: &str,
    student_id: &str,
    bearer: &str,
) -> Result<CurriculumDto, RestError> {
    get_json(ep::student_curriculum(base, school_id, student_id), bearer).await
}

pub async fn generate_curriculum(
    base: &str,
    school_id: &str,
    student_id: &str,
    bearer: &str,
) -> Result<CurriculumDto, RestError> {
    let client = mk_client()?;
    let url = ep::student_curriculum_generate(base, school_id, student_id);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}

pub async fn list_routes(
    base: &str,
    school_id: &str,
    bearer: &str,
) -> Result<Vec<RouteDto>, RestError> {
    get_json(ep::routes(base, school_id), bearer).await
}

pub async fn route_stop_statuses(
    base: &str,
    school_id: &str,
    route_id: &str,
    date: Option<&str>,
    bearer: &str,
) -> Result<Vec<StopStatusDto>, RestError> {
    let mut url = ep::route_stop_statuses(base, school_id, route_id);
    if let Some(d) = date {
        url = format!("{}?date={}", url, d);
    }
    get_json(url, bearer).await
}

pub async fn list_notifications(
    base: &str,
    school_id: &str,
    bearer: &str,
) -> Result<Vec<NotificationDto>, RestError> {
    get_json(ep::notifications(base, school_id), bearer).await
}

pub async fn trigger_notification(
    base: &str,
    school_id: &str,
    bearer: &str,
    req: &TriggerNotificationReq,
) -> Result<TriggerNotificationResp, RestError> {
    let client = mk_client()?;
    let url = ep::notifications_trigger(base, school_id);
    let res = client
        .post(url)
        .bearer_auth(bearer)
        .json(req)
        .send()
        .await
        .map_err(|e| RestError::Http(e.to_string()))?;
    handle_json(res).await
}
