mod acl;
pub mod auth;
mod config;
pub mod notify;

use crate::server::auth::AuthCtx;
use crate::store::{Store, StoreError};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::{Method, StatusCode, header},
    routing::{get, post},
};
use bcrypt::verify;
use chrono::NaiveDate;
pub use config::{AppConfig, ConfigError, UserConfig};
use edusense_shared::api;
use edusense_shared::auth::Role;
use edusense_shared::domain::{
    AttendanceStatus, Curriculum, CurriculumSubject, Fee, Notification, StudentId,
};
use notify::{NotifyService, PortalEvent};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub notify: NotifyService,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        Self {
            config,
            store,
            notify: NotifyService::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let scope = "/api/v1/school/{school}";
    let private = Router::new()
        .route(&format!("{scope}/students"), get(api_list_students))
        .route(&format!("{scope}/students/{{id}}"), get(api_get_student))
        .route(&format!("{scope}/students/{{id}}/fees"), get(api_student_fees))
        .route(
            &format!("{scope}/students/{{id}}/fees/{{fee_id}}/pay"),
            post(api_pay_fee),
        )
        .route(
            &format!("{scope}/students/{{id}}/attendance"),
            get(api_student_attendance).post(api_record_attendance),
        )
        .route(
            &format!("{scope}/students/{{id}}/diary"),
            get(api_student_diary).post(api_add_diary_entry),
        )
        .route(
            &format!("{scope}/students/{{id}}/marks"),
            get(api_student_marks).post(api_add_mark),
        )
        .route(
            &format!("{scope}/students/{{id}}/curriculum"),
            get(api_student_curriculum).put(api_edit_curriculum),
        )
        .route(
            &format!("{scope}/students/{{id}}/curriculum/generate"),
            post(api_generate_curriculum),
        )
        .route(
            &format!("{scope}/students/{{id}}/curriculum/download"),
            post(api_download_curriculum),
        )
        .route(
            &format!("{scope}/students/{{id}}/hall-tickets"),
            get(api_student_hall_tickets),
        )
        .route(
            &format!("{scope}/students/{{id}}/leaves"),
            get(api_student_leaves).post(api_submit_leave),
        )
        .route(&format!("{scope}/routes"), get(api_list_routes))
        .route(&format!("{scope}/routes/{{id}}"), get(api_get_route))
        .route(
            &format!("{scope}/routes/{{id}}/stops/statuses"),
            get(api_stop_statuses),
        )
        .route(
            &format!("{scope}/routes/{{id}}/stops/{{stop_id}}/status"),
            post(api_report_stop_status),
        )
        .route(&format!("{scope}/calendar"), get(api_calendar))
        .route(&format!("{scope}/notifications"), get(api_list_notifications))
        .route(
            &format!("{scope}/notifications/count"),
            get(api_notification_count),
        )
        .route(
            &format!("{scope}/notifications/trigger"),
            post(api_trigger_notification),
        )
        .route(&format!("{scope}/finance/overview"), get(api_finance_overview))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            acl::enforce_acl,
        ))
        .layer(middleware::from_fn(set_auth_span_fields))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            username = tracing::field::Empty,
            role = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/api/version", get(api_version))
        .route("/api/v1/auth/login", post(api_auth_login))
        .merge(private)
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_version() -> Json<api::VersionInfoDto> {
    Json(api::VersionInfoDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );

    // Disable caching for API and health endpoints
    if path == "/healthz" || path.starts_with("/api/") || path == "/api" {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(
            HeaderName::from_static("pragma"),
            HeaderValue::from_static("no-cache"),
        );
    }

    Ok(resp)
}

async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(auth) = req.extensions().get::<AuthCtx>() {
        let span = Span::current();
        span.record("username", tracing::field::display(&auth.claims.sub));
        span.record("role", tracing::field::debug(&auth.claims.role));
    }
    Ok(next.run(req).await)
}

// ---- auth ----

async fn api_auth_login(
    State(state): State<AppState>,
    Json(body): Json<api::AuthReq>,
) -> Result<Json<api::AuthResp>, AppError> {
    let user = state.config.find_user(&body.username).ok_or_else(|| {
        tracing::warn!(username=%body.username, "login: unknown username");
        AppError::unauthorized()
    })?;
    if !verify(&body.password, &user.password_hash).map_err(|e| {
        tracing::error!(username=%body.username, error=%e, "login: bcrypt verify failed");
        AppError::internal(e)
    })? {
        tracing::warn!(username=%body.username, "login: invalid password");
        return Err(AppError::unauthorized());
    }
    let token = auth::issue_jwt_for_user(&state, &user.username, user.role).await?;
    Ok(Json(api::AuthResp { token }))
}

// ---- students ----

#[derive(Deserialize)]
struct StudentPath {
    #[allow(dead_code)]
    school: String,
    id: String,
}

async fn api_list_students(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::StudentDto>>, AppError> {
    let rows = match auth.claims.role {
        Role::Parent => state.store.students_for_parent(&auth.claims.sub).await,
        Role::Teacher => {
            let classes = state
                .config
                .find_user(&auth.claims.sub)
                .map(|u| u.classes.clone())
                .unwrap_or_default();
            state.store.students_in_classes(&classes).await
        }
        Role::Admin => state.store.list_students().await,
        Role::Driver => Vec::new(),
    };
    let items = rows
        .into_iter()
        .map(|s| api::StudentDto {
            id: s.id.0,
            name: s.name,
            class_id: s.class_id,
            route_id: s.route_id.map(|r| r.0),
        })
        .collect();
    Ok(Json(items))
}

async fn api_get_student(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<api::StudentDto>, AppError> {
    let s = state.store.get_student(&p.id.as_str().into()).await?;
    Ok(Json(api::StudentDto {
        id: s.id.0,
        name: s.name,
        class_id: s.class_id,
        route_id: s.route_id.map(|r| r.0),
    }))
}

// ---- fees ----

fn fee_dto(f: Fee) -> api::FeeDto {
    api::FeeDto {
        id: f.id,
        student_id: f.student_id.0,
        description: f.description,
        amount_cents: f.amount_cents,
        status: f.status,
        due_date: f.due_date.to_string(),
    }
}

async fn api_student_fees(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<Vec<api::FeeDto>>, AppError> {
    let rows = state.store.fees_for_student(&p.id.as_str().into()).await?;
    Ok(Json(rows.into_iter().map(fee_dto).collect()))
}

#[derive(Deserialize)]
struct FeePath {
    #[allow(dead_code)]
    school: String,
    id: String,
    fee_id: String,
}

async fn api_pay_fee(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<FeePath>,
) -> Result<Json<api::FeeDto>, AppError> {
    let student: StudentId = p.id.as_str().into();
    let fee = state.store.pay_fee(&student, &p.fee_id).await?;
    state.notify.dispatch_event(
        state.store.clone(),
        PortalEvent::FeePaid {
            student_id: student,
            fee_id: fee.id.clone(),
            amount_cents: fee.amount_cents,
        },
    );
    Ok(Json(fee_dto(fee)))
}

// ---- attendance ----

#[derive(Deserialize)]
struct DateOpt {
    date: Option<String>,
}

fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date: {}", s)))
}

async fn api_student_attendance(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
    Query(opts): Query<DateOpt>,
) -> Result<Json<Vec<api::AttendanceDto>>, AppError> {
    let date = opts.date.as_deref().map(parse_date).transpose()?;
    let rows = state
        .store
        .attendance_for_student(&p.id.as_str().into(), date)
        .await?;
    let items = rows
        .into_iter()
        .map(|a| api::AttendanceDto {
            id: a.id,
            date: a.date.to_string(),
            status: a.status,
        })
        .collect();
    Ok(Json(items))
}

async fn api_record_attendance(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
    Json(body): Json<api::RecordAttendanceReq>,
) -> Result<Json<api::AttendanceDto>, AppError> {
    let date = parse_date(&body.date)?;
    let student: StudentId = p.id.as_str().into();
    let rec = state
        .store
        .record_attendance(&student, date, body.status)
        .await?;
    if rec.status == AttendanceStatus::Absent {
        state.notify.dispatch_event(
            state.store.clone(),
            PortalEvent::StudentAbsent {
                student_id: student,
                date,
            },
        );
    }
    Ok(Json(api::AttendanceDto {
        id: rec.id,
        date: rec.date.to_string(),
        status: rec.status,
    }))
}

// ---- diary ----

async fn api_student_diary(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<Vec<api::DiaryEntryDto>>, AppError> {
    let rows = state.store.diary_for_student(&p.id.as_str().into()).await?;
    let items = rows
        .into_iter()
        .map(|e| api::DiaryEntryDto {
            id: e.id,
            date: e.date.to_string(),
            teacher: e.teacher_username,
            content: e.content,
        })
        .collect();
    Ok(Json(items))
}

async fn api_add_diary_entry(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
    Json(body): Json<api::DiaryEntryReq>,
) -> Result<Json<api::DiaryEntryDto>, AppError> {
    let date = parse_date(&body.date)?;
    let e = state
        .store
        .add_diary_entry(&p.id.as_str().into(), &auth.claims.sub, date, &body.content)
        .await?;
    Ok(Json(api::DiaryEntryDto {
        id: e.id,
        date: e.date.to_string(),
        teacher: e.teacher_username,
        content: e.content,
    }))
}

// ---- marks ----

async fn api_student_marks(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<Vec<api::MarkDto>>, AppError> {
    let rows = state.store.marks_for_student(&p.id.as_str().into()).await?;
    let items = rows
        .into_iter()
        .map(|m| api::MarkDto {
            id: m.id,
            subject: m.subject,
            assessment: m.assessment,
            score: m.score,
            max_score: m.max_score,
        })
        .collect();
    Ok(Json(items))
}

async fn api_add_mark(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
    Json(body): Json<api::MarkReq>,
) -> Result<Json<api::MarkDto>, AppError> {
    let m = state
        .store
        .add_mark(
            &p.id.as_str().into(),
            &body.subject,
            &body.assessment,
            body.score,
            body.max_score,
        )
        .await?;
    Ok(Json(api::MarkDto {
        id: m.id,
        subject: m.subject,
        assessment: m.assessment,
        score: m.score,
        max_score: m.max_score,
    }))
}

// ---- curriculum ----

fn curriculum_dto(c: Curriculum) -> api::CurriculumDto {
    api::CurriculumDto {
        id: c.id,
        student_id: c.student_id.0,
        content: c
            .content
            .into_iter()
            .map(|s| api::CurriculumSubjectDto {
                subject: s.subject,
                topics: s.topics,
                difficulty: s.difficulty,
            })
            .collect(),
    }
}

async fn api_student_curriculum(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<api::CurriculumDto>, AppError> {
    let c = state
        .store
        .curriculum_for_student(&p.id.as_str().into())
        .await?;
    Ok(Json(curriculum_dto(c)))
}

async fn api_generate_curriculum(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<api::CurriculumDto>, AppError> {
    let c = state
        .store
        .generate_curriculum(&p.id.as_str().into(), state.config.curriculum_ids)
        .await;
    Ok(Json(curriculum_dto(c)))
}

async fn api_edit_curriculum(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
    Json(body): Json<api::CurriculumEditReq>,
) -> Result<Json<api::CurriculumDto>, AppError> {
    let content: Vec<CurriculumSubject> = body
        .content
        .into_iter()
        .map(|s| CurriculumSubject {
            subject: s.subject,
            topics: s.topics,
            difficulty: s.difficulty,
        })
        .collect();
    let c = state
        .store
        .edit_curriculum(&p.id.as_str().into(), content, state.config.curriculum_ids)
        .await?;
    Ok(Json(curriculum_dto(c)))
}

async fn api_download_curriculum(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<api::CurriculumDownloadResp>, AppError> {
    let subjects = state
        .store
        .download_curriculum(&p.id.as_str().into())
        .await?;
    Ok(Json(api::CurriculumDownloadResp {
        success: true,
        subjects,
    }))
}

// ---- hall tickets / leaves ----

async fn api_student_hall_tickets(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<Vec<api::HallTicketDto>>, AppError> {
    let rows = state
        .store
        .hall_tickets_for_student(&p.id.as_str().into())
        .await?;
    let items = rows
        .into_iter()
        .map(|t| api::HallTicketDto {
            id: t.id,
            exam_name: t.exam_name,
            venue: t.venue,
            date: t.date.to_string(),
        })
        .collect();
    Ok(Json(items))
}

async fn api_student_leaves(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
) -> Result<Json<Vec<api::LeaveDto>>, AppError> {
    let rows = state.store.leaves_for_student(&p.id.as_str().into()).await?;
    let items = rows
        .into_iter()
        .map(|l| api::LeaveDto {
            id: l.id,
            from_date: l.from_date.to_string(),
            to_date: l.to_date.to_string(),
            reason: l.reason,
            status: l.status,
        })
        .collect();
    Ok(Json(items))
}

async fn api_submit_leave(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StudentPath>,
    Json(body): Json<api::LeaveReq>,
) -> Result<Json<api::LeaveDto>, AppError> {
    let from = parse_date(&body.from_date)?;
    let to = parse_date(&body.to_date)?;
    let l = state
        .store
        .submit_leave(&p.id.as_str().into(), from, to, &body.reason)
        .await?;
    Ok(Json(api::LeaveDto {
        id: l.id,
        from_date: l.from_date.to_string(),
        to_date: l.to_date.to_string(),
        reason: l.reason,
        status: l.status,
    }))
}

// ---- transport ----

#[derive(Deserialize)]
struct RoutePath {
    #[allow(dead_code)]
    school: String,
    id: String,
}

#[derive(Deserialize)]
struct StopPath {
    #[allow(dead_code)]
    school: String,
    id: String,
    stop_id: String,
}

fn route_dto(r: edusense_shared::domain::Route) -> api::RouteDto {
    api::RouteDto {
        id: r.id.0,
        name: r.name,
        stops: r
            .stops
            .into_iter()
            .map(|s| api::StopDto {
                id: s.id,
                name: s.name,
                latitude: s.latitude,
                longitude: s.longitude,
                arrival_time: s.arrival_time,
            })
            .collect(),
    }
}

async fn api_list_routes(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::RouteDto>>, AppError> {
    let rows = match auth.claims.role {
        Role::Driver => state.store.routes_for_driver(&auth.claims.sub).await,
        Role::Admin => state.store.list_routes().await,
        _ => Vec::new(),
    };
    Ok(Json(rows.into_iter().map(route_dto).collect()))
}

async fn api_get_route(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<RoutePath>,
) -> Result<Json<api::RouteDto>, AppError> {
    let r = state.store.get_route(&p.id.as_str().into()).await?;
    Ok(Json(route_dto(r)))
}

async fn api_stop_statuses(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<RoutePath>,
    Query(opts): Query<DateOpt>,
) -> Result<Json<Vec<api::StopStatusDto>>, AppError> {
    let date = opts.date.as_deref().map(parse_date).transpose()?;
    let rows = state
        .store
        .stop_statuses(&p.id.as_str().into(), date)
        .await?;
    let items = rows
        .into_iter()
        .map(|s| api::StopStatusDto {
            id: s.id,
            stop_id: s.stop_id,
            date: s.date.to_string(),
            state: s.state,
            reported_at: s.reported_at.map(|t| t.to_rfc3339()),
        })
        .collect();
    Ok(Json(items))
}

async fn api_report_stop_status(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Path(p): Path<StopPath>,
    Json(body): Json<api::ReportStopStatusReq>,
) -> Result<Json<api::StopStatusDto>, AppError> {
    let date = parse_date(&body.date)?;
    let s = state
        .store
        .report_stop_status(&p.id.as_str().into(), &p.stop_id, date, body.state)
        .await?;
    Ok(Json(api::StopStatusDto {
        id: s.id,
        stop_id: s.stop_id,
        date: s.date.to_string(),
        state: s.state,
        reported_at: s.reported_at.map(|t| t.to_rfc3339()),
    }))
}

// ---- calendar ----

async fn api_calendar(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::CalendarEventDto>>, AppError> {
    let rows = state.store.calendar_events().await;
    let items = rows
        .into_iter()
        .map(|e| api::CalendarEventDto {
            id: e.id,
            date: e.date.to_string(),
            title: e.title,
            kind: e.kind,
        })
        .collect();
    Ok(Json(items))
}

// ---- notifications ----

fn notification_dto(n: Notification) -> api::NotificationDto {
    api::NotificationDto {
        id: n.id,
        student_id: n.student_id.map(|s| s.0),
        kind: n.kind,
        title: n.title,
        message: n.message,
        created_at: n.created_at.to_rfc3339(),
    }
}

async fn api_list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<Vec<api::NotificationDto>>, AppError> {
    let rows = state.store.notifications_for(&auth.claims.sub).await;
    Ok(Json(rows.into_iter().map(notification_dto).collect()))
}

async fn api_notification_count(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<api::NotificationCountDto>, AppError> {
    let count = state.store.notification_count(&auth.claims.sub).await;
    Ok(Json(api::NotificationCountDto { count }))
}

async fn api_trigger_notification(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
    Json(body): Json<api::TriggerNotificationReq>,
) -> Result<Json<api::TriggerNotificationResp>, AppError> {
    if state.config.find_user(&body.recipient).is_none() {
        return Err(AppError::bad_request(format!(
            "unknown recipient: {}",
            body.recipient
        )));
    }
    let student_id = match &body.student_id {
        Some(sid) => {
            let sid: StudentId = sid.as_str().into();
            if state.store.student_class(&sid).await.is_none() {
                return Err(AppError::not_found(format!("student not found: {}", sid)));
            }
            Some(sid)
        }
        None => None,
    };
    let note = state
        .notify
        .trigger(
            &state.store,
            &body.recipient,
            student_id,
            body.kind,
            &body.title,
            &body.message,
        )
        .await?
        .ok_or_else(|| AppError::bad_request("duplicate notification suppressed"))?;
    Ok(Json(api::TriggerNotificationResp {
        id: note.id,
        created_at: note.created_at.to_rfc3339(),
    }))
}

// ---- finance ----

async fn api_finance_overview(
    State(state): State<AppState>,
    Extension(_auth): Extension<AuthCtx>,
) -> Result<Json<api::FinanceOverviewDto>, AppError> {
    let o = state.store.finance_overview().await;
    Ok(Json(api::FinanceOverviewDto {
        total_billed_cents: o.total_billed_cents,
        total_paid_cents: o.total_paid_cents,
        total_pending_cents: o.total_pending_cents,
        total_overdue_cents: o.total_overdue_cents,
        students_with_dues: o.students_with_dues,
    }))
}

// ---- errors ----

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Internal(String),
}

impl AppError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    fn unauthorized() -> Self {
        Self::Unauthorized
    }
    fn forbidden() -> Self {
        Self::Forbidden
    }
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(m) => AppError::NotFound(m),
            StoreError::InvalidInput(m) => AppError::BadRequest(m),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized".into(),
                "unauthorized",
                None,
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".into(), "forbidden", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
                "internal",
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(status = %status, kind = kind, message = %msg, detail = %detail, "request failed");
        } else {
            tracing::error!(status = %status, kind = kind, message = %msg, "request failed");
        }
        let body = axum::Json(ErrorBody { error: msg });
        (status, body).into_response()
    }
}
