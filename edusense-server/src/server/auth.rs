use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{Duration, Utc};
use edusense_shared::auth::Role;
use edusense_shared::jwt::{self, JwtClaims};
use tracing::{error, warn};

use super::{AppError, AppState};

/// How many days of inactivity before a session is considered expired.
const SESSION_IDLE_DAYS: i64 = 14;
/// How many days before mandatory re-login.
const TOKEN_TTL_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct AuthCtx {
    pub claims: JwtClaims,
}

pub async fn require_bearer(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let unauthorized = || Err(AppError::unauthorized());
    let header_val = match req.headers().get(header::AUTHORIZATION) {
        Some(v) => v,
        None => return unauthorized(),
    };
    let header_str = header_val.to_str().map_err(|_| AppError::unauthorized())?;
    let prefix = "Bearer ";
    if !header_str.starts_with(prefix) {
        return unauthorized();
    }
    let token = &header_str[prefix.len()..];

    let claims = match jwt::decode_and_verify(token, state.config.jwt_secret.as_bytes()) {
        Ok(c) => c,
        Err(e) => {
            warn!(error=%e, "auth: jwt decode failed");
            return unauthorized();
        }
    };

    validate_claims(&state, &claims).map_err(|e| {
        warn!(error=?e, username=%claims.sub, "auth: validate_claims failed");
        AppError::unauthorized()
    })?;

    let cutoff = Utc::now() - Duration::days(SESSION_IDLE_DAYS);
    if !state
        .store
        .touch_session_with_cutoff(&claims.jti, cutoff)
        .await
    {
        warn!(
            jti = %claims.jti,
            username = %claims.sub,
            cutoff = %cutoff,
            "auth: session missing or expired (last_used_at < cutoff)"
        );
        return unauthorized();
    }
    let auth = AuthCtx { claims };
    req.extensions_mut().insert(auth);
    Ok(next.run(req).await)
}

pub async fn issue_jwt_for_user(
    state: &AppState,
    username: &str,
    role: Role,
) -> Result<String, AppError> {
    let jti = uuid::Uuid::new_v4().to_string();
    let exp = (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp();
    let claims = JwtClaims {
        sub: username.to_string(),
        jti: jti.clone(),
        exp,
        role,
        school_id: state.config.school_id.clone(),
    };

    validate_claims(state, &claims)?;

    state.store.create_session(&jti, username).await;
    let token = jwt::encode(&claims, state.config.jwt_secret.as_bytes()).map_err(|e| {
        error!(username, error=%e, "login: jwt encode failed");
        AppError::internal(e)
    })?;
    Ok(token)
}

fn validate_claims(state: &AppState, claims: &JwtClaims) -> Result<(), AppError> {
    if claims.school_id != state.config.school_id {
        warn!(
            username = %claims.sub,
            token_school = %claims.school_id,
            config_school = %state.config.school_id,
            "auth: school mismatch"
        );
        return Err(AppError::forbidden());
    }
    let user = state.config.find_user(&claims.sub).ok_or_else(|| {
        warn!(username = %claims.sub, "auth: unknown user");
        AppError::forbidden()
    })?;
    if user.role != claims.role {
        warn!(
            username = %claims.sub,
            token_role = ?claims.role,
            actual_role = ?user.role,
            "auth: role mismatch"
        );
        return Err(AppError::forbidden());
    }
    Ok(())
}
