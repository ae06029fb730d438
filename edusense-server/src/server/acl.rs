use super::{AppError, AppState, auth::AuthCtx, config::UserConfig};
use axum::response::Response;
use axum::{
    extract::{OriginalUri, State},
    http::{Method, Request},
    middleware::Next,
};
use edusense_shared::auth::Role;
use percent_encoding::percent_decode_str;

pub async fn enforce_acl(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|orig| orig.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let method = req.method().clone();
    let Some(auth) = req.extensions().get::<AuthCtx>() else {
        return Err(AppError::unauthorized());
    };
    let claims = &auth.claims;

    let segs = segmented(&path);
    let school_prefix = ["api", "v1", "school", state.config.school_id.as_str()];
    if !segs.as_slice().starts_with(&school_prefix) {
        tracing::warn!(?segs, "ACL: path outside school scope");
        return Err(AppError::forbidden());
    }
    let rest = &segs[school_prefix.len()..];

    let Some(user) = state.config.find_user(&claims.sub) else {
        return Err(AppError::forbidden());
    };

    let decision = match claims.role {
        Role::Parent => allow_parent(&method, rest, user),
        Role::Teacher => allow_teacher(&state, &method, rest, user).await,
        Role::Driver => allow_driver(&method, rest, user),
        Role::Admin => Ok(()),
    };

    if let Err(err) = decision {
        tracing::warn!(
            method = %method,
            path = %path,
            username = %claims.sub,
            role = ?claims.role,
            "ACL: no rule matched; denying"
        );
        return Err(err);
    }

    Ok(next.run(req).await)
}

fn allow_parent(method: &Method, rest: &[&str], user: &UserConfig) -> Result<(), AppError> {
    match rest {
        ["students"] if *method == Method::GET => Ok(()),
        ["calendar"] if *method == Method::GET => Ok(()),
        ["notifications"] if *method == Method::GET => Ok(()),
        ["notifications", "count"] if *method == Method::GET => Ok(()),
        ["students", id, tail @ ..] => {
            ensure_own_student(user, id)?;
            match tail {
                [] if *method == Method::GET => Ok(()),
                ["fees"] if *method == Method::GET => Ok(()),
                ["fees", _, "pay"] if *method == Method::POST => Ok(()),
                ["attendance"] if *method == Method::GET => Ok(()),
                ["diary"] if *method == Method::GET => Ok(()),
                ["marks"] if *method == Method::GET => Ok(()),
                ["curriculum"] if *method == Method::GET => Ok(()),
                ["curriculum", "download"] if *method == Method::POST => Ok(()),
                ["hall-tickets"] if *method == Method::GET => Ok(()),
                ["leaves"] if *method == Method::GET || *method == Method::POST => Ok(()),
                _ => Err(AppError::forbidden()),
            }
        }
        _ => Err(AppError::forbidden()),
    }
}

async fn allow_teacher(
    state: &AppState,
    method: &Method,
    rest: &[&str],
    user: &UserConfig,
) -> Result<(), AppError> {
    match rest {
        ["students"] if *method == Method::GET => Ok(()),
        ["calendar"] if *method == Method::GET => Ok(()),
        ["notifications"] if *method == Method::GET => Ok(()),
        ["notifications", "count"] if *method == Method::GET => Ok(()),
        ["notifications", "trigger"] if *method == Method::POST => Ok(()),
        ["students", id, tail @ ..] => {
            ensure_student_in_classes(state, user, id).await?;
            match tail {
                [] if *method == Method::GET => Ok(()),
                ["attendance"] if *method == Method::GET || *method == Method::POST => Ok(()),
                ["diary"] if *method == Method::GET || *method == Method::POST => Ok(()),
                ["marks"] if *method == Method::GET || *method == Method::POST => Ok(()),
                ["curriculum"] if *method == Method::GET || *method == Method::PUT => Ok(()),
                ["curriculum", "generate"] if *method == Method::POST => Ok(()),
                ["curriculum", "download"] if *method == Method::POST => Ok(()),
                ["hall-tickets"] if *method == Method::GET => Ok(()),
                _ => Err(AppError::forbidden()),
            }
        }
        _ => Err(AppError::forbidden()),
    }
}

fn allow_driver(method: &Method, rest: &[&str], user: &UserConfig) -> Result<(), AppError> {
    match rest {
        ["routes"] if *method == Method::GET => Ok(()),
        ["calendar"] if *method == Method::GET => Ok(()),
        ["notifications"] if *method == Method::GET => Ok(()),
        ["notifications", "count"] if *method == Method::GET => Ok(()),
        ["routes", id, tail @ ..] => {
            ensure_own_route(user, id)?;
            match tail {
                [] if *method == Method::GET => Ok(()),
                ["stops", "statuses"] if *method == Method::GET => Ok(()),
                ["stops", _, "status"] if *method == Method::POST => Ok(()),
                _ => Err(AppError::forbidden()),
            }
        }
        _ => Err(AppError::forbidden()),
    }
}

fn segmented(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn decode(seg: &str) -> String {
    percent_decode_str(seg).decode_utf8_lossy().to_string()
}

fn ensure_own_student(user: &UserConfig, seg: &str) -> Result<(), AppError> {
    let provided = decode(seg);
    if user.children.iter().any(|c| c == &provided) {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

/// Unknown students are denied rather than 404ed so teachers cannot probe
/// for ids outside their classes.
async fn ensure_student_in_classes(
    state: &AppState,
    user: &UserConfig,
    seg: &str,
) -> Result<(), AppError> {
    let provided = decode(seg);
    let Some(class_id) = state.store.student_class(&provided.as_str().into()).await else {
        return Err(AppError::forbidden());
    };
    if user.classes.contains(&class_id) {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}

fn ensure_own_route(user: &UserConfig, seg: &str) -> Result<(), AppError> {
    let provided = decode(seg);
    if user.routes.iter().any(|r| r == &provided) {
        Ok(())
    } else {
        Err(AppError::forbidden())
    }
}
