use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::http_server::state::AppState;

/// The authenticated principal, resolved once by [`require_auth`] and read by
/// handlers through the extractor impl below.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Middleware that validates the Bearer token and stores the principal in
/// request extensions. Runs before any protected handler.
pub async fn require_auth(
    State(app_state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization header"))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid authorization header"))?;

    let user_id = app_state.auth.verify_token(token).map_err(|e| {
        tracing::warn!("Token verification failed: {e}");
        (StatusCode::UNAUTHORIZED, "Invalid or expired token")
    })?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}
