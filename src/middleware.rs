//! Middlewares for routes.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;

use crate::AppState;
use crate::ServerError;
use crate::error::Result;
use crate::user::Caller;

const BEARER: &str = "Bearer ";

/// Token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolve the session and expose it, with its [`Caller`], to handlers.
pub async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(req.headers()).ok_or(ServerError::Unauthorized)?;
    let session = state
        .sessions
        .load(token)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut().insert(Caller::from(&session.user));
    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Reject non-supervisors. Must run after [`auth`].
pub async fn require_supervisor(
    Extension(caller): Extension<Caller>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if !caller.is_supervisor() {
        tracing::debug!(user_id = caller.id, path = %req.uri().path(), "supervisor route refused");
        return Err(ServerError::Forbidden);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
