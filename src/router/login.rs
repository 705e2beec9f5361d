//! Session lifecycle: login, logout and introspection.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::middleware::bearer_token;
use crate::router::Valid;
use crate::session::Session;
use crate::user::User;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(min = 1, message = "Username cannot be empty."))]
    pub username: String,
    #[validate(length(min = 1, message = "Password cannot be empty."))]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Handler for `POST /login`.
pub async fn handler(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<Json<Response>> {
    let user = state.users.authenticate(&body.username, &body.password).await?;
    let session = state.sessions.issue(&user, body.remember).await?;

    Ok(Json(Response {
        token_type: TOKEN_TYPE.to_owned(),
        token: session.token,
        expires_at: session.expires_at,
        user: session.user,
    }))
}

/// Handler for `POST /logout`.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.clear(token).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Current {
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Handler for `GET /session`.
pub async fn current(Extension(session): Extension<Session>) -> Json<Current> {
    Json(Current {
        user: session.user,
        expires_at: session.expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_handler() {
        let state = router::test_state().await;
        let response = make_request(
            None,
            app(state.clone()),
            Method::POST,
            "/login",
            json!({ "username": "suporte2", "password": "suporte123" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Response = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.token_type, TOKEN_TYPE);
        assert_eq!(body.user.name, "Maria Santos");
        assert!(state.sessions.is_valid(&body.token).await.unwrap());

        let raw: serde_json::Value = serde_json::to_value(&body.user).unwrap();
        assert!(raw.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_login_with_wrong_password() {
        let state = router::test_state().await;
        let response = make_request(
            None,
            app(state),
            Method::POST,
            "/login",
            json!({ "username": "admin", "password": "nope" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let state = router::test_state().await;
        let token = token_for(&state, "suporte1").await;

        let response = make_request(
            Some(&token),
            app(state.clone()),
            Method::GET,
            "/session",
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = make_request(
            Some(&token),
            app(state.clone()),
            Method::POST,
            "/logout",
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response =
            make_request(Some(&token), app(state), Method::GET, "/session", String::new()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
