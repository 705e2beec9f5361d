use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;

use crate::AppState;
use crate::error::Result;
use crate::user::Caller;

/// Handler for `DELETE /users/{id}`. Supervisor only.
///
/// Deactivates the account and revokes its sessions.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let user = state.users.delete(&caller, id).await?;
    state.sessions.revoke_user(user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_delete_handler() {
        let state = router::test_state().await;
        let supervisor = token_for(&state, "admin").await;
        let technician = token_for(&state, "suporte3").await;
        let id = state.users.repo.find_by_username("suporte3").await.unwrap().unwrap().id;

        let response = make_request(
            Some(&supervisor),
            app(state.clone()),
            Method::DELETE,
            &format!("/users/{id}"),
            String::new(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        assert!(!state.sessions.is_valid(&technician).await.unwrap());
        assert!(state.users.authenticate("suporte3", "suporte123").await.is_err());
    }

    #[tokio::test]
    async fn test_cannot_delete_self() {
        let state = router::test_state().await;
        let token = token_for(&state, "admin").await;
        let id = state.users.repo.find_by_username("admin").await.unwrap().unwrap().id;

        let response = make_request(
            Some(&token),
            app(state),
            Method::DELETE,
            &format!("/users/{id}"),
            String::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
