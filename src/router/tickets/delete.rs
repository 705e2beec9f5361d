use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Extension;

use crate::AppState;
use crate::error::Result;
use crate::user::Caller;

/// Handler for `DELETE /tickets/{id}`. Supervisor only.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.tickets.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_delete_handler() {
        let state = router::test_state().await;
        let technician = token_for(&state, "suporte1").await;
        let supervisor = token_for(&state, "admin").await;

        let response =
            make_request(Some(&technician), app(state.clone()), Method::DELETE, "/tickets/2", String::new())
                .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response =
            make_request(Some(&supervisor), app(state.clone()), Method::DELETE, "/tickets/2", String::new())
                .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.tickets.repo.find(2).await.unwrap().is_none());

        let response =
            make_request(Some(&supervisor), app(state), Method::DELETE, "/tickets/2", String::new())
                .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
