use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::ticket::{Status, Ticket};
use crate::user::Caller;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct StatusBody {
    pub status: Status,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct MessageBody {
    #[validate(length(min = 1, max = 5000, message = "Message must be 1 to 5000 characters long."))]
    pub message: String,
}

/// Handler for `PATCH /tickets/{id}/status`.
pub async fn status(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Valid(body): Valid<StatusBody>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.tickets.update_status(&caller, id, body.status).await?))
}

/// Handler for `POST /tickets/{id}/messages`.
pub async fn message(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Valid(body): Valid<MessageBody>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.tickets.add_message(&caller, id, &body.message).await?))
}

#[cfg(test)]
mod tests {
    use crate::ticket::{Status, Ticket};
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;

    async fn first_ticket(state: &AppState) -> Ticket {
        state.tickets.repo.find(1).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_update_status() {
        let state = router::test_state().await;
        let token = token_for(&state, "admin").await;

        let response = make_request(
            Some(&token),
            app(state.clone()),
            Method::PATCH,
            "/tickets/1/status",
            json!({ "status": "Pendente" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let ticket: Ticket = serde_json::from_slice(&body).unwrap();
        assert_eq!(ticket.status, Status::Pending);
        assert_eq!(first_ticket(&state).await.status, Status::Pending);
        assert_eq!(ticket.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_add_message() {
        let state = router::test_state().await;
        let token = token_for(&state, "admin").await;

        let response = make_request(
            Some(&token),
            app(state.clone()),
            Method::POST,
            "/tickets/1/messages",
            json!({ "message": "Cliente confirmou a correção." }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let ticket = first_ticket(&state).await;
        assert!(ticket.messages()[1].ends_with("Administrador do Sistema:\nCliente confirmou a correção."));
        assert_eq!(ticket.updated_by.as_deref(), Some("Administrador do Sistema"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let state = router::test_state().await;
        let token = token_for(&state, "admin").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::POST,
            "/tickets/1/messages",
            json!({ "message": "" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_technician_cannot_touch_others_tickets() {
        let state = router::test_state().await;
        let token = token_for(&state, "suporte1").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::PATCH,
            "/tickets/1/status",
            json!({ "status": "Pendente" }).to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
