use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::ticket::{NewTicket, Ticket};
use crate::user::Caller;

/// Handler to create a ticket.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Valid(body): Valid<NewTicket>,
) -> Result<(StatusCode, Json<Ticket>)> {
    let ticket = state.tickets.create(&caller, body).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[cfg(test)]
mod tests {
    use crate::ticket::{Platform, Status, Ticket};
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_handler() {
        let state = router::test_state().await;
        let token = token_for(&state, "suporte3").await;

        let response = make_request(
            Some(&token),
            app(state.clone()),
            Method::POST,
            "/tickets",
            json!({
                "company": "Acme Energia",
                "platform": "GRONERZAP",
                "department": "Fluxos",
                "description": "Fluxo de boas-vindas parou",
                "inImplementation": true,
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let ticket: Ticket = serde_json::from_slice(&body).unwrap();
        assert_eq!(ticket.platform, Platform::Gronerzap);
        assert_eq!(ticket.status, Status::InProgress);
        assert_eq!(ticket.created_by, "Pedro Costa");
        assert!(ticket.in_implementation);
        assert!(ticket.ticket_id.starts_with("TK-"));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_department() {
        let state = router::test_state().await;
        let token = token_for(&state, "suporte3").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::POST,
            "/tickets",
            json!({
                "company": "Acme",
                "platform": "INTERCOM",
                "department": "Marketing",
                "description": "Teste",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_company() {
        let state = router::test_state().await;
        let token = token_for(&state, "suporte3").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::POST,
            "/tickets",
            json!({
                "company": "",
                "platform": "INTERCOM",
                "department": "Suporte",
                "description": "Teste",
            })
            .to_string(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_requires_session() {
        let state = router::test_state().await;
        let response = make_request(None, app(state), Method::POST, "/tickets", "{}".into()).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
