use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::ticket::{Ticket, TicketFilter};
use crate::user::Caller;

/// Handler for `GET /tickets`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    filter: std::result::Result<Query<TicketFilter>, QueryRejection>,
) -> Result<Json<Vec<Ticket>>> {
    let Query(filter) = filter?;
    Ok(Json(state.tickets.list(&caller, &filter).await?))
}

/// Handler for `GET /tickets/today`.
pub async fn today(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Ticket>>> {
    Ok(Json(state.tickets.today(&caller).await?))
}

/// Handler for `GET /tickets/{id}`.
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.tickets.get(&caller, id).await?))
}

#[cfg(test)]
mod tests {
    use crate::ticket::{Department, NewTicket, Platform, Ticket};
    use crate::user::Caller;
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    async fn tickets(response: axum::http::Response<axum::body::Body>) -> Vec<Ticket> {
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    async fn create(state: &AppState, username: &str, company: &str) -> Ticket {
        let user = state.users.repo.find_by_username(username).await.unwrap().unwrap();
        state
            .tickets
            .create(
                &Caller::from(&user),
                NewTicket {
                    company: company.into(),
                    platform: Platform::Intercom,
                    department: Department::Pricing,
                    description: "Tabela de preços desatualizada".into(),
                    status: None,
                    in_implementation: false,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_filters_by_company() {
        let state = router::test_state().await;
        create(&state, "suporte1", "Acme").await;
        create(&state, "suporte2", "ACME Solar").await;
        create(&state, "suporte2", "Zen").await;
        let token = token_for(&state, "admin").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::GET,
            "/tickets?company=acme&platform=&status=",
            String::new(),
        )
        .await;

        let list = tickets(response).await;
        assert_eq!(list.len(), 2);
        assert!(list[0].created_at >= list[1].created_at);
    }

    #[tokio::test]
    async fn test_technician_only_lists_own_tickets() {
        let state = router::test_state().await;
        create(&state, "suporte1", "Acme").await;
        create(&state, "suporte2", "Zen").await;
        let token = token_for(&state, "suporte2").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::GET,
            "/tickets?createdBy=Jo%C3%A3o",
            String::new(),
        )
        .await;

        let list = tickets(response).await;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].created_by, "Maria Santos");
    }

    #[tokio::test]
    async fn test_invalid_query() {
        let state = router::test_state().await;
        let token = token_for(&state, "admin").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::GET,
            "/tickets?platform=WHATSAPP",
            String::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_today_queue() {
        let state = router::test_state().await;
        let first = create(&state, "suporte1", "Primeira").await;
        let second = create(&state, "suporte1", "Segunda").await;
        let token = token_for(&state, "suporte1").await;

        let response =
            make_request(Some(&token), app(state), Method::GET, "/tickets/today", String::new())
                .await;

        let ids: Vec<i64> = tickets(response).await.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn test_get_other_technicians_ticket() {
        let state = router::test_state().await;
        let ticket = create(&state, "suporte1", "Acme").await;
        let token = token_for(&state, "suporte2").await;

        let response = make_request(
            Some(&token),
            app(state),
            Method::GET,
            &format!("/tickets/{}", ticket.id),
            String::new(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
