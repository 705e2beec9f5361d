//! Tickets-related HTTP API.
mod attendance;
mod create;
mod delete;
mod list;
mod update;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};

use crate::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        // `GET /tickets` goes to `list`, `POST /tickets` to `create`.
        .route("/", get(list::handler).post(create::handler))
        .route("/today", get(list::today))
        // `DELETE /tickets/{id}` is for supervisors.
        .route("/{id}", get(list::get).delete(delete::handler))
        .route("/{id}/status", patch(update::status))
        .route("/{id}/messages", post(update::message))
        .route("/{id}/attendance/start", post(attendance::start))
        .route("/{id}/attendance/finish", post(attendance::finish))
        .route_layer(middleware::from_fn_with_state(state, crate::middleware::auth))
}
