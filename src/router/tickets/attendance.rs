use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::AppState;
use crate::error::Result;
use crate::ticket::Ticket;
use crate::user::Caller;

/// Handler for `POST /tickets/{id}/attendance/start`.
pub async fn start(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.tickets.start_attendance(&caller, id).await?))
}

/// Handler for `POST /tickets/{id}/attendance/finish`.
pub async fn finish(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
) -> Result<Json<Ticket>> {
    Ok(Json(state.tickets.finish_attendance(&caller, id).await?))
}
