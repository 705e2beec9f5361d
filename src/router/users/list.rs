use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::Result;
use crate::user::{Caller, User};

/// Handler for `GET /users`. Supervisor only.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.users.list(&caller).await?))
}

#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    pub username: String,
    /// User being edited.
    pub exclude: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Exists {
    pub exists: bool,
}

/// Handler for `GET /users/exists`.
pub async fn exists(
    State(state): State<AppState>,
    query: std::result::Result<Query<ExistsQuery>, QueryRejection>,
) -> Result<Json<Exists>> {
    let Query(query) = query?;
    let exists = state
        .users
        .username_exists(&query.username, query.exclude)
        .await?;

    Ok(Json(Exists { exists }))
}
