use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::Caller;

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 1, message = "Current password cannot be empty."))]
    pub current_password: String,
    #[validate(length(min = 6, max = 255, message = "Password must contain at least 6 characters."))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "Passwords do not match."))]
    pub confirm_password: String,
}

/// Handler for `POST /users/@me/password`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Valid(body): Valid<Body>,
) -> Result<StatusCode> {
    state
        .users
        .change_password(&caller, &body.current_password, &body.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
