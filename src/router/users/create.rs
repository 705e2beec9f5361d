use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::{Caller, Role, User, UserBuilder};

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(custom(
        function = "crate::router::users::validate_username",
        message = "Username must be 3 to 50 letters, digits, dots, dashes or underscores."
    ))]
    pub username: String,
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters long."))]
    pub name: String,
    #[validate(length(min = 6, max = 255, message = "Password must contain at least 6 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm_password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub department: String,
    #[validate(email(message = "Email must be formatted."))]
    pub email: Option<String>,
}

/// Handler to create a user. Supervisor only.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<User>)> {
    let user = UserBuilder::new()
        .username(&body.username)
        .password(&body.password)
        .name(&body.name)
        .role(body.role)
        .department(&body.department)
        .email(body.email)
        .build();

    let user = state.users.create(&caller, user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
