//! Update user profiles.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail};

use crate::AppState;
use crate::error::Result;
use crate::router::Valid;
use crate::user::{Caller, ProfileUpdate, Role, User};

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[validate(length(min = 1, max = 120, message = "Name must be 1 to 120 characters long."))]
    pub name: Option<String>,
    pub email: Option<String>,
    #[validate(length(max = 2048, message = "Avatar must be at most 2048 characters long."))]
    pub avatar: Option<String>,
    pub role: Option<Role>,
    #[validate(length(max = 50, message = "Department must be at most 50 characters long."))]
    pub department: Option<String>,
}

impl From<Body> for ProfileUpdate {
    fn from(body: Body) -> Self {
        ProfileUpdate {
            name: body.name,
            email: body.email,
            avatar: body.avatar,
            role: body.role,
            department: body.department,
        }
    }
}

/// An empty email clears the field, anything else must be an address.
fn check_email(body: &Body) -> Result<()> {
    if let Some(email) = body.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !email.to_owned().validate_email() {
            return Err(crate::ServerError::field(
                "email",
                "email",
                "Email must be formatted.",
            ));
        }
    }
    Ok(())
}

/// Handler for `PATCH /users/@me`.
pub async fn me(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Valid(body): Valid<Body>,
) -> Result<Json<User>> {
    check_email(&body)?;
    Ok(Json(state.users.update_profile(&caller, caller.id, body.into()).await?))
}

/// Handler for `PATCH /users/{id}`. Supervisor only.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<Json<User>> {
    check_email(&body)?;
    Ok(Json(state.users.update_profile(&caller, id, body.into()).await?))
}
