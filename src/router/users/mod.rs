//! Users-related HTTP API.
mod create;
mod delete;
mod list;
mod password;
mod update;

use std::sync::LazyLock;

use axum::routing::{get, patch, post};
use axum::{Router, middleware};
use regex_lite::Regex;
use validator::ValidationError;

use crate::AppState;

const ME_ROUTE: &str = "/@me";

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{3,50}$").unwrap());

/// Usernames are 3 to 50 letters, digits, dots, dashes or underscores.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("username"))
    }
}

pub fn router(state: AppState) -> Router<AppState> {
    // Supervisors only.
    let management = Router::new()
        .route("/", get(list::handler).post(create::handler))
        .route("/exists", get(list::exists))
        .route("/{id}", patch(update::handler).delete(delete::handler))
        .route_layer(middleware::from_fn(crate::middleware::require_supervisor));

    Router::new()
        // `PATCH /users/@me` goes to `update`. Authorization required.
        .route(ME_ROUTE, patch(update::me))
        // `POST /users/@me/password` goes to `password`.
        .route(&format!("{ME_ROUTE}/password"), post(password::handler))
        .merge(management)
        .route_layer(middleware::from_fn_with_state(state, crate::middleware::auth))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("suporte1").is_ok());
        assert!(validate_username("joao.silva").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("joão").is_err());
        assert!(validate_username("has space").is_err());
    }
}
