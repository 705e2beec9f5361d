//! HTTP API.
pub mod login;
pub mod stats;
pub mod status;
pub mod tickets;
pub mod users;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::ServerError;

/// JSON body checked with [`Validate`] before reaching the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Seeded in-memory state.
/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn test_state() -> crate::AppState {
    state_with_store(std::sync::Arc::new(crate::memory::MemoryStore::default())).await
}

/// Seed `store` and build a state around it, with a fast password hasher.
#[cfg(test)]
pub async fn state_with_store(
    store: std::sync::Arc<crate::memory::MemoryStore>,
) -> crate::AppState {
    use std::sync::Arc;

    let pwd = crate::crypto::PasswordManager::new(Some(crate::config::Argon2 {
        memory_cost: 1024,
        iterations: 1,
        parallelism: 1,
        hash_length: 32,
    }))
    .unwrap();

    let state = crate::AppState::new(
        Arc::new(crate::config::Configuration::default()),
        crate::database::Stores::memory(store),
        pwd,
        crate::token::TokenManager::new(b"test-secret"),
        Arc::new(crate::clock::SystemClock),
        None,
    );
    crate::memory::seed(&state).await.unwrap();
    state
}
