//! ticketdesk is a support ticket tracker with team metrics.

#![forbid(unsafe_code)]
mod clock;
mod crypto;
mod dashboard;
mod database;
pub mod error;
mod memory;
mod middleware;
mod router;
mod session;
pub mod telemetry;
mod ticket;
mod token;
mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::{get, post};
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::clock::{Clock, SystemClock};
use crate::crypto::PasswordManager;
use crate::database::{Database, Stores};
use crate::session::SessionManager;
use crate::ticket::TicketService;
use crate::token::TokenManager;
use crate::user::UserService;

const SECRET_ENV: &str = "SECRET";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    token: Option<&str>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    let mut request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    app.oneshot(request.body(axum::body::Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// Open a session for a seeded account.
/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn token_for(state: &AppState, username: &str) -> String {
    let user = state
        .users
        .repo
        .find_by_username(username)
        .await
        .unwrap()
        .expect("unknown test account");

    state.sessions.issue(&user, false).await.unwrap().token
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub clock: Arc<dyn Clock>,
    pub users: UserService,
    pub tickets: TicketService,
    pub sessions: SessionManager,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire services over `stores`.
    pub fn new(
        config: Arc<config::Configuration>,
        stores: Stores,
        pwd: PasswordManager,
        tokens: TokenManager,
        clock: Arc<dyn Clock>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let users = UserService::new(stores.users.clone(), Arc::new(pwd), Arc::clone(&clock));
        let tickets = TicketService::new(stores.tickets, Arc::clone(&clock));
        let sessions = SessionManager::new(
            tokens,
            stores.sessions,
            stores.users,
            Arc::clone(&clock),
            config.session.clone(),
        );

        Self {
            config,
            clock,
            users,
            tickets,
            sessions,
            metrics,
        }
    }
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    let session_router = Router::new()
        // `POST /logout` goes to `logout`.
        .route("/logout", post(router::login::logout))
        // `GET /session` goes to `current`.
        .route("/session", get(router::login::current))
        // `GET /stats` goes to `stats`.
        .route("/stats", get(router::stats::handler))
        .route_layer(AxumMiddleware::from_fn_with_state(
            state.clone(),
            middleware::auth,
        ));

    Router::new()
        // `GET /` goes to the dashboard page.
        .route("/", get(dashboard::handler))
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        // `POST /login` goes to `login`.
        .route("/login", post(router::login::handler))
        .route("/metrics.json", get(router::stats::metrics))
        .route("/metrics", get(router::stats::prometheus))
        .merge(session_router)
        .nest("/tickets", router::tickets::router(state.clone()))
        .nest("/users", router::users::router(state.clone()))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

fn session_secret() -> Vec<u8> {
    match std::env::var(SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => secret.into_bytes(),
        _ => {
            tracing::warn!(
                "missing `{SECRET_ENV}` environment variable, sessions will not survive a restart"
            );
            crypto::random_hex(32).into_bytes()
        },
    }
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
    metrics: Option<PrometheusHandle>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    let stores = match config.postgres {
        Some(ref postgres) => {
            let db = Database::from_config(postgres).await?;
            // execute migrations scripts on start.
            db.migrate().await?;
            Stores::postgres(&db)
        },
        None => {
            tracing::warn!("missing `postgres` entry on `config.yaml` file, using in-memory store");
            Stores::memory(Arc::new(memory::MemoryStore::default()))
        },
    };

    let pwd = PasswordManager::new(config.argon2.clone())?;
    let tokens = TokenManager::new(&session_secret());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = AppState::new(Arc::clone(&config), stores, pwd, tokens, clock, metrics);

    if config.postgres.is_none() {
        memory::seed(&state).await?;
    }

    Ok(state)
}

/// Background refresh of the ticket gauges.
pub fn spawn_refresh(state: &AppState) -> tokio::task::JoinHandle<()> {
    telemetry::spawn_ticket_gauges(
        state.tickets.clone(),
        Duration::from_secs(state.config.refresh_interval.max(1)),
    )
}
