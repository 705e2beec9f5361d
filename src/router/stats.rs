//! Statistics and metrics.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::AppState;
use crate::error::Result;
use crate::ticket::{Metrics, Stats};
use crate::user::Caller;

#[derive(Debug, Default, Deserialize)]
pub struct Scope {
    /// Creator display name. Supervisor only.
    pub user: Option<String>,
}

/// Handler for `GET /stats`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    scope: std::result::Result<Query<Scope>, QueryRejection>,
) -> Result<Json<Stats>> {
    let Query(scope) = scope?;
    Ok(Json(state.tickets.stats(&caller, scope.user.as_deref()).await?))
}

/// Handler for `GET /metrics.json`.
pub async fn metrics(State(state): State<AppState>) -> Result<Json<Metrics>> {
    Ok(Json(state.tickets.metrics().await?))
}

/// Handler for `GET /metrics`, in Prometheus exposition format.
pub async fn prometheus(State(state): State<AppState>) -> (StatusCode, String) {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_metrics_json() {
        let state = router::test_state().await;
        let response =
            make_request(None, app(state), Method::GET, "/metrics.json", String::new()).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let metrics: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(metrics["total"], 3);
        assert_eq!(metrics["intercom"], 2);
        assert_eq!(metrics["gronerzap"], 1);
        assert_eq!(metrics["completionRate"], 100.0);

        let departments = metrics["byDepartment"].as_array().unwrap();
        assert_eq!(departments.len(), 8);
        assert_eq!(departments[0]["department"], "Criação");
        assert_eq!(departments[0]["count"], 0);
        assert_eq!(departments[6]["department"], "Suporte");
        assert_eq!(departments[6]["count"], 3);
    }

    #[tokio::test]
    async fn test_stats_scope() {
        let state = router::test_state().await;
        let supervisor = token_for(&state, "admin").await;
        let technician = token_for(&state, "suporte1").await;

        let response =
            make_request(Some(&supervisor), app(state.clone()), Method::GET, "/stats", String::new())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats["total"], 3);
        assert_eq!(stats["monthlyActivity"].as_array().unwrap().len(), 6);

        let response =
            make_request(Some(&technician), app(state), Method::GET, "/stats?user=", String::new())
                .await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let stats: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(stats["total"], 0);
        assert_eq!(stats["completionRate"], 0.0);
    }

    #[tokio::test]
    async fn test_prometheus_without_recorder() {
        let state = router::test_state().await;
        let response = make_request(None, app(state), Method::GET, "/metrics", String::new()).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
