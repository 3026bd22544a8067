//! HTTP trigger
//!
//! - `GET|POST /api/sweep` - run one sweep; 200 with `Exported <n> records.`,
//!   500 with the error message of a failed run
//! - `GET /health` - liveness probe, returns `ok`
//!
//! Overlapping triggers wait for the running sweep to finish instead of
//! sweeping the same accounts concurrently. A sweep runs on its own task, so
//! a caller that disconnects never leaves marked accounts unexported.

use crate::core::sweep::SweepOrchestrator;
use crate::domain::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Shared state for the route handlers
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<SweepOrchestrator>,
    run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<SweepOrchestrator>) -> Self {
        Self {
            orchestrator,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sweep", get(trigger_sweep).post(trigger_sweep))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn trigger_sweep(State(state): State<AppState>) -> impl IntoResponse {
    let AppState {
        orchestrator,
        run_lock,
    } = state;

    let sweep = tokio::spawn(async move {
        let _running = run_lock.lock_owned().await;
        orchestrator.run().await
    });

    match sweep.await {
        Ok(summary) if summary.is_successful() => (StatusCode::OK, summary.message()),
        Ok(summary) => (StatusCode::INTERNAL_SERVER_ERROR, summary.message()),
        Err(join_err) => {
            tracing::error!(error = %join_err, "Sweep task did not complete");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Sweep did not complete: {join_err}"),
            )
        }
    }
}

async fn health_check() -> &'static str {
    "ok"
}

/// Serve the trigger on `addr` until `shutdown` resolves.
///
/// An in-flight sweep is allowed to finish before the server returns.
pub async fn start_server<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "HTTP trigger listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("HTTP trigger stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for oneshot()

    fn idle_state() -> AppState {
        let mut config = crate::config::SweepConfig::default();
        config.dataverse.base_url = "https://contoso.crm.dynamics.com".to_string();
        config.identity.static_token = Some(crate::config::secret_string("t".to_string()));
        config.storage.backend = crate::config::StorageBackend::Local;
        config.storage.target = std::env::temp_dir().to_string_lossy().into_owned();
        AppState::new(Arc::new(SweepOrchestrator::from_config(&config).unwrap()))
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(idle_state());

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_unknown_method_rejected() {
        let app = create_router(idle_state());

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/sweep")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
