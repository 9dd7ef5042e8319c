//! Collector service binary entrypoint.
//! Boots the Axum HTTP server that receives digests from the pipeline.

use newswire_digest::api::{create_router, AppState};
use newswire_digest::telemetry::Metrics;
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let state = AppState::from_env();
    let mut router = create_router(state);

    // Metrics are optional; a recorder clash must not take the API down.
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
