//! HTTP routes for ID generation.
//!
//! | route | generator |
//! |---|---|
//! | `GET /api/id/snowflake` | local [`SnowflakeGenerator`](uniqueid::SnowflakeGenerator) |
//! | `GET /api/id/redis/{key_prefix}` | [`SharedCounterGenerator`] |
//! | `GET /health` | none, always `SERVING` |
//!
//! Every answer is wrapped in an [`ApiResponse`]. Failures go through
//! [`ApiError`].

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use uniqueid::{CounterStore, Poll, SharedCounterGenerator, SnowflakeId};

use crate::server::{
    config::Generator,
    service::{
        error::{ApiError, handle_panic},
        response::ApiResponse,
    },
    telemetry::increment_ids_generated,
};

/// Shared state handed to every request.
///
/// `shared` is `None` when the shared-counter strategy is turned off; the route
/// stays mounted and answers with [`ApiError::Disabled`].
pub struct AppState<S> {
    snowflake: Arc<Generator>,
    shared: Option<Arc<SharedCounterGenerator<S>>>,
}

impl<S> AppState<S> {
    pub fn new(snowflake: Generator, shared: Option<SharedCounterGenerator<S>>) -> Self {
        Self {
            snowflake: Arc::new(snowflake),
            shared: shared.map(Arc::new),
        }
    }
}

// Derived `Clone` would needlessly require `S: Clone`.
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            snowflake: Arc::clone(&self.snowflake),
            shared: self.shared.clone(),
        }
    }
}

/// Builds the service router, including access logging and panic recovery.
pub fn router<S>(state: AppState<S>) -> Router
where
    S: CounterStore + 'static,
{
    Router::new()
        .route("/api/id/snowflake", get(snowflake_id::<S>))
        .route("/api/id/redis/{key_prefix}", get(shared_id::<S>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

async fn snowflake_id<S>(
    State(state): State<AppState<S>>,
) -> Result<ApiResponse<u64>, ApiError> {
    let id = next_snowflake(&state.snowflake).await?;
    increment_ids_generated("snowflake");
    Ok(ApiResponse::success(id.to_raw()))
}

async fn shared_id<S>(
    State(state): State<AppState<S>>,
    Path(key_prefix): Path<String>,
) -> Result<ApiResponse<u64>, ApiError>
where
    S: CounterStore,
{
    let generator = state.shared.as_ref().ok_or(ApiError::Disabled)?;
    let id = generator.generate(&key_prefix).await?;
    increment_ids_generated("redis");
    Ok(ApiResponse::success(id))
}

async fn health() -> ApiResponse<&'static str> {
    ApiResponse::success("SERVING")
}

/// Polls the local generator, sleeping on the runtime timer instead of
/// spinning a worker thread while it is pending.
async fn next_snowflake(generator: &Generator) -> uniqueid::Result<SnowflakeId> {
    loop {
        match generator.try_poll_id()? {
            Poll::Ready { id } => break Ok(id),
            Poll::Pending { yield_for } => {
                tokio::time::sleep(Duration::from_millis(yield_for)).await;
            }
        }
    }
}
