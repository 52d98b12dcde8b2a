//! JSON REST API for crochet.
//!
//! Exposes an axum [`Router`] backed by any [`AlertStore`]: the Alertmanager
//! webhook receiver, read-only listings, Prometheus metrics, and optionally
//! the static files of the web UI. Transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! axum::serve(listener, crochet_api::router(state, Some("assets".into())))
//! ```

pub mod error;
pub mod incidents;
pub mod metrics;
pub mod notifications;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use crochet_core::store::AlertStore;
use tower_http::services::ServeDir;

pub use error::ApiError;
pub use metrics::Metrics;

/// Shared state threaded through all handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:   Arc<S>,
  pub metrics: Arc<Metrics>,
}

impl<S> AppState<S> {
  pub fn new(store: S) -> Self {
    Self {
      store:   Arc::new(store),
      metrics: Arc::new(Metrics::new()),
    }
  }
}

/// Build the `/api` router.
///
/// Request latencies on these routes are recorded in the metrics registry.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: AlertStore + Clone + 'static,
{
  let notifications =
    get(notifications::list::<S>).post(notifications::create::<S>);
  let incidents = get(incidents::list::<S>);

  Router::new()
    .route("/notifications", notifications.clone())
    .route("/notifications/", notifications)
    .route("/incidents", incidents.clone())
    .route("/incidents/", incidents)
    .route_layer(middleware::from_fn_with_state(
      Arc::clone(&state.metrics),
      metrics::track_http,
    ))
    .with_state(state)
}

/// Build the full application router: `/api/*` plus `/metrics`.
///
/// When `assets_dir` is set, every other path is served from that directory
/// (`/` maps to its `index.html`).
pub fn router<S>(state: AppState<S>, assets_dir: Option<PathBuf>) -> Router<()>
where
  S: AlertStore + Clone + 'static,
{
  let metrics = Router::new()
    .route("/metrics", get(metrics::handler))
    .with_state(Arc::clone(&state.metrics));

  let app = Router::new()
    .nest("/api", api_router(state))
    .merge(metrics);

  match assets_dir {
    Some(dir) => app.fallback_service(ServeDir::new(dir)),
    None => app,
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────
