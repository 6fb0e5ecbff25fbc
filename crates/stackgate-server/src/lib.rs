//! HTTP layer for the Stackgate library-access service.
//!
//! Exposes an axum [`Router`] with the kiosk-facing scan endpoint, backed
//! by any [`AccessStore`] and [`Notifier`] pair through [`ScanEngine`].

pub mod error;
pub mod notify;
pub mod scan;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use stackgate_core::{
  notify::Notifier, scan::ScanEngine, store::AccessStore,
  timetable::BoundaryPolicy,
};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:    String,
  pub port:    u16,
  pub db_path: PathBuf,

  /// Session-window boundary handling: `half_open` or `inclusive_both`.
  #[serde(default)]
  pub boundary: BoundaryPolicy,

  /// Webhook receiving skip alerts as JSON. Absent means log-only.
  #[serde(default)]
  pub notify_url: Option<String>,

  #[serde(default = "default_notify_timeout_secs")]
  pub notify_timeout_secs: u64,
}

fn default_notify_timeout_secs() -> u64 {
  5
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, N> {
  pub engine: Arc<ScanEngine<S, N>>,
}

// Not derived: a derive would demand `S: Clone` and `N: Clone`, but only
// the Arc is cloned.
impl<S, N> Clone for AppState<S, N> {
  fn clone(&self) -> Self {
    Self {
      engine: Arc::clone(&self.engine),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the scan service.
pub fn router<S, N>(state: AppState<S, N>) -> Router
where
  S: AccessStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .route("/", get(health))
    .route("/scan", post(scan::handler::<S, N>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// `GET /` — liveness probe.
async fn health() -> Json<Value> {
  Json(json!({ "status": "ok" }))
}

// ─── Integration tests ────────────────────────────────────────────────────────
