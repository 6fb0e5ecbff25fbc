//! Handler for `POST /scan` — the kiosk-facing scan endpoint.

use axum::{Json, extract::State};
use chrono::Local;
use serde::{Deserialize, Serialize};
use stackgate_core::{
  event::{Action, ScanStatus},
  member::Role,
  notify::Notifier,
  scan::{DenialReason, ScanOutcome},
  store::AccessStore,
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ScanBody {
  /// Raw badge text exactly as read; normalisation happens server-side.
  pub identifier: String,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
  pub granted: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role:    Option<Role>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub action:  Option<Action>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:  Option<ScanStatus>,
  pub message: String,
}

/// `POST /scan` — body: `{"identifier":"s101"}`
///
/// The scan timestamp is taken once here, so resolution, matching, and the
/// recorded event all see the same instant.
pub async fn handler<S, N>(
  State(state): State<AppState<S, N>>,
  Json(body): Json<ScanBody>,
) -> Result<Json<ScanResponse>, ApiError>
where
  S: AccessStore + 'static,
  N: Notifier + 'static,
{
  let now = Local::now().naive_local();
  let outcome = state
    .engine
    .process_scan(&body.identifier, now)
    .await
    .map_err(|e| ApiError::Unavailable(Box::new(e)))?;

  match outcome {
    ScanOutcome::Denied(DenialReason::InvalidIdentifier) => {
      Err(ApiError::BadRequest(
        DenialReason::InvalidIdentifier.message().to_string(),
      ))
    }
    ScanOutcome::Denied(DenialReason::UnknownMember) => Err(ApiError::Forbidden(
      DenialReason::UnknownMember.message().to_string(),
    )),
    ScanOutcome::Granted {
      role,
      action,
      status,
      message,
    } => Ok(Json(ScanResponse {
      granted: true,
      role: Some(role),
      action: Some(action),
      status: Some(status),
      message,
    })),
  }
}
