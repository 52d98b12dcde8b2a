//! Handlers for `/notifications` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications/` | Every notification received, in arrival order |
//! | `POST` | `/notifications/` | Alertmanager webhook body; `Content-Type: application/json` |

use std::{net::SocketAddr, sync::Arc};

use axum::{
  Json,
  extract::{ConnectInfo, Request, State},
  http::{HeaderMap, StatusCode, header},
};
use chrono::Utc;
use crochet_core::{
  incident::Merged,
  notification::{Notification, WebhookPayload},
  store::AlertStore,
};

use crate::{AppState, error::ApiError};

/// Upper bound on an accepted webhook body.
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /notifications/`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Arc<Notification>>>, ApiError>
where
  S: AlertStore + Clone + 'static,
{
  let notifications = state
    .store
    .list_notifications()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(notifications))
}

// ─── Receive ──────────────────────────────────────────────────────────────────

/// `POST /notifications/` — record a webhook notification and fold it into
/// its incident.
///
/// A resolved incident is removed as soon as it is observed, and its final
/// duration recorded.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  request: Request,
) -> Result<StatusCode, ApiError>
where
  S: AlertStore + Clone + 'static,
{
  check_content_type(request.headers())?;

  let remote_address = request
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.to_string())
    .unwrap_or_default();

  let body = axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES)
    .await
    .map_err(|e| ApiError::BadRequest(format!("failed to read body: {e}")))?;
  let payload: WebhookPayload = serde_json::from_slice(&body).map_err(|e| {
    tracing::warn!(error = %e, %remote_address, "failed to decode payload");
    ApiError::BadRequest(format!("failed to decode payload: {e}"))
  })?;

  let notification =
    Arc::new(Notification::received(payload, remote_address, Utc::now()));
  state
    .store
    .append_notification(Arc::clone(&notification))
    .map_err(ApiError::store)?;

  let Merged { incident, created } = state
    .store
    .merge_notification(notification)
    .await
    .map_err(ApiError::store)?;

  if created {
    tracing::info!(key = %incident.key(), "incident opened");
    state.metrics.record_incident_created();
  }
  if !incident.is_resolved() {
    return Ok(StatusCode::OK);
  }

  // Only the caller that actually removes the incident reports it, and only
  // if no newer notification re-opened it in the meantime.
  if let Some(resolved) = state
    .store
    .delete_resolved_incident(incident)
    .await
    .map_err(ApiError::store)?
  {
    let seconds = resolved.duration_seconds();
    tracing::info!(key = %resolved.key(), duration_seconds = seconds, "incident resolved");
    state.metrics.record_incident_resolved(seconds);
  }

  Ok(StatusCode::OK)
}

fn check_content_type(headers: &HeaderMap) -> Result<(), ApiError> {
  let value = headers
    .get(header::CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  let essence = value.split(';').next().unwrap_or_default().trim();
  if essence.eq_ignore_ascii_case("application/json") {
    Ok(())
  } else {
    tracing::warn!(content_type = value, "invalid content type");
    Err(ApiError::UnsupportedContentType(value.to_owned()))
  }
}
