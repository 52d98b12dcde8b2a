//! Handler for `GET /incidents/`.

use axum::{Json, extract::State};
use chrono::Utc;
use crochet_core::{incident::seconds, notification::IncidentKey, store::AlertStore};
use serde::Serialize;

use crate::{AppState, error::ApiError};

/// One open incident as served to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentSummary {
  pub key:              IncidentKey,
  pub duration_seconds: f64,
  /// Alerts from the latest notification, passed through as received.
  pub alerts:           Vec<serde_json::Value>,
}

/// `GET /incidents/` — open incidents sorted by key.
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<IncidentSummary>>, ApiError>
where
  S: AlertStore + Clone + 'static,
{
  let incidents = state
    .store
    .list_incidents()
    .await
    .map_err(ApiError::store)?;

  // Measure every open incident against the same instant.
  let now = Utc::now();
  let summaries = incidents
    .into_iter()
    .map(|i| IncidentSummary {
      duration_seconds: seconds(i.duration_at(now)),
      alerts:           i.alerts().to_vec(),
      key:              i.key().clone(),
    })
    .collect();
  Ok(Json(summaries))
}
