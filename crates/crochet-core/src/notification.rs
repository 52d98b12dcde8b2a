//! Notification — one alert-group update received from Alertmanager.
//!
//! A notification is immutable once received. It carries the decoded webhook
//! payload untouched, plus the receipt metadata assigned by the server.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Status ──────────────────────────────────────────────────────────────────

/// The state of an alert group as reported by Alertmanager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Firing,
  Resolved,
}

// ─── Wire payload ────────────────────────────────────────────────────────────

/// The body of an Alertmanager webhook request.
///
/// `alerts` is kept as raw JSON so that every field Alertmanager sends is
/// passed back out unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
  #[serde(default)]
  pub version:            String,
  pub group_key:          String,
  pub receiver:           String,
  pub status:             Status,
  pub alerts:             Vec<serde_json::Value>,
  #[serde(default)]
  pub group_labels:       BTreeMap<String, String>,
  #[serde(default)]
  pub common_labels:      BTreeMap<String, String>,
  #[serde(default)]
  pub common_annotations: BTreeMap<String, String>,
  #[serde(default, rename = "externalURL")]
  pub external_url:       String,
}

// ─── Notification ────────────────────────────────────────────────────────────

/// A received webhook payload together with its receipt metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  #[serde(flatten)]
  pub payload:        WebhookPayload,
  /// Peer address of the sender. Diagnostic only.
  pub remote_address: String,
  /// When the notification was received. Never taken from the payload.
  pub timestamp:      DateTime<Utc>,
}

impl Notification {
  pub fn received(
    payload: WebhookPayload,
    remote_address: impl Into<String>,
    timestamp: DateTime<Utc>,
  ) -> Self {
    Self {
      payload,
      remote_address: remote_address.into(),
      timestamp,
    }
  }

  pub fn receiver(&self) -> &str { &self.payload.receiver }

  pub fn group_key(&self) -> &str { &self.payload.group_key }

  pub fn status(&self) -> Status { self.payload.status }

  pub fn alerts(&self) -> &[serde_json::Value] { &self.payload.alerts }

  /// The identity under which this notification aggregates into an incident.
  pub fn key(&self) -> IncidentKey {
    IncidentKey::new(self.receiver(), self.group_key())
  }
}

// ─── Key ─────────────────────────────────────────────────────────────────────

/// `receiver:groupKey`. Ordered lexicographically, which is the order
/// incidents are listed in.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct IncidentKey(String);

impl IncidentKey {
  pub fn new(receiver: &str, group_key: &str) -> Self {
    Self(format!("{receiver}:{group_key}"))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for IncidentKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for IncidentKey {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn decodes_alertmanager_payload() {
    let body = json!({
      "version": "4",
      "groupKey": "{}:{alertname=\"HighLatency\"}",
      "receiver": "team-x",
      "status": "firing",
      "alerts": [{ "status": "firing", "labels": { "alertname": "HighLatency" }, "fingerprint": "abc" }],
      "groupLabels": { "alertname": "HighLatency" },
      "commonLabels": {},
      "commonAnnotations": {},
      "externalURL": "http://alertmanager:9093"
    });
    let payload: WebhookPayload = serde_json::from_value(body).unwrap();
    assert_eq!(payload.receiver, "team-x");
    assert_eq!(payload.status, Status::Firing);
    assert_eq!(payload.external_url, "http://alertmanager:9093");
    // Unknown alert fields survive.
    assert_eq!(payload.alerts[0]["fingerprint"], "abc");
  }

  #[test]
  fn optional_fields_default_to_empty() {
    let body = json!({
      "groupKey": "g",
      "receiver": "r",
      "status": "resolved",
      "alerts": []
    });
    let payload: WebhookPayload = serde_json::from_value(body).unwrap();
    assert!(payload.version.is_empty());
    assert!(payload.group_labels.is_empty());
    assert_eq!(payload.status, Status::Resolved);
  }

  #[test]
  fn unknown_status_is_rejected() {
    let body = json!({
      "groupKey": "g",
      "receiver": "r",
      "status": "pending",
      "alerts": []
    });
    assert!(serde_json::from_value::<WebhookPayload>(body).is_err());
  }

  #[test]
  fn key_joins_receiver_and_group_key() {
    let payload: WebhookPayload = serde_json::from_value(json!({
      "groupKey": "{}:{alertname=\"A\"}",
      "receiver": "ops",
      "status": "firing",
      "alerts": []
    }))
    .unwrap();
    let n = Notification::received(payload, "10.0.0.1:5000", Utc::now());
    assert_eq!(n.key().as_str(), "ops:{}:{alertname=\"A\"}");
  }

  #[test]
  fn notification_serializes_flat_with_receipt_metadata() {
    let payload: WebhookPayload = serde_json::from_value(json!({
      "groupKey": "g",
      "receiver": "r",
      "status": "firing",
      "alerts": []
    }))
    .unwrap();
    let n = Notification::received(payload, "127.0.0.1:1234", Utc::now());
    let v = serde_json::to_value(&n).unwrap();
    assert_eq!(v["receiver"], "r");
    assert_eq!(v["groupKey"], "g");
    assert_eq!(v["remoteAddress"], "127.0.0.1:1234");
    assert!(v["timestamp"].is_string());
  }
}
