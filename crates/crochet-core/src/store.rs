//! The `AlertStore` trait.
//!
//! The trait is implemented by the actor-backed store in
//! `crochet-store-actor`. The HTTP layer depends on this abstraction, not on
//! the concrete actor.

use std::{future::Future, sync::Arc};

use crate::{
  incident::{Incident, Merged},
  notification::{IncidentKey, Notification},
};

/// Abstraction over the notification log and incident map.
///
/// Every operation is applied in a single global order. Operations submitted
/// by one caller run in submission order.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait AlertStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Notification log ──────────────────────────────────────────────────

  /// Enqueue `notification` for appending to the log and return without
  /// waiting for it to be applied.
  fn append_notification(
    &self,
    notification: Arc<Notification>,
  ) -> Result<(), Self::Error>;

  /// All notifications ever received, in append order.
  fn list_notifications(
    &self,
  ) -> impl Future<Output = Result<Vec<Arc<Notification>>, Self::Error>> + Send + '_;

  // ── Incidents ─────────────────────────────────────────────────────────

  /// The open incident for `key`, if any.
  fn get_incident(
    &self,
    key: IncidentKey,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + '_;

  /// Get or create the incident for the notification's key and merge the
  /// notification into it, as one step.
  ///
  /// [`Merged::created`] is `true` for exactly one caller per incident.
  fn merge_notification(
    &self,
    notification: Arc<Notification>,
  ) -> impl Future<Output = Result<Merged, Self::Error>> + Send + '_;

  /// Remove the incident for `key`, returning it if it was present.
  fn delete_incident(
    &self,
    key: IncidentKey,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + '_;

  /// Remove `observed`'s incident only if nothing newer has been merged into
  /// it since it was observed, i.e. its `last` is still `observed.last()`.
  ///
  /// Returns the removed incident, or `None` if it was absent or has moved
  /// on (for example re-opened by a later firing notification).
  fn delete_resolved_incident(
    &self,
    observed: Incident,
  ) -> impl Future<Output = Result<Option<Incident>, Self::Error>> + Send + '_;

  /// All open incidents, ordered by ascending key.
  fn list_incidents(
    &self,
  ) -> impl Future<Output = Result<Vec<Incident>, Self::Error>> + Send + '_;
}
