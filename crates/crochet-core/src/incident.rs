//! Incident — the aggregate of consecutive notifications sharing a key.
//!
//! `first` is fixed by arrival order: whichever notification is merged first
//! for a key stays `first` for the life of the incident. `last` follows the
//! greatest receipt timestamp seen so far, so a late-arriving notification
//! with an older timestamp never replaces it.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};

use crate::notification::{IncidentKey, Notification, Status};

/// An open (or just-resolved) incident.
///
/// Values handed out by a store are snapshots; mutating one has no effect on
/// the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
  key:   IncidentKey,
  first: Arc<Notification>,
  last:  Arc<Notification>,
}

impl Incident {
  /// Start a new incident from its first notification.
  pub fn open(notification: Arc<Notification>) -> Self {
    Self {
      key:   notification.key(),
      first: Arc::clone(&notification),
      last:  notification,
    }
  }

  /// Fold `notification` into the incident.
  ///
  /// Returns `true` if it became the new `last`.
  pub fn merge(&mut self, notification: Arc<Notification>) -> bool {
    debug_assert_eq!(notification.key(), self.key);
    if notification.timestamp > self.last.timestamp {
      self.last = notification;
      true
    } else {
      false
    }
  }

  pub fn key(&self) -> &IncidentKey { &self.key }

  pub fn first(&self) -> &Arc<Notification> { &self.first }

  pub fn last(&self) -> &Arc<Notification> { &self.last }

  /// Alerts carried by the latest notification.
  pub fn alerts(&self) -> &[serde_json::Value] { self.last.alerts() }

  pub fn is_resolved(&self) -> bool { self.last.status() == Status::Resolved }

  /// Duration as measured at `now`.
  ///
  /// Resolved incidents span `first` to `last`. Open incidents span `first`
  /// to `now`, saturating at zero if `now` precedes `first`.
  pub fn duration_at(&self, now: DateTime<Utc>) -> TimeDelta {
    let end = if self.is_resolved() {
      self.last.timestamp
    } else {
      now
    };
    (end - self.first.timestamp).max(TimeDelta::zero())
  }

  /// Duration as measured against the wall clock.
  pub fn duration(&self) -> TimeDelta { self.duration_at(Utc::now()) }

  /// [`Incident::duration`] in fractional seconds.
  pub fn duration_seconds(&self) -> f64 { seconds(self.duration()) }
}

/// Convert a [`TimeDelta`] to fractional seconds.
pub fn seconds(delta: TimeDelta) -> f64 {
  delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9
}

/// Result of atomically merging a notification into the incident map.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged {
  /// Snapshot of the incident after the merge.
  pub incident: Incident,
  /// Whether the merge created the incident.
  pub created:  bool,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;
  use crate::notification::WebhookPayload;

  fn at(secs: i64, status: Status) -> Arc<Notification> {
    note("r", "g", secs, status)
  }

  fn note(receiver: &str, group: &str, secs: i64, status: Status) -> Arc<Notification> {
    stamped(receiver, group, Utc.timestamp_opt(secs, 0).unwrap(), status)
  }

  fn stamped(
    receiver: &str,
    group: &str,
    ts: DateTime<Utc>,
    status: Status,
  ) -> Arc<Notification> {
    let payload = WebhookPayload {
      version:            "4".into(),
      group_key:          group.into(),
      receiver:           receiver.into(),
      status,
      alerts:             vec![serde_json::json!({ "at": ts.timestamp() })],
      group_labels:       Default::default(),
      common_labels:      Default::default(),
      common_annotations: Default::default(),
      external_url:       String::new(),
    };
    Arc::new(Notification::received(payload, "127.0.0.1:9", ts))
  }

  #[test]
  fn open_sets_first_and_last() {
    let n = at(100, Status::Firing);
    let i = Incident::open(n.clone());
    assert_eq!(i.key().as_str(), "r:g");
    assert!(Arc::ptr_eq(i.first(), &n));
    assert!(Arc::ptr_eq(i.last(), &n));
    assert!(!i.is_resolved());
  }

  #[test]
  fn open_duration_grows_from_zero() {
    let i = Incident::open(at(100, Status::Firing));
    let t = |s| Utc.timestamp_opt(s, 0).unwrap();
    assert_eq!(i.duration_at(t(100)), TimeDelta::zero());
    assert_eq!(i.duration_at(t(130)), TimeDelta::seconds(30));
    assert!(i.duration_at(t(131)) >= i.duration_at(t(130)));
  }

  #[test]
  fn open_duration_saturates_before_first() {
    let i = Incident::open(at(100, Status::Firing));
    assert_eq!(
      i.duration_at(Utc.timestamp_opt(50, 0).unwrap()),
      TimeDelta::zero()
    );
  }

  #[test]
  fn later_resolution_closes_incident() {
    let mut i = Incident::open(at(100, Status::Firing));
    assert!(i.merge(at(160, Status::Resolved)));
    assert!(i.is_resolved());
    assert_eq!(i.duration(), TimeDelta::seconds(60));
    assert_eq!(i.duration_seconds(), 60.0);
  }

  #[test]
  fn duration_seconds_keeps_sub_millisecond_precision() {
    let first = Utc.timestamp_opt(100, 250_000).unwrap();
    let last = Utc.timestamp_opt(102, 750_500).unwrap();
    let mut i = Incident::open(stamped("r", "g", first, Status::Firing));
    assert!(i.merge(stamped("r", "g", last, Status::Resolved)));
    assert!((i.duration_seconds() - 2.000_500_5).abs() < 1e-12);
  }

  #[test]
  fn seconds_of_sub_millisecond_delta_is_not_zero() {
    assert_eq!(seconds(TimeDelta::nanoseconds(400_000)), 0.0004);
    assert_eq!(seconds(TimeDelta::milliseconds(1_500)), 1.5);
  }

  #[test]
  fn older_notification_does_not_replace_last() {
    let first = at(50, Status::Resolved);
    let mut i = Incident::open(first.clone());
    assert!(!i.merge(at(30, Status::Firing)));
    assert!(Arc::ptr_eq(i.first(), &first));
    assert!(Arc::ptr_eq(i.last(), &first));
    assert!(i.is_resolved());
    assert_eq!(i.duration(), TimeDelta::zero());
  }

  #[test]
  fn equal_timestamp_keeps_existing_last() {
    let first = at(100, Status::Firing);
    let mut i = Incident::open(first.clone());
    assert!(!i.merge(at(100, Status::Resolved)));
    assert!(!i.is_resolved());
  }

  #[test]
  fn first_is_arrival_order_not_timestamp_order() {
    let early_arrival = at(200, Status::Firing);
    let mut i = Incident::open(early_arrival.clone());
    i.merge(at(150, Status::Firing));
    i.merge(at(250, Status::Firing));
    assert!(Arc::ptr_eq(i.first(), &early_arrival));
    assert_eq!(i.last().timestamp.timestamp(), 250);
  }

  #[test]
  fn last_is_max_timestamp_for_any_merge_order() {
    let orders: [[i64; 4]; 3] =
      [[10, 40, 20, 30], [40, 30, 20, 10], [20, 10, 30, 40]];
    for order in orders {
      let mut i = Incident::open(at(order[0], Status::Firing));
      let mut max = order[0];
      for &t in &order[1..] {
        i.merge(at(t, Status::Firing));
        max = max.max(t);
        assert_eq!(i.last().timestamp.timestamp(), max, "order {order:?}");
      }
      assert_eq!(i.first().timestamp.timestamp(), order[0]);
    }
  }

  #[test]
  fn alerts_come_from_last() {
    let mut i = Incident::open(at(100, Status::Firing));
    i.merge(at(120, Status::Firing));
    assert_eq!(i.alerts()[0]["at"], 120);
  }

  #[test]
  fn key_ignores_status() {
    let a = note("r", "g", 1, Status::Firing);
    let b = note("r", "g", 2, Status::Resolved);
    let c = note("r", "h", 3, Status::Firing);
    assert_eq!(a.key(), b.key());
    assert_ne!(a.key(), c.key());
  }
}
