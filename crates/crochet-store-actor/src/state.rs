//! The state owned by the store actor and the commands that operate on it.

use std::{collections::BTreeMap, sync::Arc};

use crochet_core::{
  incident::{Incident, Merged},
  notification::{IncidentKey, Notification},
};
use tokio::sync::oneshot;

/// A message on the actor's queue. Commands with a `reply` are answered
/// once they have been applied.
pub(crate) enum Command {
  Append(Arc<Notification>),
  ListNotifications {
    reply: oneshot::Sender<Vec<Arc<Notification>>>,
  },
  Get {
    key:   IncidentKey,
    reply: oneshot::Sender<Option<Incident>>,
  },
  Merge {
    notification: Arc<Notification>,
    reply:        oneshot::Sender<Merged>,
  },
  Delete {
    key:   IncidentKey,
    reply: oneshot::Sender<Option<Incident>>,
  },
  DeleteResolved {
    observed: Incident,
    reply:    oneshot::Sender<Option<Incident>>,
  },
  ListIncidents {
    reply: oneshot::Sender<Vec<Incident>>,
  },
}

/// Notification log plus open incidents, keyed and ordered by
/// [`IncidentKey`].
#[derive(Debug, Default)]
pub(crate) struct State {
  notifications: Vec<Arc<Notification>>,
  incidents:     BTreeMap<IncidentKey, Incident>,
}

impl State {
  /// Apply one command. A dropped reply receiver means the caller gave up
  /// waiting; the command still takes effect.
  pub(crate) fn apply(&mut self, command: Command) {
    match command {
      Command::Append(n) => self.notifications.push(n),
      Command::ListNotifications { reply } => {
        let _ = reply.send(self.notifications.clone());
      }
      Command::Get { key, reply } => {
        let _ = reply.send(self.incidents.get(&key).cloned());
      }
      Command::Merge {
        notification,
        reply,
      } => {
        let _ = reply.send(self.merge(notification));
      }
      Command::Delete { key, reply } => {
        let _ = reply.send(self.incidents.remove(&key));
      }
      Command::DeleteResolved { observed, reply } => {
        let _ = reply.send(self.delete_resolved(&observed));
      }
      Command::ListIncidents { reply } => {
        let _ = reply.send(self.incidents.values().cloned().collect());
      }
    }
  }

  fn merge(&mut self, notification: Arc<Notification>) -> Merged {
    let key = notification.key();
    match self.incidents.get_mut(&key) {
      Some(incident) => {
        incident.merge(notification);
        Merged {
          incident: incident.clone(),
          created:  false,
        }
      }
      None => {
        tracing::debug!(%key, "opening incident");
        let incident = Incident::open(notification);
        self.incidents.insert(key, incident.clone());
        Merged {
          incident,
          created: true,
        }
      }
    }
  }

  fn delete_resolved(&mut self, observed: &Incident) -> Option<Incident> {
    let unchanged = self
      .incidents
      .get(observed.key())
      .is_some_and(|current| Arc::ptr_eq(current.last(), observed.last()));
    if unchanged {
      self.incidents.remove(observed.key())
    } else {
      tracing::debug!(key = %observed.key(), "incident moved on, keeping it");
      None
    }
  }

  pub(crate) fn incident_count(&self) -> usize { self.incidents.len() }

  pub(crate) fn notification_count(&self) -> usize { self.notifications.len() }
}
