//! [`ActorStore`] — the actor implementation of [`AlertStore`].

use std::sync::Arc;

use crochet_core::{
  incident::{Incident, Merged},
  notification::{IncidentKey, Notification},
  store::AlertStore,
  Error, Result,
};
use tokio::{
  sync::{mpsc, oneshot},
  task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::state::{Command, State};

// ─── Handle ──────────────────────────────────────────────────────────────────

/// A handle to the store actor.
///
/// Cloning is cheap — every clone feeds the same queue.
#[derive(Clone, Debug)]
pub struct ActorStore {
  tx: mpsc::UnboundedSender<Command>,
}

impl ActorStore {
  /// Spawn the actor task on the current tokio runtime.
  ///
  /// The actor runs until `stop` is cancelled or every handle is dropped.
  /// On stop it refuses new commands, answers everything already queued,
  /// and only then exits; awaiting the returned [`JoinHandle`] waits for
  /// that drain to finish.
  pub fn spawn(stop: CancellationToken) -> (Self, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(rx, stop));
    (Self { tx }, task)
  }

  fn submit(&self, command: Command) -> Result<()> {
    self.tx.send(command).map_err(|_| Error::Stopped)
  }

  /// Submit a command and wait for the actor's answer.
  async fn request<T>(
    &self,
    command: impl FnOnce(oneshot::Sender<T>) -> Command,
  ) -> Result<T> {
    let (reply, answer) = oneshot::channel();
    self.submit(command(reply))?;
    answer.await.map_err(|_| Error::Stopped)
  }
}

// ─── Actor loop ──────────────────────────────────────────────────────────────

async fn run(mut rx: mpsc::UnboundedReceiver<Command>, stop: CancellationToken) {
  let mut state = State::default();
  tracing::debug!("store actor started");

  loop {
    tokio::select! {
      biased;
      () = stop.cancelled() => break,
      command = rx.recv() => match command {
        Some(command) => state.apply(command),
        // Every handle is gone; nothing can be queued anymore.
        None => {
          tracing::debug!("store handles dropped, stopping actor");
          return;
        }
      },
    }
  }

  // Refuse new submissions, then answer what was already accepted.
  rx.close();
  let mut drained = 0usize;
  while let Some(command) = rx.recv().await {
    state.apply(command);
    drained += 1;
  }

  tracing::info!(
    drained,
    notifications = state.notification_count(),
    open_incidents = state.incident_count(),
    "store actor stopped",
  );
}

// ─── AlertStore impl ─────────────────────────────────────────────────────────

impl AlertStore for ActorStore {
  type Error = Error;

  fn append_notification(&self, notification: Arc<Notification>) -> Result<()> {
    self.submit(Command::Append(notification))
  }

  async fn list_notifications(&self) -> Result<Vec<Arc<Notification>>> {
    self
      .request(|reply| Command::ListNotifications { reply })
      .await
  }

  async fn get_incident(&self, key: IncidentKey) -> Result<Option<Incident>> {
    self.request(|reply| Command::Get { key, reply }).await
  }

  async fn merge_notification(
    &self,
    notification: Arc<Notification>,
  ) -> Result<Merged> {
    self
      .request(|reply| Command::Merge {
        notification,
        reply,
      })
      .await
  }

  async fn delete_incident(&self, key: IncidentKey) -> Result<Option<Incident>> {
    self.request(|reply| Command::Delete { key, reply }).await
  }

  async fn delete_resolved_incident(
    &self,
    observed: Incident,
  ) -> Result<Option<Incident>> {
    self
      .request(|reply| Command::DeleteResolved { observed, reply })
      .await
  }

  async fn list_incidents(&self) -> Result<Vec<Incident>> {
    self.request(|reply| Command::ListIncidents { reply }).await
  }
}
