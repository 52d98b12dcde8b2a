//! Actor-backed implementation of the crochet [`AlertStore`].
//!
//! A single tokio task owns the notification log and the incident map. Every
//! store operation is a message on that task's queue, so state is never
//! shared and never locked.
//!
//! [`AlertStore`]: crochet_core::store::AlertStore

mod state;
mod store;

pub use crochet_core::{Error, Result};
pub use store::ActorStore;
