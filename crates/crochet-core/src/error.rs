//! Error types for `crochet-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The store actor has stopped accepting work.
  #[error("store is stopped")]
  Stopped,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
