//! Core types and trait definitions for the crochet incident store.
//!
//! This crate is deliberately free of HTTP and runtime dependencies.
//! All other crates depend on it.

pub mod error;
pub mod incident;
pub mod notification;
pub mod store;

pub use error::{Error, Result};
