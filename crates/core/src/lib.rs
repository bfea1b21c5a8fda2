//! Core types and utilities for remotesync
//!
//! This is the foundation crate (Layer 0) that all other remotesync crates depend on.
//! It provides:
//! - Base error types
//! - Sync event and execution context types
//! - The collaborator traits the scheduler is written against
//!   (`PathMatcher`, `CommandRunner`)
//!
//! This crate has no dependencies on other remotesync crates.

pub mod error;
pub mod event;
pub mod traits;

pub use error::{Error, Result};
pub use event::{CommandOutput, EventType, ExecContext};
pub use traits::{CommandRunner, PathMatcher};
