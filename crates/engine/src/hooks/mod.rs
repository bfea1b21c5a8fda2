//! Lifecycle hooks
//!
//! Hooks run before and after the initial sync, around every file operation,
//! and once on exit.
//!
//! ## Module Organization
//!
//! - `context`: Per-invocation [`HookContext`]
//! - `substitute`: `${name}` placeholder expansion for declarative commands
//! - `scripted`: Code hooks and the [`HookUtils`] they receive
//! - `loader`: Hook script discovery from `.remotesync/hooks`
//! - `executor`: Resolution and execution ([`HookPipeline`])

pub mod context;
pub mod executor;
pub mod loader;
pub mod scripted;
pub mod substitute;

pub use context::{BaseContext, HookContext, file_context};
pub use executor::{HookPipeline, HookPipelineBuilder, ResolvedHook};
pub use loader::{HookLoader, ScriptFileHook};
pub use scripted::{FnHook, HookUtils, ScriptedHook, ScriptedHooks};
pub use substitute::{Variables, substitute};
