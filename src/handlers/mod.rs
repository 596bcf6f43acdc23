//! Command handler infrastructure.
//!
//! - [`registry`]: ordered, duplicate-free pattern storage
//! - [`context`]: the per-invocation [`CommandContext`]
//! - [`traits`]: the [`Handler`] sum type and the [`Command`] trait
//! - [`dispatch`]: first-match resolution and error containment

pub mod context;
pub mod dispatch;
pub mod registry;
pub mod traits;

pub use context::{CommandContext, CommandMatch, split_args};
pub use dispatch::{Dispatcher, Outcome};
pub use registry::{Pattern, Registry, anchor};
pub use traits::{Command, Handler};
