//! Conversation session management.
//!
//! A [`Session`] is the provider-side conversational context of one lane:
//! model variant, system instruction, and the turn history the provider
//! needs on every request. [`SessionRegistry`] owns one session per lane
//! and replaces it when the model or instruction changes.

mod manager;
mod registry;
mod types;

pub use manager::Session;
pub use registry::SessionRegistry;
pub use types::SessionSpec;

pub(crate) use types::BusyGuard;
