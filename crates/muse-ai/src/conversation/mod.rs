//! UI-side conversation state.
//!
//! A lane's [`Conversation`] holds what the user sees. It never mirrors the
//! provider-side history kept by the session.

mod lane;
mod message;
mod service;

pub use lane::{Conversation, FailurePolicy};
pub use message::{Message, MessageStatus};
pub use service::ChatService;
