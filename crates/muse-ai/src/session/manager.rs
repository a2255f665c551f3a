//! Session handle and its provider-side turn history.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use muse_common::{ModelVariant, SessionId};
use tracing::{debug, warn};

use crate::content::{ChatRequest, Content};

use super::types::SessionSpec;

/// A provider-side conversational context.
///
/// Handles are immutable in model and instruction: changing either means
/// creating a new session through the registry. The turn history only grows
/// when an exchange completes successfully.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    spec: SessionSpec,
    /// Completed turns, oldest first.
    history: Mutex<Vec<Content>>,
    /// Whether an exchange is currently running on this session.
    pub(super) busy: AtomicBool,
}

impl Session {
    pub(crate) fn new(spec: SessionSpec) -> Self {
        Self {
            id: SessionId::new(),
            spec,
            history: Mutex::new(Vec::new()),
            busy: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    pub fn model(&self) -> ModelVariant {
        self.spec.model
    }

    pub fn system_instruction(&self) -> &str {
        &self.spec.system_instruction
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Number of completed turns (user and model) recorded so far.
    pub fn turn_count(&self) -> usize {
        self.history().len()
    }

    /// The history lock. A panic while it was held leaves the turns
    /// themselves intact, so poisoning is recovered rather than dropped.
    fn history(&self) -> MutexGuard<'_, Vec<Content>> {
        self.history.lock().unwrap_or_else(|poisoned| {
            warn!(session = %self.id, "Session history lock was poisoned; recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Build the request for a new user turn on top of the recorded history.
    pub(crate) fn build_request(&self, user_turn: Content) -> ChatRequest {
        let mut contents = self.history().to_vec();
        contents.push(user_turn);
        ChatRequest {
            model: self.spec.model,
            system_instruction: self.spec.system_instruction.clone(),
            contents,
        }
    }

    /// Record a completed exchange.
    pub(crate) fn record_turn(&self, user_turn: Content, reply: String) {
        let mut history = self.history();
        history.push(user_turn);
        history.push(Content::model(reply));
        debug!(session = %self.id, turns = history.len(), "Session history updated");
    }
}
