//! Session types and concurrency guards.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use muse_common::ModelVariant;

use crate::AiError;

use super::manager::Session;

/// What a session is bound to. Two sessions with equal specs behave the
/// same for new conversations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub model: ModelVariant,
    pub system_instruction: String,
}

impl SessionSpec {
    pub fn new(model: ModelVariant, system_instruction: impl Into<String>) -> Self {
        Self {
            model,
            system_instruction: system_instruction.into(),
        }
    }
}

/// Guard that clears the session's `busy` flag on drop, so the flag is
/// released even when a fragment sequence is abandoned mid-stream.
pub(crate) struct BusyGuard {
    session: Arc<Session>,
}

impl BusyGuard {
    /// Attempt to acquire the busy flag. Returns `SessionBusy` if another
    /// exchange holds it.
    pub(crate) fn acquire(session: &Arc<Session>) -> Result<Self, AiError> {
        if session
            .busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(AiError::SessionBusy);
        }
        Ok(Self {
            session: Arc::clone(session),
        })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.session.busy.store(false, Ordering::Release);
    }
}
