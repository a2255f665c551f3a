//! Per-lane message buffer and fragment reconciliation.

use futures_util::StreamExt;
use muse_common::{LaneId, MessageId, MessageIdGen};
use tracing::{debug, warn};

use crate::attachment::AttachmentDescriptor;
use crate::exchange::FragmentSequence;
use crate::AiError;

use super::message::{Message, MessageStatus};

/// What happens to already-received text when an exchange fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Replace the content with the failure notice.
    #[default]
    DiscardPartial,
    /// Keep the partial text and append the failure notice.
    PreservePartial,
}

impl FailurePolicy {
    pub fn from_preserve_flag(preserve_partial: bool) -> Self {
        if preserve_partial {
            Self::PreservePartial
        } else {
            Self::DiscardPartial
        }
    }
}

/// Ordered messages of one lane.
///
/// Only the task driving the lane's exchange mutates it. Fragments are
/// applied in arrival order; finalized messages never change again.
#[derive(Debug)]
pub struct Conversation {
    lane: LaneId,
    ids: MessageIdGen,
    messages: Vec<Message>,
    policy: FailurePolicy,
}

impl Conversation {
    pub fn new(lane: LaneId) -> Self {
        Self {
            lane,
            ids: MessageIdGen::new(),
            messages: Vec::new(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn lane(&self) -> &LaneId {
        &self.lane
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|m| m.id == id)
    }

    pub fn push_user(&mut self, text: impl Into<String>, attachments: Vec<AttachmentDescriptor>) -> MessageId {
        let id = self.ids.next();
        self.messages.push(Message::user(id, text, attachments));
        id
    }

    /// Append an empty model message in `Pending` state.
    pub fn begin_model_message(&mut self) -> MessageId {
        let id = self.ids.next();
        self.messages.push(Message::pending_model(id));
        id
    }

    /// Append a fragment to an unfinalized message. Returns `false` if the
    /// message is unknown or already final.
    pub fn apply_fragment(&mut self, id: MessageId, fragment: &str) -> bool {
        match self.get_mut(id) {
            Some(msg) if !msg.status.is_final() => {
                msg.content.push_str(fragment);
                msg.status = MessageStatus::Streaming;
                true
            }
            _ => false,
        }
    }

    /// Mark a message done. Idempotent: finalizing twice has no further
    /// effect and returns `false`.
    pub fn finalize(&mut self, id: MessageId) -> bool {
        match self.get_mut(id) {
            Some(msg) if !msg.status.is_final() => {
                msg.status = MessageStatus::Done;
                true
            }
            _ => false,
        }
    }

    /// Mark a message failed and replace its content per the failure policy.
    pub fn fail(&mut self, id: MessageId, error: &AiError) -> bool {
        let policy = self.policy;
        match self.get_mut(id) {
            Some(msg) if !msg.status.is_final() => {
                let notice = error.user_message();
                msg.content = match policy {
                    FailurePolicy::PreservePartial if !msg.content.is_empty() => {
                        format!("{}\n\n{notice}", msg.content)
                    }
                    _ => notice.to_string(),
                };
                msg.status = MessageStatus::Failed;
                msg.error_detail = Some(error.to_string());
                true
            }
            _ => false,
        }
    }

    /// Mark a message cancelled. Text received so far is kept.
    pub fn cancel(&mut self, id: MessageId) -> bool {
        match self.get_mut(id) {
            Some(msg) if !msg.status.is_final() => {
                msg.status = MessageStatus::Cancelled;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drive `sequence` into a new model message, calling `on_update` after
    /// every state change.
    ///
    /// Returns the message id on success. On failure or cancellation the
    /// message is finalized accordingly before the error is returned.
    pub async fn run_exchange<F>(
        &mut self,
        mut sequence: FragmentSequence,
        mut on_update: F,
    ) -> Result<MessageId, AiError>
    where
        F: FnMut(&Message),
    {
        let id = self.begin_model_message();
        self.publish(id, &mut on_update);

        while let Some(item) = sequence.next().await {
            if sequence.is_cancelled() {
                return Err(self.end_cancelled(id, &mut on_update));
            }
            match item {
                Ok(fragment) => {
                    self.apply_fragment(id, &fragment);
                    self.publish(id, &mut on_update);
                }
                Err(AiError::Cancelled) => return Err(self.end_cancelled(id, &mut on_update)),
                Err(e) => {
                    warn!(lane = %self.lane, message = %id, "Exchange failed: {e}");
                    self.fail(id, &e);
                    self.publish(id, &mut on_update);
                    return Err(e);
                }
            }
        }

        self.finalize(id);
        debug!(lane = %self.lane, message = %id, "Model message finalized");
        self.publish(id, &mut on_update);
        Ok(id)
    }

    fn end_cancelled<F: FnMut(&Message)>(&mut self, id: MessageId, on_update: &mut F) -> AiError {
        self.cancel(id);
        self.publish(id, on_update);
        AiError::Cancelled
    }

    fn publish<F: FnMut(&Message)>(&self, id: MessageId, on_update: &mut F) {
        if let Some(msg) = self.get(id) {
            on_update(msg);
        }
    }
}
