//! UI-visible chat messages.

use chrono::{DateTime, Utc};
use muse_common::MessageId;
use serde::{Deserialize, Serialize};

use crate::attachment::AttachmentDescriptor;
use crate::content::Role;

/// Lifecycle of a message.
///
/// User messages are created `Done`. Model messages start `Pending`, move
/// to `Streaming` on the first fragment and end in exactly one of `Done`,
/// `Failed` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Streaming,
    Done,
    Failed,
    Cancelled,
}

impl MessageStatus {
    pub fn is_final(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentDescriptor>,
    /// Diagnostic text of the error that failed this message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl Message {
    pub(crate) fn user(
        id: MessageId,
        content: impl Into<String>,
        attachments: Vec<AttachmentDescriptor>,
    ) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            status: MessageStatus::Done,
            created_at: Utc::now(),
            attachments,
            error_detail: None,
        }
    }

    pub(crate) fn pending_model(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Model,
            content: String::new(),
            status: MessageStatus::Pending,
            created_at: Utc::now(),
            attachments: Vec::new(),
            error_detail: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == MessageStatus::Failed
    }

    /// Still waiting for the first fragment.
    pub fn is_thinking(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}
