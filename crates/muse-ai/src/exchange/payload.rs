//! Builds the user turn for one exchange.

use tracing::warn;

use crate::attachment::{Attachment, Transmission};
use crate::content::{Content, Part};

/// Inline parts for binary attachments in their original order, followed by
/// a single text part. Text-kind attachments are skipped: they belong in the
/// prompt text (see [`crate::attachment::merge_text_attachments`]).
pub(crate) fn user_turn(text: &str, attachments: &[Attachment]) -> Content {
    let mut parts = Vec::with_capacity(attachments.len() + 1);

    for attachment in attachments {
        match attachment.transmission() {
            Transmission::Inline { mime_type, data } => parts.push(Part::inline(mime_type, data)),
            Transmission::Prompt { .. } => {
                warn!(
                    name = %attachment.name,
                    kind = ?attachment.kind,
                    "Text attachment passed to send; merge it into the prompt instead"
                );
            }
        }
    }

    parts.push(Part::text(text));
    Content::user(parts)
}
