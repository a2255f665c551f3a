//! Attachments and how they travel to the model.
//!
//! Binary kinds (image, video, document) are sent as inline base64 parts.
//! Text kinds (plain text, archive-extracted text) are merged into the
//! prompt. The kind alone decides the path.

mod ingest;

pub use ingest::{
    classify, extract_archive_text, ingest_bytes, ingest_file, MAX_ARCHIVE_MEMBERS, MAX_MEMBER_BYTES,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttachmentKind {
    Image,
    Video,
    Document,
    ArchiveText,
    PlainText,
}

impl AttachmentKind {
    /// Whether attachments of this kind are transmitted as inline binary
    /// parts rather than merged into the prompt.
    pub fn is_inline(self) -> bool {
        matches!(self, Self::Image | Self::Video | Self::Document)
    }
}

/// A named payload ready for transmission.
///
/// For inline kinds `content` is base64 (optionally with a data-URI
/// prefix); for text kinds it is the decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub kind: AttachmentKind,
    content: String,
}

/// The single transmission path chosen for an attachment.
#[derive(Debug, PartialEq, Eq)]
pub enum Transmission<'a> {
    Inline { mime_type: &'a str, data: &'a str },
    Prompt { text: &'a str },
}

impl Attachment {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        kind: AttachmentKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            kind,
            content: content.into(),
        }
    }

    pub fn transmission(&self) -> Transmission<'_> {
        if self.kind.is_inline() {
            Transmission::Inline {
                mime_type: &self.mime_type,
                data: strip_data_uri(&self.content),
            }
        } else {
            Transmission::Prompt {
                text: &self.content,
            }
        }
    }

    pub fn descriptor(&self) -> AttachmentDescriptor {
        AttachmentDescriptor {
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            kind: self.kind,
        }
    }
}

/// What a UI message keeps about an attachment (no payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    pub name: String,
    pub mime_type: String,
    pub kind: AttachmentKind,
}

/// Strip a `data:<mime>;base64,` prefix, leaving bare base64.
pub fn strip_data_uri(data: &str) -> &str {
    match data.strip_prefix("data:") {
        Some(rest) => rest.split_once(',').map(|(_, b64)| b64).unwrap_or(data),
        None => data,
    }
}

/// Merge the text-kind attachments into the prompt and return the prompt
/// together with the remaining inline attachments, order preserved.
pub fn merge_text_attachments(text: &str, attachments: Vec<Attachment>) -> (String, Vec<Attachment>) {
    let mut prompt = text.to_string();
    let mut inline = Vec::new();

    for attachment in attachments {
        if attachment.kind.is_inline() {
            inline.push(attachment);
            continue;
        }
        if !prompt.is_empty() {
            prompt.push_str("\n\n");
        }
        prompt.push_str(&format!(
            "[Attached file: {}]\n{}",
            attachment.name, attachment.content
        ));
    }

    (prompt, inline)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_decide_transmission_path() {
        assert!(AttachmentKind::Image.is_inline());
        assert!(AttachmentKind::Video.is_inline());
        assert!(AttachmentKind::Document.is_inline());
        assert!(!AttachmentKind::PlainText.is_inline());
        assert!(!AttachmentKind::ArchiveText.is_inline());
    }

    #[test]
    fn strips_data_uri_prefix() {
        assert_eq!(strip_data_uri("data:image/png;base64,iVBORw0"), "iVBORw0");
        assert_eq!(strip_data_uri("iVBORw0"), "iVBORw0");
        assert_eq!(strip_data_uri("data:broken"), "data:broken");
    }

    #[test]
    fn inline_transmission_uses_stripped_data() {
        let a = Attachment::new(
            "cat.png",
            "image/png",
            AttachmentKind::Image,
            "data:image/png;base64,AAAA",
        );
        assert_eq!(
            a.transmission(),
            Transmission::Inline {
                mime_type: "image/png",
                data: "AAAA"
            }
        );
    }

    #[test]
    fn text_transmission_never_goes_inline() {
        let a = Attachment::new("notes.txt", "text/plain", AttachmentKind::PlainText, "data:,x");
        assert_eq!(a.transmission(), Transmission::Prompt { text: "data:,x" });
    }

    #[test]
    fn merge_appends_text_and_keeps_inline_order() {
        let attachments = vec![
            Attachment::new("a.png", "image/png", AttachmentKind::Image, "AAA"),
            Attachment::new("notes.md", "text/markdown", AttachmentKind::PlainText, "# Notes"),
            Attachment::new("b.pdf", "application/pdf", AttachmentKind::Document, "BBB"),
        ];

        let (prompt, inline) = merge_text_attachments("summarize", attachments);

        assert_eq!(prompt, "summarize\n\n[Attached file: notes.md]\n# Notes");
        let names: Vec<_> = inline.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.pdf"]);
    }

    #[test]
    fn merge_with_empty_prompt_has_no_leading_blank_line() {
        let attachments = vec![Attachment::new(
            "x.txt",
            "text/plain",
            AttachmentKind::PlainText,
            "body",
        )];
        let (prompt, inline) = merge_text_attachments("", attachments);
        assert_eq!(prompt, "[Attached file: x.txt]\nbody");
        assert!(inline.is_empty());
    }
}
