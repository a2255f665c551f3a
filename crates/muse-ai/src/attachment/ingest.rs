//! File ingestion: classify raw files and turn them into attachments.

use std::io::{Cursor, Read};
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use muse_common::MuseError;
use tracing::{debug, warn};

use super::{Attachment, AttachmentKind};

/// At most this many text members of an archive are concatenated.
pub const MAX_ARCHIVE_MEMBERS: usize = 50;

/// Archive members that decompress past this many bytes are skipped.
pub const MAX_MEMBER_BYTES: u64 = 1024 * 1024;

const ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "csv", "tsv", "json", "xml", "yaml", "yml", "toml", "ini", "cfg",
    "log", "html", "htm", "css", "scss", "js", "jsx", "ts", "tsx", "mjs", "py", "rb", "rs", "go",
    "java", "kt", "swift", "c", "h", "cpp", "hpp", "cc", "cs", "php", "sh", "bash", "zsh", "sql",
    "vue", "svelte", "lua", "r", "dart", "scala", "gradle", "dockerfile", "env", "gitignore",
];

const TEXT_MIME_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-yaml",
    "application/toml",
    "application/x-sh",
];

/// Classify a file by MIME type (when known) and extension.
///
/// Zip archives classify as [`AttachmentKind::ArchiveText`]: they are
/// expanded into text on ingestion. Returns `None` for unsupported files.
pub fn classify(name: &str, mime_type: Option<&str>) -> Option<AttachmentKind> {
    let ext = extension(name);
    let mime = effective_mime(name, mime_type);

    if ARCHIVE_EXTENSIONS.contains(&ext.as_str())
        || matches!(
            mime.as_deref(),
            Some("application/zip" | "application/x-zip-compressed")
        )
    {
        return Some(AttachmentKind::ArchiveText);
    }

    // Extension guesses misfire on source files (".ts" guesses video/mp2t).
    let declared = mime_type.is_some_and(|m| !m.is_empty() && m != "application/octet-stream");
    if !declared && TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Some(AttachmentKind::PlainText);
    }

    if let Some(ref mime) = mime {
        if mime.starts_with("image/") {
            return Some(AttachmentKind::Image);
        }
        if mime.starts_with("video/") {
            return Some(AttachmentKind::Video);
        }
        if mime == "application/pdf" {
            return Some(AttachmentKind::Document);
        }
    }

    let text_mime = mime
        .as_deref()
        .is_some_and(|m| m.starts_with("text/") || TEXT_MIME_TYPES.contains(&m));
    if TEXT_EXTENSIONS.contains(&ext.as_str()) || text_mime {
        return Some(AttachmentKind::PlainText);
    }

    None
}

/// Build an attachment from raw file bytes.
pub fn ingest_bytes(name: &str, mime_type: Option<&str>, bytes: &[u8]) -> Result<Attachment, MuseError> {
    let kind = classify(name, mime_type)
        .ok_or_else(|| MuseError::Attachment(format!("unsupported file type: {name}")))?;

    let attachment = match kind {
        AttachmentKind::ArchiveText => extract_archive_text(name, bytes)?,
        AttachmentKind::PlainText => Attachment::new(
            name,
            effective_mime(name, mime_type)
                .filter(|m| m.starts_with("text/") || TEXT_MIME_TYPES.contains(&m.as_str()))
                .unwrap_or_else(|| "text/plain".to_string()),
            kind,
            String::from_utf8_lossy(bytes),
        ),
        _ => Attachment::new(
            name,
            effective_mime(name, mime_type).unwrap_or_else(|| "application/octet-stream".into()),
            kind,
            BASE64_STANDARD.encode(bytes),
        ),
    };

    debug!(name, kind = ?attachment.kind, size = bytes.len(), "Attachment ingested");
    Ok(attachment)
}

/// Read a file from disk and ingest it.
pub async fn ingest_file(path: &Path) -> Result<Attachment, MuseError> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    ingest_bytes(&name, None, &bytes)
}

/// Expand a zip archive into one synthetic text attachment.
///
/// Text-like members are concatenated in archive order, each preceded by a
/// path marker. Hidden files, `__MACOSX` metadata, and non-text members are
/// skipped; at most [`MAX_ARCHIVE_MEMBERS`] members are included.
pub fn extract_archive_text(name: &str, bytes: &[u8]) -> Result<Attachment, MuseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| MuseError::Attachment(format!("failed to open archive {name}: {e}")))?;

    let mut text = String::new();
    let mut included = 0usize;

    for index in 0..archive.len() {
        if included == MAX_ARCHIVE_MEMBERS {
            debug!(name, limit = MAX_ARCHIVE_MEMBERS, "Archive member limit reached");
            break;
        }

        let mut member = match archive.by_index(index) {
            Ok(member) => member,
            Err(e) => {
                warn!(name, index, "Skipping unreadable archive member: {e}");
                continue;
            }
        };
        if member.is_dir() {
            continue;
        }

        let path = member.name().to_string();
        if is_hidden_member(&path) || classify(&path, None) != Some(AttachmentKind::PlainText) {
            continue;
        }

        if member.size() > MAX_MEMBER_BYTES {
            warn!(name, member = %path, size = member.size(), "Skipping oversized archive member");
            continue;
        }

        // The declared size can lie; never read past the cap.
        let mut raw = Vec::new();
        if let Err(e) = member.by_ref().take(MAX_MEMBER_BYTES + 1).read_to_end(&mut raw) {
            warn!(name, member = %path, "Skipping archive member: {e}");
            continue;
        }
        if raw.len() as u64 > MAX_MEMBER_BYTES {
            warn!(name, member = %path, "Skipping oversized archive member");
            continue;
        }

        text.push_str(&format!(
            "--- File: {path} ---\n{}\n\n",
            String::from_utf8_lossy(&raw)
        ));
        included += 1;
    }

    if included == 0 {
        return Err(MuseError::Attachment(format!(
            "archive {name} contains no readable text files"
        )));
    }

    Ok(Attachment::new(
        name,
        "text/plain",
        AttachmentKind::ArchiveText,
        text.trim_end(),
    ))
}

fn extension(name: &str) -> String {
    let file = name.rsplit('/').next().unwrap_or(name);
    match file.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => file.to_ascii_lowercase(),
    }
}

fn effective_mime(name: &str, mime_type: Option<&str>) -> Option<String> {
    match mime_type {
        Some(m) if !m.is_empty() && m != "application/octet-stream" => Some(m.to_ascii_lowercase()),
        _ => mime_guess::from_path(name)
            .first()
            .map(|m| m.essence_str().to_string()),
    }
}

fn is_hidden_member(path: &str) -> bool {
    path.starts_with("__MACOSX/") || path.split('/').any(|segment| segment.starts_with('.'))
}
