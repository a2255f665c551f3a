//! Terminal output and file naming.

use std::io::Write;

use muse_ai::{Message, MessageStatus, Role};

/// Prints a model reply incrementally from message snapshots.
#[derive(Debug, Default)]
pub struct ReplyPrinter {
    printed: usize,
}

impl ReplyPrinter {
    pub fn update(&mut self, msg: &Message) {
        if msg.role != Role::Model {
            return;
        }
        let mut stdout = std::io::stdout();
        match msg.status {
            MessageStatus::Pending => {}
            MessageStatus::Streaming | MessageStatus::Done => {
                if let Some(delta) = msg.content.get(self.printed..) {
                    let _ = write!(stdout, "{delta}");
                    self.printed = msg.content.len();
                }
                if msg.status == MessageStatus::Done {
                    let _ = writeln!(stdout);
                }
                let _ = stdout.flush();
            }
            MessageStatus::Failed => {
                if self.printed > 0 {
                    let _ = writeln!(stdout);
                }
                eprintln!("{}", msg.content);
            }
            MessageStatus::Cancelled => {
                let _ = writeln!(stdout, "\n[cancelled]");
            }
        }
    }
}

/// File extension for a generated image MIME type.
pub fn image_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

pub fn image_file_name(stamp: &str, index: usize, mime_type: &str) -> String {
    format!("muse-{stamp}-{}.{}", index + 1, image_extension(mime_type))
}
