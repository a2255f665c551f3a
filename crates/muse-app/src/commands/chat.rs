//! `muse chat`: one-shot or interactive streaming chat.

use std::future::Future;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use muse_ai::attachment::ingest_file;
use muse_ai::{AiError, Attachment, ChatService, GeminiClient};
use muse_common::{LaneId, ModelVariant, MuseError};
use muse_config::MuseConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::{info, warn};

use super::cancel_on_ctrl_c;
use super::output::ReplyPrinter;

pub struct ChatOptions {
    pub lane: LaneId,
    pub model: ModelVariant,
    pub system: Option<String>,
    pub attachments: Vec<PathBuf>,
}

pub async fn run(
    client: Arc<GeminiClient>,
    config: &MuseConfig,
    mut options: ChatOptions,
    prompt: Option<String>,
) -> Result<(), MuseError> {
    let mut service = ChatService::new(client, &config.chat);
    let attachments = load_attachments(&options.attachments).await?;

    match prompt {
        Some(text) => send(&mut service, &options, &text, attachments).await,
        None => repl(&mut service, &mut options, attachments).await,
    }
}

async fn load_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>, MuseError> {
    let mut attachments = Vec::with_capacity(paths.len());
    for path in paths {
        let attachment = ingest_file(path).await?;
        info!(name = %attachment.name, kind = ?attachment.kind, "Attached file");
        attachments.push(attachment);
    }
    Ok(attachments)
}

async fn send(
    service: &mut ChatService,
    options: &ChatOptions,
    text: &str,
    attachments: Vec<Attachment>,
) -> Result<(), MuseError> {
    let (cancel, watcher) = cancel_on_ctrl_c();
    let mut printer = ReplyPrinter::default();

    let result = service
        .send(
            &options.lane,
            options.model,
            options.system.as_deref(),
            text,
            attachments,
            cancel,
            |msg| printer.update(msg),
        )
        .await;
    watcher.abort();

    match result {
        Ok(_) | Err(AiError::Cancelled) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn repl(
    service: &mut ChatService,
    options: &mut ChatOptions,
    mut attachments: Vec<Attachment>,
) -> Result<(), MuseError> {
    println!(
        "muse chat ({}, lane {}). /model <tier>, /clear, /quit",
        options.model, options.lane
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        // Each exchange installs a Ctrl-C handler, which replaces the
        // default SIGINT exit for the rest of the process.
        let Some(line) = next_input(&mut lines, interrupted()).await? else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            ("/quit" | "/exit", _) => break,
            ("/clear", _) => {
                service.clear_lane(&options.lane);
                println!("[cleared]");
            }
            ("/model", name) => match name.trim().parse::<ModelVariant>() {
                Ok(model) => {
                    options.model = model;
                    match service.switch_model(&options.lane, model, options.system.as_deref()) {
                        Ok(_) => println!("[model: {model}]"),
                        Err(e) => eprintln!("{}", e.user_message()),
                    }
                }
                Err(e) => eprintln!("{e}"),
            },
            _ => {
                let pending = std::mem::take(&mut attachments);
                if let Err(e) = send(service, options, line, pending).await {
                    warn!("Exchange failed: {e}");
                }
            }
        }
    }

    Ok(())
}

/// Next input line, or `None` on EOF or once `interrupt` resolves.
async fn next_input<R, I>(lines: &mut Lines<R>, interrupt: I) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = ()>,
{
    tokio::select! {
        line = lines.next_line() => line,
        () = interrupt => Ok(None),
    }
}

async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_lines_until_eof() {
        let mut lines = BufReader::new(&b"hello\n"[..]).lines();
        let pending = std::future::pending::<()>;

        assert_eq!(
            next_input(&mut lines, pending()).await.unwrap().as_deref(),
            Some("hello")
        );
        assert_eq!(next_input(&mut lines, pending()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn interrupt_ends_a_waiting_prompt() {
        // The writer half stays open, so the read never completes.
        let (_writer, reader) = tokio::io::duplex(64);
        let mut lines = BufReader::new(reader).lines();

        let line = next_input(&mut lines, std::future::ready(())).await.unwrap();
        assert_eq!(line, None);
    }
}
