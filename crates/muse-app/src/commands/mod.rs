//! Subcommand handlers.

mod chat;
mod media;
mod output;

use std::sync::Arc;

use muse_ai::GeminiClient;
use muse_common::MuseError;
use muse_config::MuseConfig;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::cli::Command;

/// Token that fires on Ctrl-C. Abort the handle once the work is done.
fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let token = CancellationToken::new();
    let trigger = token.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    (token, watcher)
}

pub async fn run(command: Command, config: &MuseConfig, client: Arc<GeminiClient>) -> Result<(), MuseError> {
    match command {
        Command::Chat {
            lane,
            model,
            system,
            attachments,
            prompt,
        } => {
            let options = chat::ChatOptions {
                lane: muse_common::LaneId::new(lane),
                model: model.unwrap_or(config.chat.default_model),
                system,
                attachments,
            };
            chat::run(client, config, options, prompt).await
        }
        Command::Image { prompt, count, out } => {
            media::image(client, config, &prompt, count, &out).await
        }
        Command::Video { prompt, image, out } => {
            media::video(client, config, &prompt, image.as_deref(), &out).await
        }
    }
}
