use std::path::PathBuf;

use clap::{Parser, Subcommand};
use muse_common::ModelVariant;

/// Muse: streaming Gemini chat, image and video generation from the terminal.
#[derive(Parser, Debug)]
#[command(name = "muse", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter override (e.g. debug, muse=trace).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chat with a model. Without a prompt, starts an interactive session.
    Chat {
        /// Conversation lane ("chat" or "code" have built-in instructions).
        #[arg(long, default_value = "chat")]
        lane: String,

        /// Model tier or id (flash, flash-lite, pro). Defaults to config.
        #[arg(short, long)]
        model: Option<ModelVariant>,

        /// System instruction override.
        #[arg(short, long)]
        system: Option<String>,

        /// Files to attach (images, video, PDF, text, zip).
        #[arg(short, long = "attach")]
        attachments: Vec<PathBuf>,

        /// Message to send.
        prompt: Option<String>,
    },

    /// Generate images.
    Image {
        prompt: String,

        /// Number of images.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,

        /// Output directory.
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Generate a video, optionally from a starting image.
    Video {
        prompt: String,

        /// Starting frame.
        #[arg(long)]
        image: Option<PathBuf>,

        /// Output file.
        #[arg(short, long, default_value = "muse-video.mp4")]
        out: PathBuf,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
