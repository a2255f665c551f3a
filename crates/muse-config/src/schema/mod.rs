//! Configuration schema types for Muse.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the client ships with.

mod api;
mod chat;
mod media;
mod system;

pub use api::*;
pub use chat::*;
pub use media::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Muse.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct MuseConfig {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub image: ImageConfig,
    pub video: VideoConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}
