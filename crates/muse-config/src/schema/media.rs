//! Image and video generation settings.

use serde::{Deserialize, Serialize};

/// One-shot image generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub model: String,
    /// One of "1:1", "3:4", "4:3", "9:16", "16:9".
    pub aspect_ratio: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            model: "imagen-4.0-generate-001".into(),
            aspect_ratio: "1:1".into(),
        }
    }
}

/// Long-running video generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub model: String,
    /// "16:9" or "9:16".
    pub aspect_ratio: String,
    /// Seconds between operation status polls (valid range: 1-60).
    pub poll_interval_secs: u32,
    /// Give up after this many polls (valid range: 1-720).
    pub max_polls: u32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            model: "veo-3.0-generate-001".into(),
            aspect_ratio: "16:9".into(),
            poll_interval_secs: 5,
            max_polls: 60,
        }
    }
}

/// Quota-exhaustion retry policy for one-shot calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Additional attempts after the first (valid range: 0-10).
    pub max_retries: u32,
    /// Delay unit in milliseconds; retry `n` waits `n * base_delay_ms`
    /// (valid range: 0-60000).
    pub base_delay_ms: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 2000,
        }
    }
}
