//! Full configuration validation.
//!
//! Validates numeric ranges and enumerated string values, collecting
//! every problem into a single `ConfigError`.

mod helpers;


use crate::schema::MuseConfig;
use muse_common::ConfigError;

use helpers::{validate_one_of, validate_range};

const IMAGE_ASPECT_RATIOS: &[&str] = &["1:1", "3:4", "4:3", "9:16", "16:9"];
const VIDEO_ASPECT_RATIOS: &[&str] = &["16:9", "9:16"];

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &MuseConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_api(&mut errors, config);
    validate_media(&mut errors, config);
    validate_retry(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_api(errors: &mut Vec<String>, config: &MuseConfig) {
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://") {
        errors.push(format!(
            "api.base_url = {:?} must be an http(s) URL",
            config.api.base_url
        ));
    }
    if config.api.api_key_env.trim().is_empty() {
        errors.push("api.api_key_env must not be empty".into());
    }
    validate_range(
        errors,
        "api.connect_timeout_secs",
        config.api.connect_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "api.request_timeout_secs",
        config.api.request_timeout_secs,
        10,
        3600,
    );
}

fn validate_media(errors: &mut Vec<String>, config: &MuseConfig) {
    validate_one_of(
        errors,
        "image.aspect_ratio",
        &config.image.aspect_ratio,
        IMAGE_ASPECT_RATIOS,
    );
    validate_one_of(
        errors,
        "video.aspect_ratio",
        &config.video.aspect_ratio,
        VIDEO_ASPECT_RATIOS,
    );
    validate_range(
        errors,
        "video.poll_interval_secs",
        config.video.poll_interval_secs,
        1,
        60,
    );
    validate_range(errors, "video.max_polls", config.video.max_polls, 1, 720);
}

fn validate_retry(errors: &mut Vec<String>, config: &MuseConfig) {
    validate_range(errors, "retry.max_retries", config.retry.max_retries, 0, 10);
    validate_range(
        errors,
        "retry.base_delay_ms",
        config.retry.base_delay_ms,
        0,
        60_000,
    );
}
