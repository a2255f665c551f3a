//! Google Gemini API backend.
//!
//! Implements [`GenerativeBackend`](crate::GenerativeBackend) over the
//! Generative Language REST API: SSE chat streaming, Imagen image
//! prediction, and Veo long-running video operations.

mod api;
mod client;
mod config;
mod wire;

pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use wire::classify_error;
