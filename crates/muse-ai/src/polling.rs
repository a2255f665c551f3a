//! Bounded polling of long-running operations.

use std::future::Future;
use std::time::Duration;

use muse_config::schema::VideoConfig;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::AiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&VideoConfig::default())
    }
}

impl From<&VideoConfig> for PollPolicy {
    fn from(config: &VideoConfig) -> Self {
        Self {
            interval: Duration::from_secs(u64::from(config.poll_interval_secs)),
            max_polls: config.max_polls,
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_polls: u32) -> Self {
        Self {
            interval,
            max_polls,
        }
    }

    /// Sleep one interval, then poll, until `poll` yields a value.
    ///
    /// `poll` returns `Ok(None)` while the operation is still running. Poll
    /// errors propagate immediately. After `max_polls` unfinished polls the
    /// result is [`AiError::Timeout`]; a fired `cancel` token ends the wait
    /// with [`AiError::Cancelled`].
    pub async fn run<F, Fut, T>(
        &self,
        cancel: Option<&CancellationToken>,
        mut poll: F,
    ) -> Result<T, AiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, AiError>>,
    {
        for count in 1..=self.max_polls {
            match cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => return Err(AiError::Cancelled),
                        _ = tokio::time::sleep(self.interval) => {}
                    }
                }
                None => tokio::time::sleep(self.interval).await,
            }

            if let Some(value) = poll().await? {
                debug!(polls = count, "Operation finished");
                return Ok(value);
            }
            debug!(poll = count, max_polls = self.max_polls, "Operation still running");
        }

        Err(AiError::Timeout(format!(
            "operation not finished after {} polls",
            self.max_polls
        )))
    }
}
