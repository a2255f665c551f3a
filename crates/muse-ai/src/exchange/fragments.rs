//! The lazy fragment sequence handed back by an exchange.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{BoxStream, FusedStream, Fuse, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::AiError;

/// Ordered, finite, non-restartable sequence of non-empty text fragments.
///
/// Nothing is sent to the provider until the first poll. A terminal `Err`
/// item ends the sequence; polling after the end always yields `None`.
/// Dropping the sequence drops the in-flight response.
pub struct FragmentSequence {
    inner: Fuse<BoxStream<'static, Result<String, AiError>>>,
    cancel: CancellationToken,
}

impl FragmentSequence {
    pub(crate) fn new(
        inner: BoxStream<'static, Result<String, AiError>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: inner.fuse(),
            cancel,
        }
    }

    /// Stop the exchange. The next poll yields [`AiError::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Drain the sequence into the full reply text.
    pub async fn collect_text(mut self) -> Result<String, AiError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for FragmentSequence {
    type Item = Result<String, AiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl FusedStream for FragmentSequence {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

impl std::fmt::Debug for FragmentSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentSequence")
            .field("terminated", &self.inner.is_terminated())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
