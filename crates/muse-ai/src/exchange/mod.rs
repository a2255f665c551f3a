//! One request/response cycle against a session.

mod fragments;
mod payload;

pub use fragments::FragmentSequence;

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::attachment::Attachment;
use crate::session::{BusyGuard, Session};
use crate::{AiError, GenerativeBackend, TextStream};

/// Result of one wait on the provider stream.
enum Step {
    Fragment(String),
    Failed(AiError),
    Cancelled,
    Done,
}

/// Sends user turns and hands back lazy fragment sequences.
///
/// Streaming is never retried: a failed exchange ends its sequence with the
/// error and the caller decides what to show.
pub struct StreamingExchange {
    backend: Arc<dyn GenerativeBackend>,
}

impl StreamingExchange {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    /// Start an exchange with a fresh cancellation token.
    pub fn send(
        &self,
        session: &Arc<Session>,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<FragmentSequence, AiError> {
        self.send_with_cancel(session, text, attachments, CancellationToken::new())
    }

    /// Start an exchange that stops when `cancel` fires.
    ///
    /// Fails with [`AiError::SessionBusy`] if another exchange is running on
    /// the session. The session is marked busy until the returned sequence
    /// ends or is dropped. On successful exhaustion the user turn and the
    /// aggregated reply are appended to the session history.
    pub fn send_with_cancel(
        &self,
        session: &Arc<Session>,
        text: &str,
        attachments: &[Attachment],
        cancel: CancellationToken,
    ) -> Result<FragmentSequence, AiError> {
        let guard = BusyGuard::acquire(session)?;
        let user_turn = payload::user_turn(text, attachments);
        let backend = Arc::clone(&self.backend);
        let session = Arc::clone(session);
        let token = cancel.clone();

        let fragments = async_stream::stream! {
            let _guard = guard;
            let request = session.build_request(user_turn.clone());
            debug!(
                session = %session.id(),
                model = %session.model(),
                parts = user_turn.parts.len(),
                "Exchange started"
            );

            let opened = tokio::select! {
                biased;
                _ = token.cancelled() => Err(AiError::Cancelled),
                result = backend.stream_content(request) => result,
            };
            let mut stream: TextStream = match opened {
                Ok(stream) => stream,
                Err(e) => {
                    warn!(session = %session.id(), "Failed to open stream: {e}");
                    yield Err(e);
                    return;
                }
            };

            let mut reply = String::new();
            loop {
                let step = tokio::select! {
                    biased;
                    _ = token.cancelled() => Step::Cancelled,
                    item = stream.next() => match item {
                        Some(Ok(fragment)) => Step::Fragment(fragment),
                        Some(Err(e)) => Step::Failed(e),
                        None => Step::Done,
                    },
                };

                match step {
                    Step::Fragment(fragment) => {
                        if fragment.is_empty() {
                            continue;
                        }
                        reply.push_str(&fragment);
                        yield Ok(fragment);
                    }
                    Step::Failed(e) => {
                        warn!(session = %session.id(), received = reply.len(), "Stream failed: {e}");
                        yield Err(e);
                        return;
                    }
                    Step::Cancelled => {
                        info!(session = %session.id(), "Exchange cancelled");
                        yield Err(AiError::Cancelled);
                        return;
                    }
                    Step::Done => break,
                }
            }

            debug!(session = %session.id(), chars = reply.len(), "Exchange complete");
            session.record_turn(user_turn, reply);
        };

        Ok(FragmentSequence::new(fragments.boxed(), cancel))
    }
}
