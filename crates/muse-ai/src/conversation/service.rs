//! Lane-aware chat front end: sessions, exchanges and message buffers.

use std::collections::HashMap;
use std::sync::Arc;

use muse_common::{LaneId, MessageId, ModelVariant};
use muse_config::schema::ChatConfig;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::attachment::{merge_text_attachments, Attachment, AttachmentDescriptor};
use crate::exchange::StreamingExchange;
use crate::session::{Session, SessionRegistry};
use crate::{AiError, GenerativeBackend};

use super::lane::{Conversation, FailurePolicy};
use super::message::Message;

/// Ties the session registry, the exchange and per-lane conversations
/// together. Each lane has at most one session and one message buffer.
pub struct ChatService {
    registry: SessionRegistry,
    exchange: StreamingExchange,
    lanes: HashMap<LaneId, Conversation>,
    lane_instructions: HashMap<LaneId, String>,
    policy: FailurePolicy,
}

impl ChatService {
    pub fn new(backend: Arc<dyn GenerativeBackend>, config: &ChatConfig) -> Self {
        let mut lane_instructions = HashMap::new();
        lane_instructions.insert(LaneId::code(), config.code_system_instruction.clone());

        Self {
            registry: SessionRegistry::new(
                Arc::clone(&backend),
                config.default_system_instruction.clone(),
            ),
            exchange: StreamingExchange::new(backend),
            lanes: HashMap::new(),
            lane_instructions,
            policy: FailurePolicy::from_preserve_flag(config.preserve_partial_on_failure),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn conversation(&self, lane: &LaneId) -> Option<&Conversation> {
        self.lanes.get(lane)
    }

    /// Send a message on `lane` and stream the reply into its buffer.
    ///
    /// Text attachments are merged into the prompt; binary ones travel
    /// inline. `system_instruction` falls back to the lane's default. Any
    /// error (including a missing credential) leaves a failed model message
    /// in the lane and is also returned.
    #[allow(clippy::too_many_arguments)]
    pub async fn send<F>(
        &mut self,
        lane: &LaneId,
        model: ModelVariant,
        system_instruction: Option<&str>,
        text: &str,
        attachments: Vec<Attachment>,
        cancel: CancellationToken,
        mut on_update: F,
    ) -> Result<MessageId, AiError>
    where
        F: FnMut(&Message),
    {
        let descriptors: Vec<AttachmentDescriptor> =
            attachments.iter().map(Attachment::descriptor).collect();
        let (prompt, inline) = merge_text_attachments(text, attachments);

        let instruction = system_instruction
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.lane_instructions.get(lane).map(String::as_str));
        let opened = self.registry.open(lane, model, instruction);

        let policy = self.policy;
        let conversation = self
            .lanes
            .entry(lane.clone())
            .or_insert_with(|| Conversation::new(lane.clone()).with_policy(policy));

        let user_id = conversation.push_user(text, descriptors);
        if let Some(msg) = conversation.get(user_id) {
            on_update(msg);
        }

        let sequence = opened.and_then(|session| {
            self.exchange
                .send_with_cancel(&session, &prompt, &inline, cancel)
        });

        match sequence {
            Ok(sequence) => conversation.run_exchange(sequence, on_update).await,
            Err(e) => {
                let id = conversation.begin_model_message();
                conversation.fail(id, &e);
                if let Some(msg) = conversation.get(id) {
                    on_update(msg);
                }
                Err(e)
            }
        }
    }

    /// Replace the lane's session with one bound to `model`. Prior turns
    /// are not carried over; the lane's visible messages stay.
    pub fn switch_model(
        &mut self,
        lane: &LaneId,
        model: ModelVariant,
        system_instruction: Option<&str>,
    ) -> Result<Arc<Session>, AiError> {
        let instruction = system_instruction
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.lane_instructions.get(lane).map(String::as_str));
        self.registry.refresh(lane, model, instruction)
    }

    /// Forget the lane's messages and close its session.
    pub fn clear_lane(&mut self, lane: &LaneId) {
        if let Some(conversation) = self.lanes.get_mut(lane) {
            conversation.clear();
        }
        self.registry.close(lane);
        info!(lane = %lane, "Lane cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::AttachmentKind;
    use crate::content::{Part, Role};
    use crate::conversation::MessageStatus;
    use crate::testing::{FakeBackend, StreamScript};
    use crate::{FAILURE_MESSAGE, NOT_CONFIGURED_MESSAGE};

    fn service(backend: &Arc<FakeBackend>) -> ChatService {
        ChatService::new(backend.clone(), &ChatConfig::default())
    }

    #[tokio::test]
    async fn hello_with_image_yields_final_model_message() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::fragments(&["Hi", " there"]));
        let mut chat = service(&backend);
        let lane = LaneId::chat();
        let image = Attachment::new("cat.png", "image/png", AttachmentKind::Image, "AAAA");

        let mut snapshots = Vec::new();
        let id = chat
            .send(
                &lane,
                ModelVariant::Flash,
                None,
                "hello",
                vec![image],
                CancellationToken::new(),
                |m| snapshots.push((m.content.clone(), m.status)),
            )
            .await
            .unwrap();

        let conv = chat.conversation(&lane).unwrap();
        assert_eq!(conv.len(), 2);
        let user = &conv.messages()[0];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");
        assert_eq!(user.attachments[0].name, "cat.png");

        let reply = conv.get(id).unwrap();
        assert_eq!(reply.role, Role::Model);
        assert_eq!(reply.content, "Hi there");
        assert_eq!(reply.status, MessageStatus::Done);

        assert_eq!(
            snapshots,
            vec![
                ("hello".to_string(), MessageStatus::Done),
                (String::new(), MessageStatus::Pending),
                ("Hi".to_string(), MessageStatus::Streaming),
                ("Hi there".to_string(), MessageStatus::Streaming),
                ("Hi there".to_string(), MessageStatus::Done),
            ]
        );
    }

    #[tokio::test]
    async fn text_attachments_are_merged_into_prompt() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::fragments(&["ok"]));
        let mut chat = service(&backend);
        let notes = Attachment::new("notes.txt", "text/plain", AttachmentKind::PlainText, "todo");

        chat.send(
            &LaneId::chat(),
            ModelVariant::Flash,
            None,
            "summarize",
            vec![notes],
            CancellationToken::new(),
            |_| {},
        )
        .await
        .unwrap();

        let requests = backend.chat_requests();
        assert_eq!(
            requests[0].contents[0].parts,
            vec![Part::text("summarize\n\n[Attached file: notes.txt]\ntodo")]
        );
        let user = &chat.conversation(&LaneId::chat()).unwrap().messages()[0];
        assert_eq!(user.content, "summarize");
    }

    #[tokio::test]
    async fn failure_after_fragments_marks_message_failed() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::Items(vec![
            Ok("Hi".into()),
            Ok(" th".into()),
            Err(AiError::Transport("reset".into())),
        ]));
        let mut chat = service(&backend);
        let lane = LaneId::chat();

        let err = chat
            .send(&lane, ModelVariant::Flash, None, "hello", Vec::new(), CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert_eq!(err, AiError::Transport("reset".into()));
        let reply = chat.conversation(&lane).unwrap().messages().last().unwrap();
        assert!(reply.is_error());
        assert_eq!(reply.content, FAILURE_MESSAGE);
        let session = chat.registry().get(&lane).unwrap();
        assert_eq!(session.turn_count(), 0);
    }

    #[tokio::test]
    async fn preserve_partial_is_opt_in_via_config() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::Items(vec![
            Ok("partial".into()),
            Err(AiError::Transport("reset".into())),
        ]));
        let config = ChatConfig {
            preserve_partial_on_failure: true,
            ..ChatConfig::default()
        };
        let mut chat = ChatService::new(backend.clone(), &config);

        let _ = chat
            .send(&LaneId::chat(), ModelVariant::Flash, None, "hi", Vec::new(), CancellationToken::new(), |_| {})
            .await;

        let reply = chat.conversation(&LaneId::chat()).unwrap().messages().last().unwrap();
        assert_eq!(reply.content, format!("partial\n\n{FAILURE_MESSAGE}"));
    }

    #[tokio::test]
    async fn missing_credential_yields_failed_message() {
        let backend = Arc::new(FakeBackend::unconfigured());
        let mut chat = service(&backend);
        let lane = LaneId::chat();

        let err = chat
            .send(&lane, ModelVariant::Flash, None, "hi", Vec::new(), CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::Configuration(_)));
        let reply = chat.conversation(&lane).unwrap().messages().last().unwrap();
        assert_eq!(reply.status, MessageStatus::Failed);
        assert_eq!(reply.content, NOT_CONFIGURED_MESSAGE);
        assert!(backend.chat_requests().is_empty());
    }

    #[tokio::test]
    async fn cancelled_exchange_keeps_text_and_status() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::ItemsThenHang(vec![Ok("partial".into())]));
        let mut chat = service(&backend);
        let lane = LaneId::chat();
        let token = CancellationToken::new();
        let trigger = token.clone();

        let err = chat
            .send(&lane, ModelVariant::Flash, None, "hi", Vec::new(), token, move |m| {
                if m.content == "partial" {
                    trigger.cancel();
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err, AiError::Cancelled);
        let reply = chat.conversation(&lane).unwrap().messages().last().unwrap();
        assert_eq!(reply.status, MessageStatus::Cancelled);
        assert_eq!(reply.content, "partial");
    }

    #[tokio::test]
    async fn lanes_use_their_own_sessions_and_instructions() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::fragments(&["a"]));
        backend.push_stream(StreamScript::fragments(&["b"]));
        let config = ChatConfig::default();
        let mut chat = ChatService::new(backend.clone(), &config);

        chat.send(&LaneId::chat(), ModelVariant::Flash, None, "x", Vec::new(), CancellationToken::new(), |_| {})
            .await
            .unwrap();
        chat.send(&LaneId::code(), ModelVariant::Pro, None, "y", Vec::new(), CancellationToken::new(), |_| {})
            .await
            .unwrap();

        let requests = backend.chat_requests();
        assert_eq!(requests[0].system_instruction, config.default_system_instruction);
        assert_eq!(requests[1].system_instruction, config.code_system_instruction);
        assert_eq!(requests[1].model, ModelVariant::Pro);
        assert_eq!(chat.conversation(&LaneId::chat()).unwrap().len(), 2);
        assert_eq!(chat.conversation(&LaneId::code()).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_send_reuses_session_history() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::fragments(&["first"]));
        backend.push_stream(StreamScript::fragments(&["second"]));
        let mut chat = service(&backend);
        let lane = LaneId::chat();

        for text in ["one", "two"] {
            chat.send(&lane, ModelVariant::Flash, None, text, Vec::new(), CancellationToken::new(), |_| {})
                .await
                .unwrap();
        }

        assert_eq!(backend.sessions_established(), 1);
        assert_eq!(backend.chat_requests()[1].contents.len(), 3);
    }

    #[tokio::test]
    async fn switch_model_starts_fresh_session_but_keeps_messages() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::fragments(&["first"]));
        backend.push_stream(StreamScript::fragments(&["second"]));
        let mut chat = service(&backend);
        let lane = LaneId::chat();

        chat.send(&lane, ModelVariant::Flash, None, "one", Vec::new(), CancellationToken::new(), |_| {})
            .await
            .unwrap();
        let session = chat.switch_model(&lane, ModelVariant::Pro, None).unwrap();
        assert_eq!(session.model(), ModelVariant::Pro);

        chat.send(&lane, ModelVariant::Pro, None, "two", Vec::new(), CancellationToken::new(), |_| {})
            .await
            .unwrap();

        assert_eq!(backend.sessions_established(), 2);
        assert_eq!(backend.chat_requests()[1].contents.len(), 1);
        assert_eq!(chat.conversation(&lane).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn clear_lane_drops_messages_and_session() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_stream(StreamScript::fragments(&["reply"]));
        let mut chat = service(&backend);
        let lane = LaneId::code();

        chat.send(&lane, ModelVariant::Flash, None, "hi", Vec::new(), CancellationToken::new(), |_| {})
            .await
            .unwrap();
        chat.clear_lane(&lane);

        assert!(chat.conversation(&lane).unwrap().is_empty());
        assert!(chat.registry().get(&lane).is_none());
    }
}
