//! Conversation state: the append-only message log, the staged draft and the
//! awaiting-reply flag.
//!
//! Every mutation publishes a fresh [`ConversationSnapshot`] on a
//! `tokio::sync::watch` channel. Renderers subscribe and redraw from the
//! snapshot instead of reaching into the state.

use std::sync::Arc;
use std::time::SystemTime;

use spark_types::ui::DraftInput;
use spark_types::{Message, NonEmptyString};
use tokio::sync::watch;

/// Why a send was refused. Nothing changes when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("message is empty")]
    Empty,
    #[error("a reply is already pending")]
    AwaitingReply,
    #[error("no API key configured")]
    MissingCredential,
}

/// Immutable view of the conversation at one point in time.
#[derive(Debug, Clone, Default)]
pub struct ConversationSnapshot {
    pub messages: Arc<[Message]>,
    pub pending_input: DraftInput,
    pub awaiting_reply: bool,
}

#[derive(Debug)]
pub struct Conversation {
    messages: Arc<[Message]>,
    pending_input: DraftInput,
    awaiting_reply: bool,
    publisher: watch::Sender<ConversationSnapshot>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    #[must_use]
    pub fn new() -> Self {
        let (publisher, _) = watch::channel(ConversationSnapshot::default());
        Self {
            messages: Arc::from(Vec::new()),
            pending_input: DraftInput::default(),
            awaiting_reply: false,
            publisher,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn pending_input(&self) -> &DraftInput {
        &self.pending_input
    }

    #[must_use]
    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// Receiver that observes every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.publisher.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot {
            messages: Arc::clone(&self.messages),
            pending_input: self.pending_input.clone(),
            awaiting_reply: self.awaiting_reply,
        }
    }

    /// Start an exchange: append the user message, clear the draft, raise the flag.
    ///
    /// Whitespace-only text and a second send while awaiting are refused
    /// without touching any state.
    pub fn append_user_message(
        &mut self,
        text: &str,
        at: SystemTime,
    ) -> Result<NonEmptyString, SubmitError> {
        if self.awaiting_reply {
            return Err(SubmitError::AwaitingReply);
        }
        let text = NonEmptyString::new(text).map_err(|_| SubmitError::Empty)?;

        self.push(Message::user(text.clone(), at));
        self.pending_input.clear();
        self.awaiting_reply = true;
        self.publish();
        Ok(text)
    }

    pub fn resolve_with_reply(&mut self, text: impl Into<String>, at: SystemTime) {
        self.resolve(Message::bot(text, at));
    }

    /// Errors are ordinary bot messages; only the text differs.
    pub fn resolve_with_error(&mut self, display_text: impl Into<String>, at: SystemTime) {
        self.resolve(Message::bot(display_text, at));
    }

    fn resolve(&mut self, message: Message) {
        if !self.awaiting_reply {
            tracing::warn!("Resolving a conversation that was not awaiting a reply");
        }
        self.push(message);
        self.awaiting_reply = false;
        self.publish();
    }

    /// Replace the staged input; the cursor moves to the end.
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input.set_text(text.into());
        self.publish();
    }

    pub fn edit_pending_input<R>(&mut self, edit: impl FnOnce(&mut DraftInput) -> R) -> R {
        let result = edit(&mut self.pending_input);
        self.publish();
        result
    }

    fn push(&mut self, message: Message) {
        let mut messages = self.messages.to_vec();
        messages.push(message);
        self.messages = Arc::from(messages);
    }

    fn publish(&self) {
        self.publisher.send_replace(self.snapshot());
    }
}
