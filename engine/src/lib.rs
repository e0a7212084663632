//! Core engine for Spark - conversation state and request orchestration.
//!
//! This crate contains the App state machine without TUI dependencies.

use std::time::{Duration, Instant, SystemTime};

use tokio::sync::{oneshot, watch};

pub use spark_providers::{
    self, ApiConfig, Completion, CompletionError, FailureKind, GeminiClient,
    SAFETY_FALLBACK_REPLY,
};
pub use spark_types::{
    ApiKey, EmptyStringError, Message, ModelName, NonEmptyString, Sender,
    ui::{DraftInput, InputMode, ScrollState, UiOptions},
};

mod config;
mod conversation;
mod suggestions;
mod view;

pub use config::{
    AppConfig, ApiKeys, ConfigError, GEMINI_API_KEY_ENV, GoogleConfig, SparkConfig, config_path,
    expand_env_vars, resolve_api_key,
};
pub use conversation::{Conversation, ConversationSnapshot, SubmitError};
pub use suggestions::{SUGGESTIONS, Suggestion};
pub use view::ViewState;

type CompletionOutcome = Result<Completion, CompletionError>;

/// An outstanding completion call. Existence proves a reply is awaited.
#[derive(Debug)]
struct PendingReply {
    receiver: oneshot::Receiver<CompletionOutcome>,
    started: Instant,
}

/// Raw text used when the request task ends without reporting (panic).
const DROPPED_TASK_ERROR: &str = "request task ended without a response";

pub struct App {
    conversation: Conversation,
    /// Local observer of conversation snapshots; drives auto-scroll.
    observer: watch::Receiver<ConversationSnapshot>,
    seen_messages: usize,
    /// `None` when no credential is configured (setup screen).
    client: Option<GeminiClient>,
    model: ModelName,
    pending: Option<PendingReply>,
    input_mode: InputMode,
    view: ViewState,
    ui_options: UiOptions,
    config_error: Option<ConfigError>,
    tick: usize,
    should_quit: bool,
}

impl App {
    /// Load `~/.spark/config.toml` and the environment, then build the app.
    ///
    /// A broken config file is reported through [`App::config_error`] and the
    /// app starts with defaults.
    pub fn new() -> anyhow::Result<Self> {
        let (config, config_error) = match SparkConfig::load() {
            Ok(config) => (config, None),
            Err(err) => (None, Some(err)),
        };

        let mut app = Self::from_config(config.as_ref(), |name| std::env::var(name).ok())?;
        app.config_error = config_error;
        Ok(app)
    }

    /// Build from an already-loaded config and an environment lookup.
    pub fn from_config(
        config: Option<&SparkConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let model = config.map(SparkConfig::model).unwrap_or_default();
        let ui_options = config.map(SparkConfig::ui_options).unwrap_or_default();

        let client = match resolve_api_key(config, env) {
            Some(key) => {
                let mut api_config = ApiConfig::new(key, model.clone());
                if let Some(base_url) = config.and_then(SparkConfig::base_url) {
                    api_config = api_config.with_base_url(base_url);
                }
                Some(GeminiClient::new(api_config)?)
            }
            None => {
                tracing::info!("No Gemini API key configured; showing setup screen");
                None
            }
        };

        Ok(Self::from_parts(client, model, ui_options))
    }

    #[must_use]
    pub fn from_parts(client: Option<GeminiClient>, model: ModelName, ui_options: UiOptions) -> Self {
        let conversation = Conversation::new();
        let observer = conversation.subscribe();
        Self {
            conversation,
            observer,
            seen_messages: 0,
            client,
            model,
            pending: None,
            input_mode: InputMode::default(),
            view: ViewState::default(),
            ui_options,
            config_error: None,
            tick: 0,
            should_quit: false,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Subscribe to conversation snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.conversation.subscribe()
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    #[must_use]
    pub fn draft(&self) -> &DraftInput {
        self.conversation.pending_input()
    }

    #[must_use]
    pub fn is_awaiting_reply(&self) -> bool {
        self.conversation.is_awaiting_reply()
    }

    /// How long the outstanding request has been running.
    #[must_use]
    pub fn pending_elapsed(&self) -> Option<Duration> {
        self.pending.as_ref().map(|pending| pending.started.elapsed())
    }

    #[must_use]
    pub fn model(&self) -> &ModelName {
        &self.model
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    #[must_use]
    pub fn config_error(&self) -> Option<&ConfigError> {
        self.config_error.as_ref()
    }

    /// No credential: the host must show the setup screen and never send.
    #[must_use]
    pub fn setup_required(&self) -> bool {
        self.client.is_none()
    }

    #[must_use]
    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    // ------------------------------------------------------------------
    // Exchange
    // ------------------------------------------------------------------

    /// Send is enabled: credential present, nothing pending, draft not blank.
    #[must_use]
    pub fn can_send(&self) -> bool {
        !self.setup_required() && !self.is_awaiting_reply() && !self.draft().is_blank()
    }

    /// Send the current draft and start the remote call.
    ///
    /// Must run inside a tokio runtime. On refusal nothing changes.
    pub fn submit(&mut self) -> Result<(), SubmitError> {
        let Some(client) = self.client.clone() else {
            return Err(SubmitError::MissingCredential);
        };

        let text = self.draft().text().to_string();
        let prompt = self
            .conversation
            .append_user_message(&text, SystemTime::now())?;

        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = client.generate(prompt.as_str()).await;
            // Receiver gone means the app is shutting down.
            let _ = tx.send(outcome);
        });

        self.pending = Some(PendingReply {
            receiver: rx,
            started: Instant::now(),
        });
        self.view.scroll_to_bottom();
        Ok(())
    }

    /// Poll the outstanding call and apply its outcome once it settles.
    pub fn process_completion(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };

        let outcome = match pending.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => None,
        };

        if let Some(pending) = self.pending.take() {
            self.settle(outcome, pending.started);
        }
    }

    /// Wait for the outstanding call (if any) and apply its outcome.
    pub async fn wait_for_reply(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let outcome = pending.receiver.await.ok();
        self.settle(outcome, pending.started);
    }

    /// Apply exactly one `resolve_*`. `None` means the task died without reporting.
    fn settle(&mut self, outcome: Option<CompletionOutcome>, started: Instant) {
        let now = SystemTime::now();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Some(Ok(completion)) => {
                tracing::info!(elapsed_ms, blocked = completion.is_blocked(), "Reply received");
                self.conversation.resolve_with_reply(completion.into_text(), now);
            }
            Some(Err(err)) => {
                tracing::warn!(elapsed_ms, kind = ?err.failure_kind(), "Request failed");
                self.conversation.resolve_with_error(err.user_message(), now);
            }
            None => {
                tracing::error!(elapsed_ms, "Completion task dropped its result");
                let text = FailureKind::GenericRemoteFailure.user_message(DROPPED_TASK_ERROR);
                self.conversation.resolve_with_error(text, now);
            }
        }
    }

    /// Put a canned prompt in the draft without sending it.
    ///
    /// Only offered while the conversation is empty.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        if self.setup_required() || !self.messages().is_empty() {
            return false;
        }
        let Some(suggestion) = SUGGESTIONS.get(index) else {
            return false;
        };
        self.conversation.set_pending_input(suggestion.prompt);
        self.enter_insert_mode();
        true
    }

    // ------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------

    pub fn enter_insert_mode(&mut self) {
        self.input_mode = InputMode::Insert;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Edit the draft. Refused while a reply is pending (the composer is read-only).
    pub fn edit_draft(&mut self, edit: impl FnOnce(&mut DraftInput)) -> bool {
        if self.is_awaiting_reply() {
            return false;
        }
        self.conversation.edit_pending_input(edit);
        true
    }

    /// Insert pasted text at the cursor with line endings normalized to `\n`.
    pub fn paste(&mut self, text: &str) -> bool {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        self.edit_draft(|draft| draft.enter_text(&normalized))
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    /// Advance the animation tick and catch up with published snapshots.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.observe_conversation();
    }

    /// Any change to the message list re-enables auto-scroll.
    fn observe_conversation(&mut self) {
        if !self.observer.has_changed().unwrap_or(false) {
            return;
        }
        let count = self.observer.borrow_and_update().messages.len();
        if count != self.seen_messages {
            self.seen_messages = count;
            self.view.scroll_to_bottom();
        }
    }

    #[must_use]
    pub fn scroll_state(&self) -> ScrollState {
        self.view.scroll()
    }

    pub fn update_scroll_max(&mut self, max: u16) {
        self.view.update_scroll_max(max);
    }

    #[must_use]
    pub fn scroll_offset_from_top(&self) -> u16 {
        self.view.scroll_offset_from_top()
    }

    pub fn scroll_up(&mut self) {
        self.view.scroll_up();
    }

    pub fn scroll_down(&mut self) {
        self.view.scroll_down();
    }

    pub fn scroll_page_up(&mut self) {
        self.view.scroll_page_up();
    }

    pub fn scroll_page_down(&mut self) {
        self.view.scroll_page_down();
    }

    pub fn scroll_to_top(&mut self) {
        self.view.scroll_to_top();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.view.scroll_to_bottom();
    }
}
