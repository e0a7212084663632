//! Input handling for Spark TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::debug;

use spark_engine::{App, DraftInput, InputMode};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking thread and hands them to the render loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(&stop2, &tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close first so a send blocked on capacity (large paste) unblocks.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: &AtomicBool, tx: &mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Backpressure instead of dropping: multi-line pastes must arrive intact.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain queued terminal events into the app. Returns `true` when the app should quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    for _ in 0..MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(app, ev) {
            return Ok(true);
        }
    }
    Ok(app.should_quit())
}

pub(crate) fn apply_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) => {
            if matches!(key.kind, KeyEventKind::Release) {
                return app.should_quit();
            }

            // No cancellation: Ctrl+C always quits, even mid-request.
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                app.request_quit();
                return true;
            }

            if app.setup_required() {
                handle_setup_screen(app, key);
                return app.should_quit();
            }

            match app.input_mode() {
                InputMode::Normal => handle_normal_mode(app, key),
                InputMode::Insert => handle_insert_mode(app, key),
            }
        }
        Event::Paste(text) => {
            if app.input_mode() == InputMode::Insert && !app.setup_required() && !app.paste(&text) {
                debug!("Paste ignored while awaiting a reply");
            }
        }
        _ => {}
    }
    app.should_quit()
}

fn handle_setup_screen(app: &mut App, key: KeyEvent) {
    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
        app.request_quit();
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.request_quit();
        }
        KeyCode::Char('i') => {
            app.enter_insert_mode();
        }
        KeyCode::Char('a') => {
            app.edit_draft(DraftInput::move_cursor_end);
            app.enter_insert_mode();
        }
        // Welcome screen suggestions are numbered from 1.
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            app.select_suggestion(index);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_up();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_page_up();
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_page_down();
        }
        KeyCode::PageUp => {
            app.scroll_page_up();
        }
        KeyCode::PageDown => {
            app.scroll_page_down();
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.scroll_to_top();
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.scroll_to_bottom();
        }
        _ => {}
    }
}

fn is_newline_chord(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => key
            .modifiers
            .intersects(KeyModifiers::SHIFT | KeyModifiers::CONTROL | KeyModifiers::ALT),
        KeyCode::Char('j') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn handle_insert_mode(app: &mut App, key: KeyEvent) {
    if is_newline_chord(&key) {
        app.edit_draft(DraftInput::enter_newline);
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.enter_normal_mode();
        }
        // Bare Enter sends; it never inserts a newline.
        KeyCode::Enter => {
            if !app.can_send() {
                return;
            }
            if let Err(err) = app.submit() {
                debug!("Send refused: {err}");
            }
        }
        KeyCode::Up => {
            app.scroll_up();
        }
        KeyCode::Down => {
            app.scroll_down();
        }
        KeyCode::PageUp => {
            app.scroll_page_up();
        }
        KeyCode::PageDown => {
            app.scroll_page_down();
        }
        // Backspace on an empty draft leaves insert mode.
        KeyCode::Backspace if app.draft().text().is_empty() => {
            app.enter_normal_mode();
        }
        _ => {
            app.edit_draft(|draft| edit_draft(draft, key));
        }
    }
}

fn edit_draft(draft: &mut DraftInput, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => draft.delete_char(),
        KeyCode::Delete => draft.delete_char_forward(),
        KeyCode::Left => draft.move_cursor_left(),
        KeyCode::Right => draft.move_cursor_right(),
        KeyCode::Home => draft.move_cursor_home(),
        KeyCode::End => draft.move_cursor_end(),
        KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            draft.move_cursor_home();
        }
        KeyCode::Char('e') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            draft.move_cursor_end();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => draft.clear(),
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            draft.delete_word_backwards();
        }
        KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => {}
        // Ignore \r; line breaks come from the newline chords or paste.
        KeyCode::Char(c) if c != '\r' => draft.enter_char(c),
        KeyCode::Tab => draft.enter_char('\t'),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_engine::{SUGGESTIONS, SparkConfig};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            apply_event(app, key(KeyCode::Char(c)));
        }
    }

    /// App with a credential whose endpoint refuses connections.
    fn ready_app() -> App {
        let config: SparkConfig = toml::from_str(
            "[api_keys]\ngoogle = \"k\"\n[google]\nbase_url = \"http://127.0.0.1:1/v1\"\n",
        )
        .unwrap();
        App::from_config(Some(&config), |_| None).unwrap()
    }

    fn setup_app() -> App {
        App::from_config(None, |_| None).unwrap()
    }

    #[test]
    fn normal_mode_keys_switch_modes_and_quit() {
        let mut app = ready_app();
        apply_event(&mut app, key(KeyCode::Char('i')));
        assert_eq!(app.input_mode(), InputMode::Insert);
        apply_event(&mut app, key(KeyCode::Esc));
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert!(apply_event(&mut app, key(KeyCode::Char('q'))));
    }

    #[test]
    fn ctrl_c_quits_from_insert_mode() {
        let mut app = ready_app();
        app.enter_insert_mode();
        assert!(apply_event(
            &mut app,
            key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)
        ));
    }

    #[test]
    fn number_keys_pick_suggestions_without_sending() {
        let mut app = ready_app();
        apply_event(&mut app, key(KeyCode::Char('3')));
        assert_eq!(app.draft().text(), SUGGESTIONS[2].prompt);
        assert_eq!(app.input_mode(), InputMode::Insert);
        assert!(app.messages().is_empty());
        assert!(!app.is_awaiting_reply());
    }

    #[test]
    fn newline_chords_insert_newlines() {
        let mut app = ready_app();
        app.enter_insert_mode();
        type_text(&mut app, "a");
        apply_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut app, "b");
        apply_event(&mut app, key_with(KeyCode::Enter, KeyModifiers::CONTROL));
        type_text(&mut app, "c");
        apply_event(&mut app, key_with(KeyCode::Char('j'), KeyModifiers::CONTROL));

        assert_eq!(app.draft().text(), "a\nb\nc\n");
        assert!(app.messages().is_empty());
    }

    #[test]
    fn enter_on_blank_draft_does_nothing() {
        let mut app = ready_app();
        app.enter_insert_mode();
        type_text(&mut app, "   ");
        apply_event(&mut app, key(KeyCode::Enter));
        assert!(app.messages().is_empty());
        assert_eq!(app.draft().text(), "   ");
    }

    #[tokio::test]
    async fn enter_sends_and_locks_the_draft() {
        let mut app = ready_app();
        app.enter_insert_mode();
        type_text(&mut app, "Tell me a joke");
        apply_event(&mut app, key(KeyCode::Enter));

        assert!(app.is_awaiting_reply());
        assert_eq!(app.messages().len(), 1);
        assert!(app.draft().text().is_empty());

        type_text(&mut app, "more");
        apply_event(&mut app, Event::Paste("pasted".to_string()));
        apply_event(&mut app, key(KeyCode::Enter));
        assert!(app.draft().text().is_empty());
        assert_eq!(app.messages().len(), 1);

        app.wait_for_reply().await;
        assert!(!app.is_awaiting_reply());
        assert_eq!(app.messages().len(), 2);
    }

    #[test]
    fn editing_keys_move_by_grapheme() {
        let mut app = ready_app();
        app.enter_insert_mode();
        type_text(&mut app, "héllo wörld");
        apply_event(&mut app, key_with(KeyCode::Char('w'), KeyModifiers::CONTROL));
        assert_eq!(app.draft().text(), "héllo ");
        apply_event(&mut app, key(KeyCode::Home));
        apply_event(&mut app, key(KeyCode::Delete));
        assert_eq!(app.draft().text(), "éllo ");
        apply_event(&mut app, key_with(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(app.draft().text().is_empty());
        apply_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.input_mode(), InputMode::Normal);
    }

    #[test]
    fn paste_only_applies_in_insert_mode() {
        let mut app = ready_app();
        apply_event(&mut app, Event::Paste("ignored".to_string()));
        assert!(app.draft().text().is_empty());

        app.enter_insert_mode();
        apply_event(&mut app, Event::Paste("line1\r\nline2".to_string()));
        assert_eq!(app.draft().text(), "line1\nline2");
    }

    #[test]
    fn setup_screen_only_allows_quitting() {
        let mut app = setup_app();
        apply_event(&mut app, key(KeyCode::Char('i')));
        apply_event(&mut app, key(KeyCode::Char('1')));
        assert_eq!(app.input_mode(), InputMode::Normal);
        assert!(app.draft().text().is_empty());
        assert!(apply_event(&mut app, key(KeyCode::Esc)));
    }

    #[test]
    fn release_events_are_ignored() {
        let mut app = ready_app();
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!apply_event(&mut app, Event::Key(release)));
    }
}
