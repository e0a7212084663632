//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use ratatui::{Terminal, backend::TestBackend};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spark_engine::{App, SparkConfig};

pub const TEST_KEY: &str = "test-key";
pub const ENDPOINT_PATH: &str = "/v1/models/gemini-2.5-flash:generateContent";

/// Start a mock server that simulates the Gemini API
pub async fn start_gemini_mock() -> MockServer {
    MockServer::start().await
}

/// Mount a `generateContent` response with the given status and JSON body
pub async fn mount_body(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(ENDPOINT_PATH))
        .and(query_param("key", TEST_KEY))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount a successful reply carrying `text` as the first candidate
pub async fn mount_reply(server: &MockServer, text: &str) {
    mount_body(
        server,
        200,
        json!({
            "candidates": [{
                "content": {"parts": [{"text": text}], "role": "model"},
                "finishReason": "STOP"
            }]
        }),
    )
    .await;
}

/// Parse a config pointing at `base_url` with the test key
pub fn config_with_base_url(base_url: &str) -> SparkConfig {
    let raw = format!(
        "[api_keys]\ngoogle = \"{TEST_KEY}\"\n\n[google]\nbase_url = \"{base_url}\"\n"
    );
    toml::from_str(&raw).expect("valid test config")
}

/// App wired to the mock server, with no environment fallback
pub fn app_for(server: &MockServer) -> App {
    let config = config_with_base_url(&format!("{}/v1", server.uri()));
    App::from_config(Some(&config), |_| None).expect("app builds")
}

/// Render one frame and return the buffer as text, one row per line
pub fn render(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
    terminal
        .draw(|frame| spark_tui::draw(frame, app))
        .expect("draw");

    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}

/// Type `text` into the draft and send it
pub fn send(app: &mut App, text: &str) {
    assert!(app.edit_draft(|draft| draft.set_text(text.to_string())));
    app.submit().expect("submit accepted");
}
