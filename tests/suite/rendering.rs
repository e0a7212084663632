//! Rendering tests using ratatui's TestBackend

use spark_engine::App;

use crate::common::{app_for, mount_body, mount_reply, render, send, start_gemini_mock};

#[test]
fn missing_credential_renders_setup_notice() {
    let mut app = App::from_config(None, |_| None).unwrap();
    let screen = render(&mut app, 100, 30);

    assert!(screen.contains("API key missing"));
    assert!(screen.contains("GEMINI_API_KEY"));
    assert!(screen.contains("google = \"your-key\""));
    assert!(!screen.contains("Gemini can make mistakes"));
}

#[tokio::test]
async fn empty_conversation_shows_welcome_and_footer() {
    let server = start_gemini_mock().await;
    let mut app = app_for(&server);
    let screen = render(&mut app, 110, 32);

    assert!(screen.contains("Gemini 2.5 Flash"));
    assert!(screen.contains("Try one of these:"));
    assert!(screen.contains("Explain React"));
    assert!(screen.contains("Gemini can make mistakes. Check important info."));
}

#[tokio::test]
async fn exchange_renders_both_messages_and_drops_welcome() {
    let server = start_gemini_mock().await;
    mount_reply(&server, "Roses are red,\nviolets are blue").await;
    let mut app = app_for(&server);

    send(&mut app, "Write a short poem");
    let pending = render(&mut app, 100, 30);
    assert!(pending.contains("typing..."));

    app.wait_for_reply().await;
    app.tick();
    let screen = render(&mut app, 100, 30);

    assert!(!screen.contains("Try one of these"));
    assert!(!screen.contains("typing..."));
    assert!(screen.contains("Write a short poem"));
    assert!(screen.contains("Roses are red,"));
    assert!(screen.contains("violets are blue"));
}

#[tokio::test]
async fn failure_text_is_rendered_as_bot_message() {
    let server = start_gemini_mock().await;
    mount_body(
        &server,
        403,
        serde_json::json!({"error": {"code": 403, "message": "Error 403: forbidden"}}),
    )
    .await;
    let mut app = app_for(&server);

    send(&mut app, "hi");
    app.wait_for_reply().await;
    let screen = render(&mut app, 140, 30);

    assert!(screen.contains("API access denied!"));
}

#[tokio::test]
async fn long_conversation_keeps_newest_message_visible() {
    let server = start_gemini_mock().await;
    mount_reply(&server, "ack").await;
    let mut app = app_for(&server);

    for i in 0..12 {
        send(&mut app, &format!("message number {i}"));
        app.wait_for_reply().await;
        app.tick();
    }

    let screen = render(&mut app, 80, 20);
    assert!(screen.contains("message number 11"));
    assert!(!screen.contains("message number 0\n"));
    assert!(!screen.contains("message number 0 "));
}

#[tokio::test]
async fn wrapped_reply_scrolls_to_its_last_word() {
    let server = start_gemini_mock().await;
    let mut reply: Vec<String> = (0..60).map(|i| format!("word{i:02}")).collect();
    reply.push("FINALTOKEN".to_string());
    mount_reply(&server, &reply.join(" ")).await;
    let mut app = app_for(&server);

    send(&mut app, "tell me a long story");
    app.wait_for_reply().await;
    app.tick();

    // Word wrap at this width leaves most rows short of the full width.
    let screen = render(&mut app, 26, 20);
    assert!(screen.contains("FINALTOKEN"));
    assert!(!screen.contains("tell me a long story"));
}
