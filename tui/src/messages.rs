//! Conversation view: welcome screen, message list and typing indicator.

use std::time::SystemTime;

use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Padding, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
};

use spark_engine::{App, Message, SUGGESTIONS, Sender};
use spark_types::sanitize_terminal_text;

use crate::theme::{Glyphs, Palette, spinner_frame, styles};

pub(crate) fn draw_messages(
    frame: &mut Frame,
    app: &mut App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let messages_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.text_muted))
        .padding(Padding::horizontal(1));

    if app.messages().is_empty() && !app.is_awaiting_reply() {
        app.update_scroll_max(0);
        let welcome = create_welcome_screen(app, palette, glyphs);
        frame.render_widget(welcome.block(messages_block), area);
        return;
    }

    let model_name = app.model().display_name();
    let mut lines: Vec<Line> = Vec::new();
    for (index, message) in app.messages().iter().enumerate() {
        if index > 0 {
            lines.push(Line::from(""));
        }
        render_message(message, &model_name, &mut lines, palette, glyphs);
    }

    if app.is_awaiting_reply() {
        lines.push(Line::from(""));
        lines.extend(typing_indicator(app, &model_name, palette, glyphs));
    }

    let inner = messages_block.inner(area);
    let total_lines = wrapped_line_count(&lines, inner.width);
    let max_scroll = total_lines.saturating_sub(inner.height);

    app.update_scroll_max(max_scroll);
    let scroll_offset = app.scroll_offset_from_top();

    let messages = Paragraph::new(lines)
        .block(messages_block)
        .wrap(Wrap { trim: false })
        .scroll((scroll_offset, 0));

    frame.render_widget(messages, area);

    if max_scroll > 0 {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .style(Style::default().fg(palette.text_muted));
        // content_length = scrollable range, so the thumb sits at the bottom at max_scroll.
        let mut scrollbar_state =
            ScrollbarState::new(max_scroll as usize).position(scroll_offset as usize);

        frame.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut scrollbar_state,
        );
    }
}

fn render_message(
    message: &Message,
    model_name: &str,
    lines: &mut Vec<Line<'static>>,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (icon, name, name_style, content_style) = match message.sender() {
        Sender::User => (
            glyphs.user,
            "You",
            styles::user_name(palette),
            Style::default().fg(palette.text_primary),
        ),
        Sender::Bot => (
            glyphs.model,
            model_name,
            styles::model_name(palette),
            Style::default().fg(palette.text_secondary),
        ),
    };

    lines.push(Line::from(vec![
        Span::styled(format!("{icon} "), name_style),
        Span::styled(name.to_string(), name_style),
        Span::styled(
            format!("  {}", format_time(message.timestamp())),
            Style::default().fg(palette.text_muted),
        ),
    ]));

    // Replies and remote error text are untrusted.
    let content = sanitize_terminal_text(message.text());
    for text_line in content.split('\n') {
        let text_line = text_line.trim_end_matches('\r');
        lines.push(Line::from(Span::styled(
            format!("  {text_line}"),
            content_style,
        )));
    }
}

fn typing_indicator(
    app: &App,
    model_name: &str,
    palette: &Palette,
    glyphs: &Glyphs,
) -> Vec<Line<'static>> {
    let spinner = spinner_frame(app.tick_count(), app.ui_options());
    let elapsed = app
        .pending_elapsed()
        .map(|elapsed| format!(" {}s", elapsed.as_secs()))
        .unwrap_or_default();

    vec![
        Line::from(vec![
            Span::styled(format!("{} ", glyphs.model), styles::model_name(palette)),
            Span::styled(model_name.to_string(), styles::model_name(palette)),
        ]),
        Line::from(vec![
            Span::styled(format!("  {spinner} "), Style::default().fg(palette.primary)),
            Span::styled(
                format!("typing...{elapsed}"),
                Style::default()
                    .fg(palette.text_muted)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
    ]
}

fn create_welcome_screen(app: &App, palette: &Palette, glyphs: &Glyphs) -> Paragraph<'static> {
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {} Hello! I'm {}", glyphs.model, app.model().display_name()),
            Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "  How can I help you today?",
            Style::default().fg(palette.text_secondary),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Try one of these:",
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (index, suggestion) in SUGGESTIONS.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("    {}", index + 1), styles::key_highlight(palette)),
            Span::styled(
                format!("  {} ", glyphs.bullet),
                Style::default().fg(palette.text_muted),
            ),
            Span::styled(
                suggestion.label,
                Style::default().fg(palette.text_secondary),
            ),
        ]));
    }

    lines.extend([
        Line::from(""),
        Line::from(vec![
            Span::styled("  i", styles::key_highlight(palette)),
            Span::styled(" type a message  ", styles::key_hint(palette)),
            Span::styled("Enter", styles::key_highlight(palette)),
            Span::styled(" send  ", styles::key_hint(palette)),
            Span::styled("q", styles::key_highlight(palette)),
            Span::styled(" quit", styles::key_hint(palette)),
        ]),
    ]);

    Paragraph::new(lines).wrap(Wrap { trim: false })
}

fn format_time(timestamp: SystemTime) -> String {
    DateTime::<Local>::from(timestamp).format("%H:%M").to_string()
}

/// Rows `lines` occupy when word-wrapped to `width`.
pub(crate) fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    if lines.is_empty() {
        return 0;
    }

    let rows = Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width.max(1));
    u16::try_from(rows).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_line_count_accounts_for_wrapping() {
        let lines = vec![
            Line::from(""),
            Line::from("abcd"),
            Line::from("abcdefghij"),
        ];
        assert_eq!(wrapped_line_count(&lines, 4), 1 + 1 + 3);
        assert_eq!(wrapped_line_count(&[], 4), 0);
    }

    #[test]
    fn wrapped_line_count_follows_word_boundaries() {
        // Character-width math gives 2 rows; word wrap needs 3.
        let lines = vec![Line::from("aaaa bbbb cccc")];
        assert_eq!(wrapped_line_count(&lines, 7), 3);
    }

    #[test]
    fn multi_line_messages_keep_their_lines() {
        let palette = crate::theme::Palette::standard();
        let glyphs = crate::theme::glyphs(spark_engine::UiOptions::default());
        let message = Message::bot("one\r\ntwo\n\nfour", SystemTime::UNIX_EPOCH);
        let mut lines = Vec::new();
        render_message(&message, "Gemini", &mut lines, &palette, &glyphs);

        let text: Vec<String> = lines.iter().skip(1).map(ToString::to_string).collect();
        assert_eq!(text, ["  one", "  two", "  ", "  four"]);
    }

    #[test]
    fn header_names_the_sender() {
        let palette = crate::theme::Palette::standard();
        let glyphs = crate::theme::glyphs(spark_engine::UiOptions::default());
        let user = Message::user(
            spark_types::NonEmptyString::new("hi").unwrap(),
            SystemTime::UNIX_EPOCH,
        );
        let mut lines = Vec::new();
        render_message(&user, "Gemini 2.5 Flash", &mut lines, &palette, &glyphs);
        assert!(lines[0].to_string().contains("You"));

        let mut lines = Vec::new();
        let bot = Message::bot("hello", SystemTime::UNIX_EPOCH);
        render_message(&bot, "Gemini 2.5 Flash", &mut lines, &palette, &glyphs);
        assert!(lines[0].to_string().contains("Gemini 2.5 Flash"));
    }
}
