//! TUI rendering for Spark using ratatui.

mod input;
mod messages;
mod setup;
mod theme;

pub use input::{InputPump, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use spark_engine::{App, InputMode};
use spark_types::sanitize_terminal_text;

use self::messages::draw_messages;
use self::setup::draw_setup_screen;

const DISCLAIMER: &str = "Gemini can make mistakes. Check important info.";

pub fn draw(frame: &mut Frame, app: &mut App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    if app.setup_required() {
        let area = frame.area();
        draw_setup_screen(frame, app, area, &palette, &glyphs);
        return;
    }

    let input_height = match app.input_mode() {
        InputMode::Normal => 3,
        InputMode::Insert => 5,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),            // Header
            Constraint::Min(1),               // Messages
            Constraint::Length(input_height), // Input
            Constraint::Length(1),            // Status bar
        ])
        .split(frame.area());

    draw_header(frame, app, chunks[0], &palette, &glyphs);
    draw_messages(frame, app, chunks[1], &palette, &glyphs);
    draw_input(frame, app, chunks[2], &palette, &glyphs);
    draw_status_bar(frame, app, chunks[3], &palette, &glyphs);
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", glyphs.model), styles::model_name(palette)),
        Span::styled(app.model().display_name(), styles::model_name(palette)),
        Span::styled(
            format!("  {}", app.model()),
            Style::default().fg(palette.text_muted),
        ),
    ]));
    frame.render_widget(header, area);
}

pub(crate) fn draw_input(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let mode = app.input_mode();
    let options = app.ui_options();
    let awaiting = app.is_awaiting_reply();
    let draft = app.draft();

    let multiline = draft.text().contains('\n');
    let prompt_char = if options.ascii_only { ">" } else { "❯" };

    let (mode_label, mode_style, border_style) = match mode {
        InputMode::Normal => (
            "NORMAL",
            styles::mode_normal(palette),
            Style::default().fg(palette.text_muted),
        ),
        InputMode::Insert => (
            "INSERT",
            styles::mode_insert(palette),
            Style::default().fg(palette.green),
        ),
    };
    let mode_text = if multiline {
        format!(" {mode_label} · MULTI ")
    } else {
        format!(" {mode_label} ")
    };

    // Key hints based on mode
    let hints = match mode {
        InputMode::Normal => vec![
            Span::styled("i", styles::key_highlight(palette)),
            Span::styled(" insert  ", styles::key_hint(palette)),
            Span::styled("j/k", styles::key_highlight(palette)),
            Span::styled(" scroll  ", styles::key_hint(palette)),
            Span::styled("q", styles::key_highlight(palette)),
            Span::styled(" quit ", styles::key_hint(palette)),
        ],
        InputMode::Insert => vec![
            Span::styled("Enter", styles::key_highlight(palette)),
            Span::styled(" send  ", styles::key_hint(palette)),
            Span::styled("Shift+Enter", styles::key_highlight(palette)),
            Span::styled(" newline  ", styles::key_hint(palette)),
            Span::styled("Esc", styles::key_highlight(palette)),
            Span::styled(" normal ", styles::key_hint(palette)),
        ],
    };

    let send_style = if app.can_send() {
        Style::default()
            .fg(palette.gemini)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.text_muted)
    };

    let inner_height = area.height.saturating_sub(2).max(1);
    let prefix = format!(" {prompt_char} ");
    let prefix_width = prefix.width() as u16;
    let content_width = area
        .width
        .saturating_sub(2)
        .saturating_sub(prefix_width)
        .max(1) as usize;
    let text_style = if awaiting {
        Style::default().fg(palette.text_muted)
    } else {
        Style::default().fg(palette.text_primary)
    };

    let (input_lines, cursor_row, cursor_col) = if draft.text().is_empty() {
        let placeholder = if awaiting {
            "Waiting for reply..."
        } else {
            "Message Gemini..."
        };
        let line = Line::from(vec![
            Span::styled(prefix.clone(), Style::default().fg(palette.primary)),
            Span::styled(
                placeholder,
                Style::default()
                    .fg(palette.text_muted)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]);
        (vec![line], 0u16, 0u16)
    } else {
        let text = draft.text();
        let before_cursor = &text[..draft.byte_index()];
        let cursor_line_index = before_cursor.matches('\n').count();
        let cursor_line_start = before_cursor.rsplit('\n').next().unwrap_or("");
        let cursor_display_pos = sanitize_terminal_text(cursor_line_start).width();

        let raw_lines: Vec<&str> = text.split('\n').collect();
        let visible_lines = inner_height as usize;
        let start_line = (cursor_line_index + 1).saturating_sub(visible_lines);
        let end_line = (start_line + visible_lines).min(raw_lines.len());

        let mut display_lines = Vec::new();
        let mut horizontal_scroll: u16 = 0;

        for (idx, line) in raw_lines[start_line..end_line].iter().enumerate() {
            let line = sanitize_terminal_text(line);
            let (visible, skipped) = if start_line + idx == cursor_line_index {
                scroll_to_cursor(&line, cursor_display_pos, content_width)
            } else {
                (&*line, 0)
            };
            if start_line + idx == cursor_line_index {
                horizontal_scroll = skipped;
            }

            let prefix_text = if idx == 0 {
                prefix.clone()
            } else {
                " ".repeat(prefix_width as usize)
            };
            display_lines.push(Line::from(vec![
                Span::styled(prefix_text, Style::default().fg(palette.primary)),
                Span::styled(visible.to_string(), text_style),
            ]));
        }

        let cursor_row = cursor_line_index.saturating_sub(start_line) as u16;
        let cursor_col = (cursor_display_pos as u16).saturating_sub(horizontal_scroll);
        (display_lines, cursor_row, cursor_col)
    };

    let input = Paragraph::new(input_lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title_top(Line::from(vec![Span::styled(mode_text, mode_style)]))
            .title_top(Line::from(hints).alignment(Alignment::Right))
            .title_bottom(
                Line::from(vec![Span::styled(format!(" {} send ", glyphs.send), send_style)])
                    .alignment(Alignment::Right),
            ),
    );

    frame.render_widget(input, area);

    // The composer is read-only while a reply is pending.
    if mode == InputMode::Insert && !awaiting {
        let cursor_x = area
            .x
            .saturating_add(1 + prefix_width)
            .saturating_add(cursor_col);
        let cursor_y = area.y.saturating_add(1).saturating_add(cursor_row);
        frame.set_cursor_position((cursor_x, cursor_y));
    }
}

/// Drop leading graphemes until a cursor at `cursor_col` fits in `content_width`.
///
/// Returns the visible tail and the display width skipped.
fn scroll_to_cursor(line: &str, cursor_col: usize, content_width: usize) -> (&str, u16) {
    if cursor_col < content_width {
        return (line, 0);
    }
    let scroll_target = cursor_col - content_width + 1;
    let mut skipped_width = 0;
    for (i, grapheme) in line.grapheme_indices(true) {
        if skipped_width >= scroll_target {
            return (&line[i..], skipped_width as u16);
        }
        skipped_width += grapheme.width();
    }
    ("", skipped_width as u16)
}

pub(crate) fn draw_status_bar(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let (status_text, status_style) = if let Some(err) = app.config_error() {
        (
            format!("{} {err}", glyphs.warning),
            Style::default().fg(palette.warning),
        )
    } else if app.is_awaiting_reply() {
        let spinner = spinner_frame(app.tick_count(), app.ui_options());
        (
            format!("{spinner} Waiting for {}...", app.model().display_name()),
            Style::default().fg(palette.primary),
        )
    } else {
        (
            format!("{} Ready", glyphs.bullet),
            Style::default().fg(palette.green),
        )
    };

    let disclaimer_width = (DISCLAIMER.width() as u16 + 1).min(area.width / 2);
    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(disclaimer_width)])
            .areas(area);

    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(status_text, status_style),
    ]));
    frame.render_widget(status, left);

    let disclaimer = Paragraph::new(Line::from(Span::styled(
        DISCLAIMER,
        Style::default().fg(palette.text_muted),
    )))
    .alignment(Alignment::Right);
    frame.render_widget(disclaimer, right);
}
