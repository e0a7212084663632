//! Blocking setup screen shown when no Gemini API key is configured.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
};

use spark_engine::{App, GEMINI_API_KEY_ENV, SparkConfig};

use crate::theme::{Glyphs, Palette, styles};

const AI_STUDIO_URL: &str = "https://aistudio.google.com/app/apikey";

pub(crate) fn draw_setup_screen(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let lines = setup_lines(app, palette, glyphs);
    let height = (lines.len() as u16).saturating_add(4).min(area.height);
    let width = 72.min(area.width);

    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [panel] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.warning))
        .title_top(
            Line::from(Span::styled(
                " Setup required ",
                Style::default()
                    .fg(palette.warning)
                    .add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        )
        .padding(Padding::uniform(1));

    let setup = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(setup, panel);
}

fn setup_lines(app: &App, palette: &Palette, glyphs: &Glyphs) -> Vec<Line<'static>> {
    let config_path = SparkConfig::path().map_or_else(
        || "~/.spark/config.toml".to_string(),
        |path| path.display().to_string(),
    );
    let text = Style::default().fg(palette.text_secondary);
    let code = Style::default().fg(palette.peach);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} API key missing", glyphs.key),
            Style::default()
                .fg(palette.error)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Set the {GEMINI_API_KEY_ENV} environment variable:"),
            text,
        )),
        Line::from(Span::styled(
            format!("  export {GEMINI_API_KEY_ENV}=\"your-key\""),
            code,
        )),
        Line::from(""),
        Line::from(Span::styled(format!("or add it to {config_path}:"), text)),
        Line::from(Span::styled("  [api_keys]", code)),
        Line::from(Span::styled("  google = \"your-key\"", code)),
        Line::from(""),
        Line::from(vec![
            Span::styled("Get a key at ", text),
            Span::styled(AI_STUDIO_URL, Style::default().fg(palette.gemini)),
        ]),
    ];

    if let Some(err) = app.config_error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} {err}", glyphs.warning),
            Style::default().fg(palette.warning),
        )));
    }

    lines.extend([
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", styles::key_hint(palette)),
            Span::styled("q", styles::key_highlight(palette)),
            Span::styled(" to quit, then restart Spark.", styles::key_hint(palette)),
        ]),
    ]);
    lines
}
