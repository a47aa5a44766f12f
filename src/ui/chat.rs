use crate::app::{App, Focus};
use crate::types::{ChatMessage, Role};
use crate::ui::pane_styles;
use crate::ui::text_editor::render_text_editor_area;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render_chat(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.state.focus == Focus::Chat;
    let (border_style, title_style) = pane_styles(focused);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let block = Block::default()
        .title(" Chat ")
        .title_style(title_style)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    if app.state.messages.is_empty() {
        let hint = Paragraph::new(vec![
            Line::from(Span::styled(
                "Describe the database you need.",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "e.g. \"An online shop with customers, products and orders\"",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .wrap(Wrap { trim: true });
        frame.render_widget(hint, inner);
    } else {
        let lines: Vec<Line> = app
            .state
            .messages
            .iter()
            .flat_map(message_lines)
            .collect();

        // Stick to the newest message unless the user scrolled back
        let total = wrapped_height(&lines, inner.width);
        let bottom = total.saturating_sub(inner.height);
        app.state.chat_scroll_max.set(bottom);
        let offset = bottom.saturating_sub(app.state.chat_scroll);

        let para = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0));
        frame.render_widget(para, inner);
    }

    let offline = app.state.model_online == Some(false);
    let (title, placeholder) = if offline {
        (" Connection required ", "Start Ollama, then press Ctrl+P")
    } else if app.state.generating {
        (" Generating... ", "Describe your database...")
    } else {
        (" Message (Enter to send) ", "Describe your database...")
    };
    render_text_editor_area(
        frame,
        chunks[1],
        &app.state.input,
        app.state.input_cursor,
        placeholder,
        title,
        border_style,
        focused && app.state.rename.is_none(),
    );
}

fn message_lines(message: &ChatMessage) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let (who, who_style) = match message.role {
        Role::User => ("You", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Role::Assistant => (
            "Assistant",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };
    lines.push(Line::from(Span::styled(who, who_style)));

    if message.loading {
        lines.push(Line::from(Span::styled(
            format!("{}...", message.content),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
        )));
    } else {
        for text in message.content.lines() {
            lines.push(Line::from(text.to_string()));
        }
    }

    for table in &message.tables {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("▸ ", Style::default().fg(Color::Yellow)),
            Span::styled(
                table.name.clone(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]));
        for text in table.description.lines().filter(|l| !l.is_empty()) {
            lines.push(Line::from(Span::styled(
                format!("  {}", text),
                Style::default().fg(Color::Gray),
            )));
        }
    }

    lines.push(Line::from(""));
    lines
}

/// Rows the lines take once wrapped at `width`
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum::<usize>()
        .min(u16::MAX as usize) as u16
}
