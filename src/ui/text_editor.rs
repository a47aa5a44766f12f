use ratatui::{
    prelude::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render a single-line input with a block cursor at a character position
pub fn render_text_editor_area(
    frame: &mut Frame,
    area: Rect,
    text: &str,
    cursor_pos: usize,
    placeholder: &str,
    title: &str,
    border_style: Style,
    show_cursor: bool,
) {
    let cursor_style = Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let line = if text.is_empty() {
        let mut spans = Vec::new();
        if show_cursor {
            spans.push(Span::styled(" ", cursor_style));
        }
        spans.push(Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray)));
        Line::from(spans)
    } else {
        let pos = cursor_pos.min(text.chars().count());
        let before: String = text.chars().take(pos).collect();
        let mut rest = text.chars().skip(pos);
        let mut spans = vec![Span::styled(before, Style::default().fg(Color::White))];
        match (show_cursor, rest.next()) {
            (true, Some(at)) => {
                spans.push(Span::styled(at.to_string(), cursor_style));
                spans.push(Span::styled(rest.collect::<String>(), Style::default().fg(Color::White)));
            }
            (true, None) => spans.push(Span::styled(" ", cursor_style)),
            (false, Some(at)) => {
                let mut after = at.to_string();
                after.extend(rest);
                spans.push(Span::styled(after, Style::default().fg(Color::White)));
            }
            (false, None) => {}
        }
        Line::from(spans)
    };

    let editor = Paragraph::new(line)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(editor, area);
}
