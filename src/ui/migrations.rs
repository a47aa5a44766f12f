use crate::app::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

const KEYWORDS: &[&str] = &[
    "CREATE", "TABLE", "IF", "NOT", "EXISTS", "PRIMARY", "KEY", "FOREIGN", "REFERENCES",
    "UNIQUE", "CHECK", "DEFAULT", "NULL", "AUTOINCREMENT", "CONSTRAINT", "INDEX", "ON",
    "DELETE", "UPDATE", "CASCADE", "SET", "RESTRICT", "NO", "ACTION", "TRUE", "FALSE",
];

const TYPES: &[&str] = &[
    "SERIAL", "INTEGER", "TEXT", "BOOLEAN", "TIMESTAMP", "DECIMAL", "JSONB", "REAL", "BLOB",
];

pub fn render_migrations(frame: &mut Frame, area: Rect, app: &App) {
    if !app.state.has_script() {
        let empty = Paragraph::new("No migration script yet. Describe a database in the chat.")
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let script_lines: Vec<&str> = app.state.sql_script.lines().collect();
    let gutter = script_lines.len().to_string().len();

    let lines: Vec<Line> = script_lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let mut spans = vec![Span::styled(
                format!("{:>width$} ", i + 1, width = gutter),
                Style::default().fg(Color::DarkGray),
            )];
            spans.extend(format_sql_line(line).spans);
            Line::from(spans)
        })
        .collect();

    let max_scroll = (lines.len() as u16).saturating_sub(area.height);
    app.state.sql_scroll_max.set(max_scroll);
    let para = Paragraph::new(lines).scroll((app.state.sql_scroll.min(max_scroll), 0));
    frame.render_widget(para, area);
}

/// Format a line of SQL with syntax highlighting
fn format_sql_line(line: &str) -> Line<'static> {
    if line.trim_start().starts_with("--") {
        return Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }

    let mut spans = Vec::new();
    let mut current_word = String::new();
    let mut in_string = false;

    for ch in line.chars() {
        match ch {
            '\'' => {
                if !current_word.is_empty() {
                    spans.push(format_word_span(&current_word));
                    current_word.clear();
                }
                in_string = !in_string;
                spans.push(Span::styled(ch.to_string(), Style::default().fg(Color::Green)));
            }
            c if in_string => {
                spans.push(Span::styled(c.to_string(), Style::default().fg(Color::Green)));
            }
            c if c.is_alphanumeric() || c == '_' => {
                current_word.push(c);
            }
            c => {
                if !current_word.is_empty() {
                    spans.push(format_word_span(&current_word));
                    current_word.clear();
                }
                let style = match c {
                    '(' | ')' => Style::default().fg(Color::Cyan),
                    ',' | ';' => Style::default().fg(Color::Gray),
                    _ => Style::default().fg(Color::White),
                };
                spans.push(Span::styled(c.to_string(), style));
            }
        }
    }

    if !current_word.is_empty() {
        spans.push(format_word_span(&current_word));
    }

    if spans.is_empty() {
        Line::from("")
    } else {
        Line::from(spans)
    }
}

fn format_word_span(word: &str) -> Span<'static> {
    let upper = word.to_uppercase();
    let style = if KEYWORDS.contains(&upper.as_str()) {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else if TYPES.contains(&upper.as_str()) {
        Style::default().fg(Color::Magenta)
    } else if word.chars().all(|c| c.is_ascii_digit()) {
        Style::default().fg(Color::LightYellow)
    } else {
        Style::default().fg(Color::White)
    };
    Span::styled(word.to_string(), style)
}
