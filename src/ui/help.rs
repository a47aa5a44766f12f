use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))
}

fn binding(keys: &str, action: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<14}", keys), Style::default().fg(Color::Cyan)),
        Span::raw(action.to_string()),
    ])
}

pub fn render_help(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(70, 80, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title("Help (Press ? or Esc to close)")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let lines = vec![
        Line::from(Span::styled(
            "schemachat - describe a database, get a schema",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        section("Everywhere:"),
        binding("Tab", "Switch between chat and diagram panes"),
        binding("Ctrl+D", "Deploy the migration script"),
        binding("Ctrl+S", "Save the script as database_schema.sql"),
        binding("Ctrl+R", "Reset the conversation (asks first)"),
        binding("Ctrl+P", "Check the model server again"),
        binding("F1", "Show this help"),
        binding("Ctrl+C", "Quit"),
        Line::from(""),
        section("Chat:"),
        binding("Enter", "Send the description"),
        binding("Up / Down", "Scroll the conversation"),
        binding("Ctrl+A / E", "Start / end of input"),
        binding("Ctrl+U / K", "Clear before / after cursor"),
        binding("Ctrl+W", "Delete word"),
        binding("Esc", "Move focus to the diagram"),
        Line::from(""),
        section("Diagram and migrations:"),
        binding("1 / 2", "Diagram / Migrations tab"),
        binding("Left / Right", "Switch tab"),
        binding("Up / Down", "Select table / scroll script"),
        binding("[ / ]", "Select field"),
        binding("r", "Rename selected table or field"),
        binding("i", "Back to the chat input"),
        binding("?", "Show this help"),
        binding("q", "Quit"),
    ];

    let para = Paragraph::new(lines)
        .block(Block::default())
        .wrap(Wrap { trim: true });

    frame.render_widget(para, inner);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
