use crate::app::{App, Focus, Tab};
use crate::ui::diagram::render_diagram;
use crate::ui::migrations::render_migrations;
use crate::ui::pane_styles;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

pub fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    let (border_style, title_style) = pane_styles(app.state.focus == Focus::Content);

    let title = match app.state.active_tab {
        Tab::Diagram => " Diagram ",
        Tab::Migrations => " Migrations ",
    };

    let block = Block::default()
        .title(title)
        .title_style(title_style)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    render_tabs(frame, chunks[0], app);

    match app.state.active_tab {
        Tab::Diagram => render_diagram(frame, chunks[1], app),
        Tab::Migrations => render_migrations(frame, chunks[1], app),
    }

    render_hints(frame, chunks[2], app);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let migrations_style = if app.state.has_script() {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let titles = vec![
        Line::from(Span::styled("1 Diagram", Style::default().fg(Color::White))),
        Line::from(Span::styled("2 Migrations", migrations_style)),
    ];
    let selected = match app.state.active_tab {
        Tab::Diagram => 0,
        Tab::Migrations => 1,
    };
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider(Span::styled("│", Style::default().fg(Color::DarkGray)));
    frame.render_widget(tabs, area);
}

fn render_hints(frame: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Cyan);
    let line = match app.state.active_tab {
        Tab::Diagram => Line::from(vec![
            Span::styled("Up/Down", key),
            Span::raw(": table  "),
            Span::styled("[ ]", key),
            Span::raw(": field  "),
            Span::styled("r", key),
            Span::raw(": rename  "),
            Span::styled("Left/Right", key),
            Span::raw(": tab"),
        ]),
        Tab::Migrations => Line::from(vec![
            Span::styled("Up/Down", key),
            Span::raw(": scroll  "),
            Span::styled("PgUp/PgDn", key),
            Span::raw(": page  "),
            Span::styled("Ctrl+S", key),
            Span::raw(": save .sql  "),
            Span::styled("Ctrl+D", key),
            Span::raw(": deploy"),
        ]),
    };
    frame.render_widget(Paragraph::new(line), area);
}
