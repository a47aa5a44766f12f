mod chat;
mod content;
mod diagram;
mod help;
mod migrations;
mod modal;
mod text_editor;

use crate::app::{App, NoticeKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub use chat::render_chat;
pub use content::render_content;
pub use help::render_help;
pub use modal::{render_confirm_reset, render_deploy_progress, render_rename};

/// Border and title styles for a pane, highlighted when focused
pub(crate) fn pane_styles(focused: bool) -> (Style, Style) {
    if focused {
        (
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
    } else {
        (Style::default().fg(Color::Gray), Style::default().fg(Color::Gray))
    }
}

/// Render the main UI
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.size();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    render_status_bar(frame, rows[0], app);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35), // Chat
            Constraint::Percentage(65), // Diagram / Migrations
        ])
        .split(rows[1]);

    render_chat(frame, panes[0], app);
    render_content(frame, panes[1], app);
    render_footer(frame, rows[2], app);

    if app.state.show_help {
        render_help(frame, size);
    } else if app.state.confirm_reset {
        render_confirm_reset(frame, size);
    } else if let Some(step) = app.state.deploying {
        render_deploy_progress(frame, size, step, app.state.deploy_target.as_deref());
    } else if let Some(rename) = &app.state.rename {
        render_rename(frame, size, rename);
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let (marker, marker_style) = match app.state.model_online {
        Some(true) => ("●", Style::default().fg(Color::Green)),
        Some(false) => ("●", Style::default().fg(Color::Red)),
        None => ("○", Style::default().fg(Color::Yellow)),
    };

    let target = app
        .state
        .deploy_target
        .clone()
        .unwrap_or_else(|| "no deploy target".to_string());

    let line = Line::from(vec![
        Span::styled(
            " schemachat ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(marker, marker_style),
        Span::raw(" "),
        Span::styled(app.state.model_status.clone(), Style::default().fg(Color::White)),
        Span::styled("  │  ", Style::default().fg(Color::DarkGray)),
        Span::styled(target, Style::default().fg(Color::Gray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.state.notification {
        Some(notice) => {
            let style = match notice.kind {
                NoticeKind::Success => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                NoticeKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            };
            Line::from(Span::styled(format!(" {}", notice.message), style))
        }
        None => {
            let key = Style::default().fg(Color::Cyan);
            Line::from(vec![
                Span::styled(" Tab", key),
                Span::raw(": pane  "),
                Span::styled("Ctrl+D", key),
                Span::raw(": deploy  "),
                Span::styled("Ctrl+S", key),
                Span::raw(": save  "),
                Span::styled("Ctrl+R", key),
                Span::raw(": reset  "),
                Span::styled("Ctrl+P", key),
                Span::raw(": recheck model  "),
                Span::styled("F1", key),
                Span::raw(": help  "),
                Span::styled("Ctrl+C", key),
                Span::raw(": quit"),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, OllamaConfig};
    use crate::pipeline::tests::{CannedModel, BLOG_ANSWER};
    use crate::pipeline::generate;
    use crate::sql::SqlDialect;
    use crate::worker::Worker;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        let config = Config::new(OllamaConfig::default(), None, None, ".".into());
        let worker = Worker::new(
            Box::new(CannedModel::answering(BLOG_ANSWER)),
            None,
            SqlDialect::Postgres,
        );
        App::new(worker, &config)
    }

    #[test]
    fn renders_generated_schema() {
        let mut app = app();
        let model = CannedModel::answering(BLOG_ANSWER);
        let generation = generate(&model, "A blog", SqlDialect::Postgres).unwrap();
        app.state.begin_generation("A blog");
        app.state.apply_generation("A blog", generation);

        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("posts"));
        assert!(text.contains("comments"));
        assert!(text.contains("PK id"));
        assert!(text.contains("The a blog schema has been created"));

        app.state.set_tab(crate::app::Tab::Migrations);
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(screen_text(&terminal).contains("CREATE TABLE posts"));
        app.shutdown().unwrap();
    }

    #[test]
    fn overlays_render_on_small_terminals() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();

        app.state.show_help = true;
        terminal.draw(|f| render(f, &app)).unwrap();
        app.state.show_help = false;

        app.state.confirm_reset = true;
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(screen_text(&terminal).contains("Confirm"));
        app.state.confirm_reset = false;

        app.state.deploying = Some(crate::deploy::DeployStep::Executing);
        terminal.draw(|f| render(f, &app)).unwrap();
        app.shutdown().unwrap();
    }
}
