use crate::app::{RenameState, RenameTarget};
use crate::deploy::DeployStep;
use crate::ui::help::centered_rect;
use crate::ui::text_editor::render_text_editor_area;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Fixed-height popup centered horizontally at `percent_x` width
fn popup(area: Rect, percent_x: u16, height: u16) -> Rect {
    let rect = centered_rect(percent_x, 100, area);
    let height = height.min(rect.height);
    Rect::new(rect.x, rect.y + (rect.height - height) / 2, rect.width, height)
}

pub fn render_confirm_reset(frame: &mut Frame, area: Rect) {
    let popup_area = popup(area, 50, 7);
    frame.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(Span::styled(
            "Reset the conversation?",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("The chat history, diagram and SQL script will be cleared."),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::Cyan)),
            Span::raw(": reset  "),
            Span::styled("n", Style::default().fg(Color::Cyan)),
            Span::raw(": cancel"),
        ]),
    ];
    let para = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Confirm ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(para, popup_area);
}

pub fn render_deploy_progress(frame: &mut Frame, area: Rect, current: DeployStep, target: Option<&str>) {
    let popup_area = popup(area, 50, DeployStep::ALL.len() as u16 + 5);
    frame.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Deploying to {}", target.unwrap_or("backend")),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for step in DeployStep::ALL {
        let (marker, style) = if step.number() < current.number() || current == DeployStep::Complete {
            ("✓", Style::default().fg(Color::Green))
        } else if step == current {
            ("▸", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else {
            ("·", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} {}. ", marker, step.number()), style),
            Span::styled(step.label(), style),
        ]));
    }

    let para = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" Step {}/{} ", current.number(), DeployStep::ALL.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(para, popup_area);
}

pub fn render_rename(frame: &mut Frame, area: Rect, rename: &RenameState) {
    let popup_area = popup(area, 50, 6);
    frame.render_widget(Clear, popup_area);

    let what = match rename.target {
        RenameTarget::Table(_) => "table",
        RenameTarget::Field(_, _) => "field",
    };

    let block = Block::default()
        .title(format!(" Rename {} ", what))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(inner);

    render_text_editor_area(
        frame,
        chunks[0],
        &rename.buffer,
        rename.cursor,
        "new name",
        " Name ",
        Style::default().fg(Color::Gray),
        true,
    );
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Cyan)),
            Span::raw(": apply  "),
            Span::styled("Esc", Style::default().fg(Color::Cyan)),
            Span::raw(": cancel"),
        ])),
        chunks[1],
    );
}
