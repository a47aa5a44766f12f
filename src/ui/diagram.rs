use crate::app::App;
use crate::layout::layer_tables;
use crate::types::{Schema, TableNode};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::collections::HashSet;

const MIN_BOX_WIDTH: u16 = 18;
const MAX_BOX_WIDTH: u16 = 34;
const MAX_BOX_HEIGHT: u16 = 12;
const ROW_GAP: u16 = 3;

pub fn render_diagram(frame: &mut Frame, area: Rect, app: &App) {
    let Some(schema) = &app.state.schema else {
        let empty = Paragraph::new(vec![
            Line::from(Span::styled("No diagram yet", Style::default().fg(Color::Gray))),
            Line::from(""),
            Line::from(Span::styled(
                "Describe your database in the chat and the tables will appear here.",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    };

    let boxes = box_layout(schema, area);
    for (idx, table) in schema.tables.iter().enumerate() {
        let selected = idx == app.state.selected_table;
        let field = if selected { app.state.selected_field } else { None };
        render_table_box(frame, boxes[idx], table, selected, field, app.state.schema_is_placeholder);
    }

    draw_relationship_arrows(frame.buffer_mut(), area, schema, &boxes);
}

/// Place each table on the grid rows produced by [`layer_tables`].
/// Tables that do not fit get an empty rect.
pub(crate) fn box_layout(schema: &Schema, area: Rect) -> Vec<Rect> {
    let mut boxes = vec![Rect::default(); schema.tables.len()];
    let layers = layer_tables(schema);
    let max_cols = layers.iter().map(Vec::len).max().unwrap_or(1).max(1) as u16;

    let cell_width = area.width / max_cols;
    let table_width = cell_width
        .saturating_sub(4)
        .clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
        .min(cell_width);

    let mut y = area.y;
    for layer in layers {
        let row_height = layer
            .iter()
            .map(|&i| schema.tables[i].fields.len() as u16 + 2)
            .max()
            .unwrap_or(3)
            .clamp(3, MAX_BOX_HEIGHT);

        for (col, &table) in layer.iter().enumerate() {
            let x = area.x + col as u16 * cell_width + cell_width.saturating_sub(table_width) / 2;
            let width = table_width.min((area.x + area.width).saturating_sub(x));
            let height = row_height.min((area.y + area.height).saturating_sub(y));
            if width >= 3 && height >= 3 {
                boxes[table] = Rect::new(x, y, width, height);
            }
        }
        y = y.saturating_add(row_height + ROW_GAP);
    }
    boxes
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        text.to_string()
    }
}

fn render_table_box(
    frame: &mut Frame,
    area: Rect,
    table: &TableNode,
    selected: bool,
    selected_field: Option<usize>,
    placeholder: bool,
) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let border_style = if placeholder {
        Style::default().fg(Color::Red)
    } else if selected {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let title_style = if placeholder {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };

    let block = Block::default()
        .title(truncate(&table.label, area.width.saturating_sub(2) as usize))
        .title_style(title_style)
        .borders(Borders::ALL)
        .border_style(border_style);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner.height as usize;
    let overflow = table.fields.len() > visible;
    let shown = if overflow { visible.saturating_sub(1) } else { visible };
    let name_width = (inner.width as usize).saturating_sub(3 + 9);

    let mut lines = Vec::new();
    for (idx, field) in table.fields.iter().take(shown).enumerate() {
        let (marker, marker_style) = if field.is_primary {
            ("PK ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        } else if field.is_foreign {
            ("FK ", Style::default().fg(Color::Green))
        } else {
            ("   ", Style::default())
        };
        let name_style = if field.is_primary {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        let name = truncate(&field.name, name_width.max(1));
        let pad = name_width.saturating_sub(name.chars().count()) + 1;
        let mut line = Line::from(vec![
            Span::styled(marker, marker_style),
            Span::styled(name, name_style),
            Span::raw(" ".repeat(pad)),
            Span::styled(field.field_type.as_str().to_string(), Style::default().fg(Color::DarkGray)),
        ]);
        if selected_field == Some(idx) {
            line = line.patch_style(Style::default().add_modifier(Modifier::REVERSED));
        }
        lines.push(line);
    }

    if overflow {
        lines.push(Line::from(Span::styled(
            format!("… {} more", table.fields.len() - shown),
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_relationship_arrows(buf: &mut Buffer, area: Rect, schema: &Schema, boxes: &[Rect]) {
    let arrow_style = Style::default().fg(Color::LightGreen);
    let mut drawn: HashSet<(usize, usize)> = HashSet::new();

    for rel in &schema.relationships {
        let source = schema.tables.iter().position(|t| t.id == rel.source);
        let target = schema.tables.iter().position(|t| t.id == rel.target);
        let (Some(source), Some(target)) = (source, target) else {
            continue;
        };
        if source == target || boxes[source].area() == 0 || boxes[target].area() == 0 {
            continue;
        }
        if !drawn.insert((source.min(target), source.max(target))) {
            continue;
        }

        let from = boxes[source];
        let to = boxes[target];
        let start = edge_point(from, center(to));
        let end = edge_point(to, center(from));
        draw_curved_arrow(buf, area, start, end, boxes, arrow_style);
    }
}

fn center(r: Rect) -> (i32, i32) {
    (r.x as i32 + r.width as i32 / 2, r.y as i32 + r.height as i32 / 2)
}

/// Cell just outside `r` on the side facing `toward`
fn edge_point(r: Rect, toward: (i32, i32)) -> (i32, i32) {
    let (cx, cy) = center(r);
    let dx = toward.0 - cx;
    let dy = toward.1 - cy;

    if dx.abs() > dy.abs() * 2 {
        if dx > 0 {
            (r.x as i32 + r.width as i32, cy)
        } else {
            (r.x as i32 - 1, cy)
        }
    } else if dy > 0 {
        (cx, r.y as i32 + r.height as i32)
    } else {
        (cx, r.y as i32 - 1)
    }
}

/// Draw a curved arrow using bezier curve approximation
fn draw_curved_arrow(
    buf: &mut Buffer,
    area: Rect,
    (x1, y1): (i32, i32),
    (x2, y2): (i32, i32),
    boxes: &[Rect],
    style: Style,
) {
    let inside_area = |x: i32, y: i32| {
        x >= area.x as i32
            && x < (area.x + area.width) as i32
            && y >= area.y as i32
            && y < (area.y + area.height) as i32
    };
    if !inside_area(x1, y1) || !inside_area(x2, y2) {
        return;
    }

    let dx = x2 - x1;
    let dy = y2 - y1;
    let dist = ((dx * dx + dy * dy) as f64).sqrt();
    let offset = (dist * 0.5).clamp(2.0, 12.0) as i32;

    // Bend perpendicular to the dominant direction
    let (c1, c2) = if dx.abs() > dy.abs() {
        let dir = if dy >= 0 { 1 } else { -1 };
        ((x1 + dx / 3, y1 + dir * offset / 2), (x1 + 2 * dx / 3, y2 - dir * offset / 2))
    } else {
        ((x1, y1 + dy / 3), (x2, y1 + 2 * dy / 3))
    };

    let steps = ((dist as usize) * 3).clamp(30, 300);
    let mut points: Vec<(i32, i32)> = Vec::new();
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let (x, y) = cubic_bezier(
            (x1 as f64, y1 as f64),
            (c1.0 as f64, c1.1 as f64),
            (c2.0 as f64, c2.1 as f64),
            (x2 as f64, y2 as f64),
            t,
        );
        let point = (x.round() as i32, y.round() as i32);
        match points.last() {
            Some(&(px, py)) if (px, py) == point => {}
            Some(&(px, py)) => {
                // Fill gaps so the line stays continuous
                let gap = (point.0 - px).abs().max((point.1 - py).abs());
                for j in 1..gap {
                    let f = j as f64 / gap as f64;
                    points.push((
                        (px as f64 + (point.0 - px) as f64 * f).round() as i32,
                        (py as f64 + (point.1 - py) as f64 * f).round() as i32,
                    ));
                }
                points.push(point);
            }
            None => points.push(point),
        }
    }

    let last = points.len().saturating_sub(1);
    for (i, &(x, y)) in points.iter().enumerate() {
        if !inside_area(x, y) {
            continue;
        }
        let in_box = boxes.iter().any(|b| {
            x >= b.x as i32
                && x < (b.x + b.width) as i32
                && y >= b.y as i32
                && y < (b.y + b.height) as i32
        });
        if in_box {
            continue;
        }

        let (adx, ady) = if i > 0 {
            (x - points[i - 1].0, y - points[i - 1].1)
        } else {
            (0, 0)
        };
        let ch = if i == last {
            if adx.abs() > ady.abs() {
                if adx > 0 { '▶' } else { '◀' }
            } else if ady < 0 {
                '▲'
            } else {
                '▼'
            }
        } else if adx != 0 && ady != 0 {
            if (adx > 0) == (ady > 0) { '╲' } else { '╱' }
        } else if ady != 0 {
            '│'
        } else {
            '─'
        };

        let cell = buf.get_mut(x as u16, y as u16);
        let existing = cell.symbol().chars().next().unwrap_or(' ');
        if can_draw_on_cell(existing) {
            cell.set_char(ch);
            cell.set_style(style);
        }
    }
}

/// Calculate a point on a cubic bezier curve
fn cubic_bezier(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), t: f64) -> (f64, f64) {
    let mt = 1.0 - t;
    let a = mt * mt * mt;
    let b = 3.0 * mt * mt * t;
    let c = 3.0 * mt * t * t;
    let d = t * t * t;
    (
        a * p0.0 + b * p1.0 + c * p2.0 + d * p3.0,
        a * p0.1 + b * p1.1 + c * p2.1 + d * p3.1,
    )
}

fn can_draw_on_cell(ch: char) -> bool {
    matches!(ch, ' ' | '─' | '│' | '╱' | '╲' | '▶' | '◀' | '▲' | '▼')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, FieldType, Relationship};

    fn blog() -> Schema {
        Schema {
            description: None,
            tables: vec![
                TableNode::new("c", "comments").with_fields(vec![
                    Field::new("id", FieldType::Ints).primary(),
                    Field::new("post_id", FieldType::Ints).foreign("posts"),
                ]),
                TableNode::new("p", "posts").with_fields(vec![Field::new("id", FieldType::Ints).primary()]),
                TableNode::new("t", "tags"),
            ],
            relationships: vec![Relationship {
                id: "ec-p".into(),
                source: "c".into(),
                target: "p".into(),
            }],
        }
    }

    fn overlaps(a: Rect, b: Rect) -> bool {
        a.intersects(b)
    }

    #[test]
    fn referenced_tables_sit_above() {
        let boxes = box_layout(&blog(), Rect::new(0, 0, 100, 40));
        assert!(boxes[1].y < boxes[0].y);
        assert_eq!(boxes[1].y, boxes[2].y);
        assert!(!overlaps(boxes[1], boxes[2]));
        assert!(boxes.iter().all(|b| b.width >= MIN_BOX_WIDTH));
    }

    #[test]
    fn tiny_area_hides_tables() {
        let boxes = box_layout(&blog(), Rect::new(0, 0, 10, 4));
        assert_eq!(boxes.len(), 3);
        assert!(boxes[0].area() == 0);
    }

    #[test]
    fn arrow_reaches_target_edge() {
        let schema = blog();
        let area = Rect::new(0, 0, 100, 30);
        let boxes = box_layout(&schema, area);
        let mut buf = Buffer::empty(area);
        draw_relationship_arrows(&mut buf, area, &schema, &boxes);

        let arrows = buf
            .content
            .iter()
            .filter(|c| c.symbol() == "▲")
            .count();
        assert_eq!(arrows, 1);
    }

    #[test]
    fn truncates_by_characters() {
        assert_eq!(truncate("ñandú_ñandú", 6), "ñandú…");
        assert_eq!(truncate("id", 6), "id");
    }
}
