use cubestorm::geometry::Bounds;
use cubestorm::{NetworkStats, RenderView, SessionStatus, TickEvents};
use glam::Vec2;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Context, Rectangle};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};

/// Session details shown around the arena.
pub struct Hud {
    pub role: &'static str,
    pub link: Option<&'static str>,
    pub invite: Option<String>,
    pub stats: Option<NetworkStats>,
    pub notice: Option<String>,
}

/// Short HUD line for a tick worth calling out.
pub fn notice(events: &TickEvents) -> Option<String> {
    if events.is_empty() {
        return None;
    }
    if !events.kills.is_empty() {
        Some(format!("+{} downed", events.kills.len()))
    } else if !events.spawned.is_empty() {
        Some("enemy incoming".to_string())
    } else {
        None
    }
}

/// Draws one frame and returns the screen area the arena occupies, for mouse mapping.
pub fn draw(frame: &mut Frame, view: &RenderView, hud: &Hud) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], view, hud);
    let arena = render_arena(frame, chunks[1], view);
    render_help(frame, chunks[2]);

    if view.status == SessionStatus::WaitingForPeer {
        render_waiting(frame, arena, hud);
    }

    arena
}

fn render_header(frame: &mut Frame, area: Rect, view: &RenderView, hud: &Hud) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(28)])
        .split(area);

    let mut spans = vec![
        Span::styled("Score ", Style::default().fg(Color::Gray)),
        Span::styled(
            view.score.to_string(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Enemies ", Style::default().fg(Color::Gray)),
        Span::styled(view.enemy_count.to_string(), Style::default().fg(Color::Red)),
        Span::styled("  Time ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{:.1}s", view.elapsed),
            Style::default().fg(Color::White),
        ),
    ];
    if let Some(notice) = &hud.notice {
        spans.push(Span::styled(
            format!("  {}", notice),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(link) = hud.link {
        spans.push(Span::styled(
            format!("  {} ", hud.role),
            Style::default().fg(Color::Gray),
        ));
        spans.push(Span::styled(link, Style::default().fg(Color::Cyan)));
    }
    if let Some(stats) = &hud.stats {
        spans.push(Span::styled(
            format!("  {}/{} frames", stats.frames_sent, stats.frames_received),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .title(" Cubestorm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), columns[0]);

    let energy = view.local_player().map_or(0.0, |p| p.energy_fraction);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Energy ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(f64::from(energy).clamp(0.0, 1.0))
        .label(format!("{:.0}%", energy * 100.0));
    frame.render_widget(gauge, columns[1]);
}

fn render_arena(frame: &mut Frame, area: Rect, view: &RenderView) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    let arena = view.arena;

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([0.0, f64::from(arena.width)])
        .y_bounds([0.0, f64::from(arena.height)])
        .paint(|ctx| {
            for position in &view.projectiles {
                draw_box(ctx, arena, *position, view.projectile_size, Color::Yellow);
            }
            for position in &view.enemies {
                draw_box(ctx, arena, *position, view.enemy_size, Color::Red);
            }
            for player in &view.players {
                let color = match (player.alive, player.local) {
                    (false, _) => Color::DarkGray,
                    (true, true) => Color::Cyan,
                    (true, false) => Color::Magenta,
                };
                draw_box(ctx, arena, player.position, view.player_size, color);
            }
        });
    frame.render_widget(canvas, area);

    inner
}

/// The canvas y axis points up; world y points down.
fn draw_box(ctx: &mut Context, arena: Bounds, center: Vec2, size: f32, color: Color) {
    let half = f64::from(size) * 0.5;
    ctx.draw(&Rectangle {
        x: f64::from(center.x) - half,
        y: f64::from(arena.height - center.y) - half,
        width: f64::from(size),
        height: f64::from(size),
        color,
    });
}

fn render_waiting(frame: &mut Frame, area: Rect, hud: &Hud) {
    let dialog = centered_rect(46, 7, area);
    frame.render_widget(Clear, dialog);

    let mut lines = vec![Line::from(Span::styled(
        "Waiting for a partner...",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(invite) = &hud.invite {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Join at ", Style::default().fg(Color::Gray)),
            Span::styled(invite.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .title(format!(" {} ", hud.role))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(paragraph, dialog);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new("WASD Move  Shift Sprint  Arrows/Click Fire  Q Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, area);
}

/// Maps a terminal cell inside `area` to the arena point under its centre.
pub fn cell_to_arena(column: u16, row: u16, area: Rect, arena: Bounds) -> Option<Vec2> {
    if area.width == 0
        || area.height == 0
        || column < area.x
        || row < area.y
        || column >= area.x + area.width
        || row >= area.y + area.height
    {
        return None;
    }

    let fx = (f32::from(column - area.x) + 0.5) / f32::from(area.width);
    let fy = (f32::from(row - area.y) + 0.5) / f32::from(area.height);
    Some(Vec2::new(fx * arena.width, fy * arena.height))
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubestorm::{HOST_PLAYER, Kill};

    #[test]
    fn test_cells_map_to_arena_points() {
        let area = Rect::new(10, 5, 80, 30);
        let arena = Bounds::new(800.0, 600.0);

        let top_left = cell_to_arena(10, 5, area, arena).unwrap();
        assert!(top_left.abs_diff_eq(Vec2::new(5.0, 10.0), 1e-3));

        let bottom_right = cell_to_arena(89, 34, area, arena).unwrap();
        assert!(bottom_right.abs_diff_eq(Vec2::new(795.0, 590.0), 1e-3));
    }

    #[test]
    fn test_kills_outrank_spawns_in_the_notice() {
        let mut events = TickEvents::new(4);
        assert_eq!(notice(&events), None);

        events.fired.push(1);
        assert_eq!(notice(&events), None);

        events.spawned.push(7);
        assert_eq!(notice(&events).as_deref(), Some("enemy incoming"));

        events.kills.push(Kill {
            projectile: 1,
            enemy: 3,
            owner: HOST_PLAYER,
        });
        events.kills.push(Kill {
            projectile: 2,
            enemy: 5,
            owner: HOST_PLAYER,
        });
        assert_eq!(notice(&events).as_deref(), Some("+2 downed"));
    }

    #[test]
    fn test_cells_outside_the_arena_are_ignored() {
        let area = Rect::new(10, 5, 80, 30);
        let arena = Bounds::new(800.0, 600.0);

        assert!(cell_to_arena(9, 10, area, arena).is_none());
        assert!(cell_to_arena(50, 35, area, arena).is_none());
        assert!(cell_to_arena(0, 0, Rect::default(), arena).is_none());
    }
}
