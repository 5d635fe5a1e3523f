mod input;

use std::io;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use cubestorm::{FixedTimestep, RenderView, Session, SessionEnd};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;

pub use input::{Command, Input};

use crate::render::{self, Hud};

const NOTICE_DURATION: Duration = Duration::from_millis(900);

pub type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// How a finished game is summarised on the game-over screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub end: SessionEnd,
    pub score: u32,
    pub seconds: f32,
}

impl Outcome {
    fn from_view(view: &RenderView) -> Self {
        Self {
            end: view.status.end().unwrap_or(SessionEnd::Quit),
            score: view.score,
            seconds: view.elapsed,
        }
    }
}

/// Drives `session` at `tick_rate` until it ends or the player quits.
pub fn run(
    terminal: &mut Term,
    session: &mut Session,
    tick_rate: u32,
    lan_ip: Option<IpAddr>,
    release_events: bool,
) -> io::Result<Outcome> {
    let mut timestep = FixedTimestep::new(tick_rate);
    let frame_budget = Duration::from_secs_f32(timestep.dt());
    let mut input = Input::new(release_events);
    let mut arena = Rect::default();
    let mut last_frame = Instant::now();
    let mut notice: Option<(String, Instant)> = None;

    let invite = lan_ip
        .zip(session.local_addr())
        .map(|(ip, addr)| format!("{}:{}", ip, addr.port()));

    loop {
        let wait = frame_budget.saturating_sub(last_frame.elapsed());
        if event::poll(wait)? {
            loop {
                let now = Instant::now();
                match event::read()? {
                    Event::Key(key) => {
                        if input.handle_key(key, now) == Command::Quit {
                            session.quit();
                            return Ok(Outcome::from_view(&session.view()));
                        }
                    }
                    Event::Mouse(mouse) => {
                        let view = session.view();
                        let target = render::cell_to_arena(mouse.column, mouse.row, arena, view.arena);
                        let origin = view
                            .local_player()
                            .filter(|p| p.alive)
                            .map(|p| p.position);
                        input.handle_mouse(mouse, target, origin);
                    }
                    _ => {}
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }

        let now = Instant::now();
        timestep.accumulate(now.duration_since(last_frame).as_secs_f32());
        last_frame = now;

        while timestep.consume_tick() {
            let intent = input.intent(now);
            match session.tick(&intent) {
                Ok(status) => {
                    if let Some(text) = session.last_events().and_then(render::notice) {
                        notice = Some((text, now + NOTICE_DURATION));
                    }
                    if status.is_ended() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("simulation stopped: {}", e);
                    session.quit();
                    break;
                }
            }
        }

        let view = session.view();
        let hud = Hud {
            role: session.role_label(),
            link: session.connection_state().map(|s| s.label()),
            invite: invite.clone(),
            stats: session.stats().cloned(),
            notice: notice
                .as_ref()
                .filter(|(_, until)| now < *until)
                .map(|(text, _)| text.clone()),
        };
        terminal.draw(|frame| {
            arena = render::draw(frame, &view, &hud);
        })?;

        if view.status.is_ended() {
            return Ok(Outcome::from_view(&view));
        }
    }
}
