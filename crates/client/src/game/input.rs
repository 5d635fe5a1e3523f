use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use cubestorm::Intent;
use glam::Vec2;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Held: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const SPRINT = 1 << 4;
    }
}

/// Terminals that never report key releases get a key treated as held for this long
/// after its last press or auto-repeat.
const HOLD_WINDOW: Duration = Duration::from_millis(180);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
}

/// Turns terminal key and mouse events into the per-tick `Intent`.
pub struct Input {
    held: Held,
    expires: [Option<Instant>; 5],
    release_events: bool,
    fire: Option<Vec2>,
}

impl Input {
    pub fn new(release_events: bool) -> Self {
        Self {
            held: Held::empty(),
            expires: [None; 5],
            release_events,
            fire: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> Command {
        let pressed = key.kind != KeyEventKind::Release;

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Command::Quit;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc if pressed => {
                return Command::Quit;
            }
            KeyCode::Up if pressed => self.fire = Some(Vec2::NEG_Y),
            KeyCode::Down if pressed => self.fire = Some(Vec2::Y),
            KeyCode::Left if pressed => self.fire = Some(Vec2::NEG_X),
            KeyCode::Right if pressed => self.fire = Some(Vec2::X),
            KeyCode::Char(c) => {
                let Some(flag) = movement_flag(c) else {
                    return Command::None;
                };
                let sprint = c.is_ascii_uppercase() || key.modifiers.contains(KeyModifiers::SHIFT);
                self.set(flag, pressed, now);
                if pressed || self.release_events {
                    self.set(Held::SPRINT, sprint && pressed, now);
                }
            }
            _ => {}
        }

        Command::None
    }

    /// A left click or drag fires from `origin` toward the arena point under the cursor.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, target: Option<Vec2>, origin: Option<Vec2>) {
        let clicked = matches!(
            mouse.kind,
            MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left)
        );
        if !clicked {
            return;
        }

        if let (Some(target), Some(origin)) = (target, origin) {
            let direction = (target - origin).normalize_or_zero();
            if direction != Vec2::ZERO {
                self.fire = Some(direction);
            }
        }
    }

    /// Intent for the next tick. A fire request is consumed by the call.
    pub fn intent(&mut self, now: Instant) -> Intent {
        if !self.release_events {
            self.expire(now);
        }

        let mut movement = Vec2::ZERO;
        if self.held.contains(Held::UP) {
            movement.y -= 1.0;
        }
        if self.held.contains(Held::DOWN) {
            movement.y += 1.0;
        }
        if self.held.contains(Held::LEFT) {
            movement.x -= 1.0;
        }
        if self.held.contains(Held::RIGHT) {
            movement.x += 1.0;
        }

        let mut intent = Intent::moving(movement).with_sprint(self.held.contains(Held::SPRINT));
        if let Some(direction) = self.fire.take() {
            intent = intent.with_fire(direction);
        }
        intent
    }

    fn set(&mut self, flag: Held, pressed: bool, now: Instant) {
        let slot = flag.bits().trailing_zeros() as usize;
        if pressed {
            self.held.insert(flag);
            self.expires[slot] = Some(now + HOLD_WINDOW);
        } else {
            self.held.remove(flag);
            self.expires[slot] = None;
        }
    }

    fn expire(&mut self, now: Instant) {
        for flag in Held::all().iter() {
            let slot = flag.bits().trailing_zeros() as usize;
            if self.expires[slot].is_some_and(|deadline| now >= deadline) {
                self.held.remove(flag);
                self.expires[slot] = None;
            }
        }
    }
}

fn movement_flag(c: char) -> Option<Held> {
    match c.to_ascii_lowercase() {
        'w' => Some(Held::UP),
        's' => Some(Held::DOWN),
        'a' => Some(Held::LEFT),
        'd' => Some(Held::RIGHT),
        _ => None,
    }
}
