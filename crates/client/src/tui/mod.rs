mod screens;

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
    KeyboardEnhancementFlags, KeyModifiers, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use cubestorm::{GameConfig, NetConfig, Session, SessionMode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::game::{self, Term};
use crate::lan;

use screens::{MENU_ITEMS, Screen, ScreenContext};

/// Everything needed to start a session from the menu.
pub struct Settings {
    pub game: GameConfig,
    pub net: NetConfig,
    pub bind: IpAddr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    Start(SessionMode),
    ChangeScreen(Screen),
}

pub struct Tui {
    terminal: Term,
    settings: Settings,
    screen: Screen,
    join_input: String,
    message: Option<String>,
    selected_index: usize,
    release_events: bool,
    lan_ip: Option<IpAddr>,
    should_quit: bool,
}

impl Tui {
    pub fn new(settings: Settings) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;

        let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        log::debug!("key release events supported: {}", release_events);

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            settings,
            screen: Screen::MainMenu,
            join_input: String::new(),
            message: None,
            selected_index: 0,
            release_events,
            lan_ip: lan::local_ip(),
            should_quit: false,
        })
    }

    pub fn run(&mut self, direct: Option<SessionMode>) -> io::Result<()> {
        if let Some(mode) = direct {
            self.play(mode)?;
        }

        while !self.should_quit {
            self.draw()?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = self.handle_key(key.code, key.modifiers);
                        self.process_action(action)?;
                    }
                }
            }
        }

        Ok(())
    }

    fn draw(&mut self) -> io::Result<()> {
        let screen = self.screen;
        let ctx = ScreenContext {
            selected: self.selected_index,
            join_input: &self.join_input,
            message: self.message.as_deref(),
        };

        self.terminal.draw(|frame| {
            screens::render(frame, screen, &ctx);
        })?;

        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> Action {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.screen {
            Screen::MainMenu => self.handle_main_menu_key(code),
            Screen::JoinPrompt => self.handle_join_key(code),
            Screen::Connecting => Action::None,
            Screen::Error => match code {
                KeyCode::Enter | KeyCode::Esc => Action::ChangeScreen(Screen::MainMenu),
                _ => Action::None,
            },
            Screen::GameOver(_) => match code {
                KeyCode::Enter | KeyCode::Esc => Action::ChangeScreen(Screen::MainMenu),
                KeyCode::Char('q') => Action::Quit,
                _ => Action::None,
            },
        }
    }

    fn handle_main_menu_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = self.selected_index.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_index = (self.selected_index + 1).min(MENU_ITEMS.len() - 1);
                Action::None
            }
            KeyCode::Enter => match self.selected_index {
                0 => Action::Start(SessionMode::Local),
                1 => Action::Start(SessionMode::Host {
                    bind: SocketAddr::new(self.settings.bind, self.settings.net.port),
                }),
                2 => Action::ChangeScreen(Screen::JoinPrompt),
                3 => Action::Quit,
                _ => Action::None,
            },
            KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
            _ => Action::None,
        }
    }

    fn handle_join_key(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Esc => {
                self.message = None;
                Action::ChangeScreen(Screen::MainMenu)
            }
            KeyCode::Enter => {
                let target = self.join_input.trim();
                if target.is_empty() {
                    self.message = Some("Enter the host's IP address".to_string());
                    Action::None
                } else {
                    self.message = None;
                    Action::Start(SessionMode::Join {
                        target: target.to_string(),
                    })
                }
            }
            KeyCode::Backspace => {
                self.join_input.pop();
                Action::None
            }
            KeyCode::Char(c) => {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '-') {
                    self.join_input.push(c);
                }
                Action::None
            }
            _ => Action::None,
        }
    }

    fn process_action(&mut self, action: Action) -> io::Result<()> {
        match action {
            Action::None => {}
            Action::Quit => {
                self.should_quit = true;
            }
            Action::Start(mode) => {
                self.play(mode)?;
            }
            Action::ChangeScreen(screen) => {
                if screen == Screen::MainMenu {
                    self.message = None;
                }
                self.screen = screen;
                self.selected_index = 0;
            }
        }

        Ok(())
    }

    fn play(&mut self, mode: SessionMode) -> io::Result<()> {
        if let SessionMode::Join { target } = &mode {
            self.join_input = target.clone();
            self.screen = Screen::Connecting;
            self.draw()?;
        }

        let tick_rate = self.settings.net.tick_rate;
        let mut session = match Session::start(
            mode,
            self.settings.game.clone(),
            self.settings.net.clone(),
        ) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("could not start session: {}", e);
                self.message = Some(e.to_string());
                self.screen = Screen::Error;
                return Ok(());
            }
        };

        let outcome = game::run(
            &mut self.terminal,
            &mut session,
            tick_rate,
            self.lan_ip,
            self.release_events,
        );
        drop(session);

        self.screen = Screen::GameOver(outcome?);
        self.selected_index = 0;
        Ok(())
    }

    pub fn restore_terminal(&mut self) -> io::Result<()> {
        if self.release_events {
            execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
        }
        terminal::disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen,
            cursor::Show
        )?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

pub fn run(settings: Settings, direct: Option<SessionMode>) -> io::Result<()> {
    let mut tui = Tui::new(settings)?;
    let result = tui.run(direct);
    tui.restore_terminal()?;
    result
}
