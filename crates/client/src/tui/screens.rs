use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};

use cubestorm::SessionEnd;

use crate::game::Outcome;
use crate::render::centered_rect;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    MainMenu,
    JoinPrompt,
    Connecting,
    Error,
    GameOver(Outcome),
}

pub const MENU_ITEMS: [&str; 4] = ["Single Player", "Host LAN Game", "Join LAN Game", "Quit"];

pub struct ScreenContext<'a> {
    pub selected: usize,
    pub join_input: &'a str,
    pub message: Option<&'a str>,
}

pub fn render(frame: &mut Frame, screen: Screen, ctx: &ScreenContext) {
    let area = frame.area();

    let block = Block::default()
        .title(" Cubestorm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([Constraint::Min(0)])
        .split(area)[0];

    match screen {
        Screen::MainMenu => render_main_menu(frame, inner, ctx.selected),
        Screen::JoinPrompt => render_join_prompt(frame, inner, ctx.join_input, ctx.message),
        Screen::Connecting => render_connecting(frame, inner, ctx.join_input),
        Screen::Error => render_error(frame, inner, ctx.message.unwrap_or("Something went wrong")),
        Screen::GameOver(outcome) => render_game_over(frame, inner, outcome),
    }
}

fn render_main_menu(frame: &mut Frame, area: Rect, selected: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(2),
        ])
        .split(area);

    let title = r#"
   ____      _               _
  / ___|   _| |__   ___  ___| |_ ___  _ __ _ __ ___
 | |  | | | | '_ \ / _ \/ __| __/ _ \| '__| '_ ` _ \
 | |__| |_| | |_) |  __/\__ \ || (_) | |  | | | | | |
  \____\__,_|_.__/ \___||___/\__\___/|_|  |_| |_| |_|
"#;

    let title_widget = Paragraph::new(title)
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    frame.render_widget(title_widget, chunks[0]);

    let menu_items: Vec<ListItem> = MENU_ITEMS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let item = ListItem::new(format!("  {}", label));
            if i == selected {
                item.style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                item.style(Style::default().fg(Color::White))
            }
        })
        .collect();

    let menu = List::new(menu_items).block(
        Block::default()
            .title(" Menu ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    let menu_area = centered_rect(40, 8, chunks[2]);
    frame.render_widget(menu, menu_area);

    let help = Paragraph::new("↑↓ Navigate  Enter Select  Q Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[3]);
}

fn render_join_prompt(frame: &mut Frame, area: Rect, input: &str, error: Option<&str>) {
    let dialog_area = centered_rect(50, 10, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Join LAN Game ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(dialog_area);

    let label = Paragraph::new("Host address:").style(Style::default().fg(Color::White));
    frame.render_widget(label, inner[0]);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let input_text = Paragraph::new(format!("{}_", input))
        .style(Style::default().fg(Color::White))
        .block(input_block);
    frame.render_widget(input_text, inner[1]);

    if let Some(err) = error {
        let error_text = Paragraph::new(err)
            .style(Style::default().fg(Color::Red))
            .alignment(Alignment::Center);
        frame.render_widget(error_text, inner[2]);
    }

    let help = Paragraph::new("Enter Join  Esc Cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[3]);
}

fn render_connecting(frame: &mut Frame, area: Rect, target: &str) {
    let dialog_area = centered_rect(40, 7, area);
    frame.render_widget(Clear, dialog_area);

    let status = Paragraph::new(format!("Connecting to {}\n\nPlease wait...", target))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(" Connecting ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    frame.render_widget(status, dialog_area);
}

fn render_error(frame: &mut Frame, area: Rect, message: &str) {
    let dialog_area = centered_rect(56, 8, area);
    frame.render_widget(Clear, dialog_area);

    let dialog = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(dialog_area);

    let text = Paragraph::new(message)
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(ratatui::widgets::Wrap { trim: true });
    frame.render_widget(text, inner[0]);

    let help = Paragraph::new("Enter/Esc Back to menu")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[1]);
}

fn render_game_over(frame: &mut Frame, area: Rect, outcome: Outcome) {
    let dialog_area = centered_rect(40, 10, area);
    frame.render_widget(Clear, dialog_area);

    let accent = match outcome.end {
        SessionEnd::Survived => Color::Green,
        SessionEnd::Fallen => Color::Red,
        SessionEnd::Quit | SessionEnd::Disconnected => Color::Yellow,
    };

    let dialog = Block::default()
        .title(" Game Over ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent));
    frame.render_widget(dialog, dialog_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(dialog_area);

    let lines = vec![
        Line::from(Span::styled(
            outcome.end.headline(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Score  ", Style::default().fg(Color::Gray)),
            Span::styled(outcome.score.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::styled("Time   ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.1}s", outcome.seconds),
                Style::default().fg(Color::White),
            ),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner[0]);

    let help = Paragraph::new("Enter Menu  Q Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(help, inner[1]);
}
