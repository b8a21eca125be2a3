use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use futures_util::StreamExt;
use tokio::time::Instant;

use crate::arbiter::ModeArbiter;
use crate::error::Result;
use crate::game::state::{Direction, GameState};

enum Action {
    Quit,
    Reset,
    Steer(Direction),
}

pub async fn run(mut arbiter: ModeArbiter) -> Result<()> {
    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let result = event_loop(&mut stdout, &mut arbiter).await;
    execute!(stdout, Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

async fn event_loop(stdout: &mut Stdout, arbiter: &mut ModeArbiter) -> Result<()> {
    let mut events = EventStream::new();
    let mut show_game_over = false;
    let mut prev_over = false;

    loop {
        // the overlay is edge-triggered: shown once per is-over transition,
        // cleared by reset, not re-shown while the flag stays up
        let over = arbiter.game_state().map(|s| s.game_over).unwrap_or(false);
        if over && !prev_over {
            show_game_over = true;
        }
        prev_over = over;

        render(stdout, arbiter, show_game_over)?;

        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event.transpose()? else { break };
                if let Event::Key(key) = event {
                    if key.kind == KeyEventKind::Press {
                        match key_action(&key) {
                            Some(Action::Quit) => break,
                            Some(Action::Reset) => {
                                show_game_over = false;
                                arbiter.send_reset(Instant::now());
                            }
                            Some(Action::Steer(direction)) if !over => {
                                arbiter.send_direction(direction);
                            }
                            _ => {}
                        }
                    }
                }
            }
            _ = arbiter.drive() => {}
        }
    }
    Ok(())
}

fn key_action(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reset),
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Action::Steer(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(Action::Steer(Direction::Down))
        }
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(Action::Steer(Direction::Left))
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(Action::Steer(Direction::Right))
        }
        _ => None,
    }
}

fn render(stdout: &mut Stdout, arbiter: &ModeArbiter, show_game_over: bool) -> Result<()> {
    queue!(stdout, Clear(ClearType::All), MoveTo(0, 0), ResetColor)?;

    let Some(state) = arbiter.game_state() else {
        queue!(
            stdout,
            Print("connecting to server..."),
            MoveTo(0, 1),
            Print("local mode starts in a few seconds if no backend is reachable"),
        )?;
        stdout.flush()?;
        return Ok(());
    };

    let badge = if arbiter.is_using_fallback() {
        "LOCAL MODE"
    } else if !arbiter.is_connected() {
        "RECONNECTING..."
    } else {
        ""
    };
    queue!(
        stdout,
        Print(format!("SNAKE   score {:>4}   {badge}", state.score))
    )?;

    draw_grid(stdout, state)?;

    let below = state.grid_height as u16 + 3;
    if state.game_over && show_game_over {
        queue!(
            stdout,
            MoveTo(0, below),
            SetForegroundColor(Color::Red),
            Print(format!("GAME OVER - final score {}", state.score)),
            ResetColor,
            MoveTo(0, below + 1),
            Print("press r to play again"),
        )?;
    } else {
        queue!(
            stdout,
            MoveTo(0, below),
            Print("arrows or wasd to steer, r to reset, q to quit"),
        )?;
    }
    stdout.flush()?;
    Ok(())
}

fn draw_grid(stdout: &mut Stdout, state: &GameState) -> Result<()> {
    let border: String = format!("+{}+", "-".repeat(state.grid_width as usize * 2));
    queue!(stdout, MoveTo(0, 1), Print(&border))?;
    for y in 0..state.grid_height {
        queue!(stdout, MoveTo(0, 2 + y as u16), Print("|"))?;
        for x in 0..state.grid_width {
            let cell = (x, y);
            let color = if cell == state.head() {
                Some(Color::Green)
            } else if state.snake.contains(&cell) {
                Some(Color::DarkGreen)
            } else if cell == state.food {
                Some(Color::Red)
            } else {
                None
            };
            match color {
                Some(color) => {
                    queue!(stdout, SetBackgroundColor(color), Print("  "), ResetColor)?;
                }
                None => queue!(stdout, Print("  "))?,
            }
        }
        queue!(stdout, Print("|"))?;
    }
    queue!(
        stdout,
        MoveTo(0, 2 + state.grid_height as u16),
        Print(&border)
    )?;
    Ok(())
}
