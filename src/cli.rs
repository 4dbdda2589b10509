#![cfg(feature = "std")]

//! Line-oriented terminal front end: command parsing and rendering.
//!
//! Coordinates are a column letter followed by a 1-based row, `A1` being
//! the top-left cell (board row 0, column 0).

use std::fmt::Write as _;

use crate::board::Grid;
use crate::config::BOARD_SIZE;
use crate::engine::GameStatus;
use crate::events::GameEvent;
use crate::piece::{Color, Rank};

pub fn coord_to_string(row: usize, col: usize) -> String {
    let col = (b'A' + col as u8) as char;
    format!("{}{}", col, row + 1)
}

pub fn parse_coord(input: &str) -> Option<(usize, usize)> {
    let input = input.trim();
    if input.len() < 2 {
        return None;
    }
    let mut chars = input.chars();
    let col_ch = chars.next()?.to_ascii_uppercase();
    if !col_ch.is_ascii_uppercase() {
        return None;
    }
    let col = (col_ch as u8 - b'A') as usize;
    let row: usize = chars.as_str().parse().ok()?;
    if row == 0 || row > BOARD_SIZE || col >= BOARD_SIZE {
        return None;
    }
    Some((row - 1, col))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Place { row: usize, col: usize, rank: Rank },
    Clear { row: usize, col: usize },
    /// Random placement of everything not yet placed.
    Auto,
    /// Deterministic placement of everything not yet placed.
    Fill,
    Available,
    Ready,
    Move { from: (usize, usize), to: (usize, usize) },
    Chat(String),
    Board,
    Quit,
    Help,
}

pub const HELP: &str = "\
Commands:
  place <cell> <rank>   put a piece in your setup band (e.g. place A7 marshal)
  clear <cell>          take a piece back out of your setup
  auto                  place the remaining pieces randomly
  fill                  place the remaining pieces in order
  avail                 list pieces still to place
  ready                 send your setup to the opponent
  move <from> <to>      move a piece (e.g. move B7 B6)
  chat <text>           talk to your opponent
  board                 redraw the board
  quit                  end the game
  help                  show this list";

/// Parse one input line. Errors are short messages meant for the user.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();
    let cell = |arg: Option<&&str>| {
        arg.and_then(|a| parse_coord(a))
            .ok_or_else(|| format!("expected a cell like A1, got {:?}", arg.copied().unwrap_or("")))
    };
    match word.to_ascii_lowercase().as_str() {
        "place" | "p" => {
            let (row, col) = cell(args.first())?;
            let rank = args
                .get(1)
                .ok_or_else(|| "missing rank".to_string())?
                .parse::<Rank>()
                .map_err(|e| e.to_string())?;
            Ok(Command::Place { row, col, rank })
        }
        "clear" => {
            let (row, col) = cell(args.first())?;
            Ok(Command::Clear { row, col })
        }
        "auto" => Ok(Command::Auto),
        "fill" => Ok(Command::Fill),
        "avail" | "available" => Ok(Command::Available),
        "ready" => Ok(Command::Ready),
        "move" | "m" => Ok(Command::Move {
            from: cell(args.first())?,
            to: cell(args.get(1))?,
        }),
        "chat" | "say" => {
            if rest.is_empty() {
                return Err("nothing to say".into());
            }
            Ok(Command::Chat(rest.to_string()))
        }
        "board" | "b" => Ok(Command::Board),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        "help" | "?" => Ok(Command::Help),
        "" => Err("empty command".into()),
        other => Err(format!("unknown command '{}', try help", other)),
    }
}

/// Draw `grid` as seen by `viewer`: own pieces by symbol, opponent pieces
/// hidden as `?`.
pub fn render_board(grid: &Grid, viewer: Color) -> String {
    let mut out = String::from("   ");
    for c in 0..BOARD_SIZE {
        let _ = write!(out, " {}", (b'A' + c as u8) as char);
    }
    out.push('\n');
    for (r, row) in grid.iter().enumerate() {
        let _ = write!(out, "{:2} ", r + 1);
        for piece in row {
            let ch = match piece.rank {
                Rank::Empty | Rank::Lake => piece.rank.symbol(),
                _ if piece.color == viewer => piece.rank.symbol(),
                _ => '?',
            };
            let _ = write!(out, " {}", ch);
        }
        out.push('\n');
    }
    out
}

/// One line describing `event` for `me`, or `None` if it needs no text.
pub fn render_event(event: &GameEvent, me: Color) -> Option<String> {
    match event {
        GameEvent::Setup(msg) if msg.color != me => Some(format!("{} has deployed.", msg.color)),
        GameEvent::Setup(_) | GameEvent::Position(_) => None,
        GameEvent::BattleStarted { first } => Some(format!("Battle begins. {} moves first.", first)),
        GameEvent::TurnChanged { my_turn: true } => Some("Your move.".into()),
        GameEvent::TurnChanged { my_turn: false } => Some("Waiting for opponent...".into()),
        GameEvent::Chat(msg) => {
            let who = if msg.color == me { "you" } else { "opponent" };
            Some(format!("[{}] {}", who, msg.text))
        }
        GameEvent::GameOver { status } => Some(match status {
            GameStatus::Won(color) if *color == me => "You win!".to_string(),
            GameStatus::Won(color) => format!("{} wins.", color),
            GameStatus::Draw => "Draw: neither army can continue.".to_string(),
            GameStatus::Abandoned => "Game ended.".to_string(),
            GameStatus::InProgress => return None,
        }),
        GameEvent::Disconnected { reason } => Some(format!("Disconnected: {}", reason)),
    }
}

/// Remaining setup pieces as `name xN` pairs, skipping exhausted ranks.
pub fn render_available(counts: &[(Rank, u8)]) -> String {
    let parts: Vec<String> = counts
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(rank, n)| format!("{} x{}", rank, n))
        .collect();
    if parts.is_empty() {
        "all pieces placed".to_string()
    } else {
        parts.join(", ")
    }
}
