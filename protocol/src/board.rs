//! GTP coordinate conversion.
//!
//! This is deliberately narrow: it knows how to turn a zero-indexed board
//! coordinate into the text a GTP engine expects on `play`/`genmove` lines,
//! and back. It does not know anything about board rules, captures, or
//! legality — that lives in the (out of scope) move-loop orchestration.

use serde::{Deserialize, Serialize};

/// The 25-letter GTP column alphabet. `i` is skipped to avoid confusion with
/// `1` in handwritten game records, a convention inherited from Go record
/// keeping that GTP carries forward.
const GTP_COLUMNS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// A stone color, as referenced by `play`/`genmove`/`time_left` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    pub fn gtp_str(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
    }

    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }
}

/// A single on-board coordinate, zero-indexed from the bottom-left corner
/// (column 0 = `A`/`a`, row 0 = the row GTP calls `1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub x: u8,
    pub y: u8,
}

/// A move an engine can play or be told about: a placed stone, a pass, or a
/// resignation. `resign` is only ever produced by an engine, never sent to
/// one, but it is represented here so `genmove` responses round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Play(Vertex),
    Pass,
    Resign,
}

/// Converts a zero-indexed column into its GTP letter (`0 -> "A"`, skipping
/// `I`). Valid for `index` in `0..24` (covers board sizes up to 25).
pub fn gtp_column(index: u8) -> char {
    GTP_COLUMNS[index as usize] as char
}

/// Inverse of [`gtp_column`]. Accepts either case. Returns `None` for `I`/`i`
/// or any character outside the alphabet.
pub fn column_from_gtp(letter: char) -> Option<u8> {
    let upper = letter.to_ascii_uppercase() as u8;
    GTP_COLUMNS.iter().position(|&c| c == upper).map(|i| i as u8)
}

impl Vertex {
    /// Renders as a GTP vertex string, e.g. `{x: 0, y: 0} -> "A1"`.
    pub fn to_gtp(self) -> String {
        format!("{}{}", gtp_column(self.x), self.y + 1)
    }

    /// Parses a GTP vertex string such as `"Q16"`. Row numbers are 1-based in
    /// GTP text and 0-based internally.
    pub fn from_gtp(text: &str) -> Option<Vertex> {
        let mut chars = text.chars();
        let column_char = chars.next()?;
        let x = column_from_gtp(column_char)?;
        let row_text: String = chars.collect();
        let row: u32 = row_text.parse().ok()?;
        if row == 0 {
            return None;
        }
        Some(Vertex {
            x,
            y: (row - 1) as u8,
        })
    }
}

impl Move {
    /// Renders the move as the text GTP uses in `play`/`genmove` exchanges.
    pub fn to_gtp(self) -> String {
        match self {
            Move::Play(vertex) => vertex.to_gtp(),
            Move::Pass => "pass".to_string(),
            Move::Resign => "resign".to_string(),
        }
    }

    /// Parses the body of a `genmove` success response.
    pub fn from_gtp(text: &str) -> Option<Move> {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("pass") {
            return Some(Move::Pass);
        }
        if trimmed.eq_ignore_ascii_case("resign") {
            return Some(Move::Resign);
        }
        Vertex::from_gtp(trimmed).map(Move::Play)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gtp_column_round_trips_and_skips_i() {
        for index in 0..19u8 {
            let letter = gtp_column(index);
            assert_ne!(letter, 'I');
            assert_eq!(column_from_gtp(letter), Some(index));
        }
    }

    #[test]
    fn vertex_round_trips_on_a_19x19_board() {
        for x in 0..19u8 {
            for y in 0..19u8 {
                let vertex = Vertex { x, y };
                let text = vertex.to_gtp();
                assert_eq!(Vertex::from_gtp(&text), Some(vertex));
            }
        }
    }

    #[test]
    fn pass_round_trips() {
        assert_eq!(Move::Pass.to_gtp(), "pass");
        assert_eq!(Move::from_gtp("pass"), Some(Move::Pass));
        assert_eq!(Move::from_gtp("PASS"), Some(Move::Pass));
    }

    #[test]
    fn resign_is_accepted_from_an_engine() {
        assert_eq!(Move::from_gtp("resign"), Some(Move::Resign));
    }

    #[test]
    fn column_i_is_rejected() {
        assert_eq!(column_from_gtp('I'), None);
        assert_eq!(column_from_gtp('i'), None);
    }
}
