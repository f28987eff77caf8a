//! Rock-paper-scissors moves and round outcomes

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// A move a player can submit. Serialized as its wire number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum Move {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// The move this one defeats
    pub fn beats(self) -> Move {
        match self {
            Move::Rock => Move::Scissors,
            Move::Scissors => Move::Paper,
            Move::Paper => Move::Rock,
        }
    }

    /// Outcome of playing `self` against `other`
    pub fn against(self, other: Move) -> Outcome {
        if self == other {
            Outcome::Draw
        } else if self.beats() == other {
            Outcome::Win
        } else {
            Outcome::Lose
        }
    }

    /// Human-readable label used in round logs
    pub fn label(self) -> &'static str {
        match self {
            Move::Rock => "ROCK (🪨)",
            Move::Paper => "PAPER (📄)",
            Move::Scissors => "SCISSORS (✂️)",
        }
    }

    /// Parse a move from a raw client payload.
    ///
    /// Accepts the wire numbers 0, 1 and 2 either as JSON integers or as
    /// numeric strings (surrounding whitespace allowed).
    pub fn from_payload(payload: &Value) -> Result<Move, MoveError> {
        let number = match payload {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };

        number
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| MoveError::Unrecognized(payload.to_string()))
            .and_then(Move::try_from)
    }
}

impl From<Move> for u8 {
    fn from(m: Move) -> u8 {
        m as u8
    }
}

impl TryFrom<u8> for Move {
    type Error = MoveError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Move::Rock),
            1 => Ok(Move::Paper),
            2 => Ok(Move::Scissors),
            other => Err(MoveError::Unrecognized(other.to_string())),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Round result from one player's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

impl Outcome {
    /// The opponent's view of the same round
    pub fn inverse(self) -> Outcome {
        match self {
            Outcome::Win => Outcome::Lose,
            Outcome::Lose => Outcome::Win,
            Outcome::Draw => Outcome::Draw,
        }
    }
}

/// Rejected move payloads
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("Unrecognized move value: {0}")]
    Unrecognized(String),
}
