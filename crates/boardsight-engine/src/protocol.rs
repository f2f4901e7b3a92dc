//! Parsing of the engine-to-GUI half of UCI.

use serde::Serialize;
use std::fmt;

/// Evaluation from the side to move's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    /// Hundredths of a pawn.
    Centipawns(i32),
    /// Moves to mate; negative when the side to move is getting mated.
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Score::Centipawns(cp) => {
                let sign = if cp < 0 { '-' } else { '+' };
                let abs = cp.unsigned_abs();
                write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
            }
            Score::Mate(n) => write!(f, "#{n}"),
        }
    }
}

/// The fields of an `info` line that ranking needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfoLine {
    /// 1-based candidate rank; engines omit it when MultiPV is 1.
    pub multipv: u32,
    pub depth: Option<u32>,
    pub score: Score,
    /// First move of the principal variation, coordinate notation.
    pub best: String,
}

/// Parse an `info ... score ... pv ...` line.
///
/// Lines without both a score and a principal variation (`currmove`,
/// `string`, `hashfull` updates) yield `None`.
pub fn parse_info_line(line: &str) -> Option<InfoLine> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("info") {
        return None;
    }

    let mut multipv = 1;
    let mut depth = None;
    let mut score = None;
    let mut best = None;
    while let Some(token) = tokens.next() {
        match token {
            "multipv" => multipv = tokens.next()?.parse().ok()?,
            "depth" => depth = tokens.next().and_then(|t| t.parse().ok()),
            "score" => {
                let kind = tokens.next()?;
                let value: i32 = tokens.next()?.parse().ok()?;
                score = match kind {
                    "cp" => Some(Score::Centipawns(value)),
                    "mate" => Some(Score::Mate(value)),
                    _ => return None,
                };
            }
            // pv runs to the end of the line
            "pv" => {
                best = tokens.next().map(str::to_string);
                break;
            }
            "string" => return None,
            _ => {}
        }
    }

    Some(InfoLine {
        multipv,
        depth,
        score: score?,
        best: best?,
    })
}

/// Move named by a `bestmove` line. `Ok(None)` for `bestmove (none)`.
pub fn parse_bestmove(line: &str) -> Option<Option<String>> {
    let mut tokens = line.split_whitespace();
    if tokens.next() != Some("bestmove") {
        return None;
    }
    match tokens.next() {
        None | Some("(none)") | Some("0000") => Some(None),
        Some(mv) => Some(Some(mv.to_string())),
    }
}
