//! Rank-by-rank placement encoding and validated full encodings.

use crate::PositionMatrix;
use boardsight_core::{Color, Occupant, SquareIndex, BOARD_FILES, BOARD_RANKS};
use serde::{Serialize, Serializer};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, PositionError};
use std::fmt;

/// Side to move, castling, en passant, halfmove clock, fullmove number.
pub const DEFAULT_METADATA: &str = "w KQkq - 0 1";
pub const STARTING_PLACEMENT: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Reasons an encoding is rejected.
///
/// `rank` fields use chess rank numbers (8 for the first placement field).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("empty position input")]
    Empty,
    #[error("expected 8 ranks in placement, found {found}")]
    RankCount { found: usize },
    #[error("rank {rank} covers {files} files, expected 8")]
    FileCount { rank: usize, files: usize },
    #[error("invalid character {ch:?} in rank {rank}")]
    InvalidChar { rank: usize, ch: char },
    #[error("malformed position encoding: {0}")]
    Syntax(String),
    #[error("illegal position: {0}")]
    Illegal(String),
}

/// Encode one rank, files left to right.
pub fn encode_rank(rank: &[Occupant; BOARD_FILES]) -> String {
    let mut out = String::with_capacity(BOARD_FILES);
    let mut empty_run = 0u8;
    for occ in rank {
        match occ.letter() {
            None => empty_run += 1,
            Some(letter) => {
                if empty_run > 0 {
                    out.push((b'0' + empty_run) as char);
                    empty_run = 0;
                }
                out.push(letter);
            }
        }
    }
    if empty_run > 0 {
        out.push((b'0' + empty_run) as char);
    }
    out
}

/// Placement field: ranks 8 down to 1 joined by `/`.
pub fn encode_placement(matrix: &PositionMatrix) -> String {
    (0..BOARD_RANKS)
        .rev()
        .map(|r| encode_rank(matrix.rank(r)))
        .collect::<Vec<_>>()
        .join("/")
}

/// Placement plus [`DEFAULT_METADATA`]. Not validated.
pub fn encode(matrix: &PositionMatrix) -> String {
    format!("{} {}", encode_placement(matrix), DEFAULT_METADATA)
}

/// Decode one placement field; `rank_label` is only used in errors.
pub fn decode_rank(text: &str, rank_label: usize) -> Result<[Occupant; BOARD_FILES], EncodingError> {
    let mut out = [Occupant::Empty; BOARD_FILES];
    let mut file = 0usize;
    for ch in text.chars() {
        if let Some(run) = ch.to_digit(10) {
            if !(1..=8).contains(&run) {
                return Err(EncodingError::InvalidChar {
                    rank: rank_label,
                    ch,
                });
            }
            file += run as usize;
        } else {
            let occ = Occupant::from_letter(ch).ok_or(EncodingError::InvalidChar {
                rank: rank_label,
                ch,
            })?;
            if file < BOARD_FILES {
                out[file] = occ;
            }
            file += 1;
        }
        if file > BOARD_FILES {
            return Err(EncodingError::FileCount {
                rank: rank_label,
                files: file,
            });
        }
    }
    if file != BOARD_FILES {
        return Err(EncodingError::FileCount {
            rank: rank_label,
            files: file,
        });
    }
    Ok(out)
}

/// Decode a full placement field back into a matrix.
pub fn decode_placement(placement: &str) -> Result<PositionMatrix, EncodingError> {
    let fields: Vec<&str> = placement.split('/').collect();
    if fields.len() != BOARD_RANKS {
        return Err(EncodingError::RankCount {
            found: fields.len(),
        });
    }
    let mut matrix = PositionMatrix::empty();
    for (i, field) in fields.iter().enumerate() {
        let rank = BOARD_RANKS - 1 - i;
        let row = decode_rank(field, rank + 1)?;
        for (file, occ) in row.into_iter().enumerate() {
            if let Some(sq) = SquareIndex::from_coords(file, rank) {
                matrix.set(sq, occ);
            }
        }
    }
    Ok(matrix)
}

/// Keep only the standard castling letters whose king and rook still stand
/// on their home squares. Other characters are left for the rules object.
fn feasible_castling(matrix: &PositionMatrix, field: &str) -> String {
    use boardsight_core::PieceKind::{King, Rook};
    let at = |file: usize, rank: usize, occ: Occupant| {
        SquareIndex::from_coords(file, rank).is_some_and(|sq| matrix.get(sq) == occ)
    };
    let home = |color: Color, rook_file: usize| {
        let rank = match color {
            Color::White => 0,
            Color::Black => BOARD_RANKS - 1,
        };
        at(4, rank, Occupant::piece(color, King)) && at(rook_file, rank, Occupant::piece(color, Rook))
    };

    let kept: String = field
        .chars()
        .filter(|&c| match c {
            'K' => home(Color::White, 7),
            'Q' => home(Color::White, 0),
            'k' => home(Color::Black, 7),
            'q' => home(Color::Black, 0),
            _ => true,
        })
        .collect();
    let kept = kept.replace('-', "");
    if kept.is_empty() {
        "-".to_string()
    } else {
        kept
    }
}

fn rules(text: &str) -> Result<Chess, EncodingError> {
    let fen: Fen = text
        .parse()
        .map_err(|err: shakmaty::fen::ParseFenError| EncodingError::Syntax(err.to_string()))?;
    fen.into_position(CastlingMode::Standard)
        .or_else(PositionError::ignore_invalid_castling_rights)
        .map_err(|err| EncodingError::Illegal(err.to_string()))
}

/// A complete position encoding that passed validation.
///
/// The only ways to obtain one are [`PositionEncoding::parse`] and
/// [`PositionEncoding::starting`], so holders may rely on it describing a
/// position the rules accept.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionEncoding {
    text: String,
}

impl PositionEncoding {
    /// Validate `text` by building a rules object from it.
    ///
    /// Castling rights that contradict the piece placement are dropped rather
    /// than rejected: the fixed `KQkq` default cannot know whether a king or
    /// rook has moved. The stored text carries the reduced rights.
    pub fn parse(text: &str) -> Result<Self, EncodingError> {
        let mut fields: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let Some(placement) = fields.first() else {
            return Err(EncodingError::Empty);
        };
        let matrix = decode_placement(placement)?;
        if let Some(castling) = fields.get_mut(2) {
            *castling = feasible_castling(&matrix, castling);
        }
        let text = fields.join(" ");
        rules(&text)?;
        Ok(Self { text })
    }

    /// Standard algebraic notation for a UCI move string, `None` when the
    /// move does not parse or is not legal here.
    pub fn san(&self, uci: &str) -> Option<String> {
        let position = rules(&self.text).ok()?;
        let mv = UciMove::from_ascii(uci.as_bytes())
            .ok()?
            .to_move(&position)
            .ok()?;
        Some(San::from_move(&position, mv).to_string())
    }

    pub fn starting() -> Self {
        Self {
            text: STARTING_FEN.to_string(),
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// First field of the encoding.
    pub fn placement(&self) -> &str {
        self.text.split(' ').next().unwrap_or_default()
    }

    pub fn side_to_move(&self) -> Color {
        match self.text.split(' ').nth(1) {
            Some("b") => Color::Black,
            _ => Color::White,
        }
    }

    /// Placement as a matrix. Validated encodings always decode.
    pub fn matrix(&self) -> PositionMatrix {
        decode_placement(self.placement()).unwrap_or_default()
    }
}

impl fmt::Display for PositionEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for PositionEncoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
