//! Position assembly for reconstructed boards.
//!
//! Current focus:
//! - folding 64 per-square occupants into a rank-by-rank placement string,
//! - validating the full encoding against the rules of chess,
//! - keeping the last validated encoding as a fallback when a fresh
//!   reconstruction does not validate,
//! - accepting a manually supplied encoding through the same gate.
//!
//! Side to move, castling rights, en-passant target and move counters cannot
//! be observed on a still frame; they are always the fixed defaults in
//! [`DEFAULT_METADATA`].

mod assembler;
mod encoding;
mod manual;
mod matrix;

pub use assembler::{Assembly, AssemblySource, PositionAssembler};
pub use encoding::{
    decode_placement, decode_rank, encode, encode_placement, encode_rank, EncodingError,
    PositionEncoding, DEFAULT_METADATA, STARTING_FEN, STARTING_PLACEMENT,
};
pub use manual::ManualInput;
pub use matrix::PositionMatrix;

pub use boardsight_core::{Color, Occupant, PieceKind, SquareIndex};
