//! Core types and utilities for on-screen chess board reconstruction.
//!
//! This crate is intentionally small. It owns the pixel containers the
//! pipeline passes around, the board geometry (region, squares), and the
//! 13-member occupant domain. It does *not* depend on any concrete image
//! codec or screen-capture backend.

mod board;
mod color;
mod image;
mod logger;
mod occupant;
mod threshold;

pub use board::{BoardRegion, SquareIndex, BOARD_FILES, BOARD_RANKS, SQUARE_COUNT};
pub use color::{luma, rgb_to_hsv, Hsv, HsvRange};
pub use image::{
    sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, ImageError, RgbImage,
    RgbImageView,
};
pub use occupant::{Color, Occupant, OccupantTable, PieceKind, OCCUPANT_COUNT};
pub use threshold::otsu_threshold;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level};
