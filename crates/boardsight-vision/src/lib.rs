//! Pixel-level stages of board reconstruction.
//!
//! This crate focuses on:
//! - locating the board rectangle in a full-screen capture by its accent hue,
//! - fingerprinting the board crop to decide whether anything changed,
//! - classifying the occupant of a single square patch, either against
//!   reference templates or with a data-free shape heuristic.
//!
//! It does **not** assemble positions; it only answers per-square questions.

mod change;
mod classify;
mod components;
mod locate;
mod templates;

pub use change::{fingerprint, BoardFingerprint, ChangeDetector};
pub use classify::{
    kind_from_shape, normalized_cross_correlation, square_patch, HeuristicClassifier,
    HeuristicParams, SquareClassifier, TemplateClassifier, TemplateParams,
};
pub use locate::{hue_mask, locate_board, LocatorParams};
pub use templates::{TemplateError, TemplateSet, BOOTSTRAP_SQUARES};
