//! Board geometry: the located region and its 64 squares.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_FILES: usize = 8;
pub const BOARD_RANKS: usize = 8;
pub const SQUARE_COUNT: usize = BOARD_FILES * BOARD_RANKS;

/// Axis-aligned pixel rectangle in screen-capture coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardRegion {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl BoardRegion {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    /// `width / height`; zero height yields infinity.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return f32::INFINITY;
        }
        self.width as f32 / self.height as f32
    }

    /// Side of one square in pixels (`width / 8`, truncated).
    #[inline]
    pub fn square_size(&self) -> usize {
        self.width / BOARD_FILES
    }

    /// Pixel rectangle of `square`, with white at the bottom of the screen.
    pub fn square_rect(&self, square: SquareIndex) -> BoardRegion {
        let s = self.square_size();
        BoardRegion {
            x: self.x + square.file() * s,
            y: self.y + (BOARD_RANKS - 1 - square.rank()) * s,
            width: s,
            height: s,
        }
    }
}

impl fmt::Display for BoardRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x={}, y={}, size={}x{}",
            self.x, self.y, self.width, self.height
        )
    }
}

/// Index in `[0, 64)`; `file = index % 8`, `rank = index / 8`, a1 = 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SquareIndex(u8);

impl SquareIndex {
    pub fn new(index: usize) -> Option<Self> {
        (index < SQUARE_COUNT).then_some(Self(index as u8))
    }

    pub fn from_coords(file: usize, rank: usize) -> Option<Self> {
        if file < BOARD_FILES && rank < BOARD_RANKS {
            Some(Self((rank * BOARD_FILES + file) as u8))
        } else {
            None
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn file(self) -> usize {
        self.index() % BOARD_FILES
    }

    #[inline]
    pub fn rank(self) -> usize {
        self.index() / BOARD_FILES
    }

    /// All squares from a1 to h8.
    pub fn all() -> impl Iterator<Item = SquareIndex> {
        (0..SQUARE_COUNT as u8).map(SquareIndex)
    }
}

impl fmt::Display for SquareIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file() as u8) as char, self.rank() + 1)
    }
}
