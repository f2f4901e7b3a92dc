//! The content of one board square and an enum-indexed table over it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

pub const OCCUPANT_COUNT: usize = 13;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn name(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    /// Uppercase standard letter.
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'K',
            PieceKind::Queen => 'Q',
            PieceKind::Rook => 'R',
            PieceKind::Bishop => 'B',
            PieceKind::Knight => 'N',
            PieceKind::Pawn => 'P',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::King => "king",
            PieceKind::Queen => "queen",
            PieceKind::Rook => "rook",
            PieceKind::Bishop => "bishop",
            PieceKind::Knight => "knight",
            PieceKind::Pawn => "pawn",
        }
    }

    fn ordinal(self) -> usize {
        match self {
            PieceKind::King => 0,
            PieceKind::Queen => 1,
            PieceKind::Rook => 2,
            PieceKind::Bishop => 3,
            PieceKind::Knight => 4,
            PieceKind::Pawn => 5,
        }
    }
}

/// Empty, or a colored piece. Carries no positional or history metadata.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occupant {
    #[default]
    Empty,
    Piece { color: Color, kind: PieceKind },
}

impl Occupant {
    /// Table order: empty, the six white kinds, the six black kinds.
    pub const ALL: [Occupant; OCCUPANT_COUNT] = [
        Occupant::Empty,
        Occupant::piece(Color::White, PieceKind::King),
        Occupant::piece(Color::White, PieceKind::Queen),
        Occupant::piece(Color::White, PieceKind::Rook),
        Occupant::piece(Color::White, PieceKind::Bishop),
        Occupant::piece(Color::White, PieceKind::Knight),
        Occupant::piece(Color::White, PieceKind::Pawn),
        Occupant::piece(Color::Black, PieceKind::King),
        Occupant::piece(Color::Black, PieceKind::Queen),
        Occupant::piece(Color::Black, PieceKind::Rook),
        Occupant::piece(Color::Black, PieceKind::Bishop),
        Occupant::piece(Color::Black, PieceKind::Knight),
        Occupant::piece(Color::Black, PieceKind::Pawn),
    ];

    pub const fn piece(color: Color, kind: PieceKind) -> Self {
        Occupant::Piece { color, kind }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Occupant::Empty)
    }

    pub fn color(self) -> Option<Color> {
        match self {
            Occupant::Empty => None,
            Occupant::Piece { color, .. } => Some(color),
        }
    }

    /// Position in [`Occupant::ALL`].
    pub fn index(self) -> usize {
        match self {
            Occupant::Empty => 0,
            Occupant::Piece {
                color: Color::White,
                kind,
            } => 1 + kind.ordinal(),
            Occupant::Piece {
                color: Color::Black,
                kind,
            } => 7 + kind.ordinal(),
        }
    }

    /// Placement letter: uppercase for white, lowercase for black.
    pub fn letter(self) -> Option<char> {
        match self {
            Occupant::Empty => None,
            Occupant::Piece { color, kind } => Some(match color {
                Color::White => kind.letter(),
                Color::Black => kind.letter().to_ascii_lowercase(),
            }),
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = PieceKind::ALL
            .into_iter()
            .find(|k| k.letter() == c.to_ascii_uppercase())?;
        Some(Occupant::piece(color, kind))
    }

    /// Stable identifier used as a storage key, e.g. `white_king` or `empty`.
    pub fn key(self) -> String {
        match self {
            Occupant::Empty => "empty".to_string(),
            Occupant::Piece { color, kind } => format!("{}_{}", color.name(), kind.name()),
        }
    }
}

impl fmt::Display for Occupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occupant::Empty => f.write_str("empty"),
            Occupant::Piece { color, kind } => write!(f, "{} {}", color.name(), kind.name()),
        }
    }
}

/// One value per occupant; lookups cannot miss.
#[derive(Clone, Debug, PartialEq)]
pub struct OccupantTable<T>([T; OCCUPANT_COUNT]);

impl<T> OccupantTable<T> {
    pub fn from_fn(mut f: impl FnMut(Occupant) -> T) -> Self {
        Self(std::array::from_fn(|i| f(Occupant::ALL[i])))
    }

    /// Build the table, stopping at the first error.
    pub fn try_from_fn<E>(mut f: impl FnMut(Occupant) -> Result<T, E>) -> Result<Self, E> {
        let mut values = Vec::with_capacity(OCCUPANT_COUNT);
        for occ in Occupant::ALL {
            values.push(f(occ)?);
        }
        match values.try_into() {
            Ok(arr) => Ok(Self(arr)),
            Err(_) => unreachable!("one value per occupant"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Occupant, &T)> {
        Occupant::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(&self, mut f: impl FnMut(Occupant, &T) -> U) -> OccupantTable<U> {
        OccupantTable(std::array::from_fn(|i| f(Occupant::ALL[i], &self.0[i])))
    }
}

impl<T> Index<Occupant> for OccupantTable<T> {
    type Output = T;

    fn index(&self, occ: Occupant) -> &T {
        &self.0[occ.index()]
    }
}

impl<T> IndexMut<Occupant> for OccupantTable<T> {
    fn index_mut(&mut self, occ: Occupant) -> &mut T {
        &mut self.0[occ.index()]
    }
}
