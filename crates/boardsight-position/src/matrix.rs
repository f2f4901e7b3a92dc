use boardsight_core::{Color, Occupant, PieceKind, SquareIndex, BOARD_FILES, BOARD_RANKS};
use std::fmt;

/// 8x8 grid of occupants, rank-major: `ranks[rank][file]`, rank 0 nearest white.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PositionMatrix {
    ranks: [[Occupant; BOARD_FILES]; BOARD_RANKS],
}

impl PositionMatrix {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_ranks(ranks: [[Occupant; BOARD_FILES]; BOARD_RANKS]) -> Self {
        Self { ranks }
    }

    pub fn from_fn(mut f: impl FnMut(SquareIndex) -> Occupant) -> Self {
        let mut m = Self::empty();
        for sq in SquareIndex::all() {
            m.set(sq, f(sq));
        }
        m
    }

    /// The standard initial arrangement.
    pub fn starting() -> Self {
        const BACK: [PieceKind; BOARD_FILES] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        Self::from_fn(|sq| match sq.rank() {
            0 => Occupant::piece(Color::White, BACK[sq.file()]),
            1 => Occupant::piece(Color::White, PieceKind::Pawn),
            6 => Occupant::piece(Color::Black, PieceKind::Pawn),
            7 => Occupant::piece(Color::Black, BACK[sq.file()]),
            _ => Occupant::Empty,
        })
    }

    #[inline]
    pub fn get(&self, sq: SquareIndex) -> Occupant {
        self.ranks[sq.rank()][sq.file()]
    }

    #[inline]
    pub fn set(&mut self, sq: SquareIndex, occ: Occupant) {
        self.ranks[sq.rank()][sq.file()] = occ;
    }

    #[inline]
    pub fn rank(&self, rank: usize) -> &[Occupant; BOARD_FILES] {
        &self.ranks[rank]
    }

    pub fn occupied_count(&self) -> usize {
        self.ranks.iter().flatten().filter(|o| !o.is_empty()).count()
    }
}

/// Text diagram, rank 8 on top, `.` for empty squares.
impl fmt::Display for PositionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..BOARD_RANKS).rev() {
            let row: Vec<String> = self.ranks[rank]
                .iter()
                .map(|o| o.letter().unwrap_or('.').to_string())
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}
