//! Operator-facing text output.

use crate::core::{BoardRegion, Color};
use crate::engine::RankedMove;
use crate::position::{Assembly, AssemblySource, PositionEncoding};
use std::io::{self, Write};

const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];

/// Rank label: a medal for the podium, `N.` after that.
pub fn rank_label(rank: u32) -> String {
    match rank {
        1..=3 => MEDALS[rank as usize - 1].to_string(),
        n => format!("{n}."),
    }
}

pub fn render_region(out: &mut impl Write, region: &BoardRegion) -> io::Result<()> {
    writeln!(out, "Board located: {region}")
}

pub fn render_status(out: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(out, "{message}")
}

/// Header, diagram (rank 8 on top) and the full encoding.
pub fn render_position(out: &mut impl Write, position: &PositionEncoding) -> io::Result<()> {
    let side = match position.side_to_move() {
        Color::White => "White",
        Color::Black => "Black",
    };
    writeln!(out, "Position ({side} to move):")?;
    write!(out, "{}", position.matrix())?;
    writeln!(out, "FEN: {position}")
}

/// Explain why a reconstruction was not used as-is.
pub fn render_assembly_note(out: &mut impl Write, assembly: &Assembly) -> io::Result<()> {
    let Some(reason) = &assembly.rejection else {
        return Ok(());
    };
    let fallback = match assembly.source {
        AssemblySource::LastKnownGood => "keeping the last valid position",
        AssemblySource::StartingPosition | AssemblySource::Assembled => {
            "using the starting position"
        }
    };
    writeln!(out, "Invalid position ({reason}); {fallback}.")
}

/// One line per move: `🥇 e4 [e2e4] (+0.35)`. Moves that do not apply to
/// `position` are printed in UCI form only.
pub fn render_moves(
    out: &mut impl Write,
    position: &PositionEncoding,
    moves: &[RankedMove],
) -> io::Result<()> {
    if moves.is_empty() {
        return writeln!(out, "No legal moves.");
    }
    writeln!(out, "Best moves:")?;
    for mv in moves {
        let label = rank_label(mv.rank);
        match position.san(&mv.uci) {
            Some(san) => writeln!(out, "  {label} {san} [{}] ({})", mv.uci, mv.score)?,
            None => writeln!(out, "  {label} {} ({})", mv.uci, mv.score)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Score;

    fn text(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn labels() {
        assert_eq!(rank_label(1), "🥇");
        assert_eq!(rank_label(3), "🥉");
        assert_eq!(rank_label(4), "4.");
    }

    #[test]
    fn moves_are_listed_in_order() {
        let moves = vec![
            RankedMove {
                rank: 1,
                uci: "e2e4".into(),
                score: Score::Centipawns(35),
            },
            RankedMove {
                rank: 2,
                uci: "d2d4".into(),
                score: Score::Centipawns(-8),
            },
            RankedMove {
                rank: 4,
                uci: "h7h8q".into(),
                score: Score::Mate(2),
            },
        ];
        let start = PositionEncoding::starting();
        let s = text(|w| render_moves(w, &start, &moves));
        // h7h8q is not legal from the start, so it stays in UCI form
        assert_eq!(
            s,
            "Best moves:\n  🥇 e4 [e2e4] (+0.35)\n  🥈 d4 [d2d4] (-0.08)\n  4. h7h8q (#2)\n"
        );
        assert_eq!(text(|w| render_moves(w, &start, &[])), "No legal moves.\n");
    }

    #[test]
    fn position_has_header_diagram_and_fen() {
        let s = text(|w| render_position(w, &PositionEncoding::starting()));
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines[0], "Position (White to move):");
        assert_eq!(lines[1], "r n b q k b n r");
        assert_eq!(lines[4], ". . . . . . . .");
        assert_eq!(lines[8], "R N B Q K B N R");
        assert!(lines[9].starts_with("FEN: rnbqkbnr/"));
    }

    #[test]
    fn region_format() {
        let s = text(|w| render_region(w, &BoardRegion::new(10, 20, 400, 400)));
        assert_eq!(s, "Board located: x=10, y=20, size=400x400\n");
    }
}
