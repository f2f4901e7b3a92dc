use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use boardsight::core::{BoardRegion, Color, Occupant, PieceKind, RgbImage, SquareIndex};
use boardsight::engine::{EngineError, Score};
use boardsight::position::STARTING_FEN;
use boardsight::vision::{TemplateClassifier, TemplateParams, TemplateSet};
use boardsight::{
    Monitor, MonitorSettings, MoveRanker, PositionEncoding, RankedMove, ReplaySource,
    SearchLimits, SessionConfig, TickOutcome,
};
use tokio_util::sync::CancellationToken;

const LIGHT: [u8; 3] = [238, 238, 210];
const DARK: [u8; 3] = [118, 150, 86];
const DESK: [u8; 3] = [48, 46, 43];
const SQUARE: usize = 50;
const MARGIN: usize = 5;
const ORIGIN: (usize, usize) = (120, 80);

fn start_occupant(square: SquareIndex) -> Occupant {
    use PieceKind::*;
    const BACK: [PieceKind; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
    match square.rank() {
        0 => Occupant::piece(Color::White, BACK[square.file()]),
        1 => Occupant::piece(Color::White, Pawn),
        6 => Occupant::piece(Color::Black, Pawn),
        7 => Occupant::piece(Color::Black, BACK[square.file()]),
        _ => Occupant::Empty,
    }
}

fn after_e4(square: SquareIndex) -> Occupant {
    match (square.file(), square.rank()) {
        (4, 1) => Occupant::Empty,
        (4, 3) => Occupant::piece(Color::White, PieceKind::Pawn),
        _ => start_occupant(square),
    }
}

fn sprite_pixel(occupant: Occupant, x: usize, y: usize) -> [u8; 3] {
    let mut h = (occupant.index() * SQUARE * SQUARE + y * SQUARE + x) as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    let v = (h >> 24) as u8;
    [v, v, v]
}

/// A 1024x640 "screen" with a 400x400 board at `ORIGIN`.
fn screen(layout: impl Fn(SquareIndex) -> Occupant) -> (RgbImage, BoardRegion) {
    let region = BoardRegion::new(ORIGIN.0, ORIGIN.1, 8 * SQUARE, 8 * SQUARE);
    let mut img = RgbImage::filled(1024, 640, DESK);
    for sq in SquareIndex::all() {
        let rect = region.square_rect(sq);
        let dark = (sq.file() + sq.rank()) % 2 == 0;
        img.fill_region(&rect, if dark { DARK } else { LIGHT });
        let occ = layout(sq);
        if occ.is_empty() {
            continue;
        }
        for y in MARGIN..SQUARE - MARGIN {
            for x in MARGIN..SQUARE - MARGIN {
                img.put_pixel(rect.x + x, rect.y + y, sprite_pixel(occ, x, y));
            }
        }
    }
    (img, region)
}

fn template_classifier() -> Box<TemplateClassifier> {
    let (img, region) = screen(start_occupant);
    let templates = TemplateSet::bootstrap_from_start(&img.view(), &region).expect("bootstrap");
    Box::new(TemplateClassifier::new(templates, TemplateParams::default()))
}

#[derive(Default)]
struct Calls {
    positions: Vec<String>,
    restarts: usize,
    shutdowns: usize,
}

/// Returns three fixed moves; optionally fails the first query.
struct MockRanker {
    calls: Rc<RefCell<Calls>>,
    fail_first: bool,
}

impl MockRanker {
    fn new(fail_first: bool) -> (Self, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        (
            Self {
                calls: Rc::clone(&calls),
                fail_first,
            },
            calls,
        )
    }
}

impl MoveRanker for MockRanker {
    fn rank(
        &mut self,
        position: &PositionEncoding,
        limits: &SearchLimits,
    ) -> Result<Vec<RankedMove>, EngineError> {
        self.calls.borrow_mut().positions.push(position.to_string());
        if std::mem::take(&mut self.fail_first) {
            return Err(EngineError::Timeout {
                waiting_for: "bestmove",
                elapsed: limits.deadline(),
            });
        }
        let moves = [
            ("e2e4", Score::Centipawns(35)),
            ("d2d4", Score::Centipawns(28)),
            ("g1f3", Score::Centipawns(20)),
        ];
        Ok(moves
            .into_iter()
            .zip(1..)
            .map(|((uci, score), rank)| RankedMove {
                rank,
                uci: uci.to_string(),
                score,
            })
            .collect())
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        self.calls.borrow_mut().restarts += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.calls.borrow_mut().shutdowns += 1;
    }
}

fn move_lines(text: &str) -> Vec<&str> {
    text.lines()
        .filter(|l| l.starts_with("  "))
        .map(str::trim)
        .collect()
}

#[test]
fn starting_board_is_located_reconstructed_and_ranked() {
    let (img, expected) = screen(start_occupant);
    let (ranker, calls) = MockRanker::new(false);
    let mut monitor = Monitor::new(
        ReplaySource::new(vec![img]),
        template_classifier(),
        ranker,
        MonitorSettings::from(&SessionConfig::default()),
    );
    let mut out = Vec::new();

    match monitor.tick(&mut out).expect("locate") {
        TickOutcome::Located(region) => {
            assert_eq!(region, expected);
            assert_eq!((region.width, region.height), (400, 400));
        }
        other => panic!("expected the board to be located, got {other:?}"),
    }

    let moves = match monitor.tick(&mut out).expect("analyse") {
        TickOutcome::Ranked(moves) => moves,
        other => panic!("expected a ranking, got {other:?}"),
    };
    let ranks: Vec<u32> = moves.iter().map(|m| m.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    assert_eq!(calls.borrow().positions, vec![STARTING_FEN.to_string()]);

    let text = String::from_utf8(out).expect("utf8");
    assert!(text.contains("Board located: x=120, y=80, size=400x400"), "{text}");
    assert!(text.contains(&format!("FEN: {STARTING_FEN}")), "{text}");
    assert_eq!(
        move_lines(&text),
        vec!["🥇 e4 [e2e4] (+0.35)", "🥈 d4 [d2d4] (+0.28)", "🥉 Nf3 [g1f3] (+0.20)"]
    );

    // same pixels: nothing to do
    assert_eq!(monitor.tick(&mut Vec::new()).expect("idle"), TickOutcome::Unchanged);
    assert_eq!(calls.borrow().positions.len(), 1);
}

#[test]
fn failed_ranking_is_skipped_and_the_engine_restarted() {
    let (before, _) = screen(start_occupant);
    let (after, _) = screen(after_e4);
    let (ranker, calls) = MockRanker::new(true);
    let mut monitor = Monitor::new(
        ReplaySource::new(vec![before.clone(), before, after]),
        template_classifier(),
        ranker,
        MonitorSettings::from(&SessionConfig::default()),
    );
    let mut out = Vec::new();

    assert!(matches!(monitor.tick(&mut out).expect("locate"), TickOutcome::Located(_)));
    assert_eq!(monitor.tick(&mut out).expect("fail"), TickOutcome::RankingFailed);
    assert_eq!(calls.borrow().restarts, 1);
    assert!(move_lines(&String::from_utf8_lossy(&out)).is_empty());

    let moves = match monitor.tick(&mut out).expect("retry") {
        TickOutcome::Ranked(moves) => moves,
        other => panic!("expected a ranking, got {other:?}"),
    };
    assert_eq!(moves.len(), 3);
    let calls = calls.borrow();
    assert_eq!(calls.positions.len(), 2);
    assert!(
        calls.positions[1].starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR "),
        "{}",
        calls.positions[1]
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn run_loop_analyses_once_and_releases_the_engine_on_cancel() {
    let (img, _) = screen(start_occupant);
    let (ranker, calls) = MockRanker::new(false);
    let monitor = Monitor::new(
        ReplaySource::new(vec![img]),
        template_classifier(),
        ranker,
        MonitorSettings::from(&SessionConfig::default()),
    );

    let cancel = CancellationToken::new();
    let stopper = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_secs(9)).await;
            cancel.cancel();
        }
    };
    let mut out = Vec::new();
    let (result, ()) = tokio::join!(monitor.run(cancel, &mut out), stopper);
    result.expect("run");

    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text.matches("Board located").count(), 1, "{text}");
    assert_eq!(text.matches("Best moves:").count(), 1, "{text}");
    assert_eq!(move_lines(&text).len(), 3);
    let calls = calls.borrow();
    assert_eq!(calls.positions.len(), 1);
    assert_eq!(calls.shutdowns, 1);
}
