use boardsight_core::{BoardRegion, Color, Occupant, PieceKind, RgbImage, SquareIndex};
use boardsight_vision::{
    locate_board, square_patch, ChangeDetector, HeuristicClassifier, LocatorParams,
    SquareClassifier, TemplateClassifier, TemplateParams, TemplateSet,
};

const LIGHT: [u8; 3] = [238, 238, 210];
const DARK: [u8; 3] = [118, 150, 86];
const DESK: [u8; 3] = [48, 46, 43];
const SQUARE: usize = 50;
const MARGIN: usize = 5;

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

/// Deterministic gray texture standing in for a piece sprite.
fn sprite_pixel(occupant: Occupant, x: usize, y: usize) -> [u8; 3] {
    // murmur3 finalizer over a unique (occupant, x, y) key
    let mut h = (occupant.index() * SQUARE * SQUARE + y * SQUARE + x) as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85EB_CA6B);
    h ^= h >> 13;
    h = h.wrapping_mul(0xC2B2_AE35);
    h ^= h >> 16;
    let v = (h >> 24) as u8;
    [v, v, v]
}

fn render(origin: (usize, usize), layout: impl Fn(SquareIndex) -> Occupant) -> (RgbImage, BoardRegion) {
    let region = BoardRegion::new(origin.0, origin.1, 8 * SQUARE, 8 * SQUARE);
    let mut img = RgbImage::filled(origin.0 + region.width + 60, origin.1 + region.height + 40, DESK);
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

#[test]
fn locates_checkered_board_exactly() {
    let (img, region) = render((37, 21), start_occupant);
    let found = locate_board(&img.view(), &LocatorParams::default()).expect("board");
    assert_eq!(found, region);
}

#[test]
fn desk_without_board_is_not_found() {
    let img = RgbImage::filled(800, 600, DESK);
    assert_eq!(locate_board(&img.view(), &LocatorParams::default()), None);
}

#[test]
fn bootstrapped_templates_read_back_the_start_position() {
    let (img, region) = render((10, 10), start_occupant);
    let templates = TemplateSet::bootstrap_from_start(&img.view(), &region).expect("bootstrap");
    let classifier = TemplateClassifier::new(templates, TemplateParams::default());

    for sq in SquareIndex::all() {
        let patch = square_patch(&img.view(), &region, sq);
        assert_eq!(classifier.classify(&patch.view()), start_occupant(sq), "square {sq}");
    }
}

#[test]
fn change_detector_tracks_a_moved_piece() {
    let (before, region) = render((10, 10), start_occupant);
    let e2 = SquareIndex::from_coords(4, 1).expect("e2");
    let e4 = SquareIndex::from_coords(4, 3).expect("e4");
    let (after, _) = render((10, 10), |sq| {
        if sq == e2 {
            Occupant::Empty
        } else if sq == e4 {
            Occupant::piece(Color::White, PieceKind::Pawn)
        } else {
            start_occupant(sq)
        }
    });

    let mut detector = ChangeDetector::new();
    assert!(detector.observe(&before.view(), &region).expect("crop"));
    assert!(!detector.observe(&before.view(), &region).expect("crop"));
    assert!(detector.observe(&after.view(), &region).expect("crop"));
    assert!(!detector.observe(&after.view(), &region).expect("crop"));
}

#[test]
fn heuristic_strategy_keeps_empty_squares_empty() {
    let (img, region) = render((10, 10), start_occupant);
    let classifier = HeuristicClassifier::default();
    for rank in 2..6 {
        for file in 0..8 {
            let sq = SquareIndex::from_coords(file, rank).expect("square");
            let patch = square_patch(&img.view(), &region, sq);
            assert_eq!(classifier.classify(&patch.view()), Occupant::Empty, "square {sq}");
        }
    }
}
