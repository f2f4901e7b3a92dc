use super::SquareClassifier;
use crate::components::label_components;
use boardsight_core::{
    otsu_threshold, rgb_to_hsv, Color, GrayImageView, Occupant, PieceKind, RgbImageView,
};
use serde::{Deserialize, Serialize};

/// Empirical knobs of the shape heuristic. None of them are validated against
/// ground truth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicParams {
    /// Side of the analysed center window relative to the patch side.
    pub center_fraction: f32,
    /// Dark-class pixel share below which the square is empty.
    pub min_foreground_ratio: f32,
    /// Mean HSV value of the center window above which the piece is white.
    pub white_brightness: f32,
    /// Hysteresis thresholds on the L1 Sobel magnitude.
    pub edge_low: f32,
    pub edge_high: f32,
    /// Height/width breakpoints, tallest first.
    pub king_aspect: f32,
    pub queen_aspect: f32,
    pub rook_aspect: f32,
    pub bishop_aspect: f32,
    /// Silhouettes at most this large (bbox px) and not tall are pawns.
    pub pawn_max_area: f32,
}

impl Default for HeuristicParams {
    fn default() -> Self {
        Self {
            center_fraction: 0.5,
            min_foreground_ratio: 0.15,
            white_brightness: 130.0,
            edge_low: 50.0,
            edge_high: 150.0,
            king_aspect: 2.5,
            queen_aspect: 2.0,
            rook_aspect: 1.5,
            bishop_aspect: 1.2,
            pawn_max_area: 500.0,
        }
    }
}

/// Ordered shape table: first matching row wins.
pub fn kind_from_shape(aspect: f32, area: f32, params: &HeuristicParams) -> PieceKind {
    if aspect > params.king_aspect {
        PieceKind::King
    } else if aspect > params.queen_aspect {
        PieceKind::Queen
    } else if aspect > params.rook_aspect {
        PieceKind::Rook
    } else if aspect > params.bishop_aspect {
        PieceKind::Bishop
    } else if area < params.pawn_max_area {
        PieceKind::Pawn
    } else {
        PieceKind::Knight
    }
}

/// Data-free fallback: silhouette threshold, brightness for color, edge bbox
/// shape for kind.
///
/// This is a low-precision approximation. Its piece-kind output in particular
/// should be treated as a guess; use [`super::TemplateClassifier`] whenever
/// reference patches are available.
#[derive(Clone, Debug, Default)]
pub struct HeuristicClassifier {
    params: HeuristicParams,
}

impl HeuristicClassifier {
    pub fn new(params: HeuristicParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &HeuristicParams {
        &self.params
    }

    fn center_window(&self, width: usize, height: usize) -> (usize, usize, usize, usize) {
        let frac = self.params.center_fraction.clamp(0.0, 1.0);
        let cw = ((width as f32 * frac).round() as usize).clamp(1, width);
        let ch = ((height as f32 * frac).round() as usize).clamp(1, height);
        ((width - cw) / 2, (height - ch) / 2, cw, ch)
    }
}

impl SquareClassifier for HeuristicClassifier {
    fn classify(&self, patch: &RgbImageView<'_>) -> Occupant {
        if patch.width == 0 || patch.height == 0 {
            return Occupant::Empty;
        }
        let (x0, y0, cw, ch) = self.center_window(patch.width, patch.height);
        let gray = patch.to_gray();
        let center = gray.view().window(x0, y0, cw, ch);

        // flat center: nothing to separate
        let Some(t) = otsu_threshold(&center.data) else {
            return Occupant::Empty;
        };
        let dark = center.data.iter().filter(|&&v| v <= t).count();
        let ratio = dark as f32 / center.data.len() as f32;
        if ratio < self.params.min_foreground_ratio {
            return Occupant::Empty;
        }

        let mut value_sum = 0.0f32;
        for y in y0..y0 + ch {
            for x in x0..x0 + cw {
                value_sum += rgb_to_hsv(patch.pixel(x, y)).v as f32;
            }
        }
        let brightness = value_sum / (cw * ch) as f32;
        let color = if brightness > self.params.white_brightness {
            Color::White
        } else {
            Color::Black
        };

        let kind = match largest_edge_bbox(&center.view(), &self.params) {
            Some((w, h)) => {
                let aspect = h as f32 / w as f32;
                kind_from_shape(aspect, (w * h) as f32, &self.params)
            }
            // piece present but no outline
            None => PieceKind::Pawn,
        };
        Occupant::piece(color, kind)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

fn sobel_l1(img: &GrayImageView<'_>) -> Vec<f32> {
    let (w, h) = (img.width as isize, img.height as isize);
    let at = |x: isize, y: isize| -> f32 {
        img.get(x.clamp(0, w - 1) as usize, y.clamp(0, h - 1) as usize) as f32
    };
    let mut out = Vec::with_capacity(img.data.len());
    for y in 0..h {
        for x in 0..w {
            let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x - 1, y)
                - at(x - 1, y + 1);
            let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x, y - 1)
                - at(x + 1, y - 1);
            out.push(gx.abs() + gy.abs());
        }
    }
    out
}

/// Width and height of the largest (by bbox area) edge chain: weak edge
/// components that contain at least one strong pixel.
fn largest_edge_bbox(img: &GrayImageView<'_>, params: &HeuristicParams) -> Option<(usize, usize)> {
    let mag = sobel_l1(img);
    let weak: Vec<bool> = mag.iter().map(|&m| m >= params.edge_low).collect();

    let (labels, comps) = label_components(&weak, img.width, img.height);
    let mut has_strong = vec![false; comps.len()];
    for (i, &label) in labels.iter().enumerate() {
        if label != 0 && mag[i] >= params.edge_high {
            has_strong[label as usize - 1] = true;
        }
    }

    comps
        .iter()
        .zip(has_strong)
        .filter(|(_, strong)| *strong)
        .map(|(c, _)| (c.bbox.width, c.bbox.height))
        .max_by_key(|(w, h)| w * h)
}
