use super::SquareClassifier;
use crate::templates::TemplateSet;
use boardsight_core::{GrayImage, GrayImageView, Occupant, RgbImageView};
use log::trace;
use serde::{Deserialize, Serialize};

/// Mean difference (in gray levels) under which two flat images count as equal.
const FLAT_MEAN_TOLERANCE: f32 = 8.0;
const FLAT_EPS: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateParams {
    /// Score against the empty template above which the square is empty
    /// without looking at piece templates.
    pub empty_threshold: f32,
    /// Best piece score below this is treated as no detection.
    pub piece_threshold: f32,
}

impl Default for TemplateParams {
    fn default() -> Self {
        Self {
            empty_threshold: 0.85,
            piece_threshold: 0.62,
        }
    }
}

/// Zero-mean normalized cross-correlation of two equally sized gray images.
///
/// Returns a score in `[-1, 1]`. Flat (zero-variance) inputs have no defined
/// correlation: two flat images of similar brightness score `1.0`, any other
/// combination involving a flat image scores `0.0`. Size mismatch scores `0.0`.
pub fn normalized_cross_correlation(a: &GrayImageView<'_>, b: &GrayImageView<'_>) -> f32 {
    if a.width != b.width || a.height != b.height || a.data.is_empty() {
        return 0.0;
    }
    let n = a.data.len() as f64;
    let mean_a = a.data.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b.data.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut cross = 0.0f64;
    let mut var_a = 0.0f64;
    let mut var_b = 0.0f64;
    for (&pa, &pb) in a.data.iter().zip(b.data) {
        let da = pa as f64 - mean_a;
        let db = pb as f64 - mean_b;
        cross += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    match (var_a < FLAT_EPS, var_b < FLAT_EPS) {
        (true, true) => {
            if ((mean_a - mean_b).abs() as f32) <= FLAT_MEAN_TOLERANCE {
                1.0
            } else {
                0.0
            }
        }
        (true, false) | (false, true) => 0.0,
        (false, false) => (cross / (var_a * var_b).sqrt()).clamp(-1.0, 1.0) as f32,
    }
}

/// Template-match strategy over the 13 reference patches.
#[derive(Clone, Debug)]
pub struct TemplateClassifier {
    templates: TemplateSet,
    params: TemplateParams,
}

impl TemplateClassifier {
    pub fn new(templates: TemplateSet, params: TemplateParams) -> Self {
        Self { templates, params }
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    pub fn params(&self) -> &TemplateParams {
        &self.params
    }

    fn score(&self, patch: &GrayImage, occupant: Occupant) -> f32 {
        let template = self.templates.get(occupant);
        if template.width == patch.width && template.height == patch.height {
            normalized_cross_correlation(&patch.view(), &template.view())
        } else {
            let resized = template.view().resize(patch.width, patch.height);
            normalized_cross_correlation(&patch.view(), &resized.view())
        }
    }
}

impl SquareClassifier for TemplateClassifier {
    fn classify(&self, patch: &RgbImageView<'_>) -> Occupant {
        if patch.width == 0 || patch.height == 0 {
            return Occupant::Empty;
        }
        let gray = patch.to_gray();

        let empty_score = self.score(&gray, Occupant::Empty);
        if empty_score > self.params.empty_threshold {
            return Occupant::Empty;
        }

        let mut best = (Occupant::Empty, f32::NEG_INFINITY);
        for occupant in Occupant::ALL.into_iter().filter(|o| !o.is_empty()) {
            let score = self.score(&gray, occupant);
            if score > best.1 {
                best = (occupant, score);
            }
        }
        trace!(
            "template match: empty={empty_score:.3} best={} ({:.3})",
            best.0,
            best.1
        );

        if best.1 < self.params.piece_threshold {
            Occupant::Empty
        } else {
            best.0
        }
    }

    fn name(&self) -> &'static str {
        "template"
    }
}
