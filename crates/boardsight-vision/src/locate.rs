//! Region Locator: find the board rectangle by its accent hue.

use crate::components::connected_components;
use boardsight_core::{BoardRegion, HsvRange, RgbImageView};
use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Admissibility rules for board candidates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    /// HSV box selecting the board's accent (dark-square) color.
    pub hue_band: HsvRange,
    /// Candidate pixel count must exceed this.
    pub min_area: usize,
    /// Candidate bounding-box width must exceed this.
    pub min_width: usize,
    /// Inclusive bounds on `width / height`.
    pub aspect_min: f32,
    pub aspect_max: f32,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            hue_band: HsvRange::default(),
            min_area: 10_000,
            min_width: 300,
            aspect_min: 0.8,
            aspect_max: 1.2,
        }
    }
}

impl LocatorParams {
    fn admits(&self, bbox: &BoardRegion, area: usize) -> bool {
        let aspect = bbox.aspect_ratio();
        area > self.min_area
            && bbox.width > self.min_width
            && (self.aspect_min..=self.aspect_max).contains(&aspect)
    }
}

/// Binary mask of pixels inside `band`, row-major.
pub fn hue_mask(capture: &RgbImageView<'_>, band: &HsvRange) -> Vec<bool> {
    capture
        .data
        .chunks_exact(3)
        .map(|px| band.contains_rgb([px[0], px[1], px[2]]))
        .collect()
}

/// Locate the board in a full-screen capture.
///
/// Pure function of the capture: the largest admissible connected region of
/// accent-colored pixels wins, first encountered on ties. `None` means the
/// caller should retry later.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(capture, params), fields(width = capture.width, height = capture.height))
)]
pub fn locate_board(capture: &RgbImageView<'_>, params: &LocatorParams) -> Option<BoardRegion> {
    if capture.width == 0 || capture.height == 0 {
        return None;
    }
    let mask = hue_mask(capture, &params.hue_band);
    let components = connected_components(&mask, capture.width, capture.height);

    let mut best: Option<(usize, BoardRegion)> = None;
    for comp in &components {
        if !params.admits(&comp.bbox, comp.area) {
            continue;
        }
        if best.map_or(true, |(area, _)| comp.area > area) {
            best = Some((comp.area, comp.bbox));
        }
    }

    debug!(
        "locator: {} components, best {:?}",
        components.len(),
        best.map(|(_, r)| r)
    );
    best.map(|(_, region)| region)
}
