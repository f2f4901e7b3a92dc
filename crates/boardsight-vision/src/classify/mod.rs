//! Square Classifier: one patch in, one occupant out.

mod heuristic;
mod template;

pub use heuristic::{kind_from_shape, HeuristicClassifier, HeuristicParams};
pub use template::{normalized_cross_correlation, TemplateClassifier, TemplateParams};

use boardsight_core::{BoardRegion, Occupant, RgbImage, RgbImageView, SquareIndex};

/// Strategy interface selected at session configuration time.
///
/// Implementations are pure functions of the patch (plus whatever immutable
/// reference data they were built with). Low confidence resolves to
/// [`Occupant::Empty`]; classification never fails.
pub trait SquareClassifier {
    fn classify(&self, patch: &RgbImageView<'_>) -> Occupant;

    /// Short identifier used in logs and configuration.
    fn name(&self) -> &'static str;
}

impl<C: SquareClassifier + ?Sized> SquareClassifier for Box<C> {
    fn classify(&self, patch: &RgbImageView<'_>) -> Occupant {
        (**self).classify(patch)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Crop the pixels of `square` out of a capture containing `region`.
///
/// Squares are `width / 8` tall, so on a region shorter than it is wide the
/// bottom rank can extend past the capture. Those pixels come back black.
pub fn square_patch(
    capture: &RgbImageView<'_>,
    region: &BoardRegion,
    square: SquareIndex,
) -> RgbImage {
    capture.crop_padded(&region.square_rect(square), [0, 0, 0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_uses_white_at_bottom_layout() {
        let region = BoardRegion::new(10, 20, 80, 80);
        let mut img = RgbImage::filled(100, 110, [0, 0, 0]);
        // a1 is bottom-left, h8 top-right
        img.put_pixel(10, 20 + 70, [1, 2, 3]);
        img.put_pixel(10 + 70, 20, [4, 5, 6]);

        let a1 = SquareIndex::from_coords(0, 0).expect("a1");
        let h8 = SquareIndex::from_coords(7, 7).expect("h8");
        let p = square_patch(&img.view(), &region, a1);
        assert_eq!((p.width, p.height), (10, 10));
        assert_eq!(p.view().pixel(0, 0), [1, 2, 3]);
        let p = square_patch(&img.view(), &region, h8);
        assert_eq!(p.view().pixel(0, 0), [4, 5, 6]);
    }

    #[test]
    fn short_region_pads_the_bottom_rank() {
        // 80 wide, 64 tall, flush with the bottom edge of the capture
        let region = BoardRegion::new(0, 16, 80, 64);
        let img = RgbImage::filled(80, 80, [200, 200, 200]);

        let a2 = SquareIndex::from_coords(0, 1).expect("a2");
        let p = square_patch(&img.view(), &region, a2);
        assert_eq!((p.width, p.height), (10, 10));
        assert_eq!(p.view().pixel(0, 3), [200, 200, 200]);
        assert_eq!(p.view().pixel(0, 4), [0, 0, 0]);

        let a1 = SquareIndex::from_coords(0, 0).expect("a1");
        assert_eq!(square_patch(&img.view(), &region, a1), RgbImage::filled(10, 10, [0, 0, 0]));
    }
}
