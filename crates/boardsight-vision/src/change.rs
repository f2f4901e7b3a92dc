//! Change Detector: content-agnostic fingerprint of the board crop.

use boardsight_core::{BoardRegion, ImageError, RgbImageView};
use sha2::{Digest, Sha256};

/// SHA-256 of the raw crop bytes. Compared for equality only.
pub type BoardFingerprint = [u8; 32];

/// Hash the raw RGB rows of `region`.
pub fn fingerprint(
    capture: &RgbImageView<'_>,
    region: &BoardRegion,
) -> Result<BoardFingerprint, ImageError> {
    let mut hasher = Sha256::new();
    for row in capture.rows(region)? {
        hasher.update(row);
    }
    Ok(hasher.finalize().into())
}

/// Remembers the fingerprint from the last time a change was reported.
///
/// Highlights, animations and the cursor all count as changes; downstream
/// validation is what keeps those from corrupting the position.
#[derive(Clone, Debug, Default)]
pub struct ChangeDetector {
    last: Option<BoardFingerprint>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fingerprint the crop and report whether it differs from the stored one.
    pub fn observe(
        &mut self,
        capture: &RgbImageView<'_>,
        region: &BoardRegion,
    ) -> Result<bool, ImageError> {
        Ok(self.observe_fingerprint(fingerprint(capture, region)?))
    }

    /// `true` on the first call and on any mismatch (the new value is stored);
    /// `false` on a match (stored value untouched).
    pub fn observe_fingerprint(&mut self, current: BoardFingerprint) -> bool {
        if self.last == Some(current) {
            return false;
        }
        self.last = Some(current);
        true
    }

    pub fn last(&self) -> Option<&BoardFingerprint> {
        self.last.as_ref()
    }

    /// Forget the stored fingerprint so the next observation reports a change.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardsight_core::RgbImage;

    fn board() -> (RgbImage, BoardRegion) {
        let mut img = RgbImage::filled(64, 48, [10, 10, 10]);
        let region = BoardRegion::new(8, 4, 32, 32);
        img.fill_region(&region, [118, 150, 86]);
        (img, region)
    }

    #[test]
    fn first_call_reports_change_then_identical_input_does_not() {
        let (img, region) = board();
        let mut det = ChangeDetector::new();
        assert!(det.observe(&img.view(), &region).expect("in bounds"));
        assert!(!det.observe(&img.view(), &region).expect("in bounds"));
        assert!(!det.observe(&img.clone().view(), &region).expect("in bounds"));
    }

    #[test]
    fn any_single_byte_inside_the_crop_is_a_change() {
        let (img, region) = board();
        let mut det = ChangeDetector::new();
        det.observe(&img.view(), &region).expect("in bounds");
        let stored = *det.last().expect("stored");

        let mut changed = img.clone();
        let i = ((region.y + 31) * changed.width + region.x + 31) * 3 + 2;
        changed.data[i] ^= 1;
        assert!(det.observe(&changed.view(), &region).expect("in bounds"));
        assert_ne!(det.last(), Some(&stored));
    }

    #[test]
    fn pixels_outside_the_crop_are_ignored() {
        let (img, region) = board();
        let mut det = ChangeDetector::new();
        det.observe(&img.view(), &region).expect("in bounds");
        let mut other = img.clone();
        other.put_pixel(0, 0, [255, 255, 255]);
        assert!(!det.observe(&other.view(), &region).expect("in bounds"));
    }

    #[test]
    fn unchanged_leaves_stored_fingerprint_alone() {
        let mut det = ChangeDetector::new();
        assert!(det.observe_fingerprint([1; 32]));
        assert!(!det.observe_fingerprint([1; 32]));
        assert_eq!(det.last(), Some(&[1; 32]));
        det.reset();
        assert!(det.observe_fingerprint([1; 32]));
    }

    #[test]
    fn region_outside_capture_is_an_error() {
        let (img, _) = board();
        let mut det = ChangeDetector::new();
        assert!(det
            .observe(&img.view(), &BoardRegion::new(40, 40, 32, 32))
            .is_err());
    }
}
