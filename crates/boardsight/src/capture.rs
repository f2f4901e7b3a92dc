//! Screen sources.

use crate::core::RgbImage;
use crate::CaptureError;
use std::path::Path;

/// Something that produces a fresh full-screen capture on demand.
pub trait ScreenSource {
    fn capture(&mut self) -> Result<RgbImage, CaptureError>;
}

impl<S: ScreenSource + ?Sized> ScreenSource for Box<S> {
    fn capture(&mut self) -> Result<RgbImage, CaptureError> {
        (**self).capture()
    }
}

/// Drop the alpha channel of an interleaved RGBA buffer.
pub fn rgb_from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<RgbImage, CaptureError> {
    let data = rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    Ok(RgbImage::from_raw(width, height, data)?)
}

/// Decode an image file into an RGB capture.
pub fn load_rgb(path: impl AsRef<Path>) -> Result<RgbImage, CaptureError> {
    let path = path.as_ref();
    let img = image::open(path)
        .map_err(|source| CaptureError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgb8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    Ok(RgbImage::from_raw(width, height, img.into_raw())?)
}

/// Write a capture (or a crop of one) as PNG.
pub fn save_png(img: &RgbImage, path: impl AsRef<Path>) -> Result<(), CaptureError> {
    let path = path.as_ref();
    let buf = image::RgbImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
        .ok_or(crate::core::ImageError::InvalidBuffer {
            expected: img.width * img.height * 3,
            got: img.data.len(),
        })?;
    buf.save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| CaptureError::Encode {
            path: path.to_path_buf(),
            source,
        })
}

/// Replays prepared frames; the last one repeats forever.
#[derive(Clone, Debug)]
pub struct ReplaySource {
    frames: Vec<RgbImage>,
    next: usize,
}

impl ReplaySource {
    pub fn new(frames: Vec<RgbImage>) -> Self {
        Self { frames, next: 0 }
    }

    /// Number of captures served so far.
    pub fn served(&self) -> usize {
        self.next
    }
}

impl ScreenSource for ReplaySource {
    fn capture(&mut self) -> Result<RgbImage, CaptureError> {
        let last = self.frames.len().checked_sub(1).ok_or(CaptureError::NoDisplay)?;
        let frame = self.frames[self.next.min(last)].clone();
        self.next += 1;
        Ok(frame)
    }
}

/// Primary display through `xcap`.
#[cfg(feature = "capture")]
#[derive(Debug, Default)]
pub struct XcapScreen;

#[cfg(feature = "capture")]
impl XcapScreen {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "capture")]
impl ScreenSource for XcapScreen {
    fn capture(&mut self) -> Result<RgbImage, CaptureError> {
        let monitors =
            xcap::Monitor::all().map_err(|err| CaptureError::Backend(err.to_string()))?;
        let primary = monitors.first().ok_or(CaptureError::NoDisplay)?;
        let rgba = primary
            .capture_image()
            .map_err(|err| CaptureError::Backend(err.to_string()))?;
        let (width, height) = (rgba.width() as usize, rgba.height() as usize);
        // zero-sized captures usually mean missing screen-recording permission
        if width == 0 || height == 0 {
            return Err(CaptureError::NoDisplay);
        }
        rgb_from_rgba(width, height, rgba.as_raw())
    }
}
