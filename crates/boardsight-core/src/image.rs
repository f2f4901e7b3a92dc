use crate::BoardRegion;

/// Errors produced when wrapping or slicing pixel buffers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid pixel buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },

    #[error("invalid image dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },

    #[error("crop {region} exceeds image bounds {width}x{height}")]
    OutOfBounds {
        region: BoardRegion,
        width: usize,
        height: usize,
    },
}

/// Borrowed interleaved 8-bit RGB buffer.
#[derive(Clone, Copy, Debug)]
pub struct RgbImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h*3
}

/// Owned interleaved 8-bit RGB buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

fn checked_len(width: usize, height: usize, channels: usize) -> Result<usize, ImageError> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(ImageError::InvalidDimensions { width, height })
}

impl<'a> RgbImageView<'a> {
    /// Wrap a raw RGB buffer, checking its length against the dimensions.
    pub fn from_raw(width: usize, height: usize, data: &'a [u8]) -> Result<Self, ImageError> {
        let expected = checked_len(width, height, 3)?;
        if data.len() != expected {
            return Err(ImageError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Whether `region` lies entirely inside the image.
    pub fn contains(&self, region: &BoardRegion) -> bool {
        region.x + region.width <= self.width && region.y + region.height <= self.height
    }

    /// Raw byte rows covered by `region`, top to bottom.
    pub fn rows(
        &self,
        region: &BoardRegion,
    ) -> Result<impl Iterator<Item = &'a [u8]> + '_, ImageError> {
        if !self.contains(region) {
            return Err(ImageError::OutOfBounds {
                region: *region,
                width: self.width,
                height: self.height,
            });
        }
        let data = self.data;
        let stride = self.width * 3;
        let x0 = region.x * 3;
        let x1 = x0 + region.width * 3;
        Ok((region.y..region.y + region.height).map(move |y| &data[y * stride + x0..y * stride + x1]))
    }

    /// Copy `region` out into an owned buffer.
    pub fn crop(&self, region: &BoardRegion) -> Result<RgbImage, ImageError> {
        let mut data = Vec::with_capacity(region.width * region.height * 3);
        for row in self.rows(region)? {
            data.extend_from_slice(row);
        }
        Ok(RgbImage {
            width: region.width,
            height: region.height,
            data,
        })
    }

    /// Like [`crop`](Self::crop), but pixels of `region` outside the image
    /// are set to `fill`.
    pub fn crop_padded(&self, region: &BoardRegion, fill: [u8; 3]) -> RgbImage {
        let mut out = RgbImage::filled(region.width, region.height, fill);
        let x1 = (region.x + region.width).min(self.width);
        let y1 = (region.y + region.height).min(self.height);
        if region.x >= x1 || region.y >= y1 {
            return out;
        }

        let stride = self.width * 3;
        let span = (x1 - region.x) * 3;
        for y in region.y..y1 {
            let src = y * stride + region.x * 3;
            let dst = (y - region.y) * region.width * 3;
            out.data[dst..dst + span].copy_from_slice(&self.data[src..src + span]);
        }
        out
    }

    /// Single-channel intensity using the BT.601 luma weights.
    pub fn to_gray(&self) -> GrayImage {
        let data = self
            .data
            .chunks_exact(3)
            .map(|px| crate::luma([px[0], px[1], px[2]]))
            .collect();
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

impl RgbImage {
    /// Solid-color image.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(width * height * 3);
        for _ in 0..width * height {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self, ImageError> {
        RgbImageView::from_raw(width, height, &data)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn view(&self) -> RgbImageView<'_> {
        RgbImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i..i + 3].copy_from_slice(&rgb);
    }

    /// Paint `region`, clipped to the image.
    pub fn fill_region(&mut self, region: &BoardRegion, rgb: [u8; 3]) {
        let x1 = (region.x + region.width).min(self.width);
        let y1 = (region.y + region.height).min(self.height);
        for y in region.y.min(y1)..y1 {
            for x in region.x.min(x1)..x1 {
                self.put_pixel(x, y, rgb);
            }
        }
    }

    /// Copy `src` into this image with its top-left corner at `(x, y)`, clipped.
    pub fn blit(&mut self, src: &RgbImageView<'_>, x: usize, y: usize) {
        for sy in 0..src.height {
            let dy = y + sy;
            if dy >= self.height {
                break;
            }
            for sx in 0..src.width {
                let dx = x + sx;
                if dx >= self.width {
                    break;
                }
                self.put_pixel(dx, dy, src.pixel(sx, sy));
            }
        }
    }
}

impl<'a> GrayImageView<'a> {
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// Copy the axis-aligned window `[x0, x0+w) x [y0, y0+h)`, clipped to the image.
    pub fn window(&self, x0: usize, y0: usize, w: usize, h: usize) -> GrayImage {
        let x1 = (x0 + w).min(self.width);
        let y1 = (y0 + h).min(self.height);
        let x0 = x0.min(x1);
        let y0 = y0.min(y1);
        let mut data = Vec::with_capacity((x1 - x0) * (y1 - y0));
        for y in y0..y1 {
            data.extend_from_slice(&self.data[y * self.width + x0..y * self.width + x1]);
        }
        GrayImage {
            width: x1 - x0,
            height: y1 - y0,
            data,
        }
    }

    /// Resample to `width x height` with bilinear interpolation.
    pub fn resize(&self, width: usize, height: usize) -> GrayImage {
        if width == self.width && height == self.height {
            return GrayImage {
                width,
                height,
                data: self.data.to_vec(),
            };
        }
        let sx = self.width as f32 / width.max(1) as f32;
        let sy = self.height as f32 / height.max(1) as f32;
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            // pixel-center alignment
            let src_y = (y as f32 + 0.5) * sy - 0.5;
            for x in 0..width {
                let src_x = (x as f32 + 0.5) * sx - 0.5;
                data.push(sample_bilinear_u8(self, src_x, src_y));
            }
        }
        GrayImage {
            width,
            height,
            data,
        }
    }

    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.data.iter().map(|&v| v as u64).sum();
        sum as f32 / self.data.len() as f32
    }
}

impl GrayImage {
    #[inline]
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

#[inline]
fn get_gray_clamped(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    let x = x.clamp(0, src.width as i32 - 1);
    let y = y.clamp(0, src.height as i32 - 1);
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample with edge clamping. `src` must be non-empty.
#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    if src.width == 0 || src.height == 0 {
        return 0.0;
    }
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray_clamped(src, x0, y0) as f32;
    let p10 = get_gray_clamped(src, x0 + 1, y0) as f32;
    let p01 = get_gray_clamped(src, x0, y0 + 1) as f32;
    let p11 = get_gray_clamped(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).round().clamp(0.0, 255.0) as u8
}
