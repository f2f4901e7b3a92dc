//! Color-space helpers.
//!
//! HSV follows the 8-bit convention used by most vision toolkits:
//! hue in `[0, 180)` (degrees halved), saturation and value in `[0, 255]`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// BT.601 luma, rounded to the nearest level.
#[inline]
pub fn luma(rgb: [u8; 3]) -> u8 {
    let [r, g, b] = rgb.map(u32::from);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 { 0 } else { (255 * diff + v / 2) / v };

    let h = if diff == 0 {
        0.0
    } else {
        let d = diff as f32;
        let deg = if v == r {
            60.0 * (g - b) as f32 / d
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / d
        } else {
            240.0 + 60.0 * (r - g) as f32 / d
        };
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    };

    Hsv {
        h: ((h / 2.0).round() as u32 % 180) as u8,
        s: s as u8,
        v: v as u8,
    }
}

/// Inclusive HSV box used to build binary masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsvRange {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl Default for HsvRange {
    /// The green accent of the dark squares on the default board theme.
    fn default() -> Self {
        Self {
            h_min: 35,
            h_max: 85,
            s_min: 40,
            s_max: 255,
            v_min: 40,
            v_max: 255,
        }
    }
}

impl HsvRange {
    #[inline]
    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.h_min..=self.h_max).contains(&hsv.h)
            && (self.s_min..=self.s_max).contains(&hsv.s)
            && (self.v_min..=self.v_max).contains(&hsv.v)
    }

    #[inline]
    pub fn contains_rgb(&self, rgb: [u8; 3]) -> bool {
        self.contains(rgb_to_hsv(rgb))
    }
}
