//! Pixel geometry shared by the raster adapters: safety scale, rotation
//! bounds, crop rectangles and the minimum-size policy.
//!
//! Everything here is pure arithmetic; the adapters apply the results to
//! actual rasters.

use crate::error::IllustrationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn greatest(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Width divided by height, or `None` for an empty raster.
    pub fn aspect(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }

    pub fn covers(&self, other: Dimensions) -> bool {
        self.width >= other.width && self.height >= other.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// Fit the rectangle into `bounds`.
    ///
    /// Rounding a scaled rectangle may push its far edge one pixel past the
    /// raster; that overflow is trimmed. Anything larger is an invalid crop.
    pub fn fit_within(self, bounds: Dimensions) -> Result<CropRect, IllustrationError> {
        if self.width == 0 || self.height == 0 {
            return Err(IllustrationError::InvalidCrop(
                "crop rectangle is empty".to_string(),
            ));
        }
        if self.x >= bounds.width || self.y >= bounds.height {
            return Err(IllustrationError::InvalidCrop(format!(
                "crop origin ({}, {}) lies outside {}×{}",
                self.x, self.y, bounds.width, bounds.height
            )));
        }

        let right = self.x as u64 + self.width as u64;
        let bottom = self.y as u64 + self.height as u64;
        let overflow_x = right.saturating_sub(bounds.width as u64);
        let overflow_y = bottom.saturating_sub(bounds.height as u64);
        if overflow_x > 1 || overflow_y > 1 {
            return Err(IllustrationError::InvalidCrop(format!(
                "crop {}×{} at ({}, {}) exceeds {}×{}",
                self.width, self.height, self.x, self.y, bounds.width, bounds.height
            )));
        }

        Ok(CropRect {
            x: self.x,
            y: self.y,
            width: self.width - overflow_x as u32,
            height: self.height - overflow_y as u32,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Factor that brings the greatest side of `source` down to `threshold`.
///
/// Returns `1.0` when the source already fits or the threshold is disabled (0).
pub fn safety_scale(source: Dimensions, threshold: u32) -> f64 {
    let greatest = source.greatest();
    if threshold == 0 || greatest <= threshold {
        return 1.0;
    }
    threshold as f64 / greatest as f64
}

pub fn scale_dimensions(source: Dimensions, scale: f64) -> Dimensions {
    if scale == 1.0 {
        return source;
    }
    Dimensions::new(
        scale_px(source.width, scale).max(1),
        scale_px(source.height, scale).max(1),
    )
}

/// Round `value * scale` to the nearest pixel.
pub fn scale_px(value: u32, scale: f64) -> u32 {
    (value as f64 * scale).round() as u32
}

/// Normalize whole degrees into `[0, 360)`.
pub fn normalize_degrees(degrees: i32) -> u32 {
    degrees.rem_euclid(360) as u32
}

/// Bounding box of `source` after a clockwise rotation by `degrees`.
///
/// Quarter turns are exact; other angles produce the enclosing box of the
/// rotated rectangle.
pub fn rotated_dimensions(source: Dimensions, degrees: u32) -> Dimensions {
    match degrees % 360 {
        0 | 180 => source,
        90 | 270 => Dimensions::new(source.height, source.width),
        other => {
            let (sin, cos) = (other as f64).to_radians().sin_cos();
            let (w, h) = (source.width as f64, source.height as f64);
            Dimensions::new(
                (w * cos.abs() + h * sin.abs()).round().max(1.0) as u32,
                (w * sin.abs() + h * cos.abs()).round().max(1.0) as u32,
            )
        }
    }
}

/// Widest aspect ratio a derivative may be sized with; the narrowest is its
/// reciprocal.
pub const MAX_ASPECT: f64 = 30.0;

/// Whether `aspect` (width / height) keeps derivative heights within
/// `MAX_ASPECT` times their width.
pub fn aspect_in_bounds(aspect: f64) -> bool {
    aspect.is_finite() && (1.0 / MAX_ASPECT..=MAX_ASPECT).contains(&aspect)
}

/// Height that goes with `width` at `aspect` (width / height), at least 1px.
pub fn height_for(width: u32, aspect: f64) -> u32 {
    ((width as f64 / aspect).round() as u32).max(1)
}

/// The smallest crop accepted for an attribute with `crop_width` at `aspect`.
pub fn minimum_crop(crop_width: u32, aspect: f64) -> Dimensions {
    Dimensions::new(crop_width, height_for(crop_width, aspect))
}
