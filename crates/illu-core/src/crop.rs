use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::IllustrationError;
use crate::geometry::{aspect_in_bounds, normalize_degrees, scale_px, CropRect};

/// Crop widgets may report the aspect ratio multiplied by 1000.
const WIDGET_ASPECT_FACTOR: f64 = 1000.0;

/// Any aspect above this is taken to be a widget value times 1000.
const WIDGET_ASPECT_LIMIT: f64 = 30.0;

/// Crop selection made in the crop widget, in source pixels.
///
/// 裁剪控件给出的裁剪选择（以源图像素为单位）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropInstruction {
    #[serde(default, deserialize_with = "pixel")]
    pub x: u32,
    #[serde(default, deserialize_with = "pixel")]
    pub y: u32,
    #[serde(default, deserialize_with = "pixel")]
    pub w: u32,
    #[serde(default, deserialize_with = "pixel")]
    pub h: u32,
    #[serde(default, deserialize_with = "whole_degrees")]
    pub degrees: i32,
    /// Width / height the derivatives are sized with. `0` when the widget
    /// did not report one.
    #[serde(default)]
    pub aspect: f64,
}

/// Widgets send fractional pixels; round them.
fn pixel<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(D::Error::custom(format!("invalid pixel value {}", value)));
    }
    Ok(value.round() as u32)
}

fn whole_degrees<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() {
        return Err(D::Error::custom("rotation must be finite"));
    }
    Ok(value.round().rem_euclid(360.0) as i32)
}

impl Default for CropInstruction {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            degrees: 0,
            aspect: 0.0,
        }
    }
}

impl CropInstruction {
    pub fn new(x: u32, y: u32, w: u32, h: u32, aspect: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            degrees: 0,
            aspect,
        }
    }

    pub fn with_degrees(mut self, degrees: i32) -> Self {
        self.degrees = degrees;
        self
    }

    /// Parse the JSON object posted by the crop widget.
    pub fn from_json(json: &str) -> Result<Self, IllustrationError> {
        serde_json::from_str(json)
            .map_err(|e| IllustrationError::InvalidCrop(format!("malformed crop data: {}", e)))
    }

    /// Whether a rectangle was actually drawn.
    pub fn has_rectangle(&self) -> bool {
        self.w > 0 && self.h > 0
    }

    pub fn rotation(&self) -> u32 {
        normalize_degrees(self.degrees)
    }

    /// Aspect ratio (width / height), compensating widget values reported
    /// times 1000. `None` when the widget did not report one.
    ///
    /// The value comes from the client, so anything outside
    /// [`aspect_in_bounds`] is an invalid crop rather than a size request.
    pub fn normalized_aspect(&self) -> Result<Option<f64>, IllustrationError> {
        if self.aspect == 0.0 {
            return Ok(None);
        }
        let aspect = if self.aspect > WIDGET_ASPECT_LIMIT {
            self.aspect / WIDGET_ASPECT_FACTOR
        } else {
            self.aspect
        };
        if !aspect_in_bounds(aspect) {
            return Err(IllustrationError::InvalidCrop(format!(
                "aspect ratio {} is out of range",
                self.aspect
            )));
        }
        Ok(Some(aspect))
    }

    /// The rectangle scaled by the safety factor, or `None` if none was drawn.
    pub fn scaled_rect(&self, scale: f64) -> Option<CropRect> {
        if !self.has_rectangle() {
            return None;
        }
        Some(CropRect {
            x: scale_px(self.x, scale),
            y: scale_px(self.y, scale),
            width: scale_px(self.w, scale).max(1),
            height: scale_px(self.h, scale).max(1),
        })
    }
}
