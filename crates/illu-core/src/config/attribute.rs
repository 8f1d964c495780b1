use serde::{Deserialize, Serialize};

use crate::geometry::{aspect_in_bounds, minimum_crop, Dimensions, MAX_ASPECT};
use crate::image_kind::ImageKind;

pub const DEFAULT_TOO_SMALL_MESSAGE: &str = "Image \"{name}\" is too small ({width}×{height}).";

/// Configuration of one illustration attribute.
///
/// 单个插图属性的配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeConfig {
    /// Width of the largest derivative. `None` keeps the crop at native size
    /// and stores a single file.
    pub crop_width: Option<u32>,
    /// Number of pyramid levels; `None` takes the collection default.
    pub crop_steps: Option<u32>,
    pub reject_too_small: bool,
    /// Fixed aspect ratio (width / height) overriding the crop widget's value.
    pub aspect_ratio: Option<f64>,
    /// Record field that keeps the aspect ratio each stored set was derived
    /// with. Written on save and blanked with the file name. Excludes
    /// `aspect_ratio`.
    pub aspect_attribute: Option<String>,
    /// Encode every derivative as this type instead of the source type.
    pub mime_override: Option<ImageKind>,
    pub allowed_types: Vec<ImageKind>,
    pub max_upload_bytes: Option<u64>,
    /// Template with `{name}`, `{width}` and `{height}` placeholders.
    pub too_small_message: String,
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self {
            crop_width: None,
            crop_steps: None,
            reject_too_small: true,
            aspect_ratio: None,
            aspect_attribute: None,
            mime_override: None,
            allowed_types: vec![ImageKind::Jpeg, ImageKind::Png, ImageKind::Gif],
            max_upload_bytes: None,
            too_small_message: DEFAULT_TOO_SMALL_MESSAGE.to_string(),
        }
    }
}

impl AttributeConfig {
    pub fn with_crop_width(crop_width: u32) -> Self {
        Self {
            crop_width: Some(crop_width),
            ..Self::default()
        }
    }

    pub fn crop_steps(mut self, steps: u32) -> Self {
        self.crop_steps = Some(steps);
        self
    }

    pub fn reject_too_small(mut self, reject: bool) -> Self {
        self.reject_too_small = reject;
        self
    }

    pub fn aspect_ratio(mut self, aspect: f64) -> Self {
        self.aspect_ratio = Some(aspect);
        self
    }

    pub fn aspect_attribute(mut self, field: impl Into<String>) -> Self {
        self.aspect_attribute = Some(field.into());
        self
    }

    pub fn mime_override(mut self, kind: ImageKind) -> Self {
        self.mime_override = Some(kind);
        self
    }

    pub fn allowed_types(mut self, kinds: impl IntoIterator<Item = ImageKind>) -> Self {
        self.allowed_types = kinds.into_iter().collect();
        self
    }

    pub fn max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = Some(limit);
        self
    }

    pub fn steps(&self) -> u32 {
        self.crop_steps.unwrap_or(0)
    }

    /// Whether derivatives live in `<width>w` subdirectories.
    pub fn is_layered(&self) -> bool {
        self.crop_width.is_some() && self.steps() > 0
    }

    /// Nominal width of each stored level, largest first. `None` is the
    /// single derivative stored without a width directory.
    pub fn level_widths(&self) -> Vec<Option<u32>> {
        match self.crop_width {
            Some(width) if self.steps() > 0 => {
                (0..self.steps()).map(|i| Some(width >> i)).collect()
            }
            _ => vec![None],
        }
    }

    /// Number of files one artifact set occupies on disk.
    pub fn level_count(&self) -> u32 {
        if self.is_layered() {
            self.steps()
        } else {
            1
        }
    }

    /// Smallest acceptable crop at `aspect`, if the size policy applies.
    pub fn minimum_crop(&self, aspect: f64) -> Option<Dimensions> {
        match self.crop_width {
            Some(width) if self.reject_too_small => Some(minimum_crop(width, aspect)),
            _ => None,
        }
    }

    pub fn too_small_message(&self, name: &str, width: u32, height: u32) -> String {
        self.too_small_message
            .replace("{name}", name)
            .replace("{width}", &width.to_string())
            .replace("{height}", &height.to_string())
    }

    pub fn accepts(&self, kind: ImageKind) -> bool {
        self.allowed_types.is_empty() || self.allowed_types.contains(&kind)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if let Some(width) = self.crop_width {
            if width == 0 {
                return Err("crop_width must be positive".to_string());
            }
            let steps = self.steps();
            if steps > 0 && (steps > 32 || width >> (steps - 1) == 0) {
                return Err(format!(
                    "{} steps from crop_width {} reach zero width",
                    steps, width
                ));
            }
        }
        if let Some(aspect) = self.aspect_ratio {
            if !aspect_in_bounds(aspect) {
                return Err(format!(
                    "aspect_ratio {} must lie within 1/{} and {}",
                    aspect, MAX_ASPECT, MAX_ASPECT
                ));
            }
        }
        if let Some(field) = &self.aspect_attribute {
            if field.is_empty() {
                return Err("aspect_attribute must not be empty".to_string());
            }
            if self.aspect_ratio.is_some() {
                return Err(format!(
                    "aspect_ratio and aspect_attribute \"{}\" are mutually exclusive",
                    field
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_widths_halve_by_shift() {
        let cfg = AttributeConfig::with_crop_width(240).crop_steps(3);
        assert_eq!(cfg.level_widths(), vec![Some(240), Some(120), Some(60)]);
        assert!(cfg.is_layered());
        assert_eq!(cfg.level_count(), 3);

        let odd = AttributeConfig::with_crop_width(250).crop_steps(3);
        assert_eq!(odd.level_widths(), vec![Some(250), Some(125), Some(62)]);
    }

    #[test]
    fn zero_steps_or_no_width_is_a_single_level() {
        assert_eq!(
            AttributeConfig::with_crop_width(240).crop_steps(0).level_widths(),
            vec![None]
        );
        assert_eq!(AttributeConfig::default().crop_steps(4).level_widths(), vec![None]);
        assert!(!AttributeConfig::default().crop_steps(4).is_layered());
    }

    #[test]
    fn too_small_message_fills_placeholders() {
        let cfg = AttributeConfig::default();
        assert_eq!(
            cfg.too_small_message("cat.png", 100, 80),
            "Image \"cat.png\" is too small (100×80)."
        );
    }

    #[test]
    fn minimum_crop_only_when_rejecting() {
        let cfg = AttributeConfig::with_crop_width(240);
        assert_eq!(cfg.minimum_crop(2.0), Some(Dimensions::new(240, 120)));
        assert_eq!(cfg.clone().reject_too_small(false).minimum_crop(2.0), None);
        assert_eq!(AttributeConfig::default().minimum_crop(2.0), None);
    }

    #[test]
    fn validate_catches_vanishing_levels() {
        assert!(AttributeConfig::with_crop_width(240).crop_steps(8).validate().is_ok());
        assert!(AttributeConfig::with_crop_width(240).crop_steps(9).validate().is_err());
        assert!(AttributeConfig::with_crop_width(0).validate().is_err());
        assert!(AttributeConfig::default().aspect_ratio(-1.0).validate().is_err());
        assert!(AttributeConfig::default().aspect_ratio(0.001).validate().is_err());
    }

    #[test]
    fn aspect_attribute_excludes_fixed_aspect() {
        assert!(AttributeConfig::default().aspect_attribute("cover_aspect").validate().is_ok());
        assert!(AttributeConfig::default().aspect_attribute("").validate().is_err());
        let both = AttributeConfig::default().aspect_ratio(1.5).aspect_attribute("cover_aspect");
        assert!(both.validate().is_err());
    }

    #[test]
    fn empty_allow_list_accepts_everything() {
        let cfg = AttributeConfig::default().allowed_types(Vec::new());
        assert!(cfg.accepts(ImageKind::Avif));
        assert!(!AttributeConfig::default().accepts(ImageKind::Webp));
    }
}
