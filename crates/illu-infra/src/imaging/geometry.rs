//! Applies the core geometry plan to a decoded raster.

use illu_core::geometry::{rotated_dimensions, safety_scale, scale_dimensions};
use illu_core::{AttributeConfig, CropInstruction, Dimensions, IllustrationError};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use tracing::debug;

/// The cropped raster plus the facts later steps need.
pub struct ResolvedRaster {
    pub raster: DynamicImage,
    /// Safety downscale applied before cropping; `1.0` when none.
    pub scale: f64,
    /// Aspect ratio (width / height) the pyramid is sized with.
    pub aspect: f64,
}

pub struct GeometryResolver {
    threshold: u32,
    filter: FilterType,
}

impl GeometryResolver {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            filter: FilterType::Lanczos3,
        }
    }

    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Downscale to the threshold, rotate, crop, and enforce the minimum size.
    ///
    /// Without a drawn rectangle the whole raster is kept. The aspect comes
    /// from the attribute, then the widget, then the raster itself.
    pub fn resolve(
        &self,
        source: DynamicImage,
        crop: &CropInstruction,
        config: &AttributeConfig,
        original_name: &str,
    ) -> Result<ResolvedRaster, IllustrationError> {
        let original = Dimensions::new(source.width(), source.height());
        let scale = safety_scale(original, self.threshold);
        let scaled = if scale < 1.0 {
            let target = scale_dimensions(original, scale);
            debug!(
                from_width = original.width,
                from_height = original.height,
                to_width = target.width,
                to_height = target.height,
                "Source exceeds threshold; downscaling before crop"
            );
            source.resize_exact(target.width, target.height, self.filter)
        } else {
            source
        };

        let rotated = rotate(scaled, crop.rotation());
        let bounds = Dimensions::new(rotated.width(), rotated.height());

        let preferred = match config.aspect_ratio {
            Some(fixed) => Some(fixed),
            None => crop.normalized_aspect()?,
        };
        let (cropped, aspect) = match crop.scaled_rect(scale) {
            Some(rect) => {
                let rect = rect.fit_within(bounds)?;
                let cropped = rotated.crop_imm(rect.x, rect.y, rect.width, rect.height);
                (cropped, preferred.or_else(|| rect.dimensions().aspect()))
            }
            None => (rotated, preferred.or_else(|| bounds.aspect())),
        };
        let aspect = aspect.unwrap_or(1.0);

        let actual = Dimensions::new(cropped.width(), cropped.height());
        if let Some(minimum) = config.minimum_crop(aspect) {
            if !actual.covers(minimum) {
                return Err(IllustrationError::TooSmall {
                    original_name: original_name.to_string(),
                    width: original.width,
                    height: original.height,
                    message: config.too_small_message(
                        original_name,
                        original.width,
                        original.height,
                    ),
                });
            }
        }

        Ok(ResolvedRaster {
            raster: cropped,
            scale,
            aspect,
        })
    }
}

/// Clockwise rotation by whole degrees in `[0, 360)`.
pub fn rotate(raster: DynamicImage, degrees: u32) -> DynamicImage {
    match degrees % 360 {
        0 => raster,
        90 => raster.rotate90(),
        180 => raster.rotate180(),
        270 => raster.rotate270(),
        other => DynamicImage::ImageRgba8(rotate_free(&raster.to_rgba8(), other)),
    }
}

/// Arbitrary-angle rotation onto a transparent canvas large enough to hold
/// the rotated image, with bilinear sampling.
fn rotate_free(src: &RgbaImage, degrees: u32) -> RgbaImage {
    let (w, h) = src.dimensions();
    let out = rotated_dimensions(Dimensions::new(w, h), degrees);
    let (sin, cos) = (degrees as f64).to_radians().sin_cos();
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (ox, oy) = (out.width as f64 / 2.0, out.height as f64 / 2.0);

    RgbaImage::from_fn(out.width, out.height, |x, y| {
        let dx = x as f64 + 0.5 - ox;
        let dy = y as f64 + 0.5 - oy;
        // inverse of the clockwise rotation (y axis points down)
        let sx = dx * cos + dy * sin + cx - 0.5;
        let sy = -dx * sin + dy * cos + cy - 0.5;
        sample_bilinear(src, sx, sy).unwrap_or(Rgba([0, 0, 0, 0]))
    })
}

fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Option<Rgba<u8>> {
    let (w, h) = src.dimensions();
    if x < -0.5 || y < -0.5 || x > w as f64 - 0.5 || y > h as f64 - 0.5 {
        return None;
    }
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let p00 = src.get_pixel(x0, y0).0;
    let p10 = src.get_pixel(x1, y0).0;
    let p01 = src.get_pixel(x0, y1).0;
    let p11 = src.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Some(Rgba(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    fn raster(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([0, 128, 255, 255])))
    }

    #[test]
    fn crops_to_rectangle() {
        let resolver = GeometryResolver::new(2000);
        let crop = CropInstruction::new(10, 20, 300, 150, 2.0);
        let resolved = resolver
            .resolve(raster(800, 600), &crop, &AttributeConfig::with_crop_width(240), "a.png")
            .unwrap();
        assert_eq!(resolved.raster.dimensions(), (300, 150));
        assert_eq!(resolved.scale, 1.0);
        assert_eq!(resolved.aspect, 2.0);
    }

    #[test]
    fn oversized_source_is_scaled_before_crop() {
        let resolver = GeometryResolver::new(1000).with_filter(FilterType::Triangle);
        let crop = CropInstruction::new(0, 0, 2000, 1000, 2.0);
        let resolved = resolver
            .resolve(raster(4000, 2000), &crop, &AttributeConfig::default(), "big.png")
            .unwrap();
        assert_eq!(resolved.scale, 0.25);
        assert_eq!(resolved.raster.dimensions(), (500, 250));
    }

    #[test]
    fn rotation_happens_before_crop() {
        let resolver = GeometryResolver::new(2000);
        // 400×200 rotated a quarter turn is 200×400; this crop only fits afterwards
        let crop = CropInstruction::new(0, 250, 200, 150, 4.0 / 3.0).with_degrees(90);
        let resolved = resolver
            .resolve(raster(400, 200), &crop, &AttributeConfig::default(), "r.png")
            .unwrap();
        assert_eq!(resolved.raster.dimensions(), (200, 150));
    }

    #[test]
    fn too_small_crop_is_rejected_with_original_size() {
        let resolver = GeometryResolver::new(2000);
        let crop = CropInstruction::new(0, 0, 200, 200, 1.0);
        let err = resolver
            .resolve(raster(640, 480), &crop, &AttributeConfig::with_crop_width(240), "cat.jpg")
            .err()
            .unwrap();
        match err {
            IllustrationError::TooSmall { original_name, width, height, message } => {
                assert_eq!(original_name, "cat.jpg");
                assert_eq!((width, height), (640, 480));
                assert_eq!(message, "Image \"cat.jpg\" is too small (640×480).");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn too_small_crop_is_accepted_when_allowed() {
        let resolver = GeometryResolver::new(2000);
        let crop = CropInstruction::new(0, 0, 200, 200, 1.0);
        let cfg = AttributeConfig::with_crop_width(240).reject_too_small(false);
        let resolved = resolver.resolve(raster(640, 480), &crop, &cfg, "cat.jpg").unwrap();
        assert_eq!(resolved.raster.dimensions(), (200, 200));
    }

    #[test]
    fn crop_outside_raster_is_invalid() {
        let resolver = GeometryResolver::new(2000);
        let crop = CropInstruction::new(500, 0, 300, 100, 3.0);
        let err = resolver
            .resolve(raster(640, 480), &crop, &AttributeConfig::default(), "a.png")
            .err()
            .unwrap();
        assert!(matches!(err, IllustrationError::InvalidCrop(_)));
    }

    #[test]
    fn no_rectangle_keeps_whole_raster_and_its_ratio() {
        let resolver = GeometryResolver::new(2000);
        let resolved = resolver
            .resolve(
                raster(640, 480),
                &CropInstruction::default(),
                &AttributeConfig::with_crop_width(240),
                "a.png",
            )
            .unwrap();
        assert_eq!(resolved.raster.dimensions(), (640, 480));
        assert!((resolved.aspect - 640.0 / 480.0).abs() < 1e-9);
    }

    #[test]
    fn no_rectangle_still_honors_widget_aspect() {
        let resolver = GeometryResolver::new(2000);
        let crop = CropInstruction::new(0, 0, 0, 0, 2000.0);
        let resolved = resolver
            .resolve(raster(640, 480), &crop, &AttributeConfig::default(), "a.png")
            .unwrap();
        assert_eq!(resolved.raster.dimensions(), (640, 480));
        assert_eq!(resolved.aspect, 2.0);
    }

    #[test]
    fn widget_aspect_out_of_range_is_rejected() {
        let resolver = GeometryResolver::new(2000);
        let crop = CropInstruction::new(0, 0, 480, 360, 0.01);
        let cfg = AttributeConfig::with_crop_width(240).reject_too_small(false);
        let err = resolver.resolve(raster(480, 360), &crop, &cfg, "a.png").err().unwrap();
        assert!(matches!(err, IllustrationError::InvalidCrop(_)));
    }

    #[test]
    fn fixed_aspect_overrides_widget_value() {
        let resolver = GeometryResolver::new(2000);
        let crop = CropInstruction::new(0, 0, 300, 300, 1.0);
        let cfg = AttributeConfig::default().aspect_ratio(1.5);
        let resolved = resolver.resolve(raster(640, 480), &crop, &cfg, "a.png").unwrap();
        assert_eq!(resolved.aspect, 1.5);
    }

    #[test]
    fn free_rotation_grows_canvas_and_keeps_center() {
        let rotated = rotate(raster(100, 100), 45);
        assert_eq!(rotated.dimensions(), (141, 141));
        let center = rotated.to_rgba8().get_pixel(70, 70).0;
        assert_eq!(center, [0, 128, 255, 255]);
        let corner = rotated.to_rgba8().get_pixel(0, 0).0;
        assert_eq!(corner[3], 0);
    }
}
