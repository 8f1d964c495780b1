//! Lazily produced resolution levels for one resolved raster.

use illu_core::geometry::height_for;
use illu_core::AttributeConfig;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

pub struct PyramidLevel {
    /// Nominal width directory, `None` for a single unlayered derivative.
    pub width: Option<u32>,
    pub raster: DynamicImage,
}

/// Yields level 0 first, then each smaller level resized from level 0.
///
/// Rasters are never enlarged: a level whose nominal width exceeds the
/// base keeps the base size. Only one derived raster is held besides the
/// base at any time, and the base is released after the last level.
pub struct Pyramid {
    base: Option<DynamicImage>,
    widths: std::vec::IntoIter<Option<u32>>,
    filter: FilterType,
}

impl Pyramid {
    pub fn new(
        raster: DynamicImage,
        aspect: f64,
        config: &AttributeConfig,
        filter: FilterType,
    ) -> Self {
        let base = match config.crop_width {
            Some(width) if raster.width() >= width => {
                let height = height_for(width, aspect);
                if raster.dimensions() == (width, height) {
                    raster
                } else {
                    raster.resize_exact(width, height, filter)
                }
            }
            _ => raster,
        };
        Self {
            base: Some(base),
            widths: config.level_widths().into_iter(),
            filter,
        }
    }
}

impl Iterator for Pyramid {
    type Item = PyramidLevel;

    fn next(&mut self) -> Option<PyramidLevel> {
        let width = self.widths.next()?;
        let last = self.widths.len() == 0;
        let base = self.base.as_ref()?;

        let raster = match width {
            Some(w) if w < base.width() => {
                let h = ((base.height() as u64 * w as u64 + base.width() as u64 / 2)
                    / base.width() as u64)
                    .max(1) as u32;
                base.resize_exact(w, h, self.filter)
            }
            _ if last => self.base.take()?,
            _ => base.clone(),
        };
        if last {
            self.base = None;
        }
        Some(PyramidLevel { width, raster })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.base.is_some() { self.widths.len() } else { 0 };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Pyramid {}
