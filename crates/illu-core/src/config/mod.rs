//! Per-attribute illustration configuration.
//!
//! The integrator supplies one [`AttributeConfig`] per logical image
//! attribute, collected in an [`IllustrationConfig`]. Both are immutable for
//! the lifetime of a save.

mod attribute;

pub use attribute::{AttributeConfig, DEFAULT_TOO_SMALL_MESSAGE};

use std::collections::BTreeMap;

use crate::error::IllustrationError;
use crate::layout::StoreLayout;

/// Greatest source dimension accepted before the safety downscale.
pub const DEFAULT_THRESHOLD: u32 = 2000;

/// Illustration settings for one owner collection.
///
/// 单个记录集合的插图配置。
#[derive(Debug, Clone, PartialEq)]
pub struct IllustrationConfig {
    pub layout: StoreLayout,
    pub threshold: u32,
    pub default_crop_steps: u32,
    /// Returned instead of a URL when an attribute has no stored file.
    pub no_image: String,
    attributes: BTreeMap<String, AttributeConfig>,
}

impl IllustrationConfig {
    pub fn new(layout: StoreLayout) -> Self {
        Self {
            layout,
            threshold: DEFAULT_THRESHOLD,
            default_crop_steps: 0,
            no_image: String::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Must be called before attributes are added to affect them.
    pub fn with_default_crop_steps(mut self, steps: u32) -> Self {
        self.default_crop_steps = steps;
        self
    }

    pub fn with_no_image(mut self, no_image: impl Into<String>) -> Self {
        self.no_image = no_image.into();
        self
    }

    /// Register an attribute. A missing `crop_steps` takes the default.
    pub fn with_attribute(mut self, name: impl Into<String>, mut config: AttributeConfig) -> Self {
        if config.crop_steps.is_none() {
            config.crop_steps = Some(self.default_crop_steps);
        }
        self.attributes.insert(name.into(), config);
        self
    }

    pub fn attribute(&self, name: &str) -> Result<&AttributeConfig, IllustrationError> {
        self.attributes
            .get(name)
            .ok_or_else(|| IllustrationError::UnknownAttribute(name.to_string()))
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &AttributeConfig)> {
        self.attributes.iter().map(|(name, cfg)| (name.as_str(), cfg))
    }

    /// Check every attribute and the layout.
    pub fn validate(&self) -> Result<(), IllustrationError> {
        self.layout.validate()?;
        for (name, cfg) in &self.attributes {
            if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(IllustrationError::InvalidConfig(format!(
                    "attribute name \"{}\" cannot be used as a directory",
                    name
                )));
            }
            cfg.validate()
                .map_err(|e| IllustrationError::InvalidConfig(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }
}
