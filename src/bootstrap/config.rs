//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML file into [`IllustratedConfig`]. Missing keys take serde
//! defaults; semantic checks happen in [`IllustrationConfig::validate`] when
//! the config is turned into a collection's settings.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use illu_core::config::DEFAULT_THRESHOLD;
use illu_core::layout::{collection_name, DEFAULT_ILLUSTRATION_DIRECTORY};
use illu_core::{AttributeConfig, IllustrationConfig, IllustrationError, StoreLayout};
use serde::Deserialize;

/// File-level settings shared by the attributes of one owner collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IllustratedConfig {
    pub root_dir: PathBuf,
    pub base_url: String,
    pub illustration_directory: String,
    /// Explicit collection directory; derived from the owner type otherwise.
    pub collection: Option<String>,
    pub threshold: u32,
    pub default_crop_steps: u32,
    pub no_image: String,
    /// SQLite database holding the stored file names. In-memory when unset.
    pub database_url: Option<String>,
    pub attributes: BTreeMap<String, AttributeConfig>,
}

impl Default for IllustratedConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            base_url: "/".to_string(),
            illustration_directory: DEFAULT_ILLUSTRATION_DIRECTORY.to_string(),
            collection: None,
            threshold: DEFAULT_THRESHOLD,
            default_crop_steps: 0,
            no_image: String::new(),
            database_url: None,
            attributes: BTreeMap::new(),
        }
    }
}

impl IllustratedConfig {
    /// Collection directory for records of `owner_type`.
    pub fn collection_for(&self, owner_type: &str) -> String {
        self.collection
            .clone()
            .unwrap_or_else(|| collection_name(owner_type))
    }

    /// Validated settings for the collection of `owner_type`.
    pub fn to_illustration_config(
        &self,
        owner_type: &str,
    ) -> Result<IllustrationConfig, IllustrationError> {
        let layout = StoreLayout::new(
            &self.root_dir,
            &self.base_url,
            self.collection_for(owner_type),
        )
        .with_illustration_directory(&self.illustration_directory);

        let config = self.attributes.iter().fold(
            IllustrationConfig::new(layout)
                .with_threshold(self.threshold)
                .with_default_crop_steps(self.default_crop_steps)
                .with_no_image(&self.no_image),
            |config, (name, attribute)| config.with_attribute(name, attribute.clone()),
        );
        config.validate()?;
        Ok(config)
    }
}

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or its content does not map
/// onto [`IllustratedConfig`].
pub fn load_config(config_path: impl AsRef<Path>) -> anyhow::Result<IllustratedConfig> {
    let config_path = config_path.as_ref();
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}
