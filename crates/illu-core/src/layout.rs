//! On-disk layout of derived artifacts.
//!
//! `<root>/<illustration_directory>/<collection>/<attribute>[/<width>w]/<stem>.<ext>`
//!
//! The `<width>w` segment only exists for layered attributes. This layout is
//! the persisted format and must stay stable.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::AttributeConfig;
use crate::error::IllustrationError;

pub const DEFAULT_ILLUSTRATION_DIRECTORY: &str = "illustrations";

/// Where derivatives of one owner collection live, on disk and on the web.
///
/// 某个记录集合的派生图像在磁盘与 Web 上的位置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLayout {
    pub root_dir: PathBuf,
    pub base_url: String,
    pub illustration_directory: String,
    pub collection: String,
}

impl StoreLayout {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            base_url: base_url.into(),
            illustration_directory: DEFAULT_ILLUSTRATION_DIRECTORY.to_string(),
            collection: collection.into(),
        }
    }

    pub fn with_illustration_directory(mut self, directory: impl Into<String>) -> Self {
        self.illustration_directory = directory.into();
        self
    }

    pub fn collection_dir(&self) -> PathBuf {
        self.root_dir
            .join(&self.illustration_directory)
            .join(&self.collection)
    }

    pub fn path_for(&self, key: &ArtifactKey) -> PathBuf {
        self.collection_dir().join(key.relative_path())
    }

    pub fn url_for(&self, key: &ArtifactKey) -> String {
        let mut url = self.base_url.trim_end_matches('/').to_string();
        for segment in [
            self.illustration_directory.as_str(),
            self.collection.as_str(),
            key.attribute.as_str(),
        ] {
            url.push('/');
            url.push_str(segment);
        }
        if let Some(width) = key.width {
            url.push_str(&format!("/{}w", width));
        }
        url.push('/');
        url.push_str(&key.file_name);
        url
    }

    pub(crate) fn validate(&self) -> Result<(), IllustrationError> {
        for (label, segment) in [
            ("illustration_directory", &self.illustration_directory),
            ("collection", &self.collection),
        ] {
            if segment.is_empty() || segment.contains(['/', '\\']) || segment == ".." {
                return Err(IllustrationError::InvalidConfig(format!(
                    "{} \"{}\" must be a single path segment",
                    label, segment
                )));
            }
        }
        Ok(())
    }
}

/// Owner collection name derived from a record type name:
/// `app::models::BlogPost` becomes `blog_post`.
///
/// An underscore goes before every uppercase letter that does not follow
/// another uppercase letter, so `Post2Item` becomes `post2_item` and
/// `HTMLPage` stays `htmlpage`.
pub fn collection_name(type_name: &str) -> String {
    let base = type_name.rsplit("::").next().unwrap_or(type_name);
    let mut out = String::with_capacity(base.len() + 4);
    let mut prev: Option<char> = None;
    for c in base.chars() {
        if c.is_uppercase() {
            if matches!(prev, Some(p) if !p.is_uppercase()) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Map a read-access step onto a level index.
///
/// Step 0 is the largest level, growing steps are smaller, negative steps
/// count from the smallest (`-1`). Out-of-range steps wrap around.
pub fn resolve_step(step: i32, level_count: u32) -> usize {
    if level_count <= 1 {
        return 0;
    }
    let resolved = (step as i64).rem_euclid(level_count as i64) as usize;
    if step < -(level_count as i32) || step >= level_count as i32 {
        #[cfg(feature = "tracing")]
        tracing::debug!(step, level_count, resolved, "Step out of range; wrapped");
    }
    resolved
}

/// One stored file of an artifact set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    pub attribute: String,
    pub width: Option<u32>,
    pub file_name: String,
}

impl ArtifactKey {
    pub fn new(
        attribute: impl Into<String>,
        width: Option<u32>,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            width,
            file_name: file_name.into(),
        }
    }

    /// Path below the collection directory.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.attribute);
        if let Some(width) = self.width {
            path.push(format!("{}w", width));
        }
        path.push(&self.file_name);
        path
    }
}

/// Every file belonging to one (record, attribute) at one point in time.
///
/// 某个（记录，属性）在某一时刻对应的全部派生文件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedArtifactSet {
    attribute: String,
    file_name: String,
    widths: Vec<Option<u32>>,
}

impl DerivedArtifactSet {
    pub fn new(
        attribute: impl Into<String>,
        file_name: impl Into<String>,
        config: &AttributeConfig,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            file_name: file_name.into(),
            widths: config.level_widths(),
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Keys largest level first.
    pub fn keys(&self) -> Vec<ArtifactKey> {
        self.widths
            .iter()
            .map(|width| ArtifactKey::new(&self.attribute, *width, &self.file_name))
            .collect()
    }

    pub fn key_for_step(&self, step: i32) -> ArtifactKey {
        let index = resolve_step(step, self.widths.len() as u32);
        ArtifactKey::new(&self.attribute, self.widths[index], &self.file_name)
    }

    /// Smallest level whose nominal width is at least `size`; the largest
    /// level when `size` is 0 or exceeds every level.
    pub fn key_for_size(&self, size: u32) -> ArtifactKey {
        let width = if size == 0 {
            self.widths[0]
        } else {
            self.widths
                .iter()
                .rev()
                .copied()
                .find(|w| w.map_or(true, |w| w >= size))
                .unwrap_or(self.widths[0])
        };
        ArtifactKey::new(&self.attribute, width, &self.file_name)
    }
}
