//! Random, per-attribute unique file names for artifact sets.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::IllustrationError;
use crate::ids::Stem;
use crate::image_kind::ImageKind;

/// 36^5: the smallest number with six base-36 digits.
const STEM_LOWER: u64 = 60_466_176;
const STEM_UPPER: u64 = i32::MAX as u64;
const DEFAULT_MAX_ATTEMPTS: u32 = 64;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// The file name stored on the owning record: `<stem>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName {
    pub stem: Stem,
    pub extension: String,
}

impl ArtifactName {
    pub fn new(stem: Stem, kind: ImageKind) -> Self {
        Self {
            stem,
            extension: kind.extension().to_string(),
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.stem, self.extension)
    }
}

impl FromStr for ArtifactName {
    type Err = IllustrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Ok(Self {
                stem: Stem::from(stem),
                extension: ext.to_string(),
            }),
            _ => Err(IllustrationError::InvalidConfig(format!(
                "stored file name \"{}\" has no extension",
                s
            ))),
        }
    }
}

pub fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Draws random base-36 stems until one is free.
///
/// 随机生成 base-36 文件名主干，直到不与已有名称冲突。
#[derive(Debug, Clone)]
pub struct StemAllocator {
    max_attempts: u32,
}

impl Default for StemAllocator {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl StemAllocator {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Allocate with the thread-local generator.
    pub fn allocate<F>(&self, exists: F) -> Result<Stem, IllustrationError>
    where
        F: FnMut(&str) -> anyhow::Result<bool>,
    {
        self.allocate_with(&mut rand::rng(), exists)
    }

    /// `exists` reports whether any stored name of the attribute starts with
    /// the candidate.
    pub fn allocate_with<R, F>(&self, rng: &mut R, mut exists: F) -> Result<Stem, IllustrationError>
    where
        R: Rng + ?Sized,
        F: FnMut(&str) -> anyhow::Result<bool>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = to_base36(rng.random_range(STEM_LOWER..=STEM_UPPER));
            if !exists(&candidate)? {
                return Ok(Stem::from(candidate));
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, candidate = %candidate, "Stem collision; drawing again");
            #[cfg(not(feature = "tracing"))]
            let _ = attempt;
        }
        Err(IllustrationError::NamingExhausted {
            attempts: self.max_attempts,
        })
    }
}
