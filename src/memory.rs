//! `JAVA_MEMORY` normalization.

use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;

/// Heap size used when `JAVA_MEMORY` is unset or unusable.
pub const DEFAULT_JAVA_MEMORY: &str = "1024M";

lazy_static! {
    static ref MEGABYTES: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref WITH_UNIT: Regex = Regex::new(r"^[0-9]+[GM]$").unwrap();
}

/// A normalized `-Xmx` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryFlag {
    flag: String,
    fallback: bool,
}

impl MemoryFlag {
    /// The flag, e.g. `-Xmx2G`.
    pub fn as_str(&self) -> &str {
        &self.flag
    }

    /// Whether the input was rejected and the default heap size used instead.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    fn fallback() -> Self {
        Self {
            flag: format!("-Xmx{DEFAULT_JAVA_MEMORY}"),
            fallback: true,
        }
    }
}

impl Display for MemoryFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.flag)
    }
}

impl From<MemoryFlag> for String {
    fn from(value: MemoryFlag) -> Self {
        value.flag
    }
}

/// Turn a `JAVA_MEMORY` value into a maximum heap flag.
///
/// Whitespace is stripped and letters upper-cased first. A bare number is read
/// as megabytes (`2048` becomes `-Xmx2048M`), a number with a single `G` or `M`
/// unit is used as-is. Anything else logs a warning and falls back to
/// `-Xmx1024M`; this is never fatal.
pub fn java_memory_flag(raw: Option<&str>) -> MemoryFlag {
    let raw = raw
        .filter(|raw| !raw.is_empty())
        .unwrap_or(DEFAULT_JAVA_MEMORY);
    let normalized = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if MEGABYTES.is_match(&normalized) {
        MemoryFlag {
            flag: format!("-Xmx{normalized}M"),
            fallback: false,
        }
    } else if WITH_UNIT.is_match(&normalized) {
        MemoryFlag {
            flag: format!("-Xmx{normalized}"),
            fallback: false,
        }
    } else {
        tracing::warn!(
            value = raw,
            "unrecognized JAVA_MEMORY format, expected e.g. 1024, 1024M or 2G; using -Xmx{DEFAULT_JAVA_MEMORY}"
        );
        MemoryFlag::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flag(raw: &str) -> MemoryFlag {
        java_memory_flag(Some(raw))
    }

    #[test]
    fn bare_digits_are_megabytes() {
        assert_eq!(flag("2048").as_str(), "-Xmx2048M");
        assert_eq!(flag("1").as_str(), "-Xmx1M");
        assert!(!flag("2048").is_fallback());
    }

    #[test]
    fn unit_suffix_is_kept() {
        assert_eq!(flag("2G").as_str(), "-Xmx2G");
        assert_eq!(flag("512M").as_str(), "-Xmx512M");
    }

    #[test]
    fn case_and_whitespace_are_normalized() {
        assert_eq!(flag("4g").as_str(), "-Xmx4G");
        assert_eq!(flag(" 1 024 m ").as_str(), "-Xmx1024M");
        assert_eq!(flag("\t8G\n").as_str(), "-Xmx8G");
    }

    #[test]
    fn default_when_unset_or_empty() {
        assert_eq!(java_memory_flag(None).as_str(), "-Xmx1024M");
        assert!(!java_memory_flag(None).is_fallback());
        assert_eq!(java_memory_flag(Some("")).as_str(), "-Xmx1024M");
    }

    #[test]
    fn unrecognized_falls_back() {
        for raw in ["abc", "12GB", "1.5G", "G", "2K", "-2G", "   "] {
            let result = flag(raw);
            assert_eq!(result.as_str(), "-Xmx1024M", "{raw:?}");
            assert!(result.is_fallback(), "{raw:?}");
        }
    }
}
