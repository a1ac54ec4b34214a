//! Configuration for the codec limits and snapshot storage
//!
//! Both structures are serde-friendly so they can be embedded in a host's
//! own configuration file, and both can be validated before use.

use crate::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default ceiling for the JSON form of a display name
pub const DEFAULT_MAX_RICH_TEXT_BYTES: usize = 2_097_152;

/// Default ceiling for namespaces, paths and account names
pub const DEFAULT_MAX_STRING_BYTES: usize = 32767 * 3;

/// Environment variable overriding [`CodecConfig::max_rich_text_bytes`]
pub const ENV_MAX_RICH_TEXT_BYTES: &str = "STATSNAP_MAX_RICH_TEXT_BYTES";

/// Environment variable overriding [`CodecConfig::max_string_bytes`]
pub const ENV_MAX_STRING_BYTES: &str = "STATSNAP_MAX_STRING_BYTES";

/// Size ceilings applied while decoding an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Largest accepted display name, in bytes of JSON
    pub max_rich_text_bytes: usize,
    /// Largest accepted plain string, in bytes of UTF-8
    pub max_string_bytes: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_rich_text_bytes: DEFAULT_MAX_RICH_TEXT_BYTES,
            max_string_bytes: DEFAULT_MAX_STRING_BYTES,
        }
    }
}

impl CodecConfig {
    /// Defaults, overridden by any `STATSNAP_*` variables that are set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(value) = read_env_usize(ENV_MAX_RICH_TEXT_BYTES)? {
            config.max_rich_text_bytes = value;
        }
        if let Some(value) = read_env_usize(ENV_MAX_STRING_BYTES)? {
            config.max_string_bytes = value;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_rich_text_bytes == 0 {
            return Err(StatsError::validation(
                "max_rich_text_bytes must be greater than zero",
            ));
        }
        if self.max_string_bytes == 0 {
            return Err(StatsError::validation(
                "max_string_bytes must be greater than zero",
            ));
        }
        // lengths travel as 32-bit varints
        let ceiling = i32::MAX as usize;
        if self.max_rich_text_bytes > ceiling || self.max_string_bytes > ceiling {
            return Err(StatsError::validation(format!(
                "size limits must not exceed {ceiling} bytes"
            )));
        }
        Ok(())
    }
}

fn read_env_usize(name: &str) -> Result<Option<usize>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| StatsError::validation(format!("{name}={raw:?} is not a size: {e}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(StatsError::validation(format!("{name}: {e}"))),
    }
}

/// Where snapshot files live
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base directory relative paths are resolved against (defaults to the
    /// current directory)
    pub base_dir: Option<PathBuf>,
}

impl StoreConfig {
    pub fn with_base_dir<P: Into<PathBuf>>(base_dir: P) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Resolve `path` against the base directory, leaving absolute paths alone
    pub fn resolve(&self, path: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) if !Path::new(path).is_absolute() => base.join(path),
            _ => PathBuf::from(path),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(base) = &self.base_dir {
            if base.as_os_str().is_empty() {
                return Err(StatsError::validation("base_dir must not be empty"));
            }
            if base.exists() && !base.is_dir() {
                return Err(StatsError::validation(format!(
                    "base_dir {} is not a directory",
                    base.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_codec_config() {
        let config = CodecConfig::default();
        assert_eq!(config.max_rich_text_bytes, 2_097_152);
        assert_eq!(config.max_string_bytes, 98_301);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_codec_config_rejects_zero_limits() {
        let config = CodecConfig {
            max_string_bytes: 0,
            ..CodecConfig::default()
        };
        assert!(config.validate().is_err());

        let config = CodecConfig {
            max_rich_text_bytes: 0,
            ..CodecConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_rich_text_bytes"));
    }

    #[test]
    fn test_codec_config_partial_json_uses_defaults() {
        let config: CodecConfig = serde_json::from_str(r#"{"max_string_bytes": 64}"#).unwrap();
        assert_eq!(config.max_string_bytes, 64);
        assert_eq!(config.max_rich_text_bytes, DEFAULT_MAX_RICH_TEXT_BYTES);
    }

    #[test]
    fn test_codec_config_from_env() {
        std::env::set_var(ENV_MAX_STRING_BYTES, "512");
        let config = CodecConfig::from_env().unwrap();
        assert_eq!(config.max_string_bytes, 512);

        std::env::set_var(ENV_MAX_STRING_BYTES, "lots");
        assert!(CodecConfig::from_env().is_err());
        std::env::remove_var(ENV_MAX_STRING_BYTES);
    }

    #[test]
    fn test_store_config_resolve() {
        let config = StoreConfig::default();
        assert_eq!(config.resolve("a/b.stsn"), PathBuf::from("a/b.stsn"));

        let config = StoreConfig::with_base_dir("/var/stats");
        assert_eq!(
            config.resolve("a/b.stsn"),
            PathBuf::from("/var/stats/a/b.stsn")
        );
        assert_eq!(config.resolve("/abs.stsn"), PathBuf::from("/abs.stsn"));
    }

    #[test]
    fn test_store_config_validate() {
        assert!(StoreConfig::default().validate().is_ok());
        assert!(StoreConfig::with_base_dir("").validate().is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(StoreConfig::with_base_dir(file.path()).validate().is_err());
    }
}
