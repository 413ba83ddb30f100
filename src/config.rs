//! Optional TOML configuration
//!
//! ```toml
//! hurricane_threshold_kt = 64
//!
//! [datasets]
//! atlantic = "data/hurdat2-1851-2016-041117.txt"
//!
//! [hypothesis]
//! low_offset_deg = 45.0
//! high_offset_deg = 90.0
//! ```

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use common::constants::HURRICANE_THRESHOLD_KT;

use crate::accuracy::{Classifier, HypothesisWindow};
use crate::summary::Analyzer;

/// Looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "hurdat.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not parse config")]
    Toml(#[from] toml::de::Error),
    #[error("hypothesis offsets must be finite degrees in [0, 360), got {low} and {high}")]
    HypothesisOffsets { low: f64, high: f64 },
    #[error("hurricane threshold must be above zero")]
    ZeroThreshold,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Short names for dataset files
    pub datasets: BTreeMap<String, PathBuf>,
    pub hurricane_threshold_kt: u16,
    pub hypothesis: HypothesisWindow,
}

impl Default for Config {
    fn default() -> Self {
        let atlantic = PathBuf::from("hurdat2-1851-2016-041117.txt");
        let nepac = PathBuf::from("hurdat2-nepac-1949-2016-041317.txt");
        Self {
            datasets: BTreeMap::from([
                ("atlantic".into(), atlantic.clone()),
                ("a".into(), atlantic),
                ("nepac".into(), nepac.clone()),
                ("n".into(), nepac),
            ]),
            hurricane_threshold_kt: HURRICANE_THRESHOLD_KT,
            hypothesis: HypothesisWindow::default(),
        }
    }
}

impl Config {
    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] if none is given.
    ///
    /// A missing default file gives the default configuration; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config = Self::from_toml_str(&text)?;
                tracing::debug!(path = %path.display(), "loaded config");
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_owned(),
                source,
            }),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let HypothesisWindow {
            low_offset_deg: low,
            high_offset_deg: high,
        } = self.hypothesis;
        let in_range = |x: f64| x.is_finite() && (0.0..360.0).contains(&x);
        if !in_range(low) || !in_range(high) {
            return Err(ConfigError::HypothesisOffsets { low, high });
        }
        if self.hurricane_threshold_kt == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }

    /// A configured alias, otherwise `name` taken as a path
    pub fn resolve_dataset(&self, name: &str) -> PathBuf {
        self.datasets
            .get(name)
            .or_else(|| self.datasets.get(&name.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name))
    }

    pub fn analyzer(&self) -> Analyzer {
        Analyzer::new(
            Classifier::wgs84(self.hypothesis),
            self.hurricane_threshold_kt,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.hurricane_threshold_kt, 64);
        assert_eq!(config.hypothesis, HypothesisWindow::default());
        assert_eq!(
            config.resolve_dataset("a"),
            PathBuf::from("hurdat2-1851-2016-041117.txt")
        );
        assert_eq!(
            config.resolve_dataset("NEPAC"),
            PathBuf::from("hurdat2-nepac-1949-2016-041317.txt")
        );
        assert_eq!(
            config.resolve_dataset("storms/custom.txt"),
            PathBuf::from("storms/custom.txt")
        );
    }

    #[test]
    fn partial_override() {
        let config = Config::from_toml_str(
            r#"
            hurricane_threshold_kt = 96

            [datasets]
            pacific = "/data/hurdat2-nepac.txt"

            [hypothesis]
            high_offset_deg = 135.0
            "#,
        )
        .unwrap();
        assert_eq!(config.hurricane_threshold_kt, 96);
        assert_eq!(config.hypothesis.low_offset_deg, 45.0);
        assert_eq!(config.hypothesis.high_offset_deg, 135.0);
        // A datasets table replaces the default aliases
        assert_eq!(config.resolve_dataset("a"), PathBuf::from("a"));
        assert_eq!(
            config.resolve_dataset("pacific"),
            PathBuf::from("/data/hurdat2-nepac.txt")
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_toml_str("[hypothesis]\nlow_offset_deg = 360.0"),
            Err(ConfigError::HypothesisOffsets { .. })
        ));
        assert!(matches!(
            Config::from_toml_str("hurricane_threshold_kt = 0"),
            Err(ConfigError::ZeroThreshold)
        ));
        assert!(matches!(
            Config::from_toml_str("threshold = 64"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("hurdat-config-that-does-not-exist.toml");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("hurdat-config-{}.toml", std::process::id()));
        std::fs::write(&path, "hurricane_threshold_kt = 50\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.hurricane_threshold_kt, 50);
    }
}
