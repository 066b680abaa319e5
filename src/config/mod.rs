use crate::link::LinkOptions;
use crate::logging::LoggingConfig;
use crate::readout::format::MAX_SEXAGESIMAL_DECIMALS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub link: LinkConfig,
    pub frame: FrameConfig,
    pub readout: ReadoutConfig,
    /// Options used for the initial alignment and for relinking on load.
    pub defaults: LinkOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Samples per axis over the reference footprint when fitting an affine link.
    pub sample_grid: usize,
    /// Largest residual, in reference pixels, an affine link may leave.
    pub affine_tolerance_px: f64,
    /// Tolerances for treating the affine linear part as the identity.
    pub offset_rtol: f64,
    pub offset_atol: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Relative Jacobian variation below which a frame classifies as affine.
    pub affine_rtol: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadoutConfig {
    pub pixel_decimals: usize,
    pub value_decimals: usize,
    pub sexagesimal_decimals: u32,
    pub decimal_decimals: usize,
    pub frame_name: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            sample_grid: 10,
            affine_tolerance_px: 0.1,
            offset_rtol: 1e-5,
            offset_atol: 1e-8,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { affine_rtol: 1e-3 }
    }
}

impl Default for ReadoutConfig {
    fn default() -> Self {
        Self {
            pixel_decimals: 1,
            value_decimals: 5,
            sexagesimal_decimals: 4,
            decimal_decimals: 10,
            frame_name: "ICRS".to_string(),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse JSON when the text starts with `{`, TOML otherwise.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(content)?)
        } else {
            Ok(toml::from_str(content)?)
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> anyhow::Result<()> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.link.sample_grid < 2 {
            errors.push("link.sample_grid must be at least 2".to_string());
        }

        if !(self.link.affine_tolerance_px > 0.0) {
            errors.push("link.affine_tolerance_px must be positive".to_string());
        }

        if self.link.offset_rtol < 0.0 || self.link.offset_atol < 0.0 {
            errors.push("link offset tolerances must be non-negative".to_string());
        }

        if !(self.frame.affine_rtol > 0.0) {
            errors.push("frame.affine_rtol must be positive".to_string());
        }

        if self.readout.sexagesimal_decimals > MAX_SEXAGESIMAL_DECIMALS {
            errors.push(format!(
                "readout.sexagesimal_decimals must be at most {}",
                MAX_SEXAGESIMAL_DECIMALS
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Json,
    Toml,
}

pub fn load_config_or_default(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => {
                if let Err(errors) = config.validate() {
                    eprintln!("Configuration validation errors:");
                    for error in errors {
                        eprintln!("  - {}", error);
                    }
                    eprintln!("Using default configuration instead.");
                    Config::default()
                } else {
                    config
                }
            }
            Err(e) => {
                eprintln!("Failed to load config from '{}': {}", path.display(), e);
                eprintln!("Using default configuration.");
                Config::default()
            }
        },
        None => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::AlignMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::parse(
            r#"
            [link]
            affine_tolerance_px = 0.5

            [defaults]
            mode = "wcs"
            fallback = "none"
            fast_approximation = false
            "#,
        )
        .unwrap();
        assert_eq!(config.link.affine_tolerance_px, 0.5);
        assert_eq!(config.link.sample_grid, 10);
        assert_eq!(config.defaults.mode, AlignMode::Wcs);
        assert!(!config.defaults.fast_approximation);
        assert_eq!(config.readout.frame_name, "ICRS");
    }

    #[test]
    fn test_validation_collects_errors() {
        let mut config = Config::default();
        config.link.sample_grid = 1;
        config.frame.affine_rtol = 0.0;
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.readout.pixel_decimals = 2;
        config.save_to_file(&path, ConfigFormat::Toml).unwrap();
        assert_eq!(Config::load_from_file(&path).unwrap(), config);

        let json = dir.path().join("config.json");
        config.save_to_file(&json, ConfigFormat::Json).unwrap();
        assert_eq!(Config::load_from_file(&json).unwrap(), config);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = load_config_or_default(Some(Path::new("/nonexistent/sky-align.toml")));
        assert_eq!(config, Config::default());
    }
}
