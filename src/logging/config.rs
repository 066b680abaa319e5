//! Logging configuration
//!
//! Per-component log levels and output destinations.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global log level (trace, debug, info, warn, error)
    pub global_level: String,

    /// Enable console output
    pub console_output: bool,

    /// Directory for daily JSON log files (None = no file logging)
    pub log_directory: Option<PathBuf>,

    /// Include file location in logs
    pub include_file_location: bool,

    /// Link selection log level
    pub link_level: String,

    /// Realignment and viewer state log level
    pub alignment_level: String,

    /// Cursor readout log level
    pub readout_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            global_level: "info".to_string(),
            console_output: true,
            log_directory: None,
            include_file_location: false,
            link_level: "info".to_string(),
            alignment_level: "info".to_string(),
            readout_level: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Verbose logging, including per-event readout traces
    pub fn development() -> Self {
        Self {
            global_level: "debug".to_string(),
            console_output: true,
            log_directory: Some(PathBuf::from("logs")),
            include_file_location: true,
            link_level: "debug".to_string(),
            alignment_level: "debug".to_string(),
            readout_level: "trace".to_string(),
        }
    }

    /// Quiet console, JSON files only
    pub fn production() -> Self {
        Self {
            global_level: "warn".to_string(),
            console_output: false,
            log_directory: Some(PathBuf::from("/var/log/sky-align")),
            include_file_location: false,
            link_level: "info".to_string(),
            alignment_level: "info".to_string(),
            readout_level: "warn".to_string(),
        }
    }

    /// Map a `-v` count onto the global level.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        let level = match verbose {
            0 => return self,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        self.global_level = level.to_string();
        self.link_level = level.to_string();
        self.alignment_level = level.to_string();
        self.readout_level = level.to_string();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, level) in [
            ("global_level", &self.global_level),
            ("link_level", &self.link_level),
            ("alignment_level", &self.alignment_level),
            ("readout_level", &self.readout_level),
        ] {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(format!(
                    "Invalid {}: {}. Must be one of: {:?}",
                    name, level, VALID_LEVELS
                ));
            }
        }

        if let Some(ref log_dir) = self.log_directory {
            if let Some(parent) = log_dir.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(format!("Log directory parent does not exist: {:?}", parent));
                }
            }
        }

        Ok(())
    }

    /// Get the effective log level for a specific component
    pub fn get_component_level(&self, component: &str) -> &str {
        match component {
            "link" | "links" => &self.link_level,
            "alignment" | "workspace" => &self.alignment_level,
            "readout" => &self.readout_level,
            _ => &self.global_level,
        }
    }

    /// `EnvFilter` directives: global level for this crate, then per-module overrides.
    pub fn filter_directives(&self) -> String {
        let krate = env!("CARGO_PKG_NAME").replace('-', "_");
        format!(
            "{krate}={},{krate}::link={},{krate}::alignment={},{krate}::workspace={},{krate}::readout={}",
            self.global_level,
            self.link_level,
            self.alignment_level,
            self.alignment_level,
            self.readout_level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.global_level, "info");
        assert!(config.console_output);
        assert!(config.log_directory.is_none());
        assert!(!config.include_file_location);
    }

    #[test]
    fn test_development_config() {
        let config = LoggingConfig::development();
        assert_eq!(config.global_level, "debug");
        assert_eq!(config.readout_level, "trace");
        assert!(config.include_file_location);
        assert!(config.log_directory.is_some());
    }

    #[test]
    fn test_production_config() {
        let config = LoggingConfig::production();
        assert_eq!(config.global_level, "warn");
        assert!(!config.console_output);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.global_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.global_level = "debug".to_string();
        config.link_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_component_level_selection() {
        let config = LoggingConfig::development();
        assert_eq!(config.get_component_level("link"), "debug");
        assert_eq!(config.get_component_level("readout"), "trace");
        assert_eq!(config.get_component_level("unknown"), "debug");
    }

    #[test]
    fn test_verbosity_overrides_levels() {
        let config = LoggingConfig::default().with_verbosity(2);
        assert_eq!(config.global_level, "debug");
        assert_eq!(config.readout_level, "debug");
        assert_eq!(LoggingConfig::default().with_verbosity(0), LoggingConfig::default());
    }

    #[test]
    fn test_filter_directives_name_modules() {
        let directives = LoggingConfig::default().filter_directives();
        assert!(directives.starts_with("sky_align=info"));
        assert!(directives.contains("sky_align::readout=warn"));
    }
}
