//! Shared configuration loader for the paperlex toolchain.
//!
//! `defaults/paperlex.default.toml` is embedded into every binary so that
//! documented defaults and runtime behavior stay in sync. Applications
//! layer user-specific files on top of those defaults via [`Loader`]
//! before deserializing into [`PaperlexConfig`], which converts into the
//! engine's [`EngineOptions`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

use paperlex_parser::paper::alignment::StrategyChoice;
use paperlex_parser::paper::calibration::Columns;
use paperlex_parser::paper::pipeline::EngineOptions;

const DEFAULT_TOML: &str = include_str!("../defaults/paperlex.default.toml");

/// Top-level configuration consumed by paperlex applications.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperlexConfig {
    pub scanning: ScanningConfig,
    pub calibration: CalibrationConfig,
    pub images: ImagesConfig,
    pub alignment: AlignmentConfig,
}

/// Marker scanner knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ScanningConfig {
    pub column_tolerance: f64,
}

/// Calibration fallback constants and the sub-sub window derivation.
#[derive(Debug, Clone, Deserialize)]
pub struct CalibrationConfig {
    pub question_x: f64,
    pub subquestion_x: f64,
    pub subsub_window: (f64, f64),
    pub subsub_window_offsets: (f64, f64),
}

/// Whole-question render knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    pub margin: f64,
}

/// Answer reconciliation knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct AlignmentConfig {
    pub strategy: StrategyChoice,
}

impl PaperlexConfig {
    /// Convert into the engine's option set.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            column_tolerance: self.scanning.column_tolerance,
            default_columns: Columns {
                question_x: self.calibration.question_x,
                subquestion_x: self.calibration.subquestion_x,
                subsub_window: self.calibration.subsub_window,
            },
            subsub_window_offsets: self.calibration.subsub_window_offsets,
            image_margin: self.images.margin,
            strategy: self.alignment.strategy,
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<PaperlexConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<PaperlexConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.scanning.column_tolerance, 5.0);
        assert_eq!(config.calibration.question_x, 49.6063);
        assert_eq!(config.calibration.subsub_window, (90.0, 100.0));
        assert_eq!(config.alignment.strategy, StrategyChoice::StrictFirst);
    }

    #[test]
    fn defaults_convert_to_engine_options() {
        let options = load_defaults().unwrap().engine_options();
        assert_eq!(options.column_tolerance, 5.0);
        assert_eq!(options.default_columns.subquestion_x, 72.0);
        assert_eq!(options.subsub_window_offsets, (-20.0, 10.0));
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("alignment.strategy", "tolerant-only")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.alignment.strategy, StrategyChoice::TolerantOnly);
    }

    #[test]
    fn user_file_layers_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[scanning]\ncolumn_tolerance = 7.5").expect("write");
        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert_eq!(config.scanning.column_tolerance, 7.5);
        // Untouched sections keep their defaults.
        assert_eq!(config.images.margin, 20.0);
    }

    #[test]
    fn absent_optional_file_is_ignored() {
        let config = Loader::new()
            .with_optional_file("/nonexistent/paperlex.toml")
            .build()
            .expect("config to build");
        assert_eq!(config.images.margin, 20.0);
    }
}
