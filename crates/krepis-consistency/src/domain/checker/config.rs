//! Checker configuration

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported memory models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Sequential consistency
    Sc,
    /// Total store order (x86)
    Tso,
    /// Release/acquire
    Ra,
    /// Repaired C11
    Rc11,
    /// Intermediate memory model (dependency tracking)
    Imm,
}

impl ModelType {
    /// Every supported model
    pub const ALL: [Self; 5] = [Self::Sc, Self::Tso, Self::Ra, Self::Rc11, Self::Imm];

    /// Short lowercase name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sc => "sc",
            Self::Tso => "tso",
            Self::Ra => "ra",
            Self::Rc11 => "rc11",
            Self::Imm => "imm",
        }
    }

    /// Whether the model tracks per-instruction dependencies
    pub const fn is_dep_tracking(self) -> bool {
        matches!(self, Self::Imm)
    }

    /// Whether library-refinement checking is available
    pub const fn supports_relinche(self) -> bool {
        matches!(self, Self::Rc11)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for ModelType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| ConfigError::UnknownModel(s.to_string()))
    }
}

/// Configuration a checker is created from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Memory model
    pub model: ModelType,
    /// Track the hb-relinche view for library refinement checking
    pub relinche: bool,
    /// Report write-write races as warnings
    pub check_ww_races: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            model: ModelType::Rc11,
            relinche: false,
            check_ww_races: true,
        }
    }
}

impl CheckerConfig {
    /// Default configuration for `model`
    pub fn new(model: ModelType) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    /// Start a builder from the defaults
    ///
    /// ```rust
    /// use krepis_consistency::{CheckerConfig, ModelType};
    ///
    /// let config = CheckerConfig::builder()
    ///     .model(ModelType::Imm)
    ///     .check_ww_races(false)
    ///     .build();
    /// assert!(!config.check_ww_races);
    /// ```
    pub fn builder() -> CheckerConfigBuilder {
        CheckerConfigBuilder::new()
    }

    /// Reject combinations the selected model cannot honour
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relinche && !self.model.supports_relinche() {
            return Err(ConfigError::RelincheUnsupported(self.model));
        }
        Ok(())
    }
}

/// Fluent builder for [`CheckerConfig`]
#[derive(Debug, Clone, Default)]
pub struct CheckerConfigBuilder {
    config: CheckerConfig,
}

impl CheckerConfigBuilder {
    /// Create new builder with default configuration
    ///
    /// Defaults:
    /// - RC11
    /// - Library refinement off
    /// - Write-write race warnings on
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the memory model
    pub fn model(mut self, model: ModelType) -> Self {
        self.config.model = model;
        self
    }

    /// Enable or disable library refinement checking
    pub fn relinche(mut self, enable: bool) -> Self {
        self.config.relinche = enable;
        self
    }

    /// Enable or disable write-write race warnings
    pub fn check_ww_races(mut self, enable: bool) -> Self {
        self.config.check_ww_races = enable;
        self
    }

    /// Finish the configuration
    pub fn build(self) -> CheckerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_models() {
        for model in ModelType::ALL {
            assert_eq!(model.name().parse::<ModelType>(), Ok(model));
        }
        assert_eq!("RC11".parse::<ModelType>(), Ok(ModelType::Rc11));
        assert_eq!(
            "power".parse::<ModelType>(),
            Err(ConfigError::UnknownModel("power".into()))
        );
    }

    #[test]
    fn test_defaults() {
        let config = CheckerConfig::default();
        assert_eq!(config.model, ModelType::Rc11);
        assert!(!config.relinche);
        assert!(config.check_ww_races);
        assert_eq!(CheckerConfig::builder().build(), config);
    }

    #[test]
    fn test_validate_relinche() {
        let ok = CheckerConfig::builder().relinche(true).build();
        assert!(ok.validate().is_ok());
        let bad = CheckerConfig::builder()
            .model(ModelType::Tso)
            .relinche(true)
            .build();
        assert_eq!(bad.validate(), Err(ConfigError::RelincheUnsupported(ModelType::Tso)));
    }

    #[test]
    fn test_serde_lowercase() {
        let config = CheckerConfig::new(ModelType::Imm);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"imm\""));
        let back: CheckerConfig = serde_json::from_str(r#"{"model":"tso"}"#).unwrap();
        assert_eq!(back.model, ModelType::Tso);
        assert!(back.check_ww_races);
    }
}
