//! Analysis configuration.

use serde::{Deserialize, Serialize};

/// Errors raised while loading an [`AnalysisConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),
}

/// Numerical policy and optional passes of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Slack below this is binding; waste flows above it count as positive;
    /// rates below it are reported as zero.
    pub tolerance: f64,
    /// Re-solve degenerate optima to prefer routings with less weighted waste.
    pub minimize_waste: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            minimize_waste: true,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    ///
    /// ```
    /// use flowcalc_core::config::AnalysisConfig;
    ///
    /// let config = AnalysisConfig::from_toml_str("minimize_waste = false").unwrap();
    /// assert!(!config.minimize_waste);
    /// assert_eq!(config.tolerance, 1e-9);
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(source)?;
        if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
            return Err(ConfigLoadError::InvalidTolerance(config.tolerance));
        }
        Ok(config)
    }

    /// Clamp near-zero and negative values to exactly zero.
    pub(crate) fn clean(&self, value: f64) -> f64 {
        if value < self.tolerance { 0.0 } else { value }
    }
}
