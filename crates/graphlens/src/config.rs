//! View configuration.
//!
//! Thresholds, layout spacing and the coupling color scale are read from a
//! YAML file. Every field has a default so a partial file is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Error, Result};
use crate::layout::LayoutDirection;

/// Default complexity above which a symbol counts as risky.
pub const DEFAULT_COMPLEXITY_THRESHOLD: f64 = 10.0;

/// Default normalized coupling above which a symbol counts as risky.
pub const DEFAULT_COUPLING_THRESHOLD: f64 = 0.6;

/// Default layout quiescence window in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 150;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ViewConfig {
    /// Risk-mode thresholds
    pub risk: RiskThresholds,
    /// Layout settings
    pub layout: LayoutConfig,
    /// Coupling color scale
    pub coupling_colors: CouplingColors,
}

/// Thresholds used by risk mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RiskThresholds {
    /// Complexity strictly above this adds 0.5 risk
    pub complexity_threshold: f64,
    /// Normalized coupling strictly above this adds 0.5 risk
    pub coupling_threshold: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
            coupling_threshold: DEFAULT_COUPLING_THRESHOLD,
        }
    }
}

/// Layout scheduling and spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LayoutConfig {
    /// Quiescence window before a layout runs
    pub debounce_ms: u64,
    /// Direction of the BFS tree layout
    pub direction: LayoutDirection,
    /// Gap between nodes in the same layer
    pub node_spacing: f64,
    /// Gap between consecutive layers
    pub layer_spacing: f64,
    /// Inner padding of containers at depth zero
    pub container_padding: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            direction: LayoutDirection::TopDown,
            node_spacing: 40.0,
            layer_spacing: 80.0,
            container_padding: 24.0,
        }
    }
}

/// Three-stop coupling color scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CouplingColors {
    /// Color below `medium_break` (also the baseline for uncoupled symbols)
    pub low: String,
    /// Color from `medium_break` up to `high_break`
    pub medium: String,
    /// Color from `high_break` up
    pub high: String,
    /// Lower break point on the normalized score
    pub medium_break: f64,
    /// Upper break point on the normalized score
    pub high_break: f64,
}

impl Default for CouplingColors {
    fn default() -> Self {
        Self {
            low: "#4caf50".to_string(),
            medium: "#ff9800".to_string(),
            high: "#f44336".to_string(),
            medium_break: 0.33,
            high_break: 0.66,
        }
    }
}

impl CouplingColors {
    /// Pick the color for a normalized score in `[0, 1]`.
    #[must_use]
    pub fn color_for(&self, score: f64) -> &str {
        if score >= self.high_break {
            &self.high
        } else if score >= self.medium_break {
            &self.medium
        } else {
            &self.low
        }
    }
}

impl ViewConfig {
    /// Load configuration from a YAML file and validate it.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let RiskThresholds {
            complexity_threshold,
            coupling_threshold,
        } = self.risk;
        if !complexity_threshold.is_finite() || complexity_threshold < 0.0 {
            return Err(Error::Config(
                "complexity-threshold must be a non-negative number".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&coupling_threshold) {
            return Err(Error::Config(
                "coupling-threshold must be between 0 and 1".to_string(),
            ));
        }

        let colors = &self.coupling_colors;
        if !(0.0 < colors.medium_break
            && colors.medium_break < colors.high_break
            && colors.high_break < 1.0)
        {
            return Err(Error::Config(
                "coupling color breaks must satisfy 0 < medium-break < high-break < 1".to_string(),
            ));
        }

        let layout = &self.layout;
        for (name, value) in [
            ("node-spacing", layout.node_spacing),
            ("layer-spacing", layout.layer_spacing),
            ("container-padding", layout.container_padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!("{name} must be a non-negative number")));
            }
        }
        Ok(())
    }
}
