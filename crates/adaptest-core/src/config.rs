//! Engine configuration.
//!
//! Every tunable constant of the adaptive loop lives here with its default.
//! The scoring transform and the precision thresholds are calibration policy,
//! not derived values; deployments that validate their own are expected to
//! override them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ability assumed before any response.
    pub initial_theta: f64,
    pub estimation: EstimationConfig,
    pub selection: SelectionConfig,
    pub termination: TerminationConfig,
    pub scoring: ScoringConfig,
    pub calibration: CalibrationConfig,
}

/// How Fisher information is turned into a `[0, 1]` confidence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceScale {
    /// `min(1, 1 / sqrt(I))`.
    #[default]
    InverseSqrtInformation,
    /// `1 - min(1, 1 / sqrt(I))`: grows as the standard error shrinks.
    Precision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Newton step cap per estimate.
    pub max_iterations: u32,
    /// Stop once a Newton step moves theta by less than this.
    pub convergence_threshold: f64,
    /// Curvature magnitudes below this end the iteration.
    pub curvature_epsilon: f64,
    pub confidence_scale: ConfidenceScale,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            convergence_threshold: 0.1,
            curvature_epsilon: 1e-6,
            confidence_scale: ConfidenceScale::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Items whose information is within this of the best are considered tied.
    pub information_tolerance: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            information_tolerance: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    /// Hard cap on administered items.
    pub max_questions: u32,
    /// Items required before any precision-based stop.
    pub min_questions: u32,
    /// Confidence at which the session stops.
    pub target_precision: f64,
    /// Looser confidence bar that also stops the session.
    pub relaxed_precision: f64,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            max_questions: 20,
            min_questions: 5,
            target_precision: 0.3,
            relaxed_precision: 0.5,
        }
    }
}

/// Linear theta-to-score transform: `score = center + theta * scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub center: f64,
    pub scale: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            center: 50.0,
            scale: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Step size for online difficulty/discrimination nudges.
    pub learning_rate: f64,
    /// Response time treated as "on pace".
    pub expected_response_secs: f64,
    pub discrimination_floor: f64,
    /// Pending jobs held before new submissions are dropped.
    pub queue_capacity: usize,
    /// Optimistic-concurrency retries per job.
    pub max_retries: u32,
    /// Initial backoff after a store error; doubles per attempt.
    pub retry_delay_ms: u64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            expected_response_secs: 30.0,
            discrimination_floor: 0.1,
            queue_capacity: 1024,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl EngineConfig {
    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_theta.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "initial_theta",
                value: self.initial_theta,
            });
        }

        let t = &self.termination;
        if t.max_questions == 0 {
            return Err(ConfigError::NoQuestions);
        }
        if t.min_questions > t.max_questions {
            return Err(ConfigError::QuestionBounds {
                min: t.min_questions,
                max: t.max_questions,
            });
        }
        for (field, value) in [
            ("termination.target_precision", t.target_precision),
            ("termination.relaxed_precision", t.relaxed_precision),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::PrecisionOutOfRange { field, value });
            }
        }

        let e = &self.estimation;
        if e.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        positive("estimation.convergence_threshold", e.convergence_threshold)?;
        positive("estimation.curvature_epsilon", e.curvature_epsilon)?;

        non_negative(
            "selection.information_tolerance",
            self.selection.information_tolerance,
        )?;
        positive("scoring.scale", self.scoring.scale)?;
        if !self.scoring.center.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "scoring.center",
                value: self.scoring.center,
            });
        }

        let c = &self.calibration;
        non_negative("calibration.learning_rate", c.learning_rate)?;
        positive(
            "calibration.expected_response_secs",
            c.expected_response_secs,
        )?;
        positive("calibration.discrimination_floor", c.discrimination_floor)?;
        if c.queue_capacity == 0 {
            return Err(ConfigError::NonPositive {
                field: "calibration.queue_capacity",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Falls back to [`EngineConfig::default`] when neither exists.
pub fn load_config() -> Result<EngineConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EngineConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else {
            config_dir()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = parse_config_str(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded engine config from {}", path.display());
            config
        }
        None => EngineConfig::default(),
    };

    Ok(config)
}

/// Parse and validate a TOML configuration string.
pub fn parse_config_str(content: &str) -> Result<EngineConfig> {
    let config: EngineConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}
