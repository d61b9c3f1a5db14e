//! Engine configuration
//!
//! Severity thresholds and the encryption factor are operator-tunable
//! configuration, not policy baked into the scorer. Defaults:
//!
//! ```toml
//! [scoring]
//! encryption_factor = 0.6
//! max_score = 10.0
//!
//! [scoring.thresholds]
//! medium = 4.0
//! high = 6.5
//! critical = 8.5
//!
//! [synthesis]
//! objectives = ["tampering", "spoofing", "information_disclosure", "repudiation"]
//! ```

use crate::error::EngineError;
use crate::threat::SeverityLevel;
use serde::{Deserialize, Serialize};
use threatflow_refdata::ObjectiveCategory;

/// Lower bounds of the MEDIUM, HIGH and CRITICAL levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityThresholds {
    /// Scores below this are LOW
    pub medium: f64,
    /// Scores below this (and at least `medium`) are MEDIUM
    pub high: f64,
    /// Scores at or above this are CRITICAL
    pub critical: f64,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            medium: 4.0,
            high: 6.5,
            critical: 8.5,
        }
    }
}

impl SeverityThresholds {
    /// Map a score to its level
    #[must_use]
    pub fn level(&self, score: f64) -> SeverityLevel {
        if score < self.medium {
            SeverityLevel::Low
        } else if score < self.high {
            SeverityLevel::Medium
        } else if score < self.critical {
            SeverityLevel::High
        } else {
            SeverityLevel::Critical
        }
    }
}

/// Severity scorer settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Level thresholds
    pub thresholds: SeverityThresholds,
    /// Factor for Information Disclosure and Tampering on encrypted flows
    pub encryption_factor: f64,
    /// Upper clamp of every score
    pub max_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            thresholds: SeverityThresholds::default(),
            encryption_factor: 0.6,
            max_score: 10.0,
        }
    }
}

/// Attack-path synthesis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Objectives to synthesize flows for
    pub objectives: Vec<ObjectiveCategory>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            objectives: ObjectiveCategory::ALL.to_vec(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Scorer settings
    pub scoring: ScoringConfig,
    /// Synthesizer settings
    pub synthesis: SynthesisConfig,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With level thresholds
    #[inline]
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: SeverityThresholds) -> Self {
        self.scoring.thresholds = thresholds;
        self
    }

    /// With encryption factor
    #[inline]
    #[must_use]
    pub fn with_encryption_factor(mut self, factor: f64) -> Self {
        self.scoring.encryption_factor = factor;
        self
    }

    /// With synthesized objectives
    #[inline]
    #[must_use]
    pub fn with_objectives(mut self, objectives: &[ObjectiveCategory]) -> Self {
        self.synthesis.objectives = objectives.to_vec();
        self
    }

    /// Parse and validate TOML configuration
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] for malformed TOML or values rejected
    /// by [`EngineConfig::validate`]
    pub fn from_toml_str(text: &str) -> Result<Self, EngineError> {
        let config: Self = toml::from_str(text).map_err(|e| EngineError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`EngineError::Config`] unless
    /// `0 < medium < high < critical <= max_score`, the encryption factor is
    /// in `(0, 1]`, and no objective is listed twice
    pub fn validate(&self) -> Result<(), EngineError> {
        let scoring = &self.scoring;
        let t = scoring.thresholds;
        let values = [scoring.max_score, scoring.encryption_factor, t.medium, t.high, t.critical];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::config("scoring values must be finite"));
        }
        if scoring.max_score <= 0.0 {
            return Err(EngineError::config(format!(
                "max_score must be positive, got {}",
                scoring.max_score
            )));
        }
        let ordered = t.medium > 0.0 && t.medium < t.high && t.high < t.critical;
        if !(ordered && t.critical <= scoring.max_score) {
            return Err(EngineError::config(format!(
                "thresholds must satisfy 0 < medium < high < critical <= {}, got {}/{}/{}",
                scoring.max_score, t.medium, t.high, t.critical
            )));
        }
        if !(scoring.encryption_factor > 0.0 && scoring.encryption_factor <= 1.0) {
            return Err(EngineError::config(format!(
                "encryption_factor must be in (0, 1], got {}",
                scoring.encryption_factor
            )));
        }
        let objectives = &self.synthesis.objectives;
        if let Some(repeated) = objectives
            .iter()
            .enumerate()
            .find_map(|(i, o)| objectives[..i].contains(o).then_some(o))
        {
            return Err(EngineError::config(format!(
                "objective {repeated} listed more than once"
            )));
        }
        Ok(())
    }
}
