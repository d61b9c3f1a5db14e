//! Severity scorer
//!
//! ```text
//! score = clamp(base × target multiplier × protocol factor × encryption factor, 0, max)
//! ```
//!
//! - base: per-category constant from the reference data
//! - target multiplier: run override, then the element's declared value, then 1.0
//! - protocol factor: dataflow targets only, 1.0 for undeclared protocols
//! - encryption factor: Information Disclosure and Tampering on encrypted
//!   dataflows only
//!
//! Factors are applied in that fixed order, so identical inputs give
//! bit-identical scores.

use crate::config::ScoringConfig;
use crate::threat::{ScoredThreat, ThreatCandidate};
use std::collections::BTreeMap;
use threatflow_model::{ArchitectureGraph, Element, TargetRef};
use threatflow_refdata::{ReferenceData, ReferenceDataError, StrideCategory};

/// Scores candidates against one graph
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    graph: &'a ArchitectureGraph,
    reference: &'a ReferenceData,
    config: &'a ScoringConfig,
    multipliers: Option<&'a BTreeMap<TargetRef, f64>>,
}

impl<'a> Scorer<'a> {
    /// Create scorer without run overrides
    #[must_use]
    pub fn new(
        graph: &'a ArchitectureGraph,
        reference: &'a ReferenceData,
        config: &'a ScoringConfig,
    ) -> Self {
        Self {
            graph,
            reference,
            config,
            multipliers: None,
        }
    }

    /// With multiplier overrides keyed by resolved target
    #[inline]
    #[must_use]
    pub fn with_multipliers(mut self, multipliers: &'a BTreeMap<TargetRef, f64>) -> Self {
        self.multipliers = Some(multipliers);
        self
    }

    /// Effective multiplier of a target
    #[must_use]
    pub fn target_multiplier(&self, target: &TargetRef) -> f64 {
        if let Some(value) = self.multipliers.and_then(|m| m.get(target)) {
            return *value;
        }
        match target {
            TargetRef::Element(name) => self.graph.element(name).map_or(1.0, Element::multiplier),
            TargetRef::Dataflow(_) => 1.0,
        }
    }

    fn protocol_factor(&self, target: &TargetRef) -> f64 {
        match target {
            TargetRef::Dataflow(name) => self
                .graph
                .dataflow(name)
                .and_then(|flow| self.reference.protocol(&flow.protocol))
                .map_or(1.0, |profile| profile.severity_factor),
            TargetRef::Element(_) => 1.0,
        }
    }

    fn encryption_factor(&self, category: StrideCategory, target: &TargetRef) -> f64 {
        let dampened = matches!(
            category,
            StrideCategory::InformationDisclosure | StrideCategory::Tampering
        );
        let encrypted = match target {
            TargetRef::Dataflow(name) => self.graph.dataflow(name).is_some_and(|f| f.is_encrypted),
            TargetRef::Element(_) => false,
        };
        if dampened && encrypted {
            self.config.encryption_factor
        } else {
            1.0
        }
    }

    /// Clamped score of a candidate
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::MissingBaseScore`] if the category has no
    /// base score
    pub fn raw_score(&self, candidate: &ThreatCandidate) -> Result<f64, ReferenceDataError> {
        let base = self
            .reference
            .base_score(candidate.category)
            .ok_or(ReferenceDataError::MissingBaseScore(candidate.category))?;
        let score = base
            * self.target_multiplier(&candidate.target)
            * self.protocol_factor(&candidate.target)
            * self.encryption_factor(candidate.category, &candidate.target);
        Ok(score.clamp(0.0, self.config.max_score))
    }

    /// Score a candidate and assign its level
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::MissingBaseScore`] if the category has no
    /// base score
    pub fn score(&self, candidate: ThreatCandidate) -> Result<ScoredThreat, ReferenceDataError> {
        let score = self.raw_score(&candidate)?;
        let level = self.config.thresholds.level(score);
        let target_name = self.graph.target_name(&candidate.target);
        let fingerprint = candidate.identity().fingerprint();
        Ok(ScoredThreat {
            candidate,
            target_name,
            score,
            level,
            fingerprint,
        })
    }
}
