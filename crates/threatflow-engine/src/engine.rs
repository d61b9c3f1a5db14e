//! Analysis pipeline
//!
//! ```text
//! validate → pre-scan → rules → score → resolve → synthesize → result
//! ```
//!
//! Fatal errors surface before rule evaluation starts. Everything after that
//! point only accumulates warnings.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineWarning, OverrideSource};
use crate::flows::AttackPathSynthesizer;
use crate::mapping::MappingResolver;
use crate::result::{AnalysisResult, Coverage};
use crate::rules::{RuleContext, RuleSet, RULESET_VERSION};
use crate::scoring::Scorer;
use crate::threat::Threat;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use threatflow_model::{ArchitectureGraph, TargetRef, ValidationError};
use threatflow_refdata::{protocol_key, CveDefinitions, MappingOverrides, ReferenceData};

/// Inputs of one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Architecture graph
    pub graph: ArchitectureGraph,
    /// Per-target severity multipliers, by element or dataflow name
    pub multipliers: BTreeMap<String, f64>,
    /// Per-element CVE declarations
    pub cves: CveDefinitions,
    /// User technique additions
    pub mapping_overrides: MappingOverrides,
}

impl AnalysisRequest {
    /// Create request for a graph
    #[must_use]
    pub fn new(graph: ArchitectureGraph) -> Self {
        Self {
            graph,
            multipliers: BTreeMap::new(),
            cves: CveDefinitions::new(),
            mapping_overrides: MappingOverrides::new(),
        }
    }

    /// With a severity multiplier for one target
    #[must_use]
    pub fn with_multiplier(mut self, target: impl AsRef<str>, multiplier: f64) -> Self {
        self.multipliers
            .insert(target.as_ref().trim().to_string(), multiplier);
        self
    }

    /// With severity multipliers
    #[must_use]
    pub fn with_multipliers<I, S>(mut self, multipliers: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        for (target, multiplier) in multipliers {
            self = self.with_multiplier(target, multiplier);
        }
        self
    }

    /// With CVE declarations
    #[inline]
    #[must_use]
    pub fn with_cves(mut self, cves: CveDefinitions) -> Self {
        self.cves = cves;
        self
    }

    /// With technique additions
    #[inline]
    #[must_use]
    pub fn with_mapping_overrides(mut self, overrides: MappingOverrides) -> Self {
        self.mapping_overrides = overrides;
        self
    }
}

/// Threat classification and attack-path synthesis engine
///
/// Stateless across runs; the reference store is shared read-only.
#[derive(Debug)]
pub struct ThreatEngine {
    reference: Arc<ReferenceData>,
    config: EngineConfig,
    rules: RuleSet,
}

impl Default for ThreatEngine {
    fn default() -> Self {
        Self::new(ReferenceData::shared())
    }
}

impl ThreatEngine {
    /// Create engine with default configuration and the standard rule set
    #[must_use]
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self {
            reference,
            config: EngineConfig::default(),
            rules: RuleSet::standard(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// With rule set
    #[inline]
    #[must_use]
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Reference store
    #[inline]
    #[must_use]
    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rule set
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Run one analysis
    ///
    /// # Errors
    /// - [`EngineError::Config`] if the configuration is out of range
    /// - [`EngineError::ReferenceData`] if the store lacks a required table
    /// - [`EngineError::Validation`] for an unusable multiplier override
    pub fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, EngineError> {
        self.config.validate()?;
        self.reference.validate()?;

        let graph = &request.graph;
        let reference = self.reference.as_ref();
        let (multipliers, mut warnings) = self.check_multipliers(request)?;
        warnings.extend(self.scan_protocols(graph));
        warnings.extend(self.scan_cves(request));

        tracing::info!(
            "Analyzing {} elements and {} dataflows with {} rules",
            graph.element_count(),
            graph.dataflow_count(),
            self.rules.len()
        );

        let ctx = RuleContext::new(graph, reference, &request.cves);
        let candidates = self.rules.evaluate(&ctx);

        let scorer = Scorer::new(graph, reference, &self.config.scoring)
            .with_multipliers(&multipliers);
        let scored = candidates
            .into_par_iter()
            .map(|candidate| scorer.score(candidate))
            .collect::<Result<Vec<_>, _>>()?;

        let resolver = MappingResolver::new(reference).with_overrides(&request.mapping_overrides);
        let mut threats: Vec<Threat> = scored
            .into_par_iter()
            .map(|threat| resolver.resolve(threat))
            .collect();
        threats.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.category.cmp(&b.category))
                .then_with(|| a.target_name.cmp(&b.target_name))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });

        warnings.extend(
            threats
                .iter()
                .filter(|t| !t.is_mapped())
                .map(|t| EngineWarning::UnresolvedMapping {
                    category: t.category,
                    target: t.target_name.clone(),
                    fingerprint: t.fingerprint.clone(),
                }),
        );

        let attack_flows =
            AttackPathSynthesizer::new(graph, &self.config.synthesis).synthesize(&threats);
        let coverage = Coverage::from_threats(&threats);

        warnings.sort();
        warnings.dedup();
        for warning in &warnings {
            warning.log();
        }

        tracing::info!(
            "Analysis complete: {} threats ({} unmapped), {} attack flows, {} warnings",
            coverage.total,
            coverage.unmapped,
            attack_flows.len(),
            warnings.len()
        );

        Ok(AnalysisResult {
            reference_version: reference.version().to_string(),
            ruleset_version: RULESET_VERSION.to_string(),
            threats,
            coverage,
            attack_flows,
            warnings,
        })
    }

    /// Resolve multiplier overrides to graph targets
    fn check_multipliers(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(BTreeMap<TargetRef, f64>, Vec<EngineWarning>), ValidationError> {
        let mut resolved = BTreeMap::new();
        let mut warnings = Vec::new();
        for (target, value) in &request.multipliers {
            if !value.is_finite() || *value < 0.0 {
                return Err(ValidationError::InvalidMultiplier {
                    target: target.clone(),
                    value: *value,
                });
            }
            match request.graph.resolve_target(target) {
                Some(resolved_target) => {
                    resolved.insert(resolved_target, *value);
                }
                None => warnings.push(EngineWarning::UnknownTarget {
                    input: OverrideSource::SeverityMultipliers,
                    target: target.clone(),
                }),
            }
        }
        Ok((resolved, warnings))
    }

    fn scan_protocols(&self, graph: &ArchitectureGraph) -> Vec<EngineWarning> {
        let mut unknown: BTreeMap<String, &str> = BTreeMap::new();
        for flow in graph.dataflows() {
            if self.reference.protocol(&flow.protocol).is_none() {
                unknown
                    .entry(protocol_key(&flow.protocol))
                    .or_insert(flow.protocol.trim());
            }
        }
        unknown
            .into_values()
            .map(|protocol| EngineWarning::UnknownProtocol {
                protocol: protocol.to_string(),
            })
            .collect()
    }

    fn scan_cves(&self, request: &AnalysisRequest) -> Vec<EngineWarning> {
        let index = self.reference.cve_index();
        let mut warnings = Vec::new();
        for (target, cves) in request.cves.iter() {
            if request.graph.element(target).is_none() {
                warnings.push(EngineWarning::UnknownTarget {
                    input: OverrideSource::CveDefinitions,
                    target: target.to_string(),
                });
                continue;
            }
            for cve in cves {
                for capec in index.capecs_for(cve) {
                    if self.reference.capec(capec).is_none() {
                        warnings.push(EngineWarning::UnknownCapec {
                            target: target.to_string(),
                            cve: cve.clone(),
                            capec: capec.clone(),
                        });
                    }
                }
            }
        }
        warnings
    }
}
