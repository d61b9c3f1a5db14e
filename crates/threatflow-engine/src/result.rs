//! Analysis result
//!
//! The aggregate value handed to reporting collaborators. Every collection is
//! ordered, so serializing the same result twice is byte-identical.

use crate::error::EngineWarning;
use crate::flows::AttackFlow;
use crate::threat::{SeverityLevel, Threat};
use serde::Serialize;
use std::collections::BTreeMap;
use threatflow_model::TargetRef;
use threatflow_refdata::{ObjectiveCategory, StrideCategory};

/// Threat counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    /// All threats
    pub total: usize,
    /// Threats per STRIDE category
    pub by_category: BTreeMap<StrideCategory, usize>,
    /// Threats per severity level
    pub by_level: BTreeMap<SeverityLevel, usize>,
    /// Threats with no mapped technique
    pub unmapped: usize,
}

impl Coverage {
    /// Count threats
    #[must_use]
    pub fn from_threats(threats: &[Threat]) -> Self {
        let mut coverage = Self {
            total: threats.len(),
            ..Self::default()
        };
        for threat in threats {
            *coverage.by_category.entry(threat.category).or_default() += 1;
            *coverage.by_level.entry(threat.level).or_default() += 1;
            if !threat.is_mapped() {
                coverage.unmapped += 1;
            }
        }
        coverage
    }

    /// Threats with at least one technique
    #[inline]
    #[must_use]
    pub fn mapped(&self) -> usize {
        self.total - self.unmapped
    }
}

/// Output of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Version tag of the reference data used
    pub reference_version: String,
    /// Version of the rule set used
    pub ruleset_version: String,
    /// Threats, highest score first
    pub threats: Vec<Threat>,
    /// Threat counts
    pub coverage: Coverage,
    /// Best attack flow per objective
    pub attack_flows: BTreeMap<ObjectiveCategory, AttackFlow>,
    /// Non-fatal findings, sorted
    pub warnings: Vec<EngineWarning>,
}

impl AnalysisResult {
    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Threats on a target
    pub fn threats_for<'a>(&'a self, target: &'a TargetRef) -> impl Iterator<Item = &'a Threat> {
        self.threats.iter().filter(move |t| &t.target == target)
    }

    /// Threats of a category
    pub fn threats_in(&self, category: StrideCategory) -> impl Iterator<Item = &Threat> {
        self.threats.iter().filter(move |t| t.category == category)
    }

    /// Lookup threat by fingerprint
    #[must_use]
    pub fn threat(&self, fingerprint: &str) -> Option<&Threat> {
        self.threats.iter().find(|t| t.fingerprint == fingerprint)
    }

    /// Attack flow of an objective
    #[inline]
    #[must_use]
    pub fn attack_flow(&self, objective: ObjectiveCategory) -> Option<&AttackFlow> {
        self.attack_flows.get(&objective)
    }

    /// Check if any warning was raised
    #[inline]
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threat::Provenance;
    use threatflow_refdata::{Tactic, Technique};

    fn threat(category: StrideCategory, level: SeverityLevel, mapped: bool) -> Threat {
        Threat {
            fingerprint: format!("{category}-{level}"),
            category,
            target: TargetRef::Element("Web".into()),
            target_name: "Web".into(),
            description: String::new(),
            score: 5.0,
            level,
            techniques: if mapped {
                vec![Technique::new("T1078", "Valid Accounts", &[Tactic::InitialAccess])]
            } else {
                vec![]
            },
            controls: vec![],
            provenance: Provenance::Rule,
            rule_id: "r".into(),
            capec: None,
            cves: vec![],
        }
    }

    #[test]
    fn coverage_counts() {
        let threats = vec![
            threat(StrideCategory::Spoofing, SeverityLevel::Medium, true),
            threat(StrideCategory::Spoofing, SeverityLevel::High, false),
            threat(StrideCategory::Repudiation, SeverityLevel::Medium, true),
        ];
        let coverage = Coverage::from_threats(&threats);
        assert_eq!(coverage.total, 3);
        assert_eq!(coverage.unmapped, 1);
        assert_eq!(coverage.mapped(), 2);
        assert_eq!(coverage.by_category[&StrideCategory::Spoofing], 2);
        assert_eq!(coverage.by_level[&SeverityLevel::Medium], 2);
    }

    #[test]
    fn json_uses_readable_keys() {
        let threats = vec![threat(StrideCategory::Spoofing, SeverityLevel::High, true)];
        let result = AnalysisResult {
            reference_version: "v".into(),
            ruleset_version: "r".into(),
            coverage: Coverage::from_threats(&threats),
            threats,
            attack_flows: BTreeMap::new(),
            warnings: vec![EngineWarning::UnknownProtocol {
                protocol: "GOPHER".into(),
            }],
        };
        let value: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(value["coverage"]["by_category"]["spoofing"], 1);
        assert_eq!(value["coverage"]["by_level"]["HIGH"], 1);
        assert_eq!(value["threats"][0]["provenance"], "rule");
        assert_eq!(value["warnings"][0]["kind"], "unknown_protocol");
        assert!(result.has_warnings());
        assert_eq!(
            result
                .threats_for(&TargetRef::Element("Web".into()))
                .count(),
            1
        );
        assert!(result.threat("Spoofing-HIGH").is_some());
        assert!(result.threat("missing").is_none());
    }
}
