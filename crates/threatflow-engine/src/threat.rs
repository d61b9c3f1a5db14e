//! Threat pipeline values
//!
//! Each stage produces a new immutable value:
//! [`ThreatCandidate`] (rule output) → [`ScoredThreat`] (scorer) →
//! [`Threat`] (mapping resolver).

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use threatflow_model::TargetRef;
use threatflow_refdata::{ControlRef, StrideCategory, Tactic, Technique};

/// Where a threat came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// STRIDE rule over the graph
    Rule,
    /// Declared CVE resolved through CAPEC
    CveBridge,
}

impl Display for Provenance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Rule => write!(f, "rule"),
            Provenance::CveBridge => write!(f, "cve-bridge"),
        }
    }
}

/// Discrete severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SeverityLevel {
    /// Below the medium threshold
    Low,
    /// At least medium, below high
    Medium,
    /// At least high, below critical
    High,
    /// At or above the critical threshold
    Critical,
}

impl Display for SeverityLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SeverityLevel::Low => write!(f, "LOW"),
            SeverityLevel::Medium => write!(f, "MEDIUM"),
            SeverityLevel::High => write!(f, "HIGH"),
            SeverityLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Deduplication identity of a threat
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreatIdentity {
    /// STRIDE category
    pub category: StrideCategory,
    /// Element or dataflow
    pub target: TargetRef,
    /// Origin
    pub provenance: Provenance,
    /// Emitting rule
    pub rule_id: String,
}

impl ThreatIdentity {
    /// Blake3 content fingerprint of the identity, hex encoded
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for part in [
            self.category.name(),
            if self.target.is_dataflow() {
                "dataflow"
            } else {
                "element"
            },
            self.target.name(),
            if self.provenance == Provenance::Rule {
                "rule"
            } else {
                "cve-bridge"
            },
            self.rule_id.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(&[0x1f]);
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

/// Raw rule output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatCandidate {
    /// STRIDE category
    pub category: StrideCategory,
    /// Element or dataflow
    pub target: TargetRef,
    /// Human-readable description
    pub description: String,
    /// Origin
    pub provenance: Provenance,
    /// Emitting rule (`cve-bridge/CAPEC-<n>` for CVE threats)
    pub rule_id: String,
    /// Resolved CAPEC entry (CVE threats only)
    pub capec: Option<String>,
    /// CVEs that led to the CAPEC entry (CVE threats only)
    pub cves: Vec<String>,
}

impl ThreatCandidate {
    /// Candidate emitted by a STRIDE rule
    #[must_use]
    pub fn from_rule(
        rule_id: &str,
        category: StrideCategory,
        target: TargetRef,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            target,
            description: description.into(),
            provenance: Provenance::Rule,
            rule_id: rule_id.to_string(),
            capec: None,
            cves: Vec::new(),
        }
    }

    /// Candidate bridged from CVEs through a CAPEC entry
    #[must_use]
    pub fn from_cve(
        category: StrideCategory,
        target: TargetRef,
        capec: &str,
        cves: Vec<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            category,
            target,
            description: description.into(),
            provenance: Provenance::CveBridge,
            rule_id: format!("cve-bridge/{capec}"),
            capec: Some(capec.to_string()),
            cves,
        }
    }

    /// Deduplication identity
    #[must_use]
    pub fn identity(&self) -> ThreatIdentity {
        ThreatIdentity {
            category: self.category,
            target: self.target.clone(),
            provenance: self.provenance,
            rule_id: self.rule_id.clone(),
        }
    }
}

/// Candidate with a severity
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredThreat {
    /// Scored candidate
    pub candidate: ThreatCandidate,
    /// Display name of the target (`source → sink` for dataflows)
    pub target_name: String,
    /// Clamped severity score
    pub score: f64,
    /// Level derived from the configured thresholds
    pub level: SeverityLevel,
    /// Identity fingerprint
    pub fingerprint: String,
}

/// Fully resolved threat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    /// Identity fingerprint
    pub fingerprint: String,
    /// STRIDE category
    pub category: StrideCategory,
    /// Element or dataflow
    pub target: TargetRef,
    /// Display name of the target
    pub target_name: String,
    /// Human-readable description
    pub description: String,
    /// Clamped severity score
    pub score: f64,
    /// Severity level
    pub level: SeverityLevel,
    /// Mapped ATT&CK techniques, sorted by id
    pub techniques: Vec<Technique>,
    /// Advisory NIST/CIS controls (never affect scoring)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controls: Vec<ControlRef>,
    /// Origin
    pub provenance: Provenance,
    /// Emitting rule
    pub rule_id: String,
    /// Resolved CAPEC entry (CVE threats only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capec: Option<String>,
    /// CVEs behind the threat (CVE threats only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cves: Vec<String>,
}

impl Threat {
    /// Deduplication identity
    #[must_use]
    pub fn identity(&self) -> ThreatIdentity {
        ThreatIdentity {
            category: self.category,
            target: self.target.clone(),
            provenance: self.provenance,
            rule_id: self.rule_id.clone(),
        }
    }

    /// Kill-chain stage: earliest tactic over all mapped techniques
    #[must_use]
    pub fn stage(&self) -> Option<Tactic> {
        self.techniques
            .iter()
            .filter_map(Technique::earliest_tactic)
            .min()
    }

    /// Check if at least one technique is mapped
    #[inline]
    #[must_use]
    pub fn is_mapped(&self) -> bool {
        !self.techniques.is_empty()
    }

    /// Lowest-id mapped technique serving a tactic
    #[must_use]
    pub fn technique_for(&self, tactic: Tactic) -> Option<&Technique> {
        self.techniques.iter().find(|t| t.serves(tactic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_follows_identity() {
        let a = ThreatCandidate::from_rule(
            "boundary-crossing",
            StrideCategory::Spoofing,
            TargetRef::Dataflow("login".into()),
            "one description",
        );
        let mut b = a.clone();
        b.description = "another description".into();
        assert_eq!(a.identity().fingerprint(), b.identity().fingerprint());
        assert_eq!(a.identity().fingerprint().len(), 64);

        let c = ThreatCandidate::from_rule(
            "boundary-crossing",
            StrideCategory::Tampering,
            TargetRef::Dataflow("login".into()),
            "one description",
        );
        assert_ne!(a.identity().fingerprint(), c.identity().fingerprint());
    }

    #[test]
    fn element_and_dataflow_with_same_name_differ() {
        let element = ThreatIdentity {
            category: StrideCategory::Spoofing,
            target: TargetRef::Element("x".into()),
            provenance: Provenance::Rule,
            rule_id: "r".into(),
        };
        let mut dataflow = element.clone();
        dataflow.target = TargetRef::Dataflow("x".into());
        assert_ne!(element.fingerprint(), dataflow.fingerprint());
    }

    #[test]
    fn cve_candidates_qualify_rule_id() {
        let candidate = ThreatCandidate::from_cve(
            StrideCategory::Spoofing,
            TargetRef::Element("ServerB".into()),
            "CAPEC-560",
            vec!["CVE-2023-1234".into()],
            "desc",
        );
        assert_eq!(candidate.rule_id, "cve-bridge/CAPEC-560");
        assert_eq!(candidate.provenance, Provenance::CveBridge);
    }

    #[test]
    fn level_ordering_and_serde() {
        assert!(SeverityLevel::Low < SeverityLevel::Critical);
        assert_eq!(
            serde_json::to_string(&SeverityLevel::High).unwrap(),
            "\"HIGH\""
        );
        assert_eq!(
            serde_json::to_string(&Provenance::CveBridge).unwrap(),
            "\"cve-bridge\""
        );
    }

    #[test]
    fn stage_is_earliest_tactic() {
        let threat = Threat {
            fingerprint: String::new(),
            category: StrideCategory::Spoofing,
            target: TargetRef::Element("a".into()),
            target_name: "a".into(),
            description: String::new(),
            score: 1.0,
            level: SeverityLevel::Low,
            techniques: vec![
                Technique::new("T1036", "Masquerading", &[Tactic::DefenseEvasion]),
                Technique::new(
                    "T1078",
                    "Valid Accounts",
                    &[Tactic::InitialAccess, Tactic::Persistence],
                ),
            ],
            controls: vec![],
            provenance: Provenance::Rule,
            rule_id: "r".into(),
            capec: None,
            cves: vec![],
        };
        assert_eq!(threat.stage(), Some(Tactic::InitialAccess));
        assert_eq!(
            threat.technique_for(Tactic::DefenseEvasion).unwrap().id,
            "T1036"
        );
        assert!(threat.technique_for(Tactic::Impact).is_none());
    }
}
