//! Taxonomy vocabularies
//!
//! - [`StrideCategory`]: the six STRIDE threat classes
//! - [`ObjectiveCategory`]: STRIDE classes eligible for attack-flow synthesis
//! - [`Tactic`]: ATT&CK enterprise tactics, ordered by kill-chain position
//! - [`Technique`], [`CapecEntry`], [`ControlRef`]: catalog entries

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Unknown vocabulary term
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary}: '{term}'")]
pub struct UnknownTerm {
    /// Vocabulary the term was parsed against
    pub vocabulary: &'static str,
    /// Offending input
    pub term: String,
}

/// Lowercase and drop separators so "Initial Access", "initial_access" and
/// "initial-access" compare equal
fn normalize(term: &str) -> String {
    term.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// STRIDE threat category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrideCategory {
    /// Impersonating something or someone else
    Spoofing,
    /// Modifying data or code without authorization
    Tampering,
    /// Denying having performed an action
    Repudiation,
    /// Exposing information to unauthorized parties
    InformationDisclosure,
    /// Making a system or resource unavailable
    DenialOfService,
    /// Gaining capabilities without authorization
    ElevationOfPrivilege,
}

impl StrideCategory {
    /// All categories in canonical order
    pub const ALL: [StrideCategory; 6] = [
        StrideCategory::Spoofing,
        StrideCategory::Tampering,
        StrideCategory::Repudiation,
        StrideCategory::InformationDisclosure,
        StrideCategory::DenialOfService,
        StrideCategory::ElevationOfPrivilege,
    ];

    /// Human-readable name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            StrideCategory::Spoofing => "Spoofing",
            StrideCategory::Tampering => "Tampering",
            StrideCategory::Repudiation => "Repudiation",
            StrideCategory::InformationDisclosure => "Information Disclosure",
            StrideCategory::DenialOfService => "Denial of Service",
            StrideCategory::ElevationOfPrivilege => "Elevation of Privilege",
        }
    }

    /// Objective category, if this class participates in attack flows
    #[inline]
    #[must_use]
    pub const fn objective(&self) -> Option<ObjectiveCategory> {
        match self {
            StrideCategory::Tampering => Some(ObjectiveCategory::Tampering),
            StrideCategory::Spoofing => Some(ObjectiveCategory::Spoofing),
            StrideCategory::InformationDisclosure => Some(ObjectiveCategory::InformationDisclosure),
            StrideCategory::Repudiation => Some(ObjectiveCategory::Repudiation),
            StrideCategory::DenialOfService | StrideCategory::ElevationOfPrivilege => None,
        }
    }
}

impl Display for StrideCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrideCategory {
    type Err = UnknownTerm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        Self::ALL
            .into_iter()
            .find(|c| normalize(c.name()) == key)
            .ok_or_else(|| UnknownTerm {
                vocabulary: "STRIDE category",
                term: s.to_string(),
            })
    }
}

/// STRIDE category eligible for attack-flow synthesis
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveCategory {
    /// Attacker goal: alter data or behavior
    Tampering,
    /// Attacker goal: act under a false identity
    Spoofing,
    /// Attacker goal: read protected data
    InformationDisclosure,
    /// Attacker goal: act without accountability
    Repudiation,
}

impl ObjectiveCategory {
    /// All objectives in canonical order
    pub const ALL: [ObjectiveCategory; 4] = [
        ObjectiveCategory::Tampering,
        ObjectiveCategory::Spoofing,
        ObjectiveCategory::InformationDisclosure,
        ObjectiveCategory::Repudiation,
    ];

    /// Underlying STRIDE category
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> StrideCategory {
        match self {
            ObjectiveCategory::Tampering => StrideCategory::Tampering,
            ObjectiveCategory::Spoofing => StrideCategory::Spoofing,
            ObjectiveCategory::InformationDisclosure => StrideCategory::InformationDisclosure,
            ObjectiveCategory::Repudiation => StrideCategory::Repudiation,
        }
    }
}

impl Display for ObjectiveCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.stride().name())
    }
}

/// ATT&CK enterprise tactic
///
/// Declaration order is the canonical kill-chain order, so the derived
/// `Ord` compares stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Tactic {
    Reconnaissance,
    ResourceDevelopment,
    InitialAccess,
    Execution,
    Persistence,
    PrivilegeEscalation,
    DefenseEvasion,
    CredentialAccess,
    Discovery,
    LateralMovement,
    Collection,
    CommandAndControl,
    Exfiltration,
    Impact,
}

impl Tactic {
    /// All tactics in kill-chain order
    pub const ALL: [Tactic; 14] = [
        Tactic::Reconnaissance,
        Tactic::ResourceDevelopment,
        Tactic::InitialAccess,
        Tactic::Execution,
        Tactic::Persistence,
        Tactic::PrivilegeEscalation,
        Tactic::DefenseEvasion,
        Tactic::CredentialAccess,
        Tactic::Discovery,
        Tactic::LateralMovement,
        Tactic::Collection,
        Tactic::CommandAndControl,
        Tactic::Exfiltration,
        Tactic::Impact,
    ];

    /// ATT&CK tactic id
    #[must_use]
    pub const fn id(&self) -> &'static str {
        match self {
            Tactic::Reconnaissance => "TA0043",
            Tactic::ResourceDevelopment => "TA0042",
            Tactic::InitialAccess => "TA0001",
            Tactic::Execution => "TA0002",
            Tactic::Persistence => "TA0003",
            Tactic::PrivilegeEscalation => "TA0004",
            Tactic::DefenseEvasion => "TA0005",
            Tactic::CredentialAccess => "TA0006",
            Tactic::Discovery => "TA0007",
            Tactic::LateralMovement => "TA0008",
            Tactic::Collection => "TA0009",
            Tactic::CommandAndControl => "TA0011",
            Tactic::Exfiltration => "TA0010",
            Tactic::Impact => "TA0040",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Tactic::Reconnaissance => "Reconnaissance",
            Tactic::ResourceDevelopment => "Resource Development",
            Tactic::InitialAccess => "Initial Access",
            Tactic::Execution => "Execution",
            Tactic::Persistence => "Persistence",
            Tactic::PrivilegeEscalation => "Privilege Escalation",
            Tactic::DefenseEvasion => "Defense Evasion",
            Tactic::CredentialAccess => "Credential Access",
            Tactic::Discovery => "Discovery",
            Tactic::LateralMovement => "Lateral Movement",
            Tactic::Collection => "Collection",
            Tactic::CommandAndControl => "Command and Control",
            Tactic::Exfiltration => "Exfiltration",
            Tactic::Impact => "Impact",
        }
    }
}

impl Display for Tactic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tactic {
    type Err = UnknownTerm;

    /// Accepts a tactic name in any separator style, or its `TA` id
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        Self::ALL
            .into_iter()
            .find(|t| normalize(t.name()) == key || normalize(t.id()) == key)
            .ok_or_else(|| UnknownTerm {
                vocabulary: "ATT&CK tactic",
                term: s.to_string(),
            })
    }
}

/// ATT&CK technique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technique {
    /// Technique id (e.g. `T1078`)
    pub id: String,
    /// Technique name
    pub name: String,
    /// Tactics the technique serves
    #[serde(default)]
    pub tactics: Vec<Tactic>,
}

impl Technique {
    /// Create technique
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, tactics: &[Tactic]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            tactics: tactics.to_vec(),
        }
    }

    /// Earliest tactic in kill-chain order
    #[inline]
    #[must_use]
    pub fn earliest_tactic(&self) -> Option<Tactic> {
        self.tactics.iter().copied().min()
    }

    /// Check if the technique serves a tactic
    #[inline]
    #[must_use]
    pub fn serves(&self, tactic: Tactic) -> bool {
        self.tactics.contains(&tactic)
    }
}

/// Which threat targets a STRIDE table binding applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechniqueScope {
    /// Elements and dataflows
    #[default]
    Any,
    /// Actors and servers only
    Element,
    /// Dataflows only
    Dataflow,
}

impl TechniqueScope {
    /// Check if a binding with this scope applies to a target
    #[inline]
    #[must_use]
    pub const fn covers(&self, target_is_dataflow: bool) -> bool {
        match self {
            TechniqueScope::Any => true,
            TechniqueScope::Element => !target_is_dataflow,
            TechniqueScope::Dataflow => target_is_dataflow,
        }
    }
}

/// STRIDE table entry: a technique id and the targets it applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueBinding {
    /// Technique id
    pub technique: String,
    /// Applicable targets
    #[serde(default)]
    pub scope: TechniqueScope,
}

impl TechniqueBinding {
    /// Binding for any target
    #[must_use]
    pub fn any(technique: impl Into<String>) -> Self {
        Self::scoped(technique, TechniqueScope::Any)
    }

    /// Binding restricted to a target kind
    #[must_use]
    pub fn scoped(technique: impl Into<String>, scope: TechniqueScope) -> Self {
        Self {
            technique: technique.into(),
            scope,
        }
    }
}

/// CAPEC attack pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapecEntry {
    /// Pattern id (`CAPEC-<n>`)
    pub id: String,
    /// Pattern name
    pub name: String,
    /// STRIDE category recorded for the pattern
    pub category: StrideCategory,
    /// Linked ATT&CK technique ids
    #[serde(default)]
    pub techniques: Vec<String>,
}

/// Control framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlFramework {
    /// NIST SP 800-53
    Nist,
    /// CIS Critical Security Controls
    Cis,
}

impl Display for ControlFramework {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ControlFramework::Nist => write!(f, "NIST"),
            ControlFramework::Cis => write!(f, "CIS"),
        }
    }
}

/// Advisory control suggestion
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ControlRef {
    /// Framework the control belongs to
    pub framework: ControlFramework,
    /// Control id within the framework
    pub id: String,
    /// Control title
    pub name: String,
}
