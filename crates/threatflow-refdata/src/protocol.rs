//! Protocol profiles
//!
//! A profile tells the engine how a dataflow protocol shifts severity and
//! which default threats it suppresses or adds.

use crate::vocab::StrideCategory;
use serde::{Deserialize, Serialize};

fn default_factor() -> f64 {
    1.0
}

/// Per-protocol scoring and rule adjustments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolProfile {
    /// Multiplies the score of every threat on a flow using the protocol
    #[serde(default = "default_factor")]
    pub severity_factor: f64,
    /// Peers authenticate each other; suppresses boundary Spoofing
    #[serde(default)]
    pub authenticated: bool,
    /// Messages are integrity protected; suppresses boundary Tampering
    #[serde(default)]
    pub integrity_protected: bool,
    /// Extra categories raised on every flow using the protocol
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adds: Vec<StrideCategory>,
}

impl Default for ProtocolProfile {
    fn default() -> Self {
        Self::neutral()
    }
}

impl ProtocolProfile {
    /// Profile applied to undeclared protocols: no bonus, no suppression
    #[inline]
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            severity_factor: 1.0,
            authenticated: false,
            integrity_protected: false,
            adds: Vec::new(),
        }
    }

    /// With severity factor
    #[inline]
    #[must_use]
    pub fn with_factor(mut self, factor: f64) -> Self {
        self.severity_factor = factor;
        self
    }

    /// Mark as mutually authenticated
    #[inline]
    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    /// Mark as integrity protected
    #[inline]
    #[must_use]
    pub fn integrity_protected(mut self) -> Self {
        self.integrity_protected = true;
        self
    }

    /// Raise an extra category on flows
    #[inline]
    #[must_use]
    pub fn adding(mut self, category: StrideCategory) -> Self {
        if !self.adds.contains(&category) {
            self.adds.push(category);
        }
        self
    }

    /// Check if the profile suppresses a default boundary-crossing threat
    #[must_use]
    pub fn suppresses(&self, category: StrideCategory) -> bool {
        match category {
            StrideCategory::Spoofing => self.authenticated,
            StrideCategory::Tampering => self.integrity_protected,
            _ => false,
        }
    }
}

/// Normalized protocol lookup key
#[inline]
#[must_use]
pub fn protocol_key(protocol: &str) -> String {
    protocol.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_profile_changes_nothing() {
        let neutral = ProtocolProfile::neutral();
        assert_eq!(neutral.severity_factor, 1.0);
        for category in StrideCategory::ALL {
            assert!(!neutral.suppresses(category));
        }
        assert!(neutral.adds.is_empty());
    }

    #[test]
    fn suppression_follows_flags() {
        let ssh = ProtocolProfile::neutral().authenticated().integrity_protected();
        assert!(ssh.suppresses(StrideCategory::Spoofing));
        assert!(ssh.suppresses(StrideCategory::Tampering));
        assert!(!ssh.suppresses(StrideCategory::InformationDisclosure));

        let kerberos = ProtocolProfile::neutral().authenticated();
        assert!(!kerberos.suppresses(StrideCategory::Tampering));
    }

    #[test]
    fn adding_is_deduplicated() {
        let dns = ProtocolProfile::neutral()
            .adding(StrideCategory::Spoofing)
            .adding(StrideCategory::Spoofing);
        assert_eq!(dns.adds, vec![StrideCategory::Spoofing]);
    }

    #[test]
    fn serde_defaults() {
        let profile: ProtocolProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, ProtocolProfile::neutral());
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(protocol_key(" HTTPS "), "https");
    }
}
