//! Core model types
//!
//! Defines the entities of an architecture description:
//! - Trust boundaries
//! - Elements (actors and servers)
//! - Data assets
//! - Dataflows between elements
//! - Threat targets

use serde::{Deserialize, Serialize};

/// Named trust zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Unique boundary name
    pub name: String,
    /// Display color (rendering only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Whether the zone is trusted
    #[serde(default)]
    pub is_trusted: bool,
}

impl Boundary {
    /// Create untrusted boundary
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: None,
            is_trusted: false,
        }
    }

    /// Mark boundary as trusted
    #[inline]
    #[must_use]
    pub fn trusted(mut self) -> Self {
        self.is_trusted = true;
        self
    }

    /// With display color
    #[inline]
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Kind of participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Human or external system initiating interactions
    Actor,
    /// Process or host serving requests
    Server,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Actor => write!(f, "actor"),
            ElementKind::Server => write!(f, "server"),
        }
    }
}

/// Named participant of the modeled system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique element name
    pub name: String,
    /// Actor or server
    pub kind: ElementKind,
    /// Containing boundary, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<String>,
    /// Declared severity multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_multiplier: Option<f64>,
}

impl Element {
    /// Create actor element
    #[inline]
    #[must_use]
    pub fn actor(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Actor)
    }

    /// Create server element
    #[inline]
    #[must_use]
    pub fn server(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Server)
    }

    /// Create element of given kind
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            boundary: None,
            severity_multiplier: None,
        }
    }

    /// Place element inside a boundary
    #[inline]
    #[must_use]
    pub fn in_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// With declared severity multiplier
    #[inline]
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.severity_multiplier = Some(multiplier);
        self
    }

    /// Multiplier declared on the element, defaulting to 1.0
    #[inline]
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.severity_multiplier.unwrap_or(1.0)
    }

    /// Check if element is a server
    #[inline]
    #[must_use]
    pub fn is_server(&self) -> bool {
        self.kind == ElementKind::Server
    }
}

/// Data sensitivity classification
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Freely shareable
    Public,
    /// Internal use only
    #[default]
    Internal,
    /// Restricted to authorized parties
    Confidential,
    /// Highest sensitivity
    Secret,
}

impl Classification {
    /// Anything other than public is sensitive
    #[inline]
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        !matches!(self, Classification::Public)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Public => write!(f, "public"),
            Classification::Internal => write!(f, "internal"),
            Classification::Confidential => write!(f, "confidential"),
            Classification::Secret => write!(f, "secret"),
        }
    }
}

/// How long data lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// In transit only
    #[default]
    Transient,
    /// Stored at rest
    Persistent,
}

/// Named payload descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAsset {
    /// Unique asset name
    pub name: String,
    /// Sensitivity
    #[serde(default)]
    pub classification: Classification,
    /// Lifetime
    #[serde(default)]
    pub lifetime: Lifetime,
}

impl DataAsset {
    /// Create asset with classification
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, classification: Classification) -> Self {
        Self {
            name: name.into(),
            classification,
            lifetime: Lifetime::default(),
        }
    }

    /// With lifetime
    #[inline]
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }
}

/// Directed edge between two elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataflow {
    /// Unique dataflow name
    pub name: String,
    /// Sending element
    pub source: String,
    /// Receiving element
    pub sink: String,
    /// Protocol key (looked up in protocol profiles)
    pub protocol: String,
    /// Carried data asset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Whether the channel is encrypted
    #[serde(default)]
    pub is_encrypted: bool,
}

impl Dataflow {
    /// Create unencrypted dataflow carrying no declared asset
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        sink: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            sink: sink.into(),
            protocol: protocol.into(),
            data: None,
            is_encrypted: false,
        }
    }

    /// Carry a data asset
    #[inline]
    #[must_use]
    pub fn carrying(mut self, asset: impl Into<String>) -> Self {
        self.data = Some(asset.into());
        self
    }

    /// Set encryption flag
    #[inline]
    #[must_use]
    pub fn encrypted(mut self, is_encrypted: bool) -> Self {
        self.is_encrypted = is_encrypted;
        self
    }

    /// Both endpoints, source first
    #[inline]
    #[must_use]
    pub fn endpoints(&self) -> [&str; 2] {
        [&self.source, &self.sink]
    }

    /// `source → sink` label
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} → {}", self.source, self.sink)
    }
}

/// Threat target: an element or a dataflow, by name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum TargetRef {
    /// Actor or server
    Element(String),
    /// Dataflow edge
    Dataflow(String),
}

impl TargetRef {
    /// Declared name of the target
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            TargetRef::Element(name) | TargetRef::Dataflow(name) => name,
        }
    }

    /// Check if target is a dataflow
    #[inline]
    #[must_use]
    pub fn is_dataflow(&self) -> bool {
        matches!(self, TargetRef::Dataflow(_))
    }
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetRef::Element(name) => write!(f, "element:{name}"),
            TargetRef::Dataflow(name) => write!(f, "dataflow:{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_sensitivity() {
        assert!(!Classification::Public.is_sensitive());
        assert!(Classification::Internal.is_sensitive());
        assert!(Classification::Confidential.is_sensitive());
        assert!(Classification::Secret.is_sensitive());
    }

    #[test]
    fn element_multiplier_defaults_to_one() {
        assert_eq!(Element::server("db").multiplier(), 1.0);
        assert_eq!(Element::server("db").with_multiplier(2.0).multiplier(), 2.0);
    }

    #[test]
    fn dataflow_label() {
        let flow = Dataflow::new("f", "ClientA", "ServerB", "HTTP");
        assert_eq!(flow.label(), "ClientA → ServerB");
        assert_eq!(flow.endpoints(), ["ClientA", "ServerB"]);
    }

    #[test]
    fn target_ref_serde_shape() {
        let target = TargetRef::Dataflow("login".into());
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r#"{"kind":"dataflow","name":"login"}"#);
        let back: TargetRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, target);
    }

    #[test]
    fn classification_parses_lowercase() {
        let c: Classification = serde_json::from_str("\"confidential\"").unwrap();
        assert_eq!(c, Classification::Confidential);
    }
}
