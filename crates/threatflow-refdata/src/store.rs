//! Reference Data Store
//!
//! [`ReferenceData`] is built once (embedded tables or a loaded document),
//! validated, and then only read. [`ReferenceData::shared`] hands out the
//! process-wide embedded store.

use crate::builtin;
use crate::cve::{capec_id, CveIndex};
use crate::error::ReferenceDataError;
use crate::protocol::{protocol_key, ProtocolProfile};
use crate::vocab::{
    CapecEntry, ControlFramework, ControlRef, StrideCategory, Technique, TechniqueBinding,
};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

static SHARED: Lazy<Arc<ReferenceData>> = Lazy::new(|| Arc::new(ReferenceData::builtin()));

fn custom_version() -> String {
    "custom".to_string()
}

/// Control as written in a document; the framework comes from the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlEntry {
    /// Control id
    pub id: String,
    /// Control title
    pub name: String,
}

/// Serialized form of the store
///
/// `base_scores`, `stride_techniques` and `techniques` are required; the
/// other tables default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    /// Version tag echoed into analysis results
    #[serde(default = "custom_version")]
    pub version: String,
    /// Base score per STRIDE category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_scores: Option<BTreeMap<StrideCategory, f64>>,
    /// STRIDE category → technique bindings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stride_techniques: Option<BTreeMap<StrideCategory, Vec<TechniqueBinding>>>,
    /// Technique catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub techniques: Option<Vec<Technique>>,
    /// CAPEC catalog with ATT&CK links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capec: Option<Vec<CapecEntry>>,
    /// Technique id → NIST SP 800-53 controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nist_controls: Option<BTreeMap<String, Vec<ControlEntry>>>,
    /// Technique id → CIS controls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cis_controls: Option<BTreeMap<String, Vec<ControlEntry>>>,
    /// Protocol name → profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocols: Option<BTreeMap<String, ProtocolProfile>>,
}

/// Read-only taxonomy and scoring tables
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceData {
    version: String,
    base_scores: BTreeMap<StrideCategory, f64>,
    stride_techniques: BTreeMap<StrideCategory, Vec<TechniqueBinding>>,
    techniques: BTreeMap<String, Technique>,
    capec: BTreeMap<String, CapecEntry>,
    controls: BTreeMap<String, Vec<ControlRef>>,
    protocols: BTreeMap<String, ProtocolProfile>,
    cve_index: CveIndex,
}

impl ReferenceData {
    /// Store built from the embedded tables
    #[must_use]
    pub fn builtin() -> Self {
        Self::assemble(builtin::document())
    }

    /// Process-wide embedded store, built on first use
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Build and validate a store from a document
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::MissingTable`] if a required table is
    /// absent, or any error reported by [`ReferenceData::validate`]
    pub fn from_document(doc: ReferenceDocument) -> Result<Self, ReferenceDataError> {
        if doc.base_scores.is_none() {
            return Err(ReferenceDataError::MissingTable("base_scores"));
        }
        if doc.stride_techniques.is_none() {
            return Err(ReferenceDataError::MissingTable("stride_techniques"));
        }
        if doc.techniques.is_none() {
            return Err(ReferenceDataError::MissingTable("techniques"));
        }
        let technique_ids = doc.techniques.iter().flatten().map(|t| t.id.trim());
        if let Some(duplicate) = first_duplicate(technique_ids) {
            return Err(ReferenceDataError::invalid(
                "techniques",
                duplicate,
                "declared more than once",
            ));
        }

        let data = Self::assemble(doc);
        data.validate()?;
        tracing::debug!(
            "Loaded reference data {}: {} techniques, {} CAPEC entries, {} protocols",
            data.version,
            data.techniques.len(),
            data.capec.len(),
            data.protocols.len()
        );
        Ok(data)
    }

    /// Decode and validate a JSON document
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Parse`] for malformed JSON, or any
    /// error from [`ReferenceData::from_document`]
    pub fn from_json_str(json: &str) -> Result<Self, ReferenceDataError> {
        let doc = serde_json::from_str(json)
            .map_err(|e| ReferenceDataError::parse("reference data", e))?;
        Self::from_document(doc)
    }

    /// Decode and validate a YAML document
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Parse`] for malformed YAML, or any
    /// error from [`ReferenceData::from_document`]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ReferenceDataError> {
        let doc = serde_yaml::from_str(yaml)
            .map_err(|e| ReferenceDataError::parse("reference data", e))?;
        Self::from_document(doc)
    }

    /// Load a store from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Io`] if the file cannot be read, or any
    /// decoding or validation error
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ReferenceDataError::io(path, e))?;
        let origin = path.display().to_string();
        let doc: ReferenceDocument = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&text).map_err(|e| ReferenceDataError::parse(&origin, e))?
        } else {
            serde_yaml::from_str(&text).map_err(|e| ReferenceDataError::parse(&origin, e))?
        };
        Self::from_document(doc)
    }

    /// Attach a CVE → CAPEC index
    #[must_use]
    pub fn with_cve_index(mut self, index: CveIndex) -> Self {
        self.cve_index = index;
        self
    }

    /// Check every table the engine depends on
    ///
    /// # Errors
    /// - [`ReferenceDataError::MissingTable`] if the technique catalog or the
    ///   STRIDE table is empty
    /// - [`ReferenceDataError::MissingBaseScore`] if a category has no score
    /// - [`ReferenceDataError::InvalidValue`] for unusable numbers or links to
    ///   undeclared techniques
    pub fn validate(&self) -> Result<(), ReferenceDataError> {
        if self.techniques.is_empty() {
            return Err(ReferenceDataError::MissingTable("techniques"));
        }
        if self.stride_techniques.is_empty() {
            return Err(ReferenceDataError::MissingTable("stride_techniques"));
        }

        for category in StrideCategory::ALL {
            let score = self
                .base_scores
                .get(&category)
                .ok_or(ReferenceDataError::MissingBaseScore(category))?;
            if !score.is_finite() || *score < 0.0 {
                return Err(ReferenceDataError::invalid(
                    "base_scores",
                    category.to_string(),
                    format!("score {score} must be finite and non-negative"),
                ));
            }
        }

        for (category, bindings) in &self.stride_techniques {
            if let Some(binding) = bindings
                .iter()
                .find(|b| !self.techniques.contains_key(&b.technique))
            {
                return Err(ReferenceDataError::invalid(
                    "stride_techniques",
                    category.to_string(),
                    format!("unknown technique {}", binding.technique),
                ));
            }
        }

        for entry in self.capec.values() {
            if let Some(id) = entry
                .techniques
                .iter()
                .find(|id| !self.techniques.contains_key(*id))
            {
                return Err(ReferenceDataError::invalid(
                    "capec",
                    entry.id.clone(),
                    format!("unknown technique {id}"),
                ));
            }
        }

        for (name, profile) in &self.protocols {
            if !profile.severity_factor.is_finite() || profile.severity_factor < 0.0 {
                return Err(ReferenceDataError::invalid(
                    "protocols",
                    name.clone(),
                    format!(
                        "severity factor {} must be finite and non-negative",
                        profile.severity_factor
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Version tag
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Base score of a category
    #[inline]
    #[must_use]
    pub fn base_score(&self, category: StrideCategory) -> Option<f64> {
        self.base_scores.get(&category).copied()
    }

    /// Catalog techniques bound to a category for a target kind, in table order
    pub fn techniques_for(
        &self,
        category: StrideCategory,
        target_is_dataflow: bool,
    ) -> impl Iterator<Item = &Technique> {
        self.stride_techniques
            .get(&category)
            .into_iter()
            .flatten()
            .filter(move |binding| binding.scope.covers(target_is_dataflow))
            .filter_map(|binding| self.techniques.get(&binding.technique))
    }

    /// Lookup technique by id
    #[inline]
    #[must_use]
    pub fn technique(&self, id: &str) -> Option<&Technique> {
        self.techniques.get(id)
    }

    /// Lookup CAPEC entry by id (bare numbers accepted)
    #[must_use]
    pub fn capec(&self, id: &str) -> Option<&CapecEntry> {
        self.capec.get(&capec_id(id))
    }

    /// Advisory NIST and CIS controls for a technique, sorted
    #[must_use]
    pub fn controls_for(&self, technique_id: &str) -> &[ControlRef] {
        self.controls.get(technique_id).map_or(&[], Vec::as_slice)
    }

    /// Profile of a protocol, if declared (case-insensitive)
    #[must_use]
    pub fn protocol(&self, protocol: &str) -> Option<&ProtocolProfile> {
        self.protocols.get(&protocol_key(protocol))
    }

    /// CVE → CAPEC index
    #[inline]
    #[must_use]
    pub fn cve_index(&self) -> &CveIndex {
        &self.cve_index
    }

    /// Number of catalog techniques
    #[inline]
    #[must_use]
    pub fn technique_count(&self) -> usize {
        self.techniques.len()
    }

    /// Serialized form of the store (the CVE index is not part of it)
    #[must_use]
    pub fn to_document(&self) -> ReferenceDocument {
        let split = |framework: ControlFramework| -> BTreeMap<String, Vec<ControlEntry>> {
            self.controls
                .iter()
                .map(|(technique, controls)| {
                    let entries: Vec<ControlEntry> = controls
                        .iter()
                        .filter(|c| c.framework == framework)
                        .map(|c| ControlEntry {
                            id: c.id.clone(),
                            name: c.name.clone(),
                        })
                        .collect();
                    (technique.clone(), entries)
                })
                .filter(|(_, entries)| !entries.is_empty())
                .collect()
        };

        ReferenceDocument {
            version: self.version.clone(),
            base_scores: Some(self.base_scores.clone()),
            stride_techniques: Some(self.stride_techniques.clone()),
            techniques: Some(self.techniques.values().cloned().collect()),
            capec: Some(self.capec.values().cloned().collect()),
            nist_controls: Some(split(ControlFramework::Nist)),
            cis_controls: Some(split(ControlFramework::Cis)),
            protocols: Some(self.protocols.clone()),
        }
    }

    /// Index document tables without validating them
    fn assemble(doc: ReferenceDocument) -> Self {
        let techniques = doc
            .techniques
            .unwrap_or_default()
            .into_iter()
            .map(|mut t| {
                t.id = t.id.trim().to_string();
                (t.id.clone(), t)
            })
            .collect();

        let capec = doc
            .capec
            .unwrap_or_default()
            .into_iter()
            .map(|mut entry| {
                entry.id = capec_id(&entry.id);
                (entry.id.clone(), entry)
            })
            .collect();

        let mut controls: BTreeMap<String, Vec<ControlRef>> = BTreeMap::new();
        let frameworks = [
            (ControlFramework::Nist, doc.nist_controls),
            (ControlFramework::Cis, doc.cis_controls),
        ];
        for (framework, table) in frameworks {
            for (technique, entries) in table.unwrap_or_default() {
                let slot = controls.entry(technique.trim().to_string()).or_default();
                slot.extend(entries.into_iter().map(|e| ControlRef {
                    framework,
                    id: e.id,
                    name: e.name,
                }));
            }
        }
        for slot in controls.values_mut() {
            slot.sort();
            slot.dedup();
        }

        let protocols = doc
            .protocols
            .unwrap_or_default()
            .into_iter()
            .map(|(name, profile)| (protocol_key(&name), profile))
            .collect();

        Self {
            version: doc.version,
            base_scores: doc.base_scores.unwrap_or_default(),
            stride_techniques: doc.stride_techniques.unwrap_or_default(),
            techniques,
            capec,
            controls,
            protocols,
            cve_index: CveIndex::default(),
        }
    }
}

fn first_duplicate<'a>(ids: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut seen = std::collections::BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Some(id.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::{Tactic, TechniqueScope};
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"
version: test-1
base_scores:
  spoofing: 6.0
  tampering: 6.5
  repudiation: 4.0
  information_disclosure: 6.0
  denial_of_service: 5.0
  elevation_of_privilege: 8.0
stride_techniques:
  spoofing:
    - technique: T1078
      scope: element
techniques:
  - id: T1078
    name: Valid Accounts
    tactics: [initial_access, persistence]
protocols:
  HTTP:
    severity_factor: 1.2
"#;

    #[test]
    fn builtin_store_is_valid() {
        let data = ReferenceData::builtin();
        data.validate().unwrap();
        assert_eq!(data.version(), builtin::BUILTIN_VERSION);
        for category in StrideCategory::ALL {
            assert!(data.base_score(category).is_some());
        }
        assert_eq!(
            data.base_score(StrideCategory::ElevationOfPrivilege),
            Some(8.0)
        );
    }

    #[test]
    fn shared_store_is_single_instance() {
        let a = ReferenceData::shared();
        let b = ReferenceData::shared();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn yaml_store_loads_and_normalizes() {
        let data = ReferenceData::from_yaml_str(MINIMAL).unwrap();
        assert_eq!(data.version(), "test-1");
        assert_eq!(data.protocol("http").unwrap().severity_factor, 1.2);
        assert!(data.protocol("gopher").is_none());

        let element: Vec<_> = data
            .techniques_for(StrideCategory::Spoofing, false)
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(element, vec!["T1078"]);
        assert_eq!(
            data.techniques_for(StrideCategory::Spoofing, true).count(),
            0
        );
        assert_eq!(
            data.technique("T1078").unwrap().earliest_tactic(),
            Some(Tactic::InitialAccess)
        );
    }

    #[test]
    fn missing_tables_are_fatal() {
        let err = ReferenceData::from_yaml_str("version: x\n").unwrap_err();
        assert!(matches!(err, ReferenceDataError::MissingTable("base_scores")));

        let without_techniques = MINIMAL.replace("techniques:\n  - id", "unused:\n  - id");
        let err = ReferenceData::from_yaml_str(&without_techniques).unwrap_err();
        assert!(matches!(err, ReferenceDataError::MissingTable("techniques")));
    }

    #[test]
    fn missing_base_score_is_fatal() {
        let doc = MINIMAL.replace("  repudiation: 4.0\n", "");
        let err = ReferenceData::from_yaml_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            ReferenceDataError::MissingBaseScore(StrideCategory::Repudiation)
        ));
    }

    #[test]
    fn dangling_technique_link_is_invalid() {
        let doc = MINIMAL.replace("- technique: T1078", "- technique: T9999");
        let err = ReferenceData::from_yaml_str(&doc).unwrap_err();
        assert!(matches!(
            err,
            ReferenceDataError::InvalidValue {
                table: "stride_techniques",
                ..
            }
        ));
    }

    #[test]
    fn negative_factor_is_invalid() {
        let doc = MINIMAL.replace("severity_factor: 1.2", "severity_factor: -1.0");
        assert!(matches!(
            ReferenceData::from_yaml_str(&doc),
            Err(ReferenceDataError::InvalidValue {
                table: "protocols",
                ..
            })
        ));
    }

    #[test]
    fn document_roundtrip_preserves_builtin() {
        let data = ReferenceData::builtin();
        let json = serde_json::to_string(&data.to_document()).unwrap();
        let reloaded = ReferenceData::from_json_str(&json).unwrap();
        assert_eq!(reloaded, data);
    }

    #[test]
    fn controls_merge_frameworks() {
        let data = ReferenceData::builtin();
        let controls = data.controls_for("T1078");
        assert!(controls.iter().any(|c| c.framework == ControlFramework::Nist));
        assert!(controls.iter().any(|c| c.framework == ControlFramework::Cis));
        let mut sorted = controls.to_vec();
        sorted.sort();
        assert_eq!(sorted, controls);
        assert!(data.controls_for("T0000").is_empty());
    }

    #[test]
    fn capec_lookup_accepts_bare_ids() {
        let data = ReferenceData::builtin();
        assert_eq!(data.capec("560").unwrap().category, StrideCategory::Spoofing);
        assert_eq!(
            data.capec("CAPEC-560").unwrap().techniques,
            vec!["T1078".to_string()]
        );
    }

    #[test]
    fn builtin_scopes_split_stages() {
        let data = ReferenceData::builtin();
        let stage = |dataflow| {
            data.techniques_for(StrideCategory::Spoofing, dataflow)
                .filter_map(Technique::earliest_tactic)
                .min()
        };
        assert_eq!(stage(false), Some(Tactic::InitialAccess));
        assert_eq!(stage(true), Some(Tactic::CredentialAccess));
        assert_eq!(TechniqueScope::default(), TechniqueScope::Any);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reference.yaml");
        std::fs::write(&path, MINIMAL).unwrap();
        assert_eq!(ReferenceData::load(&path).unwrap().version(), "test-1");

        let missing = dir.path().join("absent.yaml");
        assert!(matches!(
            ReferenceData::load(missing),
            Err(ReferenceDataError::Io { .. })
        ));
    }
}
