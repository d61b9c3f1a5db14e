//! User-supplied mapping additions
//!
//! Overrides are keyed by STRIDE category and only ever add techniques to
//! the built-in table:
//!
//! ```yaml
//! spoofing:
//!   - id: T1000
//!     name: Custom Technique
//!     tactics: [initial_access]
//! ```

use crate::error::ReferenceDataError;
use crate::vocab::{StrideCategory, Tactic, Technique, TechniqueScope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One added technique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueOverride {
    /// Technique id
    pub id: String,
    /// Name used when the id is not in the catalog
    #[serde(default)]
    pub name: String,
    /// Tactics used when the id is not in the catalog
    #[serde(default)]
    pub tactics: Vec<Tactic>,
    /// Targets the addition applies to
    #[serde(default)]
    pub scope: TechniqueScope,
}

impl TechniqueOverride {
    /// Catalog-style technique built from this override
    #[must_use]
    pub fn technique(&self) -> Technique {
        let name = if self.name.trim().is_empty() {
            self.id.clone()
        } else {
            self.name.clone()
        };
        Technique {
            id: self.id.trim().to_string(),
            name,
            tactics: self.tactics.clone(),
        }
    }
}

/// Per-category technique additions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingOverrides {
    additions: BTreeMap<StrideCategory, Vec<TechniqueOverride>>,
}

impl MappingOverrides {
    /// Create empty overrides
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a technique to a category
    pub fn add(&mut self, category: StrideCategory, addition: TechniqueOverride) -> &mut Self {
        self.additions.entry(category).or_default().push(addition);
        self
    }

    /// Builder-style add of a technique applying to every target
    #[must_use]
    pub fn with(mut self, category: StrideCategory, technique: Technique) -> Self {
        self.add(
            category,
            TechniqueOverride {
                id: technique.id,
                name: technique.name,
                tactics: technique.tactics,
                scope: TechniqueScope::Any,
            },
        );
        self
    }

    /// Additions for a category
    #[must_use]
    pub fn for_category(&self, category: StrideCategory) -> &[TechniqueOverride] {
        self.additions.get(&category).map_or(&[], Vec::as_slice)
    }

    /// Check if no addition is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.values().all(Vec::is_empty)
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Parse`] for malformed input, or
    /// [`ReferenceDataError::InvalidValue`] for blank technique ids
    pub fn from_json_str(json: &str) -> Result<Self, ReferenceDataError> {
        let overrides: Self =
            serde_json::from_str(json).map_err(|e| ReferenceDataError::parse("overrides", e))?;
        overrides.validate()?;
        Ok(overrides)
    }

    /// Decode from YAML
    ///
    /// # Errors
    /// Same as [`MappingOverrides::from_json_str`]
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ReferenceDataError> {
        let overrides: Option<Self> =
            serde_yaml::from_str(yaml).map_err(|e| ReferenceDataError::parse("overrides", e))?;
        let overrides = overrides.unwrap_or_default();
        overrides.validate()?;
        Ok(overrides)
    }

    /// Load from a YAML or JSON file
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Io`] if the file cannot be read, or any
    /// decoding error
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ReferenceDataError::io(path, e))?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    fn validate(&self) -> Result<(), ReferenceDataError> {
        for (category, additions) in &self.additions {
            if additions.iter().any(|a| a.id.trim().is_empty()) {
                return Err(ReferenceDataError::invalid(
                    "overrides",
                    category.to_string(),
                    "technique id must not be empty",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides() {
        let yaml = r"
spoofing:
  - id: T1000
    name: Custom Technique
    tactics: [initial_access]
";
        let overrides = MappingOverrides::from_yaml_str(yaml).unwrap();
        let added = overrides.for_category(StrideCategory::Spoofing);
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].technique().tactics, vec![Tactic::InitialAccess]);
        assert_eq!(added[0].scope, TechniqueScope::Any);
        assert!(overrides.for_category(StrideCategory::Tampering).is_empty());
    }

    #[test]
    fn blank_ids_rejected() {
        let err = MappingOverrides::from_json_str(r#"{"tampering": [{"id": " "}]}"#).unwrap_err();
        assert!(matches!(err, ReferenceDataError::InvalidValue { .. }));
    }

    #[test]
    fn unnamed_override_uses_id() {
        let addition = TechniqueOverride {
            id: "T1600".into(),
            name: String::new(),
            tactics: vec![],
            scope: TechniqueScope::Dataflow,
        };
        assert_eq!(addition.technique().name, "T1600");
    }

    #[test]
    fn empty_document_is_empty() {
        assert!(MappingOverrides::from_yaml_str("").unwrap().is_empty());
    }
}
