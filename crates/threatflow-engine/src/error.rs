//! Error and warning types for analysis runs
//!
//! Fatal problems stop a run before rule evaluation ([`EngineError`]).
//! Everything else is accumulated as an [`EngineWarning`] and returned with
//! the result.

use serde::Serialize;
use threatflow_model::ValidationError;
use threatflow_refdata::{ReferenceDataError, StrideCategory};

/// Fatal analysis error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed architecture graph or run input
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Reference data store cannot support scoring or mapping
    #[error("reference data error: {0}")]
    ReferenceData(#[from] ReferenceDataError),

    /// Engine configuration is unusable
    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Create configuration error
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Run input that can name graph targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideSource {
    /// Per-target CVE declarations
    CveDefinitions,
    /// Per-target severity multipliers
    SeverityMultipliers,
}

impl std::fmt::Display for OverrideSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverrideSource::CveDefinitions => write!(f, "CVE definitions"),
            OverrideSource::SeverityMultipliers => write!(f, "severity multipliers"),
        }
    }
}

/// Non-fatal analysis finding
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    /// Protocol absent from the profile table; neutral profile applied
    #[error("unknown protocol '{protocol}', neutral profile applied")]
    UnknownProtocol { protocol: String },

    /// Threat resolved to no technique
    #[error("no technique mapped for {category} threat on '{target}'")]
    UnresolvedMapping {
        category: StrideCategory,
        target: String,
        fingerprint: String,
    },

    /// CVE maps to a CAPEC entry missing from the catalog
    #[error("{cve} on '{target}' maps to {capec}, which is not in the CAPEC catalog")]
    UnknownCapec {
        target: String,
        cve: String,
        capec: String,
    },

    /// Run input names something that is not a usable target
    #[error("{input} name '{target}', which is not a usable target in the model")]
    UnknownTarget {
        input: OverrideSource,
        target: String,
    },
}

impl EngineWarning {
    /// Emit through tracing
    pub fn log(&self) {
        tracing::warn!("{}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatflow_model::EntityKind;

    #[test]
    fn fatal_errors_wrap_sources() {
        let err: EngineError = ValidationError::duplicate(EntityKind::Element, "Db").into();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "validation failed: duplicate element name: 'Db'"
        );

        let err: EngineError = ReferenceDataError::MissingTable("techniques").into();
        assert!(matches!(err, EngineError::ReferenceData(_)));
    }

    #[test]
    fn warning_display_and_shape() {
        let warning = EngineWarning::UnknownProtocol {
            protocol: "GOPHER".into(),
        };
        assert_eq!(
            warning.to_string(),
            "unknown protocol 'GOPHER', neutral profile applied"
        );
        let json = serde_json::to_string(&warning).unwrap();
        assert_eq!(json, r#"{"kind":"unknown_protocol","protocol":"GOPHER"}"#);

        let warning = EngineWarning::UnknownTarget {
            input: OverrideSource::CveDefinitions,
            target: "Ghost".into(),
        };
        assert_eq!(
            warning.to_string(),
            "CVE definitions name 'Ghost', which is not a usable target in the model"
        );
    }
}
