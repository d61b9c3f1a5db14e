//! Error types for architecture graph construction
//!
//! A graph that fails any of these checks never reaches the engine.

/// Kind of named model entity, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Trust boundary
    Boundary,
    /// Actor or server
    Element,
    /// Data asset
    DataAsset,
    /// Dataflow edge
    Dataflow,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Boundary => write!(f, "boundary"),
            EntityKind::Element => write!(f, "element"),
            EntityKind::DataAsset => write!(f, "data asset"),
            EntityKind::Dataflow => write!(f, "dataflow"),
        }
    }
}

/// Malformed architecture graph
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Entity declared with an empty or whitespace-only name
    #[error("{kind} declared with an empty name")]
    EmptyName { kind: EntityKind },

    /// Name carries leading or trailing whitespace
    #[error("{kind} name '{name}' has surrounding whitespace")]
    PaddedName { kind: EntityKind, name: String },

    /// Two entities share a name within the same namespace
    #[error("duplicate {kind} name: '{name}'")]
    DuplicateName { kind: EntityKind, name: String },

    /// Element references a boundary that was never declared
    #[error("element '{element}' references unknown boundary '{boundary}'")]
    UnknownBoundary { element: String, boundary: String },

    /// Dataflow endpoint is not a declared element
    #[error("dataflow '{dataflow}' references unknown element '{element}'")]
    UnknownElement { dataflow: String, element: String },

    /// Dataflow carries an undeclared data asset
    #[error("dataflow '{dataflow}' references unknown data asset '{asset}'")]
    UnknownDataAsset { dataflow: String, asset: String },

    /// Severity multiplier is negative, NaN or infinite
    #[error("invalid severity multiplier {value} for target '{target}'")]
    InvalidMultiplier { target: String, value: f64 },

    /// Model document could not be decoded
    #[error("malformed model document: {0}")]
    Document(String),
}

impl ValidationError {
    /// Create duplicate name error
    #[inline]
    pub fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Name of the offending entity, when there is one
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::EmptyName { .. } | Self::Document(_) => None,
            Self::DuplicateName { name, .. } | Self::PaddedName { name, .. } => Some(name),
            Self::UnknownBoundary { element, .. } => Some(element),
            Self::UnknownElement { dataflow, .. } | Self::UnknownDataAsset { dataflow, .. } => {
                Some(dataflow)
            }
            Self::InvalidMultiplier { target, .. } => Some(target),
        }
    }
}

/// Check a multiplier is usable for scoring
pub(crate) fn check_multiplier(target: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidMultiplier {
            target: target.to_string(),
            value,
        })
    }
}
