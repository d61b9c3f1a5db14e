//! Threatflow Reference Data
//!
//! Read-only, versioned tables the engine scores and maps against:
//!
//! - STRIDE base scores and STRIDE → ATT&CK technique bindings
//! - ATT&CK technique catalog with tactics
//! - CAPEC catalog with recorded STRIDE category and ATT&CK links
//! - NIST SP 800-53 and CIS control suggestions per technique
//! - Protocol profiles (severity factor, suppression flags, added threats)
//! - CVE → CAPEC index and per-target CVE declarations
//!
//! A store is loaded once per process and never mutated. Refreshing the
//! tables means building a new [`ReferenceData`].

#![warn(unreachable_pub)]

mod builtin;
mod cve;
mod error;
mod overrides;
mod protocol;
mod store;
mod vocab;

// Re-exports
pub use builtin::BUILTIN_VERSION;
pub use cve::{capec_id, normalize_cve, CveDefinitions, CveIndex};
pub use error::ReferenceDataError;
pub use overrides::{MappingOverrides, TechniqueOverride};
pub use protocol::{protocol_key, ProtocolProfile};
pub use store::{ControlEntry, ReferenceData, ReferenceDocument};
pub use vocab::{
    CapecEntry, ControlFramework, ControlRef, ObjectiveCategory, StrideCategory, Tactic,
    Technique, TechniqueBinding, TechniqueScope, UnknownTerm,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
