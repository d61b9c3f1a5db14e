//! Threatflow Engine
//!
//! Rule-driven STRIDE threat classification and attack-path synthesis.
//!
//! # Pipeline
//!
//! - [`RuleSet`]: Fixed, versioned rules derive [`ThreatCandidate`]s from the graph
//! - [`Scorer`]: Multi-factor severity score and level ([`ScoredThreat`])
//! - [`MappingResolver`]: ATT&CK techniques and advisory controls ([`Threat`])
//! - [`AttackPathSynthesizer`]: Highest-value [`AttackFlow`] per objective
//! - [`ThreatEngine`]: Runs the stages and returns an [`AnalysisResult`]
//!
//! # Example
//!
//! ```no_run
//! use threatflow_engine::{AnalysisRequest, ThreatEngine};
//! use threatflow_model::ModelDocument;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = ModelDocument::from_yaml_str("elements: []")?.into_graph()?;
//! let result = ThreatEngine::default().analyze(&AnalysisRequest::new(graph))?;
//! println!("{}", result.to_json()?);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

mod config;
mod engine;
mod error;
mod flows;
mod mapping;
mod result;
pub mod rules;
mod scoring;
mod threat;

// Re-exports
pub use config::{EngineConfig, ScoringConfig, SeverityThresholds, SynthesisConfig};
pub use engine::{AnalysisRequest, ThreatEngine};
pub use error::{EngineError, EngineWarning, OverrideSource};
pub use flows::{AttackFlow, AttackPathSynthesizer, FlowStep};
pub use mapping::MappingResolver;
pub use result::{AnalysisResult, Coverage};
pub use rules::{RuleContext, RuleSet, Subject, ThreatRule, RULESET_VERSION};
pub use scoring::Scorer;
pub use threat::{
    Provenance, ScoredThreat, SeverityLevel, Threat, ThreatCandidate, ThreatIdentity,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
