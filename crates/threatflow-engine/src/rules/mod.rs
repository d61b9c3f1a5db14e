//! STRIDE rule engine
//!
//! A rule is a pure function of the graph context and one subject (an
//! element or a dataflow). Rules never see each other's output; the
//! [`RuleSet`] concatenates every candidate, sorts, and deduplicates by
//! [`ThreatIdentity`](crate::ThreatIdentity).
//!
//! Evaluation is a single pass over all subjects with no fixed-point
//! iteration, so it parallelizes per subject.

mod boundary_crossing;
mod cve_bridge;
mod exposed_service;
mod privileged_target;
mod protocol_profile;
mod unencrypted_flow;

pub use boundary_crossing::BoundaryCrossingRule;
pub use cve_bridge::CveBridgeRule;
pub use exposed_service::ExposedServiceRule;
pub use privileged_target::PrivilegedTargetRule;
pub use protocol_profile::ProtocolProfileRule;
pub use unencrypted_flow::UnencryptedFlowRule;

use crate::threat::ThreatCandidate;
use rayon::prelude::*;
use threatflow_model::{ArchitectureGraph, Dataflow, Element};
use threatflow_refdata::{CveDefinitions, ProtocolProfile, ReferenceData};

/// Version of the standard rule set, echoed into results
pub const RULESET_VERSION: &str = "2025.1";

static NEUTRAL_PROFILE: ProtocolProfile = ProtocolProfile::neutral();

/// Read-only inputs every rule sees
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Architecture graph
    pub graph: &'a ArchitectureGraph,
    /// Reference tables
    pub reference: &'a ReferenceData,
    /// Per-target CVE declarations
    pub cves: &'a CveDefinitions,
}

impl<'a> RuleContext<'a> {
    /// Create context
    #[must_use]
    pub fn new(
        graph: &'a ArchitectureGraph,
        reference: &'a ReferenceData,
        cves: &'a CveDefinitions,
    ) -> Self {
        Self {
            graph,
            reference,
            cves,
        }
    }

    /// Profile of the flow's protocol, neutral when undeclared
    #[must_use]
    pub fn profile(&self, flow: &Dataflow) -> &'a ProtocolProfile {
        self.reference
            .protocol(&flow.protocol)
            .unwrap_or(&NEUTRAL_PROFILE)
    }

    /// Boundary name of an element, `None` for the external zone
    #[must_use]
    pub fn zone_of(&self, element: &str) -> Option<&'a str> {
        self.graph
            .element(element)
            .and_then(|e| e.boundary.as_deref())
    }

    /// Whether the named element sits in a trusted boundary
    #[must_use]
    pub fn is_trusted(&self, element: &str) -> bool {
        self.graph
            .element(element)
            .is_some_and(|e| self.graph.is_trusted(e))
    }
}

/// What a rule is evaluated against
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    /// Actor or server
    Element(&'a Element),
    /// Dataflow edge
    Dataflow(&'a Dataflow),
}

/// A fixed threat-derivation rule
pub trait ThreatRule: Send + Sync {
    /// Stable rule identifier
    fn id(&self) -> &'static str;

    /// One-line summary of what the rule detects
    fn summary(&self) -> &'static str;

    /// Candidates for one subject
    fn evaluate(&self, ctx: &RuleContext<'_>, subject: Subject<'_>) -> Vec<ThreatCandidate>;
}

/// Ordered collection of rules
pub struct RuleSet {
    rules: Vec<Box<dyn ThreatRule>>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.ids()).finish()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    /// Rule set with no rules
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// The versioned standard rule set
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_rule(UnencryptedFlowRule)
            .with_rule(BoundaryCrossingRule)
            .with_rule(PrivilegedTargetRule)
            .with_rule(ProtocolProfileRule)
            .with_rule(ExposedServiceRule)
            .with_rule(CveBridgeRule)
    }

    /// With an additional rule
    #[must_use]
    pub fn with_rule(mut self, rule: impl ThreatRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Rule identifiers in evaluation order
    #[must_use]
    pub fn ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the set has no rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate every rule against every element and dataflow
    ///
    /// Output is sorted by identity and deduplicated, so it does not depend
    /// on scheduling or rule order.
    #[must_use]
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Vec<ThreatCandidate> {
        let subjects: Vec<Subject<'_>> = ctx
            .graph
            .elements()
            .map(Subject::Element)
            .chain(ctx.graph.dataflows().map(Subject::Dataflow))
            .collect();

        let mut candidates: Vec<ThreatCandidate> = subjects
            .par_iter()
            .flat_map_iter(|subject| {
                self.rules
                    .iter()
                    .flat_map(move |rule| rule.evaluate(ctx, *subject))
            })
            .collect();

        let emitted = candidates.len();
        candidates.sort_by(|a, b| {
            a.identity()
                .cmp(&b.identity())
                .then_with(|| a.description.cmp(&b.description))
        });
        candidates.dedup_by(|later, earlier| later.identity() == earlier.identity());

        tracing::debug!(
            "Rule set evaluated {} subjects: {} candidates, {} after deduplication",
            subjects.len(),
            emitted,
            candidates.len()
        );
        candidates
    }
}
