//! Privileged-target rule

use super::{RuleContext, Subject, ThreatRule};
use crate::threat::ThreatCandidate;
use threatflow_model::{ElementKind, TargetRef};
use threatflow_refdata::StrideCategory;

/// Elevation of Privilege on servers, Repudiation on actors
///
/// Actors are assumed non-auditable by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrivilegedTargetRule;

impl ThreatRule for PrivilegedTargetRule {
    fn id(&self) -> &'static str {
        "privileged-target"
    }

    fn summary(&self) -> &'static str {
        "privilege escalation on servers and repudiation by actors"
    }

    fn evaluate(&self, _ctx: &RuleContext<'_>, subject: Subject<'_>) -> Vec<ThreatCandidate> {
        let Subject::Element(element) = subject else {
            return Vec::new();
        };
        let (category, description) = match element.kind {
            ElementKind::Server => (
                StrideCategory::ElevationOfPrivilege,
                format!("Attacker gains elevated privileges on server '{}'", element.name),
            ),
            ElementKind::Actor => (
                StrideCategory::Repudiation,
                format!("Actor '{}' can deny actions it performed", element.name),
            ),
        };
        vec![ThreatCandidate::from_rule(
            self.id(),
            category,
            TargetRef::Element(element.name.clone()),
            description,
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatflow_refdata::{CveDefinitions, ReferenceData};
    use threatflow_test_utils::two_element_model;

    #[test]
    fn one_candidate_per_element() {
        let graph = two_element_model(false);
        let reference = ReferenceData::builtin();
        let cves = CveDefinitions::new();
        let ctx = RuleContext::new(&graph, &reference, &cves);

        let client = graph.element("ClientA").unwrap();
        let server = graph.element("ServerB").unwrap();
        let on_client = PrivilegedTargetRule.evaluate(&ctx, Subject::Element(client));
        let on_server = PrivilegedTargetRule.evaluate(&ctx, Subject::Element(server));

        assert_eq!(on_client.len(), 1);
        assert_eq!(on_client[0].category, StrideCategory::Repudiation);
        assert_eq!(on_server.len(), 1);
        assert_eq!(on_server[0].category, StrideCategory::ElevationOfPrivilege);

        let flow = graph.dataflows().next().unwrap();
        assert!(PrivilegedTargetRule
            .evaluate(&ctx, Subject::Dataflow(flow))
            .is_empty());
    }
}
