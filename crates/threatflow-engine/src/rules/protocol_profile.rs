//! Protocol-profile rule

use super::{RuleContext, Subject, ThreatRule};
use crate::threat::ThreatCandidate;
use threatflow_model::TargetRef;

/// Extra categories a protocol profile raises on every flow using it
///
/// Undeclared protocols get the neutral profile, which adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtocolProfileRule;

impl ThreatRule for ProtocolProfileRule {
    fn id(&self) -> &'static str {
        "protocol-profile"
    }

    fn summary(&self) -> &'static str {
        "protocol-specific weaknesses from the profile table"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, subject: Subject<'_>) -> Vec<ThreatCandidate> {
        let Subject::Dataflow(flow) = subject else {
            return Vec::new();
        };
        ctx.profile(flow)
            .adds
            .iter()
            .map(|category| {
                ThreatCandidate::from_rule(
                    self.id(),
                    *category,
                    TargetRef::Dataflow(flow.name.clone()),
                    format!(
                        "{} exposes {} to {}",
                        flow.protocol,
                        flow.label(),
                        category
                    ),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatflow_refdata::{CveDefinitions, ReferenceData, StrideCategory};
    use threatflow_test_utils::model_with_protocol;

    fn categories(protocol: &str) -> Vec<StrideCategory> {
        let graph = model_with_protocol(protocol, false);
        let reference = ReferenceData::builtin();
        let cves = CveDefinitions::new();
        let ctx = RuleContext::new(&graph, &reference, &cves);
        let flow = graph.dataflows().next().unwrap();
        ProtocolProfileRule
            .evaluate(&ctx, Subject::Dataflow(flow))
            .into_iter()
            .map(|c| c.category)
            .collect()
    }

    #[test]
    fn profile_additions() {
        assert_eq!(
            categories("DNS"),
            vec![StrideCategory::Spoofing, StrideCategory::DenialOfService]
        );
        assert_eq!(
            categories("telnet"),
            vec![StrideCategory::InformationDisclosure]
        );
        assert!(categories("HTTPS").is_empty());
        assert!(categories("GOPHER").is_empty());
    }
}
