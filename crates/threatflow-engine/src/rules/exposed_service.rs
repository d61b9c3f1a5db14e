//! Exposed-service rule

use super::{RuleContext, Subject, ThreatRule};
use crate::threat::ThreatCandidate;
use threatflow_model::TargetRef;
use threatflow_refdata::StrideCategory;

/// Denial of Service on servers reachable from an untrusted zone
#[derive(Debug, Clone, Copy, Default)]
pub struct ExposedServiceRule;

impl ThreatRule for ExposedServiceRule {
    fn id(&self) -> &'static str {
        "exposed-service"
    }

    fn summary(&self) -> &'static str {
        "server receiving traffic from an untrusted zone"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, subject: Subject<'_>) -> Vec<ThreatCandidate> {
        let Subject::Element(element) = subject else {
            return Vec::new();
        };
        if !element.is_server() {
            return Vec::new();
        }

        let mut senders: Vec<&str> = ctx
            .graph
            .dataflows()
            .filter(|flow| flow.sink == element.name && flow.source != element.name)
            .filter(|flow| !ctx.is_trusted(&flow.source))
            .map(|flow| flow.source.as_str())
            .collect();
        if senders.is_empty() {
            return Vec::new();
        }
        senders.sort_unstable();
        senders.dedup();

        vec![ThreatCandidate::from_rule(
            self.id(),
            StrideCategory::DenialOfService,
            TargetRef::Element(element.name.clone()),
            format!(
                "Server '{}' can be flooded by untrusted senders: {}",
                element.name,
                senders.join(", ")
            ),
        )]
    }
}
