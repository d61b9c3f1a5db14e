//! Unencrypted-flow rule

use super::{RuleContext, Subject, ThreatRule};
use crate::threat::ThreatCandidate;
use threatflow_model::TargetRef;
use threatflow_refdata::StrideCategory;

/// Information Disclosure on cleartext flows carrying non-public data
#[derive(Debug, Clone, Copy, Default)]
pub struct UnencryptedFlowRule;

impl ThreatRule for UnencryptedFlowRule {
    fn id(&self) -> &'static str {
        "unencrypted-flow"
    }

    fn summary(&self) -> &'static str {
        "non-public data crossing an unencrypted dataflow"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, subject: Subject<'_>) -> Vec<ThreatCandidate> {
        let Subject::Dataflow(flow) = subject else {
            return Vec::new();
        };
        if flow.is_encrypted {
            return Vec::new();
        }
        match ctx.graph.data_asset_of(flow) {
            Some(asset) if asset.classification.is_sensitive() => vec![ThreatCandidate::from_rule(
                self.id(),
                StrideCategory::InformationDisclosure,
                TargetRef::Dataflow(flow.name.clone()),
                format!(
                    "{} data '{}' is sent unencrypted over {} on {}",
                    asset.classification,
                    asset.name,
                    flow.protocol,
                    flow.label()
                ),
            )],
            _ => Vec::new(),
        }
    }
}
