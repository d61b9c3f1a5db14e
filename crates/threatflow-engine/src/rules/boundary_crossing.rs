//! Boundary-crossing rule
//!
//! A flow whose endpoints sit in different zones, at least one untrusted,
//! raises Spoofing and Tampering. Elements outside every boundary share one
//! implicit, untrusted external zone. Authenticated protocols suppress the
//! Spoofing candidate; integrity-protected ones suppress Tampering.

use super::{RuleContext, Subject, ThreatRule};
use crate::threat::ThreatCandidate;
use threatflow_model::TargetRef;
use threatflow_refdata::StrideCategory;

const EXTERNAL_ZONE: &str = "external";

/// Spoofing and Tampering on flows leaving or entering an untrusted zone
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundaryCrossingRule;

impl ThreatRule for BoundaryCrossingRule {
    fn id(&self) -> &'static str {
        "boundary-crossing"
    }

    fn summary(&self) -> &'static str {
        "dataflow crossing into or out of an untrusted boundary"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, subject: Subject<'_>) -> Vec<ThreatCandidate> {
        let Subject::Dataflow(flow) = subject else {
            return Vec::new();
        };
        let from = ctx.zone_of(&flow.source);
        let to = ctx.zone_of(&flow.sink);
        if from == to || (ctx.is_trusted(&flow.source) && ctx.is_trusted(&flow.sink)) {
            return Vec::new();
        }

        let profile = ctx.profile(flow);
        [StrideCategory::Spoofing, StrideCategory::Tampering]
            .into_iter()
            .filter(|category| !profile.suppresses(*category))
            .map(|category| {
                ThreatCandidate::from_rule(
                    self.id(),
                    category,
                    TargetRef::Dataflow(flow.name.clone()),
                    format!(
                        "{} of {} traffic on {} crossing from '{}' to '{}'",
                        category,
                        flow.protocol,
                        flow.label(),
                        from.unwrap_or(EXTERNAL_ZONE),
                        to.unwrap_or(EXTERNAL_ZONE)
                    ),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatflow_model::{Boundary, Dataflow, Element, ModelBuilder};
    use threatflow_refdata::{CveDefinitions, ReferenceData};

    fn categories(builder: ModelBuilder) -> Vec<StrideCategory> {
        let graph = builder.build().unwrap();
        let reference = ReferenceData::builtin();
        let cves = CveDefinitions::new();
        let ctx = RuleContext::new(&graph, &reference, &cves);
        graph
            .dataflows()
            .flat_map(|flow| BoundaryCrossingRule.evaluate(&ctx, Subject::Dataflow(flow)))
            .map(|c| c.category)
            .collect()
    }

    fn zones(protocol: &str) -> ModelBuilder {
        let mut builder = ModelBuilder::new();
        builder
            .add_boundary(Boundary::new("Internet"))
            .add_boundary(Boundary::new("Intranet").trusted())
            .add_element(Element::actor("ClientA").in_boundary("Internet"))
            .add_element(Element::server("ServerB").in_boundary("Intranet"))
            .add_dataflow(Dataflow::new("f", "ClientA", "ServerB", protocol));
        builder
    }

    #[test]
    fn untrusted_crossing_raises_both() {
        assert_eq!(
            categories(zones("HTTP")),
            vec![StrideCategory::Spoofing, StrideCategory::Tampering]
        );
    }

    #[test]
    fn protocol_flags_suppress() {
        assert_eq!(categories(zones("HTTPS")), vec![StrideCategory::Spoofing]);
        assert_eq!(categories(zones("Kerberos")), vec![StrideCategory::Tampering]);
        assert!(categories(zones("SSH")).is_empty());
    }

    #[test]
    fn same_zone_or_all_trusted_is_silent() {
        let mut same = ModelBuilder::new();
        same.add_boundary(Boundary::new("Internet"))
            .add_element(Element::actor("A").in_boundary("Internet"))
            .add_element(Element::server("B").in_boundary("Internet"))
            .add_dataflow(Dataflow::new("f", "A", "B", "HTTP"));
        assert!(categories(same).is_empty());

        let mut trusted = ModelBuilder::new();
        trusted
            .add_boundary(Boundary::new("Core").trusted())
            .add_boundary(Boundary::new("Data").trusted())
            .add_element(Element::server("A").in_boundary("Core"))
            .add_element(Element::server("B").in_boundary("Data"))
            .add_dataflow(Dataflow::new("f", "A", "B", "HTTP"));
        assert!(categories(trusted).is_empty());

        let mut external = ModelBuilder::new();
        external
            .add_element(Element::actor("A"))
            .add_element(Element::server("B"))
            .add_dataflow(Dataflow::new("f", "A", "B", "HTTP"));
        assert!(categories(external).is_empty());
    }

    #[test]
    fn external_zone_counts_as_untrusted() {
        let mut builder = ModelBuilder::new();
        builder
            .add_boundary(Boundary::new("Intranet").trusted())
            .add_element(Element::actor("Visitor"))
            .add_element(Element::server("Web").in_boundary("Intranet"))
            .add_dataflow(Dataflow::new("f", "Visitor", "Web", "HTTP"));
        assert_eq!(categories(builder).len(), 2);
    }
}
