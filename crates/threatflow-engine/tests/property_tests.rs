use proptest::prelude::*;
use std::collections::BTreeMap;
use threatflow_engine::{AnalysisRequest, AnalysisResult, Provenance, ThreatEngine};
use threatflow_model::{
    ArchitectureGraph, Boundary, Classification, DataAsset, Dataflow, Element, ModelBuilder,
    TargetRef,
};
use threatflow_refdata::StrideCategory;

const PROTOCOLS: [&str; 7] = ["HTTP", "HTTPS", "SSH", "DNS", "telnet", "GOPHER", "gRPC"];
const CLASSES: [Classification; 4] = [
    Classification::Public,
    Classification::Internal,
    Classification::Confidential,
    Classification::Secret,
];

#[derive(Debug, Clone)]
struct ElementSpec {
    server: bool,
    boundary: Option<usize>,
}

#[derive(Debug, Clone)]
struct FlowSpec {
    source: usize,
    sink: usize,
    protocol: usize,
    encrypted: bool,
    data: Option<usize>,
}

fn element_spec() -> impl Strategy<Value = ElementSpec> {
    (any::<bool>(), proptest::option::of(0..3usize))
        .prop_map(|(server, boundary)| ElementSpec { server, boundary })
}

fn flow_spec() -> impl Strategy<Value = FlowSpec> {
    (
        0..6usize,
        0..6usize,
        0..PROTOCOLS.len(),
        any::<bool>(),
        proptest::option::of(0..CLASSES.len()),
    )
        .prop_map(|(source, sink, protocol, encrypted, data)| FlowSpec {
            source,
            sink,
            protocol,
            encrypted,
            data,
        })
}

fn model() -> impl Strategy<Value = (Vec<ElementSpec>, Vec<FlowSpec>)> {
    (
        proptest::collection::vec(element_spec(), 2..6),
        proptest::collection::vec(flow_spec(), 1..8),
    )
}

fn build(elements: &[ElementSpec], flows: &[FlowSpec]) -> ArchitectureGraph {
    let mut builder = ModelBuilder::new();
    builder
        .add_boundary(Boundary::new("dmz"))
        .add_boundary(Boundary::new("core").trusted())
        .add_boundary(Boundary::new("data").trusted());
    let zones = ["dmz", "core", "data"];
    for class in CLASSES {
        builder.add_data_asset(DataAsset::new(format!("{class:?}"), class));
    }
    for (i, spec) in elements.iter().enumerate() {
        let name = format!("e{i}");
        let mut element = if spec.server {
            Element::server(name)
        } else {
            Element::actor(name)
        };
        if let Some(b) = spec.boundary {
            element = element.in_boundary(zones[b]);
        }
        builder.add_element(element);
    }
    let n = elements.len();
    for (i, spec) in flows.iter().enumerate() {
        let source = spec.source % n;
        let mut sink = spec.sink % n;
        if sink == source {
            sink = (source + 1) % n;
        }
        let mut flow = Dataflow::new(
            format!("f{i}"),
            format!("e{source}"),
            format!("e{sink}"),
            PROTOCOLS[spec.protocol],
        )
        .encrypted(spec.encrypted);
        if let Some(c) = spec.data {
            flow = flow.carrying(format!("{:?}", CLASSES[c]));
        }
        builder.add_dataflow(flow);
    }
    builder.build().unwrap()
}

fn analyze(request: &AnalysisRequest) -> AnalysisResult {
    ThreatEngine::default().analyze(request).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_analysis_is_deterministic((elements, flows) in model()) {
        let request = AnalysisRequest::new(build(&elements, &flows));
        let first = analyze(&request).to_json().unwrap();
        let second = analyze(&request).to_json().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_cleartext_sensitive_flows_raise_disclosure((elements, flows) in model()) {
        let graph = build(&elements, &flows);
        let result = analyze(&AnalysisRequest::new(graph.clone()));
        for flow in graph.dataflows() {
            let sensitive = graph
                .data_asset_of(flow)
                .is_some_and(|asset| asset.classification.is_sensitive());
            if flow.is_encrypted || !sensitive {
                continue;
            }
            let target = TargetRef::Dataflow(flow.name.clone());
            let has_disclosure = result.threats_for(&target).any(|t| {
                t.category == StrideCategory::InformationDisclosure
                    && t.provenance == Provenance::Rule
            });
            prop_assert!(has_disclosure);
        }
    }

    #[test]
    fn prop_attack_flows_are_valid((elements, flows) in model()) {
        let result = analyze(&AnalysisRequest::new(build(&elements, &flows)));
        for (objective, flow) in &result.attack_flows {
            prop_assert!(!flow.is_empty());
            prop_assert_eq!(flow.objective, *objective);
            let stages = flow.stages();
            prop_assert!(stages.windows(2).all(|w| w[0] < w[1]));
            prop_assert!(flow.steps.windows(2).all(|w| w[0].target != w[1].target));

            let sum: f64 = flow.steps.iter().map(|s| s.score).sum();
            prop_assert!((sum - flow.total_score).abs() < 1e-9);
            for step in &flow.steps {
                let threat = result.threat(&step.fingerprint).unwrap();
                prop_assert_eq!(threat.category, objective.stride());
                prop_assert!(step.technique.serves(step.stage));
            }
        }
    }

    #[test]
    fn prop_score_is_monotonic_in_multiplier(
        (elements, flows) in model(),
        pick in 0..6usize,
        low in 0.1f64..0.6,
        step in 0.05f64..0.6,
    ) {
        let graph = build(&elements, &flows);
        let target = format!("e{}", pick % elements.len());
        let scores = |multiplier: f64| -> BTreeMap<String, f64> {
            let request = AnalysisRequest::new(graph.clone()).with_multiplier(&target, multiplier);
            analyze(&request)
                .threats
                .into_iter()
                .filter(|t| t.target == TargetRef::Element(target.clone()))
                .map(|t| (t.fingerprint, t.score))
                .collect()
        };
        let before = scores(low);
        let after = scores(low + step);
        prop_assert_eq!(before.len(), after.len());
        for (fingerprint, score) in &before {
            let raised = after[fingerprint];
            prop_assert!(raised > *score);
            prop_assert!(raised <= 10.0);
        }
    }

    #[test]
    fn prop_threat_identities_are_unique((elements, flows) in model()) {
        let result = analyze(&AnalysisRequest::new(build(&elements, &flows)));
        let mut prints: Vec<&str> = result.threats.iter().map(|t| t.fingerprint.as_str()).collect();
        prints.sort_unstable();
        let total = prints.len();
        prints.dedup();
        prop_assert_eq!(prints.len(), total);
        prop_assert_eq!(result.coverage.total, total);
    }
}
