//! Testing utilities for the threatflow workspace
//!
//! Shared scenario models, reference fixtures, and logging setup.

#![allow(missing_docs)]

use threatflow_model::{
    ArchitectureGraph, Boundary, Classification, DataAsset, Dataflow, Element, ModelBuilder,
};
use threatflow_refdata::{CveDefinitions, CveIndex};
use tracing_subscriber::EnvFilter;

/// Reference store whose STRIDE table only maps Spoofing on elements
pub const SPARSE_REFERENCE: &str = r#"
version: sparse-1
base_scores:
  spoofing: 6.0
  tampering: 6.5
  repudiation: 4.0
  information_disclosure: 6.0
  denial_of_service: 5.0
  elevation_of_privilege: 8.0
stride_techniques:
  spoofing:
    - technique: T1078
      scope: element
techniques:
  - id: T1078
    name: Valid Accounts
    tactics: [initial_access, persistence]
"#;

pub const SCENARIO_CVE: &str = "CVE-2023-1234";
pub const SCENARIO_CAPEC: &str = "CAPEC-560";

/// Route `tracing` output to the test harness, honouring `RUST_LOG`
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn zones(builder: &mut ModelBuilder) -> &mut ModelBuilder {
    builder
        .add_boundary(Boundary::new("Internet").with_color("red"))
        .add_boundary(Boundary::new("Intranet").with_color("green").trusted())
        .add_element(Element::actor("ClientA").in_boundary("Internet"))
        .add_element(Element::server("ServerB").in_boundary("Intranet"))
}

/// `ClientA` (Internet, untrusted) sends confidential credentials to
/// `ServerB` (Intranet, trusted) over HTTP on dataflow `login`
pub fn two_element_model(encrypted: bool) -> ArchitectureGraph {
    let mut builder = ModelBuilder::new();
    zones(&mut builder)
        .add_data_asset(DataAsset::new("Credentials", Classification::Confidential))
        .add_dataflow(
            Dataflow::new("login", "ClientA", "ServerB", "HTTP")
                .carrying("Credentials")
                .encrypted(encrypted),
        );
    builder.build().unwrap()
}

/// The two zones joined by `request` and `response` flows over `protocol`
pub fn model_with_protocol(protocol: &str, encrypted: bool) -> ArchitectureGraph {
    let mut builder = ModelBuilder::new();
    zones(&mut builder)
        .add_data_asset(DataAsset::new("Payload", Classification::Internal))
        .add_dataflow(
            Dataflow::new("request", "ClientA", "ServerB", protocol)
                .carrying("Payload")
                .encrypted(encrypted),
        )
        .add_dataflow(
            Dataflow::new("response", "ServerB", "ClientA", protocol)
                .carrying("Payload")
                .encrypted(encrypted),
        );
    builder.build().unwrap()
}

/// One cleartext flow of public data between trusted servers
pub fn public_data_model() -> ArchitectureGraph {
    let mut builder = ModelBuilder::new();
    builder
        .add_boundary(Boundary::new("Intranet").trusted())
        .add_element(Element::server("Cms").in_boundary("Intranet"))
        .add_element(Element::server("Cache").in_boundary("Intranet"))
        .add_data_asset(DataAsset::new("Articles", Classification::Public))
        .add_dataflow(Dataflow::new("publish", "Cms", "Cache", "HTTP").carrying("Articles"));
    builder.build().unwrap()
}

/// Servers only, no actors, no boundary crossings, no sensitive data
pub fn quiet_model() -> ArchitectureGraph {
    let mut builder = ModelBuilder::new();
    builder
        .add_boundary(Boundary::new("Intranet").trusted())
        .add_element(Element::server("Worker").in_boundary("Intranet"))
        .add_element(Element::server("Queue").in_boundary("Intranet"))
        .add_dataflow(Dataflow::new("poll", "Worker", "Queue", "gRPC").encrypted(true));
    builder.build().unwrap()
}

/// `ServerB` declares [`SCENARIO_CVE`]
pub fn scenario_cve_definitions() -> CveDefinitions {
    CveDefinitions::new().with("ServerB", [SCENARIO_CVE])
}

/// [`SCENARIO_CVE`] maps to [`SCENARIO_CAPEC`], which leads to `T1078`
pub fn scenario_cve_index() -> CveIndex {
    CveIndex::new().with(SCENARIO_CVE, ["560"])
}
