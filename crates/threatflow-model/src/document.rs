//! Serializable model document
//!
//! External parsers and infrastructure importers hand the engine a graph as
//! plain data. The document mirrors [`ModelBuilder`] one-to-one and is
//! validated through it, so a document can never bypass graph validation.

use crate::builder::ModelBuilder;
use crate::error::ValidationError;
use crate::graph::ArchitectureGraph;
use crate::types::{Boundary, DataAsset, Dataflow, Element};
use serde::{Deserialize, Serialize};

/// Architecture description as data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Trust boundaries
    #[serde(default)]
    pub boundaries: Vec<Boundary>,
    /// Actors and servers
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Data assets
    #[serde(default)]
    pub data: Vec<DataAsset>,
    /// Dataflows
    #[serde(default)]
    pub dataflows: Vec<Dataflow>,
}

impl ModelDocument {
    /// Decode from JSON
    ///
    /// # Errors
    /// Returns [`ValidationError::Document`] if the JSON is malformed
    pub fn from_json_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|e| ValidationError::Document(e.to_string()))
    }

    /// Decode from YAML
    ///
    /// # Errors
    /// Returns [`ValidationError::Document`] if the YAML is malformed
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ValidationError> {
        serde_yaml::from_str(yaml).map_err(|e| ValidationError::Document(e.to_string()))
    }

    /// Validate and convert into a graph
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] reported by the builder
    pub fn into_graph(self) -> Result<ArchitectureGraph, ValidationError> {
        let mut builder = ModelBuilder::new();
        for boundary in self.boundaries {
            builder.add_boundary(boundary);
        }
        for element in self.elements {
            builder.add_element(element);
        }
        for asset in self.data {
            builder.add_data_asset(asset);
        }
        for flow in self.dataflows {
            builder.add_dataflow(flow);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Classification, ElementKind};

    const YAML: &str = r#"
boundaries:
  - name: Internet
  - name: Intranet
    is_trusted: true
    color: lightgreen
elements:
  - name: ClientA
    kind: actor
    boundary: Internet
  - name: ServerB
    kind: server
    boundary: Intranet
    severity_multiplier: 1.5
data:
  - name: Creds
    classification: confidential
dataflows:
  - name: login
    source: ClientA
    sink: ServerB
    protocol: HTTP
    data: Creds
"#;

    #[test]
    fn yaml_document_builds_graph() {
        let doc = ModelDocument::from_yaml_str(YAML).unwrap();
        let graph = doc.into_graph().unwrap();

        let server = graph.element("ServerB").unwrap();
        assert_eq!(server.kind, ElementKind::Server);
        assert_eq!(server.multiplier(), 1.5);

        let flow = graph.dataflow("login").unwrap();
        assert!(!flow.is_encrypted);
        assert_eq!(
            graph.data_asset_of(flow).unwrap().classification,
            Classification::Confidential
        );
        assert!(graph.boundary("Intranet").unwrap().is_trusted);
    }

    #[test]
    fn json_roundtrip_preserves_document() {
        let doc = ModelDocument::from_yaml_str(YAML).unwrap();
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(ModelDocument::from_json_str(&json).unwrap(), doc);
    }

    #[test]
    fn malformed_document_is_validation_error() {
        let err = ModelDocument::from_json_str("{\"elements\": 3}").unwrap_err();
        assert!(matches!(err, ValidationError::Document(_)));
    }

    #[test]
    fn document_goes_through_validation() {
        let doc = ModelDocument {
            dataflows: vec![Dataflow::new("f", "A", "B", "HTTP")],
            ..ModelDocument::default()
        };
        assert!(matches!(
            doc.into_graph(),
            Err(ValidationError::UnknownElement { .. })
        ));
    }

    #[test]
    fn padded_yaml_name_is_rejected() {
        let doc = ModelDocument::from_yaml_str("elements:\n  - name: \"Api \"\n    kind: server\n")
            .unwrap();
        assert!(matches!(
            doc.into_graph(),
            Err(ValidationError::PaddedName { .. })
        ));
    }
}
