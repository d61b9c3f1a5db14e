//! Model Builder
//!
//! The primary interface for assembling an architecture graph.
//! Collects declarations and validates them, producing an [`ArchitectureGraph`].

use crate::error::{check_multiplier, EntityKind, ValidationError};
use crate::graph::{ArchitectureGraph, GraphConstructor};
use crate::types::{Boundary, DataAsset, Dataflow, Element};
use indexmap::IndexMap;

/// Builder for validated architecture graphs
///
/// Usage:
/// ```rust
/// use threatflow_model::{Boundary, Dataflow, Element, ModelBuilder};
///
/// let mut builder = ModelBuilder::new();
/// builder
///     .add_boundary(Boundary::new("Internet"))
///     .add_element(Element::actor("User").in_boundary("Internet"))
///     .add_element(Element::server("Web"))
///     .add_dataflow(Dataflow::new("browse", "User", "Web", "HTTPS").encrypted(true));
/// let graph = builder.build().unwrap();
/// assert_eq!(graph.element_count(), 2);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ModelBuilder {
    boundaries: Vec<Boundary>,
    elements: Vec<Element>,
    data_assets: Vec<DataAsset>,
    dataflows: Vec<Dataflow>,
}

impl ModelBuilder {
    /// Create an empty builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a boundary
    pub fn add_boundary(&mut self, boundary: Boundary) -> &mut Self {
        self.boundaries.push(boundary);
        self
    }

    /// Declare an actor or server
    pub fn add_element(&mut self, element: Element) -> &mut Self {
        self.elements.push(element);
        self
    }

    /// Declare a data asset
    pub fn add_data_asset(&mut self, asset: DataAsset) -> &mut Self {
        self.data_assets.push(asset);
        self
    }

    /// Declare a dataflow
    pub fn add_dataflow(&mut self, dataflow: Dataflow) -> &mut Self {
        self.dataflows.push(dataflow);
        self
    }

    /// Number of declared elements
    #[inline]
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of declared dataflows
    #[inline]
    #[must_use]
    pub fn dataflow_count(&self) -> usize {
        self.dataflows.len()
    }

    /// Validate all declarations and produce the graph
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found. Checks run in order:
    /// names (blank or padded), duplicates, element boundaries and multipliers, then dataflow
    /// endpoints and assets.
    pub fn build(self) -> Result<ArchitectureGraph, ValidationError> {
        let boundaries = index_by_name(self.boundaries, EntityKind::Boundary, |b| &b.name)?;
        let data_assets = index_by_name(self.data_assets, EntityKind::DataAsset, |a| &a.name)?;
        let elements = index_by_name(self.elements, EntityKind::Element, |e| &e.name)?;
        let dataflows = index_by_name(self.dataflows, EntityKind::Dataflow, |d| &d.name)?;

        // Elements and dataflows share the threat-target namespace
        if let Some(name) = dataflows.keys().find(|name| elements.contains_key(*name)) {
            return Err(ValidationError::duplicate(EntityKind::Dataflow, name.clone()));
        }

        for element in elements.values() {
            if let Some(boundary) = &element.boundary {
                if !boundaries.contains_key(boundary) {
                    return Err(ValidationError::UnknownBoundary {
                        element: element.name.clone(),
                        boundary: boundary.clone(),
                    });
                }
            }
            if let Some(multiplier) = element.severity_multiplier {
                check_multiplier(&element.name, multiplier)?;
            }
        }

        for flow in dataflows.values() {
            for endpoint in flow.endpoints() {
                if !elements.contains_key(endpoint) {
                    return Err(ValidationError::UnknownElement {
                        dataflow: flow.name.clone(),
                        element: endpoint.to_string(),
                    });
                }
            }
            if let Some(asset) = &flow.data {
                if !data_assets.contains_key(asset) {
                    return Err(ValidationError::UnknownDataAsset {
                        dataflow: flow.name.clone(),
                        asset: asset.clone(),
                    });
                }
            }
        }

        tracing::debug!(
            "Validated model: {} boundaries, {} elements, {} data assets, {} dataflows",
            boundaries.len(),
            elements.len(),
            data_assets.len(),
            dataflows.len()
        );

        Ok(GraphConstructor::construct(
            boundaries,
            elements,
            data_assets,
            dataflows,
        ))
    }
}

/// Index entities by name, rejecting blank, padded and duplicate names
fn index_by_name<T>(
    items: Vec<T>,
    kind: EntityKind,
    name_of: impl Fn(&T) -> &String,
) -> Result<IndexMap<String, T>, ValidationError> {
    let mut map = IndexMap::with_capacity(items.len());
    for item in items {
        let name = name_of(&item).clone();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName { kind });
        }
        if name.trim() != name {
            return Err(ValidationError::PaddedName { kind, name });
        }
        if map.contains_key(&name) {
            return Err(ValidationError::duplicate(kind, name));
        }
        map.insert(name, item);
    }
    Ok(map)
}
