//! Validated architecture graph
//!
//! [`ArchitectureGraph`] can ONLY be obtained through [`ModelBuilder::build`]
//! (or [`ModelDocument::into_graph`], which goes through the builder), so every
//! graph reaching the engine has passed referential validation:
//! 1. Every dataflow endpoint is a declared element
//! 2. Every carried data asset is declared
//! 3. Every element boundary is declared
//!
//! The graph is read-only after construction.
//!
//! [`ModelBuilder::build`]: crate::ModelBuilder::build
//! [`ModelDocument::into_graph`]: crate::ModelDocument::into_graph

use crate::types::{Boundary, DataAsset, Dataflow, Element, TargetRef};
use indexmap::IndexMap;
use std::collections::BTreeSet;

/// Typed, validated representation of the modeled system
///
/// Iteration order of every collection is declaration order.
#[derive(Debug, Clone)]
pub struct ArchitectureGraph {
    boundaries: IndexMap<String, Boundary>,
    elements: IndexMap<String, Element>,
    data_assets: IndexMap<String, DataAsset>,
    dataflows: IndexMap<String, Dataflow>,
    /// Unordered element pairs joined by at least one dataflow
    links: BTreeSet<(String, String)>,
}

/// Sealed constructor for ArchitectureGraph
pub(crate) struct GraphConstructor;

impl GraphConstructor {
    /// Assemble a graph (internal use only)
    ///
    /// Must only be called from `ModelBuilder::build()` after all
    /// validation checks have passed.
    pub(crate) fn construct(
        boundaries: IndexMap<String, Boundary>,
        elements: IndexMap<String, Element>,
        data_assets: IndexMap<String, DataAsset>,
        dataflows: IndexMap<String, Dataflow>,
    ) -> ArchitectureGraph {
        let links = dataflows
            .values()
            .filter(|flow| flow.source != flow.sink)
            .map(|flow| ordered_pair(&flow.source, &flow.sink))
            .collect();

        ArchitectureGraph {
            boundaries,
            elements,
            data_assets,
            dataflows,
            links,
        }
    }
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl ArchitectureGraph {
    /// All elements in declaration order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// All dataflows in declaration order
    pub fn dataflows(&self) -> impl Iterator<Item = &Dataflow> {
        self.dataflows.values()
    }

    /// All boundaries in declaration order
    pub fn boundaries(&self) -> impl Iterator<Item = &Boundary> {
        self.boundaries.values()
    }

    /// All data assets in declaration order
    pub fn data_assets(&self) -> impl Iterator<Item = &DataAsset> {
        self.data_assets.values()
    }

    /// Lookup element by name
    #[inline]
    #[must_use]
    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    /// Lookup dataflow by name
    #[inline]
    #[must_use]
    pub fn dataflow(&self, name: &str) -> Option<&Dataflow> {
        self.dataflows.get(name)
    }

    /// Lookup boundary by name
    #[inline]
    #[must_use]
    pub fn boundary(&self, name: &str) -> Option<&Boundary> {
        self.boundaries.get(name)
    }

    /// Boundary containing the element, if any
    #[must_use]
    pub fn boundary_of(&self, element: &Element) -> Option<&Boundary> {
        element
            .boundary
            .as_deref()
            .and_then(|name| self.boundaries.get(name))
    }

    /// Data asset carried by the dataflow, if any
    #[must_use]
    pub fn data_asset_of(&self, dataflow: &Dataflow) -> Option<&DataAsset> {
        dataflow
            .data
            .as_deref()
            .and_then(|name| self.data_assets.get(name))
    }

    /// Whether the element sits in a trusted boundary
    ///
    /// Elements outside every boundary are in the external zone, which is
    /// never trusted.
    #[must_use]
    pub fn is_trusted(&self, element: &Element) -> bool {
        self.boundary_of(element).is_some_and(|b| b.is_trusted)
    }

    /// Whether a dataflow joins the two elements, in either direction
    #[must_use]
    pub fn is_linked(&self, a: &str, b: &str) -> bool {
        self.links.contains(&ordered_pair(a, b))
    }

    /// Whether both elements are declared inside the same boundary
    #[must_use]
    pub fn share_boundary(&self, a: &str, b: &str) -> bool {
        match (self.element(a), self.element(b)) {
            (Some(ea), Some(eb)) => match (&ea.boundary, &eb.boundary) {
                (Some(ba), Some(bb)) => ba == bb,
                _ => false,
            },
            _ => false,
        }
    }

    /// Check that a target names a declared element or dataflow
    #[must_use]
    pub fn contains_target(&self, target: &TargetRef) -> bool {
        match target {
            TargetRef::Element(name) => self.elements.contains_key(name),
            TargetRef::Dataflow(name) => self.dataflows.contains_key(name),
        }
    }

    /// Resolve a bare name to a target, elements first
    #[must_use]
    pub fn resolve_target(&self, name: &str) -> Option<TargetRef> {
        let name = name.trim();
        if self.elements.contains_key(name) {
            Some(TargetRef::Element(name.to_string()))
        } else if self.dataflows.contains_key(name) {
            Some(TargetRef::Dataflow(name.to_string()))
        } else {
            None
        }
    }

    /// Elements a target touches: itself, or both ends of a dataflow
    #[must_use]
    pub fn endpoints_of(&self, target: &TargetRef) -> Vec<&str> {
        match target {
            TargetRef::Element(name) => self
                .elements
                .get_key_value(name)
                .map(|(k, _)| vec![k.as_str()])
                .unwrap_or_default(),
            TargetRef::Dataflow(name) => self
                .dataflows
                .get(name)
                .map(|flow| flow.endpoints().to_vec())
                .unwrap_or_default(),
        }
    }

    /// Human-readable target name
    ///
    /// Dataflows render as `source → sink`; unknown targets fall back to
    /// their declared name.
    #[must_use]
    pub fn target_name(&self, target: &TargetRef) -> String {
        match target {
            TargetRef::Element(name) => name.clone(),
            TargetRef::Dataflow(name) => self
                .dataflows
                .get(name)
                .map_or_else(|| name.clone(), Dataflow::label),
        }
    }

    /// Number of elements
    #[inline]
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Number of dataflows
    #[inline]
    #[must_use]
    pub fn dataflow_count(&self) -> usize {
        self.dataflows.len()
    }
}
