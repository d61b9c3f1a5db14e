//! Mapping resolver
//!
//! Techniques for a threat are the union of:
//!
//! 1. the STRIDE table bindings for its category and target kind
//! 2. user overrides for the category (catalog entries win for known ids)
//! 3. for CVE-bridged threats, the techniques of the resolved CAPEC entry
//!
//! The union is keyed by technique id, so the output is sorted and free of
//! duplicates. NIST and CIS controls for every resolved technique ride along
//! as advisory metadata. A threat that resolves to nothing is kept as is.

use crate::threat::{ScoredThreat, Threat};
use std::collections::{BTreeMap, BTreeSet};
use threatflow_refdata::{ControlRef, MappingOverrides, ReferenceData, StrideCategory, Technique};

/// Attaches ATT&CK techniques and controls to scored threats
#[derive(Debug, Clone, Copy)]
pub struct MappingResolver<'a> {
    reference: &'a ReferenceData,
    overrides: Option<&'a MappingOverrides>,
}

impl<'a> MappingResolver<'a> {
    /// Create resolver over the reference tables
    #[inline]
    #[must_use]
    pub fn new(reference: &'a ReferenceData) -> Self {
        Self {
            reference,
            overrides: None,
        }
    }

    /// With user technique additions
    #[inline]
    #[must_use]
    pub fn with_overrides(mut self, overrides: &'a MappingOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Resolve a scored threat
    #[must_use]
    pub fn resolve(&self, scored: ScoredThreat) -> Threat {
        let ScoredThreat {
            candidate,
            target_name,
            score,
            level,
            fingerprint,
        } = scored;
        let techniques = self.techniques(
            candidate.category,
            candidate.target.is_dataflow(),
            candidate.capec.as_deref(),
            &[],
        );
        let controls = self.controls(&techniques);
        Threat {
            fingerprint,
            category: candidate.category,
            target: candidate.target,
            target_name,
            description: candidate.description,
            score,
            level,
            techniques,
            controls,
            provenance: candidate.provenance,
            rule_id: candidate.rule_id,
            capec: candidate.capec,
            cves: candidate.cves,
        }
    }

    /// Resolve an already resolved threat again
    ///
    /// Existing techniques are kept and unioned with a fresh lookup, so
    /// repeated calls return the same list.
    #[must_use]
    pub fn refresh(&self, threat: &Threat) -> Threat {
        let techniques = self.techniques(
            threat.category,
            threat.target.is_dataflow(),
            threat.capec.as_deref(),
            &threat.techniques,
        );
        let controls = self.controls(&techniques);
        Threat {
            techniques,
            controls,
            ..threat.clone()
        }
    }

    fn techniques(
        &self,
        category: StrideCategory,
        target_is_dataflow: bool,
        capec: Option<&str>,
        existing: &[Technique],
    ) -> Vec<Technique> {
        let mut by_id: BTreeMap<String, Technique> = BTreeMap::new();
        let mut add = |technique: Technique| {
            by_id.entry(technique.id.clone()).or_insert(technique);
        };

        for technique in self.reference.techniques_for(category, target_is_dataflow) {
            add(technique.clone());
        }

        let additions = self
            .overrides
            .map_or(&[][..], |overrides| overrides.for_category(category));
        for addition in additions
            .iter()
            .filter(|a| a.scope.covers(target_is_dataflow))
        {
            let technique = addition.technique();
            match self.reference.technique(&technique.id) {
                Some(known) => add(known.clone()),
                None => add(technique),
            }
        }

        if let Some(entry) = capec.and_then(|id| self.reference.capec(id)) {
            for id in &entry.techniques {
                if let Some(technique) = self.reference.technique(id) {
                    add(technique.clone());
                }
            }
        }

        for technique in existing {
            add(technique.clone());
        }

        by_id.into_values().collect()
    }

    fn controls(&self, techniques: &[Technique]) -> Vec<ControlRef> {
        techniques
            .iter()
            .flat_map(|t| self.reference.controls_for(&t.id))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
