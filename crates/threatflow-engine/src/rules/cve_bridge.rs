//! CVE-bridge rule
//!
//! Declared CVEs on an element are resolved through the CVE→CAPEC index.
//! Each catalog CAPEC entry reached yields one candidate in the entry's
//! recorded STRIDE category, listing every CVE that led to it. CAPEC ids
//! missing from the catalog are skipped here and reported by the engine.

use super::{RuleContext, Subject, ThreatRule};
use crate::threat::ThreatCandidate;
use std::collections::BTreeMap;
use threatflow_model::TargetRef;

/// One threat per CAPEC entry reached from an element's declared CVEs
#[derive(Debug, Clone, Copy, Default)]
pub struct CveBridgeRule;

impl ThreatRule for CveBridgeRule {
    fn id(&self) -> &'static str {
        "cve-bridge"
    }

    fn summary(&self) -> &'static str {
        "declared CVEs resolved to CAPEC attack patterns"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>, subject: Subject<'_>) -> Vec<ThreatCandidate> {
        let Subject::Element(element) = subject else {
            return Vec::new();
        };
        let declared = ctx.cves.cves_for(&element.name);
        if declared.is_empty() {
            return Vec::new();
        }

        let index = ctx.reference.cve_index();
        let mut by_capec: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for cve in declared {
            for capec in index.capecs_for(cve) {
                let cves = by_capec.entry(capec.as_str()).or_default();
                if !cves.contains(cve) {
                    cves.push(cve.clone());
                }
            }
        }

        by_capec
            .into_iter()
            .filter_map(|(capec, mut cves)| {
                let entry = ctx.reference.capec(capec)?;
                cves.sort();
                let description = format!(
                    "{} on '{}' enables {} ({})",
                    cves.join(", "),
                    element.name,
                    entry.id,
                    entry.name
                );
                Some(ThreatCandidate::from_cve(
                    entry.category,
                    TargetRef::Element(element.name.clone()),
                    &entry.id,
                    cves,
                    description,
                ))
            })
            .collect()
    }
}
