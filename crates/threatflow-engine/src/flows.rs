//! Attack-path synthesizer
//!
//! Per objective category, every resolved threat with a kill-chain stage
//! becomes a node. Nodes are arranged in (stage, target name, fingerprint)
//! order and an edge X → Y exists when:
//!
//! - stage(X) < stage(Y)
//! - X and Y target different things
//! - some endpoint element of X is the same as, linked to by a dataflow, or in
//!   the same boundary as some endpoint element of Y
//!
//! Arena order is a topological order, so one DP pass yields the best path
//! ending at every node:
//!
//! ```text
//! best[y] = score(y) + max(best[x] for x → y, default 0)
//! ```
//!
//! Ties prefer the longer path, then the smaller sequence of target names,
//! then the smaller sequence of fingerprints.

use crate::config::SynthesisConfig;
use crate::threat::Threat;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use threatflow_model::{ArchitectureGraph, TargetRef};
use threatflow_refdata::{ObjectiveCategory, StrideCategory, Tactic, Technique};

/// One stage of an attack flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    /// Kill-chain stage
    pub stage: Tactic,
    /// Fingerprint of the threat taken at this stage
    pub fingerprint: String,
    /// Threat target
    pub target: TargetRef,
    /// Display name of the target
    pub target_name: String,
    /// Threat category
    pub category: StrideCategory,
    /// Lowest-id technique of the threat serving the stage
    pub technique: Technique,
    /// Threat score
    pub score: f64,
}

/// Highest-value attack path for one objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackFlow {
    /// Objective category
    pub objective: ObjectiveCategory,
    /// Steps in strictly increasing stage order
    pub steps: Vec<FlowStep>,
    /// Sum of step scores
    pub total_score: f64,
}

impl AttackFlow {
    /// Stages in path order
    #[must_use]
    pub fn stages(&self) -> Vec<Tactic> {
        self.steps.iter().map(|s| s.stage).collect()
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the flow has no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

struct FlowNode<'t> {
    threat: &'t Threat,
    stage: Tactic,
    technique: &'t Technique,
    endpoints: Vec<&'t str>,
}

#[derive(Clone)]
struct Best {
    total: f64,
    path: Vec<usize>,
}

/// Builds attack flows from resolved threats
#[derive(Debug, Clone, Copy)]
pub struct AttackPathSynthesizer<'a> {
    graph: &'a ArchitectureGraph,
    config: &'a SynthesisConfig,
}

impl<'a> AttackPathSynthesizer<'a> {
    /// Create synthesizer over a graph
    #[inline]
    #[must_use]
    pub fn new(graph: &'a ArchitectureGraph, config: &'a SynthesisConfig) -> Self {
        Self { graph, config }
    }

    /// Best flow per configured objective
    ///
    /// Objectives without a single eligible threat are absent.
    #[must_use]
    pub fn synthesize(&self, threats: &[Threat]) -> BTreeMap<ObjectiveCategory, AttackFlow> {
        self.config
            .objectives
            .par_iter()
            .filter_map(|objective| {
                self.flow_for(*objective, threats)
                    .map(|flow| (*objective, flow))
            })
            .collect()
    }

    /// Best flow for one objective
    #[must_use]
    pub fn flow_for(&self, objective: ObjectiveCategory, threats: &[Threat]) -> Option<AttackFlow> {
        let category = objective.stride();
        let mut nodes: Vec<FlowNode<'_>> = threats
            .iter()
            .filter(|t| t.category == category)
            .filter_map(|threat| {
                let stage = threat.stage()?;
                let technique = threat.technique_for(stage)?;
                Some(FlowNode {
                    threat,
                    stage,
                    technique,
                    endpoints: self.graph.endpoints_of(&threat.target),
                })
            })
            .collect();
        if nodes.is_empty() {
            return None;
        }
        nodes.sort_by(|a, b| {
            a.stage
                .cmp(&b.stage)
                .then_with(|| a.threat.target_name.cmp(&b.threat.target_name))
                .then_with(|| a.threat.fingerprint.cmp(&b.threat.fingerprint))
        });

        let mut dag: DiGraph<usize, ()> = DiGraph::with_capacity(nodes.len(), nodes.len());
        let indices: Vec<NodeIndex> = (0..nodes.len()).map(|i| dag.add_node(i)).collect();
        for (j, later) in nodes.iter().enumerate() {
            for (i, earlier) in nodes[..j].iter().enumerate() {
                if self.connects(earlier, later) {
                    dag.add_edge(indices[i], indices[j], ());
                }
            }
        }

        let mut best: Vec<Best> = Vec::with_capacity(nodes.len());
        for (j, node) in nodes.iter().enumerate() {
            let prefix = dag
                .neighbors_directed(indices[j], Direction::Incoming)
                .map(|p| &best[dag[p]])
                .max_by(|a, b| compare(a, b, &nodes));
            let candidate = match prefix {
                Some(prev) => {
                    let mut path = prev.path.clone();
                    path.push(j);
                    Best {
                        total: prev.total + node.threat.score,
                        path,
                    }
                }
                None => Best {
                    total: node.threat.score,
                    path: vec![j],
                },
            };
            best.push(candidate);
        }

        let winner = best.iter().max_by(|a, b| compare(a, b, &nodes))?;
        let steps: Vec<FlowStep> = winner
            .path
            .iter()
            .map(|&i| {
                let node = &nodes[i];
                FlowStep {
                    stage: node.stage,
                    fingerprint: node.threat.fingerprint.clone(),
                    target: node.threat.target.clone(),
                    target_name: node.threat.target_name.clone(),
                    category: node.threat.category,
                    technique: node.technique.clone(),
                    score: node.threat.score,
                }
            })
            .collect();

        tracing::debug!(
            "Synthesized {} flow: {} candidates, {} steps, total {:.2}",
            objective,
            nodes.len(),
            steps.len(),
            winner.total
        );
        Some(AttackFlow {
            objective,
            steps,
            total_score: winner.total,
        })
    }

    fn connects(&self, from: &FlowNode<'_>, to: &FlowNode<'_>) -> bool {
        if from.stage >= to.stage || from.threat.target == to.threat.target {
            return false;
        }
        from.endpoints.iter().any(|a| {
            to.endpoints.iter().any(|b| {
                a == b || self.graph.is_linked(a, b) || self.graph.share_boundary(a, b)
            })
        })
    }
}

/// Order paths so the preferred one is greatest
fn compare(a: &Best, b: &Best, nodes: &[FlowNode<'_>]) -> Ordering {
    let names = |best: &Best| -> Vec<&str> {
        best.path
            .iter()
            .map(|&i| nodes[i].threat.target_name.as_str())
            .collect()
    };
    let prints = |best: &Best| -> Vec<&str> {
        best.path
            .iter()
            .map(|&i| nodes[i].threat.fingerprint.as_str())
            .collect()
    };
    a.total
        .total_cmp(&b.total)
        .then_with(|| a.path.len().cmp(&b.path.len()))
        .then_with(|| names(b).cmp(&names(a)))
        .then_with(|| prints(b).cmp(&prints(a)))
}
