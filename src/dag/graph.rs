// src/dag/graph.rs

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::types::TaskKind;

/// Index of a step inside one compiled plan.
pub type StepId = usize;

/// Compiled plan: one node per step, edge `a -> b` meaning `b` waits for `a`.
///
/// Adjacency lists are cached next to the petgraph graph so the scheduler
/// can borrow them as slices.
#[derive(Debug, Clone, Default)]
pub struct StepGraph {
    graph: DiGraph<TaskKind, ()>,
    deps: Vec<Vec<StepId>>,
    dependents: Vec<Vec<StepId>>,
}

impl StepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_step(&mut self, kind: TaskKind) -> StepId {
        let idx = self.graph.add_node(kind);
        self.deps.push(Vec::new());
        self.dependents.push(Vec::new());
        idx.index()
    }

    pub(crate) fn add_dependency(&mut self, before: StepId, after: StepId) {
        if self.deps[after].contains(&before) {
            return;
        }
        self.graph
            .add_edge(NodeIndex::new(before), NodeIndex::new(after), ());
        self.deps[after].push(before);
        self.dependents[before].push(after);
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn steps(&self) -> impl Iterator<Item = StepId> {
        0..self.len()
    }

    pub fn kind(&self, step: StepId) -> TaskKind {
        self.graph[NodeIndex::new(step)]
    }

    /// First step running the given kind, if any.
    pub fn find(&self, kind: TaskKind) -> Option<StepId> {
        self.steps().find(|s| self.kind(*s) == kind)
    }

    /// Steps that must finish before `step` may start.
    pub fn deps_of(&self, step: StepId) -> &[StepId] {
        self.deps.get(step).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Steps waiting on `step`.
    pub fn dependents_of(&self, step: StepId) -> &[StepId] {
        self.dependents.get(step).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Steps with no dependencies.
    pub fn roots(&self) -> Vec<StepId> {
        self.steps()
            .filter(|s| {
                self.graph
                    .neighbors_directed(NodeIndex::new(*s), Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect()
    }

    /// Steps in a valid execution order, used for dry-run output.
    pub fn topo_order(&self) -> Vec<StepId> {
        match toposort(&self.graph, None) {
            Ok(order) => order.into_iter().map(NodeIndex::index).collect(),
            // Plans are built from series/parallel only and cannot form cycles.
            Err(_) => self.steps().collect(),
        }
    }

    /// Group steps into stages: every step lands one stage after its latest
    /// dependency.
    pub fn stages(&self) -> Vec<Vec<StepId>> {
        let mut depth = vec![0usize; self.len()];
        for step in self.topo_order() {
            depth[step] = self
                .deps_of(step)
                .iter()
                .map(|d| depth[*d] + 1)
                .max()
                .unwrap_or(0);
        }

        let mut stages: Vec<Vec<StepId>> = Vec::new();
        for step in self.steps() {
            let d = depth[step];
            if stages.len() <= d {
                stages.resize_with(d + 1, Vec::new);
            }
            stages[d].push(step);
        }
        stages
    }
}
