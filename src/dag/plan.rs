// src/dag/plan.rs

//! Task composition with `series` and `parallel`.

use crate::dag::graph::{StepGraph, StepId};
use crate::types::TaskKind;

/// A composition of tasks.
///
/// - `Series`: each member starts only after every step of the previous
///   member has finished.
/// - `Parallel`: members are independent of each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Task(TaskKind),
    Series(Vec<Plan>),
    Parallel(Vec<Plan>),
}

pub fn task(kind: TaskKind) -> Plan {
    Plan::Task(kind)
}

pub fn series(members: impl IntoIterator<Item = Plan>) -> Plan {
    Plan::Series(members.into_iter().collect())
}

pub fn parallel(members: impl IntoIterator<Item = Plan>) -> Plan {
    Plan::Parallel(members.into_iter().collect())
}

impl From<TaskKind> for Plan {
    fn from(kind: TaskKind) -> Self {
        Plan::Task(kind)
    }
}

/// Entry and exit steps of a compiled sub-plan.
struct Fragment {
    entries: Vec<StepId>,
    exits: Vec<StepId>,
}

impl Plan {
    /// Compile into a step graph. Every `Task` occurrence becomes its own step.
    pub fn compile(&self) -> StepGraph {
        let mut graph = StepGraph::new();
        self.lower(&mut graph);
        graph
    }

    fn lower(&self, graph: &mut StepGraph) -> Fragment {
        match self {
            Plan::Task(kind) => {
                let id = graph.add_step(*kind);
                Fragment {
                    entries: vec![id],
                    exits: vec![id],
                }
            }
            Plan::Parallel(members) => {
                let mut entries = Vec::new();
                let mut exits = Vec::new();
                for member in members {
                    let frag = member.lower(graph);
                    entries.extend(frag.entries);
                    exits.extend(frag.exits);
                }
                Fragment { entries, exits }
            }
            Plan::Series(members) => {
                let mut entries: Option<Vec<StepId>> = None;
                let mut prev_exits: Vec<StepId> = Vec::new();
                for member in members {
                    let frag = member.lower(graph);
                    if frag.entries.is_empty() {
                        continue;
                    }
                    for &from in prev_exits.iter() {
                        for &to in frag.entries.iter() {
                            graph.add_dependency(from, to);
                        }
                    }
                    if entries.is_none() {
                        entries = Some(frag.entries);
                    }
                    prev_exits = frag.exits;
                }
                Fragment {
                    entries: entries.unwrap_or_default(),
                    exits: prev_exits,
                }
            }
        }
    }

    /// Every task kind mentioned, in first-seen order.
    pub fn tasks(&self) -> Vec<TaskKind> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks(&self, out: &mut Vec<TaskKind>) {
        match self {
            Plan::Task(kind) => {
                if !out.contains(kind) {
                    out.push(*kind);
                }
            }
            Plan::Series(members) | Plan::Parallel(members) => {
                for member in members {
                    member.collect_tasks(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TaskKind::*;

    #[test]
    fn series_links_every_exit_to_every_entry() {
        let plan = series([
            parallel([task(RenderTemplates), task(CompileStyles)]),
            parallel([task(WatchFiles), task(ServeSite)]),
        ]);
        let graph = plan.compile();
        assert_eq!(graph.len(), 4);

        let watch = graph.find(WatchFiles).unwrap();
        let mut deps: Vec<_> = graph.deps_of(watch).iter().map(|d| graph.kind(*d)).collect();
        deps.sort();
        assert_eq!(deps, vec![RenderTemplates, CompileStyles]);

        let render = graph.find(RenderTemplates).unwrap();
        assert!(graph.deps_of(render).is_empty());
    }

    #[test]
    fn empty_members_are_skipped() {
        let plan = series([task(CompressImages), parallel([]), task(ConvertWebp)]);
        let graph = plan.compile();
        let webp = graph.find(ConvertWebp).unwrap();
        let deps: Vec<_> = graph.deps_of(webp).iter().map(|d| graph.kind(*d)).collect();
        assert_eq!(deps, vec![CompressImages]);
    }
}
