// tests/scheduler_property.rs

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use proptest::prelude::*;

use sitepipe::dag::{Plan, ScheduledStep, Scheduler, StepState};
use sitepipe::engine::StepOutcome;
use sitepipe::types::TaskKind;

fn leaf() -> impl Strategy<Value = Plan> {
    prop_oneof![
        Just(TaskKind::RenderTemplates),
        Just(TaskKind::CompileStyles),
        Just(TaskKind::CompileScripts),
        Just(TaskKind::CompressImages),
        Just(TaskKind::ConvertWebp),
        Just(TaskKind::CleanAll),
    ]
    .prop_map(Plan::Task)
}

fn plan_strategy() -> impl Strategy<Value = Plan> {
    leaf().prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Plan::Series),
            prop::collection::vec(inner, 1..4).prop_map(Plan::Parallel),
        ]
    })
}

proptest! {
    #[test]
    fn every_step_runs_once_after_its_dependencies(
        plan in plan_strategy(),
        picks in prop::collection::vec(any::<usize>(), 64),
        failures in prop::collection::vec(any::<bool>(), 64),
    ) {
        let graph = Arc::new(plan.compile());
        let mut scheduler = Scheduler::new("prop", graph.clone(), 1);

        let mut ready: VecDeque<ScheduledStep> = scheduler.start().newly_scheduled.into();
        let mut dispatched = HashSet::new();
        let mut completions = 0usize;

        while !ready.is_empty() {
            let idx = picks[completions % picks.len()] % ready.len();
            let Some(next) = ready.remove(idx) else { break };

            for dep in graph.deps_of(next.step) {
                let state = scheduler.state_of(*dep).unwrap();
                prop_assert!(state.is_terminal(), "dependency {dep} of {} still {state:?}", next.step);
            }
            prop_assert!(dispatched.insert(next.step), "step {} dispatched twice", next.step);
            prop_assert_eq!(scheduler.state_of(next.step), Some(StepState::Running));

            let outcome = if failures[completions % failures.len()] {
                StepOutcome::Failed("boom".into())
            } else {
                StepOutcome::Success
            };
            completions += 1;
            ready.extend(scheduler.handle_completion(next.step, outcome).newly_scheduled);
        }

        prop_assert!(scheduler.is_finished());
        prop_assert_eq!(dispatched.len(), graph.len());
    }

    #[test]
    fn failures_are_counted_but_never_block(plan in plan_strategy()) {
        let graph = Arc::new(plan.compile());
        let mut scheduler = Scheduler::new("prop", graph.clone(), 7);

        let mut ready: VecDeque<ScheduledStep> = scheduler.start().newly_scheduled.into();
        while let Some(next) = ready.pop_front() {
            prop_assert_eq!(next.run_id, 7);
            ready.extend(
                scheduler
                    .handle_completion(next.step, StepOutcome::Failed("always".into()))
                    .newly_scheduled,
            );
        }

        prop_assert!(scheduler.is_finished());
        prop_assert_eq!(scheduler.failed_count(), graph.len());
    }
}
