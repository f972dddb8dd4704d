// tests/runtime_fake_executor.rs

mod common;
use crate::common::{init_tracing, FakeExecutor};

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use sitepipe::dag::plans::{BUILD_PLAN, DEFAULT_PLAN, WATCH_IMAGES_PLAN};
use sitepipe::dag::{series, task, PlanBook};
use sitepipe::engine::{
    CoreRuntime, RunSummary, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason,
};
use sitepipe::types::TaskKind;

type TestResult = Result<(), Box<dyn Error>>;

fn one_shot() -> RuntimeOptions {
    RuntimeOptions {
        exit_when_idle: true,
        queue_length: 1,
    }
}

async fn run_with(
    plans: PlanBook,
    triggers: &[&str],
    executor_setup: impl FnOnce(FakeExecutor) -> FakeExecutor,
) -> Result<(RunSummary, Vec<TaskKind>), Box<dyn Error>> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = executor_setup(FakeExecutor::new(rt_tx.clone(), executed.clone()));

    for plan in triggers {
        rt_tx
            .send(RuntimeEvent::PlanTriggered {
                plan: plan.to_string(),
                reason: TriggerReason::Manual,
            })
            .await?;
    }

    let core = CoreRuntime::new(plans, one_shot());
    let runtime = Runtime::new(core, rt_rx, executor);

    // Enforce an upper bound on how long this test may run.
    let summary = match timeout(Duration::from_secs(3), runtime.run()).await {
        Ok(result) => result?,
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    };

    let kinds = executed.lock().unwrap().clone();
    Ok((summary, kinds))
}

#[tokio::test]
async fn default_plan_builds_before_starting_services() -> TestResult {
    init_tracing();

    let (summary, kinds) = run_with(PlanBook::standard(), &[DEFAULT_PLAN], |e| e).await?;

    assert_eq!(kinds.len(), 9);
    let first_service = kinds.iter().position(|k| k.is_service()).unwrap();
    assert_eq!(first_service, 7, "all builds dispatched before services: {kinds:?}");
    assert!(kinds[7..].contains(&TaskKind::WatchFiles));
    assert!(kinds[7..].contains(&TaskKind::ServeSite));
    assert_eq!(summary.failed_steps(), 0);
    Ok(())
}

#[tokio::test]
async fn build_plan_runs_every_transform_and_no_cleanup() -> TestResult {
    init_tracing();

    let (_, mut kinds) = run_with(PlanBook::standard(), &[BUILD_PLAN], |e| e).await?;
    kinds.sort();

    assert_eq!(
        kinds,
        vec![
            TaskKind::RenderTemplates,
            TaskKind::CompileStyles,
            TaskKind::CopyVendorStyles,
            TaskKind::CompileScripts,
            TaskKind::CopyVendorScripts,
            TaskKind::CompressImages,
            TaskKind::ConvertWebp,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn failed_step_does_not_block_the_rest_of_a_series() -> TestResult {
    init_tracing();

    let (summary, kinds) = run_with(PlanBook::standard(), &[WATCH_IMAGES_PLAN], |e| {
        e.failing(TaskKind::CompressImages)
    })
    .await?;

    assert_eq!(
        kinds,
        vec![
            TaskKind::CompressImages,
            TaskKind::ConvertWebp,
            TaskKind::ReloadBrowser
        ]
    );
    assert_eq!(summary.failed_steps(), 1);
    Ok(())
}

#[tokio::test]
async fn retrigger_while_running_queues_one_rerun() -> TestResult {
    init_tracing();

    let mut plans = PlanBook::new();
    plans.insert("pair", &series([task(TaskKind::CleanCssJs), task(TaskKind::CleanImages)]));

    // Three triggers land before the first run can finish: one runs, one is
    // queued and the third is coalesced into it.
    let (summary, kinds) = run_with(plans, &["pair", "pair", "pair"], |e| e).await?;

    assert_eq!(summary.runs_of("pair").count(), 2);
    assert_eq!(
        kinds,
        vec![
            TaskKind::CleanCssJs,
            TaskKind::CleanImages,
            TaskKind::CleanCssJs,
            TaskKind::CleanImages
        ]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_plan_is_ignored_and_runtime_exits() -> TestResult {
    init_tracing();

    let (summary, kinds) = run_with(PlanBook::standard(), &["nope"], |e| e).await?;
    assert!(kinds.is_empty());
    assert!(summary.runs.is_empty());
    Ok(())
}
