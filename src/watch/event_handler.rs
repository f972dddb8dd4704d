// src/watch/event_handler.rs

//! Turning batches of changed paths into plan triggers.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::watch::path_utils::relative_str;
use crate::watch::registrations::WatchRegistration;

/// Plans to trigger for one debounced batch, each at most once, in
/// registration order.
pub fn plans_for_paths(
    root: &Path,
    paths: &[PathBuf],
    registrations: &[WatchRegistration],
) -> Vec<&'static str> {
    let rel_paths: Vec<String> = paths
        .iter()
        .filter_map(|path| {
            let rel = relative_str(root, path);
            if rel.is_none() {
                debug!(?path, ?root, "path outside project root ignored");
            }
            rel
        })
        .collect();

    registrations
        .iter()
        .filter(|reg| rel_paths.iter().any(|rel| reg.matches(rel)))
        .map(|reg| {
            debug!(registration = reg.name(), plan = reg.plan(), "watch match");
            reg.plan()
        })
        .collect()
}

/// Send one trigger per matching plan. Returns `false` once the runtime is
/// gone.
pub async fn forward_batch(
    root: &Path,
    paths: &[PathBuf],
    registrations: &[WatchRegistration],
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) -> bool {
    for plan in plans_for_paths(root, paths, registrations) {
        let event = RuntimeEvent::PlanTriggered {
            plan: plan.to_string(),
            reason: TriggerReason::FileWatch,
        };
        if let Err(err) = runtime_tx.send(event).await {
            warn!("failed to send RuntimeEvent::PlanTriggered: {err}");
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::plans::{WATCH_IMAGES_PLAN, WATCH_SCRIPTS_PLAN, WATCH_STYLES_PLAN};

    fn regs() -> Vec<WatchRegistration> {
        vec![
            WatchRegistration::new("styles", WATCH_STYLES_PLAN, &["src/scss/**/*.scss"]).unwrap(),
            WatchRegistration::new("scripts", WATCH_SCRIPTS_PLAN, &["src/js/**/*.js"]).unwrap(),
            WatchRegistration::new("images", WATCH_IMAGES_PLAN, &["src/images/**/*.png"]).unwrap(),
        ]
    }

    #[test]
    fn a_batch_triggers_each_plan_once() {
        let root = Path::new("/proj");
        let paths = vec![
            PathBuf::from("/proj/src/js/a.js"),
            PathBuf::from("/proj/src/scss/main.scss"),
            PathBuf::from("/proj/src/js/b.js"),
        ];
        assert_eq!(
            plans_for_paths(root, &paths, &regs()),
            vec![WATCH_STYLES_PLAN, WATCH_SCRIPTS_PLAN]
        );
    }

    #[test]
    fn unrelated_and_outside_paths_trigger_nothing() {
        let root = Path::new("/proj");
        let paths = vec![
            PathBuf::from("/proj/public/index.html"),
            PathBuf::from("/elsewhere/src/js/a.js"),
        ];
        assert!(plans_for_paths(root, &paths, &regs()).is_empty());
    }

    #[tokio::test]
    async fn forwarded_triggers_are_file_watch() {
        let (tx, mut rx) = mpsc::channel(8);
        let root = Path::new("/proj");
        let paths = vec![PathBuf::from("/proj/src/images/logo.png")];
        assert!(forward_batch(root, &paths, &regs(), &tx).await);

        match rx.recv().await {
            Some(RuntimeEvent::PlanTriggered { plan, reason }) => {
                assert_eq!(plan, WATCH_IMAGES_PLAN);
                assert_eq!(reason, TriggerReason::FileWatch);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
