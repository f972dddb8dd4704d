// tests/since_last_run.rs

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use sitepipe::config::{ConfigFile, RawConfigFile};
use sitepipe::fs::mock::MockFileSystem;
use sitepipe::fs::FileSystem;
use sitepipe::tasks::{run_task, TaskContext};
use sitepipe::types::TaskKind;

fn context(fs: &MockFileSystem) -> TaskContext {
    let cfg = ConfigFile::try_from(RawConfigFile::default()).unwrap();
    TaskContext::new("/site", Arc::new(cfg), Arc::new(fs.clone()))
}

#[test]
fn compress_images_only_processes_changed_files() {
    let fs = MockFileSystem::new();
    let before = SystemTime::now() - Duration::from_secs(60);
    fs.add_file_at("/site/src/images/a.gif", "GIF89a-a", before);
    fs.add_file_at("/site/src/images/b.gif", "GIF89a-b", before);
    let ctx = context(&fs);

    let first = run_task(TaskKind::CompressImages, &ctx).unwrap();
    assert_eq!(first.written, 2);

    let second = run_task(TaskKind::CompressImages, &ctx).unwrap();
    assert_eq!(second.written, 0);
    assert_eq!(second.skipped, 2);

    fs.remove_file(Path::new("/site/public/assets/images/a.gif")).unwrap();
    fs.touch("/site/src/images/b.gif", SystemTime::now() + Duration::from_secs(60))
        .unwrap();
    let third = run_task(TaskKind::CompressImages, &ctx).unwrap();
    assert_eq!(third.written, 1);
    assert!(!fs.exists(Path::new("/site/public/assets/images/a.gif")));
}

#[test]
fn failed_runs_do_not_advance_the_record() {
    let fs = MockFileSystem::new();
    let before = SystemTime::now() - Duration::from_secs(60);
    fs.add_file_at("/site/src/images/photo.jpg", "not a jpeg", before);
    let ctx = context(&fs);

    assert!(run_task(TaskKind::ConvertWebp, &ctx).is_err());
    assert_eq!(ctx.last_run.get(TaskKind::ConvertWebp), None);
    assert!(run_task(TaskKind::ConvertWebp, &ctx).is_err());
}

#[test]
fn gating_is_per_task() {
    let fs = MockFileSystem::new();
    let before = SystemTime::now() - Duration::from_secs(60);
    fs.add_file_at("/site/src/images/a.gif", "GIF89a", before);
    let ctx = context(&fs);

    run_task(TaskKind::CompressImages, &ctx).unwrap();
    assert!(ctx.last_run.get(TaskKind::CompressImages).is_some());
    assert_eq!(ctx.last_run.get(TaskKind::ConvertWebp), None);
}
