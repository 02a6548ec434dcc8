mod common;

use std::time::Duration;

use clap::Parser;
use common::{SourceRepo, branches_and_tags, run_git, write_config};
use gitbackup_cli::{Args, collect_jobs, run, run_periodically};
use gitbackup_mirror::{BackupScheduler, SchedulerConfig};
use tempfile::TempDir;

fn args(config: &std::path::Path) -> Args {
    Args::try_parse_from(["git-backup", "-c", config.to_str().unwrap(), "--json"]).unwrap()
}

#[tokio::test]
async fn test_collect_jobs_per_source_directory() {
    let work = TempDir::new().unwrap();
    let base = work.path().join("backups");
    let (_, settings) = write_config(
        work.path(),
        &format!(
            r#"
clone_base_dir: {base}
backup:
  lock_timeout: 7
sources:
  - name: mine
    plain_git:
      repos:
        tool: /srv/git/tool.git
        notes: /srv/git/notes.git
"#,
            base = base.display()
        ),
    );

    let (jobs, failures) = collect_jobs(&settings).await.unwrap();

    assert!(failures.is_empty());
    let paths: Vec<_> = jobs.iter().map(|job| job.path().to_path_buf()).collect();
    assert_eq!(
        paths,
        vec![base.join("mine/tool.git"), base.join("mine/notes.git")]
    );
    assert_eq!(jobs[0].config().lock_timeout().as_secs(), 7);
}

#[tokio::test]
async fn test_run_mirrors_branches_and_tags() {
    let source = SourceRepo::new();
    let work = TempDir::new().unwrap();
    let base = work.path().join("backups");
    let (config, settings) = write_config(
        work.path(),
        &format!(
            "clone_base_dir: {}\nsources:\n  - name: mine\n    plain_git:\n      repos:\n        tool: {}\n",
            base.display(),
            source.url()
        ),
    );

    assert!(run(&args(&config), &settings).await.unwrap());

    let mirror = base.join("mine/tool.git");
    assert_eq!(
        branches_and_tags(&mirror),
        branches_and_tags(std::path::Path::new(&source.url()))
    );
    assert_eq!(
        run_git(&mirror, &["for-each-ref", "refs/notes"]),
        "",
        "other namespaces are not mirrored"
    );

    // A second run against the unchanged source succeeds and changes nothing.
    let before = branches_and_tags(&mirror);
    assert!(run(&args(&config), &settings).await.unwrap());
    assert_eq!(branches_and_tags(&mirror), before);
}

#[tokio::test]
async fn test_failed_backup_fails_run() {
    let work = TempDir::new().unwrap();
    let (config, settings) = write_config(
        work.path(),
        &format!(
            "clone_base_dir: {}\nsources:\n  - name: mine\n    plain_git:\n      repos:\n        gone: {}\n",
            work.path().join("backups").display(),
            work.path().join("does-not-exist").display()
        ),
    );

    assert!(!run(&args(&config), &settings).await.unwrap());
}

#[tokio::test]
async fn test_unreachable_source_does_not_stop_others() {
    let source = SourceRepo::new();
    let work = TempDir::new().unwrap();
    let base = work.path().join("backups");
    let (config, settings) = write_config(
        work.path(),
        &format!(
            r#"
clone_base_dir: {base}
sources:
  - name: hub
    github:
      token: ghp_secret
      api_url: http://127.0.0.1:9
  - name: mine
    plain_git:
      repos:
        tool: {url}
"#,
            base = base.display(),
            url = source.url()
        ),
    );

    let (jobs, failures) = collect_jobs(&settings).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].name, "hub");

    assert!(!run(&args(&config), &settings).await.unwrap());
    assert!(base.join("mine/tool.git").exists());
}

#[tokio::test]
async fn test_invalid_source_aborts() {
    let work = TempDir::new().unwrap();
    let (config, settings) = write_config(
        work.path(),
        &format!(
            "clone_base_dir: {}\nsources:\n  - name: mine\n    bitbucket: {{token: x}}\n",
            work.path().display()
        ),
    );

    let err = run(&args(&config), &settings).await.unwrap_err();
    assert!(format!("{:#}", err).contains("invalid source configuration"));
}

fn hourly() -> (Args, SchedulerConfig) {
    let args = Args::try_parse_from(["git-backup", "--interval", "3600", "--json"]).unwrap();
    let config = SchedulerConfig {
        interval: Duration::from_secs(3600),
        ..SchedulerConfig::default()
    };
    (args, config)
}

#[tokio::test]
async fn test_periodic_run_fails_with_last_run() {
    let work = TempDir::new().unwrap();
    let (_, settings) = write_config(
        work.path(),
        &format!(
            "clone_base_dir: {}\nsources:\n  - name: mine\n    plain_git:\n      repos:\n        gone: {}\n",
            work.path().join("backups").display(),
            work.path().join("does-not-exist").display()
        ),
    );
    let (jobs, failures) = collect_jobs(&settings).await.unwrap();
    assert!(failures.is_empty());

    let (args, config) = hourly();
    let succeeded = run_periodically(
        &args,
        BackupScheduler::new(jobs, config),
        failures,
        tokio::time::sleep(Duration::from_millis(500)),
    )
    .await
    .unwrap();

    assert!(!succeeded);
}

#[tokio::test]
async fn test_periodic_run_succeeds() {
    let (args, config) = hourly();
    let succeeded = run_periodically(
        &args,
        BackupScheduler::new(Vec::new(), config),
        Vec::new(),
        tokio::time::sleep(Duration::from_millis(500)),
    )
    .await
    .unwrap();

    assert!(succeeded);
}
