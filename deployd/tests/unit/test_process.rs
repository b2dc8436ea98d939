//! Deployment against real `tar` and `sh` processes

#![cfg(unix)]

#[path = "../common/mod.rs"]
mod common;

use std::process::Command;
use std::sync::Arc;

use common::{count_lines, manifest, Fixture};
use deployd::deploy::runner::ProcessRunner;

fn write_script(fx: &Fixture, name: &str, body: &str) {
    let dir = fx.dir.path().join("deployment_scripts");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), body).unwrap();
}

#[tokio::test]
async fn test_script_output_lands_in_session_log() {
    let mut fx = Fixture::with_runner(Some("secret"), Arc::new(ProcessRunner));
    write_script(&fx, "d.sh", "echo deployed-from-script\necho oops >&2\n");

    let submission = fx
        .engine
        .submit(manifest("prod", "secret", &[("web", "missing.tar", "d.sh", false)]))
        .unwrap();
    fx.execute_next().await;

    let log = fx.read_log("prod", submission.session.id).await;
    let step2 = log.find("Step 2: Start deployment script").unwrap();
    let output = log.find("deployed-from-script").unwrap();
    let completed = log.find("Script completed").unwrap();
    assert!(step2 < output && output < completed);
    assert!(log.contains("oops"));
}

#[tokio::test]
async fn test_missing_archive_still_runs_script() {
    let mut fx = Fixture::with_runner(Some("secret"), Arc::new(ProcessRunner));
    write_script(&fx, "d.sh", "echo still-ran\n");

    let submission = fx
        .engine
        .submit(manifest("prod", "secret", &[("web", "missing.tar", "d.sh", false)]))
        .unwrap();
    fx.execute_next().await;

    let log = fx.read_log("prod", submission.session.id).await;
    assert_eq!(count_lines(&log, "tar decompress err"), 1);
    assert!(log.contains("still-ran"));
    assert!(log.contains("End of deploy task web"));
}

#[tokio::test]
async fn test_archive_is_extracted_next_to_itself() {
    let mut fx = Fixture::with_runner(Some("secret"), Arc::new(ProcessRunner));

    let packages = fx.dir.path().join("deployment_packages");
    let staging = fx.dir.path().join("staging");
    std::fs::create_dir_all(&packages).unwrap();
    std::fs::create_dir_all(&staging).unwrap();
    std::fs::write(staging.join("index.html"), "<h1>hi</h1>").unwrap();
    let status = Command::new("tar")
        .arg("-cf")
        .arg(packages.join("site.tar"))
        .arg("-C")
        .arg(&staging)
        .arg("index.html")
        .status()
        .unwrap();
    assert!(status.success());

    write_script(&fx, "d.sh", "exit 0\n");

    let submission = fx
        .engine
        .submit(manifest("prod", "secret", &[("site", "site.tar", "d.sh", false)]))
        .unwrap();
    fx.execute_next().await;

    let log = fx.read_log("prod", submission.session.id).await;
    assert!(log.contains("Completed tar decompress."));
    assert_eq!(
        std::fs::read_to_string(packages.join("index.html")).unwrap(),
        "<h1>hi</h1>"
    );
}

#[tokio::test]
async fn test_failing_script_is_logged_as_error() {
    let mut fx = Fixture::with_runner(Some("secret"), Arc::new(ProcessRunner));
    write_script(&fx, "d.sh", "exit 3\n");

    let submission = fx
        .engine
        .submit(manifest("prod", "secret", &[("web", "missing.tar", "d.sh", false)]))
        .unwrap();
    fx.execute_next().await;

    let log = fx.read_log("prod", submission.session.id).await;
    assert!(log.contains("ERROR: "));
    assert!(log.contains("Run script command err"));
    assert!(!log.contains("Script completed"));
    assert!(log.contains("End of deploy task web"));
}
