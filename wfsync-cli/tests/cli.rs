use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;
use std::thread;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn wfsync_cmd(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wfsync"));
    cmd.current_dir(cwd)
        .env_remove("GITHUB_TOKEN")
        .env("NO_COLOR", "1")
        .env("RUST_LOG", "info");
    cmd
}

/// Raw-content stub: known paths answer 200, everything else 404.
fn serve(routes: HashMap<String, String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            let mut reader = BufReader::new(stream.try_clone().expect("clone"));
            let mut request_line = String::new();
            let _ = reader.read_line(&mut request_line);
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap_or(0) == 0 || line == "\r\n" {
                    break;
                }
            }
            let path = request_line.split_whitespace().nth(1).unwrap_or("/");
            let (status, body) = match routes.get(path) {
                Some(body) => (200, body.clone()),
                None => (404, "404: Not Found".to_owned()),
            };
            let response = format!(
                "HTTP/1.1 {status} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}")
}

const SETTINGS: &str = r#"workflows:
  keep:
    - keep.yaml
    - missing.yaml
  modify:
    build.yaml:
      updates:
        - jobs.build.runs-on: ubuntu-22.04
        - "jobs.build.container: ${{ matrix.image }}"
  ignore:
    - local-only.yaml
  unique_tier4_workflows:
    - tier4-deploy.yaml
"#;

const BUILD: &str = "name: build\njobs:\n  build:\n    runs-on: self-hosted # runner\n    container: ros:humble\n";

fn write_settings(dir: &Path, contents: &str) {
    fs::write(dir.join("workflow_sync_setting.yaml"), contents).expect("write settings");
}

#[test]
fn sync_without_token_fails_before_loading_settings() {
    let cwd = TempDir::new().unwrap();

    wfsync_cmd(cwd.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(contains("GITHUB_TOKEN"));
}

#[test]
fn blank_token_counts_as_missing() {
    let cwd = TempDir::new().unwrap();
    write_settings(cwd.path(), SETTINGS);

    wfsync_cmd(cwd.path())
        .args(["diff", "--token", "  "])
        .assert()
        .failure()
        .stderr(contains("GITHUB_TOKEN"));
}

#[test]
fn missing_settings_file_is_fatal() {
    let cwd = TempDir::new().unwrap();

    wfsync_cmd(cwd.path())
        .arg("sync")
        .env("GITHUB_TOKEN", "t")
        .assert()
        .failure()
        .stderr(contains("workflow_sync_setting.yaml"))
        .stderr(contains("not found"));
}

#[test]
fn invalid_settings_file_is_fatal() {
    let cwd = TempDir::new().unwrap();
    write_settings(cwd.path(), "workflows: [unclosed\n");

    wfsync_cmd(cwd.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(contains("failed to load settings"));
}

#[test]
fn check_reports_drift_and_missing_unique_local() {
    let cwd = TempDir::new().unwrap();
    write_settings(cwd.path(), SETTINGS);
    let dir = cwd.path().join(".github/workflows");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("keep.yaml"), "name: keep\n").unwrap();
    fs::write(dir.join("stray.yml"), "name: stray\n").unwrap();

    wfsync_cmd(cwd.path())
        .arg("check")
        .assert()
        .success()
        .stdout(contains("tier4-deploy.yaml (missing)"))
        .stdout(contains("1 workflow(s) not mentioned in settings"))
        .stdout(contains("- stray.yml"));
}

#[test]
fn sync_writes_keep_verbatim_and_patches_modify() {
    let cwd = TempDir::new().unwrap();
    write_settings(cwd.path(), SETTINGS);
    let prefix = "/org/repo/main/.github/workflows";
    let base = serve(HashMap::from([
        (format!("{prefix}/keep.yaml"), "name:   keep  # as-is\n".to_owned()),
        (format!("{prefix}/build.yaml"), BUILD.to_owned()),
    ]));

    wfsync_cmd(cwd.path())
        .args(["sync", "--upstream", "org/repo", "--base-url", &base])
        .env("GITHUB_TOKEN", "t")
        .assert()
        .success()
        .stdout(contains("not found upstream"))
        .stdout(contains("2 synced, 1 failed"));

    let dir = cwd.path().join(".github/workflows");
    assert_eq!(
        fs::read_to_string(dir.join("keep.yaml")).unwrap(),
        "name:   keep  # as-is\n"
    );
    assert_eq!(
        fs::read_to_string(dir.join("build.yaml")).unwrap(),
        "name: build\njobs:\n  build:\n    runs-on: ubuntu-22.04 # runner\n    container: ${{ matrix.image }}\n"
    );
    assert!(!dir.join("missing.yaml").exists());
}

#[test]
fn dry_run_sync_writes_nothing() {
    let cwd = TempDir::new().unwrap();
    write_settings(cwd.path(), SETTINGS);
    let prefix = "/org/repo/main/.github/workflows";
    let base = serve(HashMap::from([(
        format!("{prefix}/keep.yaml"),
        "name: keep\n".to_owned(),
    )]));

    wfsync_cmd(cwd.path())
        .args(["sync", "--dry-run", "--upstream", "org/repo", "--base-url", &base])
        .env("GITHUB_TOKEN", "t")
        .assert()
        .success()
        .stdout(contains("would write"));

    assert!(!cwd.path().join(".github").exists());
}

#[test]
fn diff_shows_changes_without_writing() {
    let cwd = TempDir::new().unwrap();
    write_settings(cwd.path(), SETTINGS);
    let dir = cwd.path().join(".github/workflows");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("build.yaml"), BUILD).unwrap();
    let prefix = "/org/repo/main/.github/workflows";
    let base = serve(HashMap::from([(format!("{prefix}/build.yaml"), BUILD.to_owned())]));

    wfsync_cmd(cwd.path())
        .args(["diff", "--upstream", "org/repo", "--base-url", &base])
        .env("GITHUB_TOKEN", "t")
        .assert()
        .success()
        .stdout(contains("-    runs-on: self-hosted # runner"))
        .stdout(contains("+    runs-on: ubuntu-22.04 # runner"));

    assert_eq!(fs::read_to_string(dir.join("build.yaml")).unwrap(), BUILD);
}
