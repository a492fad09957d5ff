//! CLI integration tests.
//!
//! These tests exercise the binary end to end. Each test runs in a fresh
//! temporary directory with HOME and XDG_CONFIG_HOME pointed into it, so no
//! user configuration leaks in.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for running sonar-harvest in `dir`.
fn sonar_harvest(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sonar-harvest").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("SONAR_HARVEST_CONFIG")
        .env_remove("SONAR_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_flag_works() {
    let dir = TempDir::new().unwrap();
    sonar_harvest(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sonar-harvest"));
}

mod input_validation {
    use super::*;

    #[test]
    fn missing_token_is_usage_error() {
        let dir = TempDir::new().unwrap();
        sonar_harvest(dir.path())
            .args(["--quiet", "harvest", "proj-a"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("token is required"));
    }

    #[test]
    fn malformed_project_key_is_usage_error() {
        let dir = TempDir::new().unwrap();
        sonar_harvest(dir.path())
            .args(["harvest", "--token", "squ_x", "proj-a", "bad,key"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid project key"));
    }

    #[test]
    fn no_projects_is_rejected_by_parser() {
        let dir = TempDir::new().unwrap();
        sonar_harvest(dir.path())
            .args(["harvest", "--token", "squ_x"])
            .assert()
            .code(2);
    }

    #[test]
    fn invalid_input_writes_no_report() {
        let dir = TempDir::new().unwrap();
        sonar_harvest(dir.path())
            .args(["--quiet", "harvest", "proj-a"])
            .assert()
            .failure();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert!(entries
            .iter()
            .filter_map(|e| e.as_ref().ok())
            .all(|e| !e.file_name().to_string_lossy().starts_with("sonar-report-")));
    }
}

mod config {
    use super::*;

    #[test]
    fn shows_defaults() {
        let dir = TempDir::new().unwrap();
        sonar_harvest(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("base_url = \"https://sonarcloud.io\""))
            .stdout(predicate::str::contains("ceiling = 10000"))
            .stdout(predicate::str::contains("# local: (none)"));
    }

    #[test]
    fn local_file_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(".sonar-harvest.toml"),
            "base_url = \"https://sonar.example.com\"\n\n[harvest]\nceiling = 5000\n",
        )
        .unwrap();

        sonar_harvest(dir.path())
            .arg("config")
            .assert()
            .success()
            .stdout(predicate::str::contains("https://sonar.example.com"))
            .stdout(predicate::str::contains("ceiling = 5000"))
            .stdout(predicate::str::contains(".sonar-harvest.toml"));
    }

    #[test]
    fn invalid_file_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".sonar-harvest.toml"), "[harvest]\npage_size = 0\n").unwrap();

        sonar_harvest(dir.path())
            .arg("config")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("page_size"));
    }
}

#[test]
fn completion_generates_script() {
    let dir = TempDir::new().unwrap();
    sonar_harvest(dir.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sonar-harvest"));
}

mod harvest {
    use super::*;

    async fn mock_server(valid: bool) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/authentication/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": valid })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/issues/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 2,
                "issues": [
                    {
                        "key": "AX1",
                        "severity": "CRITICAL",
                        "type": "BUG",
                        "status": "OPEN",
                        "component": "proj-a:src/main.rs",
                        "creationDate": "2024-02-01T09:00:00+0000"
                    },
                    {
                        "key": "AX2",
                        "type": "CODE_SMELL",
                        "status": "OPEN",
                        "component": "proj-a:src/lib.rs",
                        "creationDate": "2024-02-02T09:00:00+0000"
                    }
                ]
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_report_and_prints_stats() {
        let server = mock_server(true).await;
        let dir = TempDir::new().unwrap();

        sonar_harvest(dir.path())
            .args(["harvest", "proj-a", "--output", "report.json", "--base-url"])
            .arg(server.uri())
            .env("SONAR_TOKEN", "squ_x")
            .assert()
            .success()
            .stdout(predicate::str::contains("CRITICAL"))
            .stdout(predicate::str::contains("UNKNOWN"))
            .stdout(predicate::str::contains("Wrote 2 issues"));

        let report: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
                .unwrap();
        assert_eq!(report["summary"]["totalIssues"], 2);
        assert_eq!(report["summary"]["projects"][0]["issuesCount"], 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_still_writes_payload() {
        let server = mock_server(false).await;
        let dir = TempDir::new().unwrap();

        sonar_harvest(dir.path())
            .args(["harvest", "proj-a", "--token", "squ_x", "-o", "out.json", "--base-url"])
            .arg(server.uri())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("token rejected"));

        let report: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("out.json")).unwrap())
                .unwrap();
        assert!(report["error"].is_string());
        assert!(report["partialResults"].is_null());
    }
}
