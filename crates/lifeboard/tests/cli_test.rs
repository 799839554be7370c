//! Integration tests for the `lifeboard` CLI binary.
//!
//! Parsing, help, completions and config handling run without a backend;
//! request commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::process::Output;

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the binary with env isolation.
///
/// Clears all `LIFEBOARD_*` env vars and points the config file at
/// `config` so tests never touch the user's real configuration.
fn lifeboard_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("lifeboard");
    cmd.env("HOME", "/tmp/lifeboard-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/lifeboard-cli-test-nonexistent")
        .env("LIFEBOARD_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("LIFEBOARD_PROFILE")
        .env_remove("LIFEBOARD_BASE_URL")
        .env_remove("LIFEBOARD_EMAIL")
        .env_remove("LIFEBOARD_PASSWORD")
        .env_remove("LIFEBOARD_OUTPUT")
        .env_remove("LIFEBOARD_INSECURE")
        .env_remove("LIFEBOARD_TIMEOUT")
        .env_remove("LIFEBOARD_DEFAULT_PROFILE");
    cmd
}

fn missing_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    (dir, config)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run_against(server: &MockServer, config: &Path, args: &[&str]) -> Output {
    let mut cmd = lifeboard_cmd(config);
    cmd.arg("--base-url")
        .arg(format!("{}/api", server.uri()))
        .args(args)
        .env("LIFEBOARD_PASSWORD", "hunter2");
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn mount_login(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ada@example.com", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "access_token=a1; Path=/")
                .set_body_json(json!({ "id": 1, "email": "ada@example.com" })),
        )
        .expect(expected)
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = missing_config();
    let output = lifeboard_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("Lifeboard backend")
            .and(predicate::str::contains("get"))
            .and(predicate::str::contains("login"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lifeboard"));
}

#[test]
fn test_completions_zsh() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_output_format() {
    let (_dir, config) = missing_config();
    let output = lifeboard_cmd(&config)
        .args(["--output", "table", "get", "habits"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("invalid value") || text.contains("possible values"),
        "Expected error about valid output formats:\n{text}"
    );
}

#[test]
fn test_data_and_data_file_conflict() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config)
        .args(["post", "habits", "--data", "{}", "--data-file", "body.json"])
        .assert()
        .code(2);
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_get_without_backend_reports_missing_config() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config)
        .args(["get", "habits"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No backend configured"));
}

#[test]
fn test_unknown_profile() {
    let (_dir, config) = missing_config();
    std::fs::write(
        &config,
        "[profiles.home]\nbase_url = \"https://lifeboard.test/api\"\n",
    )
    .unwrap();

    lifeboard_cmd(&config)
        .args(["--profile", "work", "get", "habits"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Profile 'work' not found").and(predicate::str::contains("home")));
}

#[test]
fn test_config_path_honors_override() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config.to_string_lossy().as_ref()));
}

#[test]
fn test_config_show_without_file() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default_profile"));
}

#[test]
fn test_config_show_masks_password() {
    let (_dir, config) = missing_config();
    std::fs::write(
        &config,
        "[profiles.default]\nbase_url = \"https://lifeboard.test/api\"\n\
         email = \"ada@example.com\"\npassword = \"s3cret-value\"\n",
    )
    .unwrap();

    lifeboard_cmd(&config)
        .args(["--output", "yaml", "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("****")
                .and(predicate::str::contains("ada@example.com"))
                .and(predicate::str::contains("s3cret-value").not()),
        );
}

#[test]
fn test_request_without_credentials_is_auth_error() {
    let (_dir, config) = missing_config();
    lifeboard_cmd(&config)
        .args(["--base-url", "http://127.0.0.1:9/api", "get", "habits"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No credentials"));
}

// ── Requests against a mock backend ─────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_get_logs_in_and_prints_response() {
    let server = MockServer::start().await;
    let (_dir, config) = missing_config();
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/habits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Read" }])))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &config,
        &["--email", "ada@example.com", "-o", "json-compact", "get", "habits"],
    )
    .await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"[{"id":1,"name":"Read"}]"#));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_public_get_skips_login() {
    let server = MockServer::start().await;
    let (_dir, config) = missing_config();
    mount_login(&server, 0).await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &config, &["-o", "plain", "get", "health", "--public"]).await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("status\tok"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_post_sends_inline_body() {
    let server = MockServer::start().await;
    let (_dir, config) = missing_config();
    mount_login(&server, 1).await;

    Mock::given(method("POST"))
        .and(path("/api/habits"))
        .and(body_json(json!({ "name": "Walk" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 9, "name": "Walk" })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &config,
        &[
            "--email",
            "ada@example.com",
            "-o",
            "yaml",
            "post",
            "habits",
            "--data",
            r#"{"name":"Walk"}"#,
        ],
    )
    .await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("id: 9"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_expired_session_exits_with_auth_code() {
    let server = MockServer::start().await;
    let (_dir, config) = missing_config();
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/habits"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(&server, &config, &["--email", "ada@example.com", "get", "habits"]).await;

    output
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Session expired"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forbidden_exits_with_permission_code() {
    let server = MockServer::start().await;
    let (_dir, config) = missing_config();
    mount_login(&server, 1).await;

    Mock::given(method("DELETE"))
        .and(path("/api/users/2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Admins only" })))
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &config,
        &["--email", "ada@example.com", "delete", "users/2"],
    )
    .await;

    output
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Admins only"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_login_with_bad_credentials() {
    let server = MockServer::start().await;
    let (_dir, config) = missing_config();

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let output = run_against(&server, &config, &["--email", "ada@example.com", "login"]).await;

    output
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid credentials"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_whoami_prints_current_user() {
    let server = MockServer::start().await;
    let (_dir, config) = missing_config();
    mount_login(&server, 1).await;

    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "email": "ada@example.com" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = run_against(
        &server,
        &config,
        &["--email", "ada@example.com", "-o", "plain", "whoami"],
    )
    .await;

    output
        .assert()
        .success()
        .stdout(predicate::str::contains("email\tada@example.com"));
}
