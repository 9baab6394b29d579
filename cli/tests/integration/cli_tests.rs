//! End-to-end tests that run the `rigup` binary against a local script
//! source in a temporary directory.

#![cfg(unix)]
#![allow(clippy::expect_used)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TOOLS_YAML: &str = "\
tools:
  - name: rigup-fixture-ok
    description: Always installs
    auto_install: true
  - name: rigup-fixture-broken
    auto_install: true
  - name: rigup-fixture-extra
    dependencies: [rigup-fixture-ok]
";

const ENVIRONMENTS_YAML: &str = "\
environments:
  - name: fixture-zsh
    shell: zsh
    auto_apply: true
";

/// A script source plus an isolated config file.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("source");
        write(&root.join("tools.yaml"), TOOLS_YAML);
        write(&root.join("environments.yaml"), ENVIRONMENTS_YAML);
        write(
            &root.join("tools/rigup-fixture-ok/install.sh"),
            "echo \"installed-$TOOL_NAME on $PLATFORM\"\n",
        );
        write(
            &root.join("tools/rigup-fixture-ok/uninstall.sh"),
            "echo \"removed-$TOOL_NAME\"\n",
        );
        write(
            &root.join("tools/rigup-fixture-broken/install.sh"),
            "echo nope >&2\nexit 3\n",
        );
        write(
            &root.join("tools/rigup-fixture-extra/install.sh"),
            "echo extra\n",
        );
        write(
            &root.join("environments/fixture-zsh/setup.sh"),
            "echo \"env=$ENV_NAME shell=$ENV_SHELL\"\n",
        );
        write(
            &root.join("environments/fixture-zsh/restore.sh"),
            "echo restored\n",
        );
        Self { dir }
    }

    fn source(&self) -> std::path::PathBuf {
        self.dir.path().join("source")
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.dir.path().join("config.yaml")
    }

    fn rigup(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rigup"));
        cmd.env("NO_COLOR", "1")
            .env("CI", "1")
            .env("RIGUP_SOURCE", self.source())
            .env("RIGUP_CONFIG", self.config_path())
            .env_remove("RIGUP_LOG");
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.rigup().args(args).arg("--json").output().expect("run rigup");
        serde_json::from_slice(&output.stdout).expect("stdout is one JSON document")
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    std::fs::write(path, content).expect("write file");
}

// --- Help and version ---

#[test]
fn test_no_args_shows_help() {
    Sandbox::new()
        .rigup()
        .env_remove("NO_COLOR")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "Install developer tools and shell environments",
        ));
}

#[test]
fn test_no_color_accepts_any_value() {
    let sandbox = Sandbox::new();
    for value in ["1", "yes", "true", ""] {
        sandbox
            .rigup()
            .env("NO_COLOR", value)
            .arg("version")
            .assert()
            .success()
            .stdout(format!("rigup {}\n", env!("CARGO_PKG_VERSION")));
    }
}

#[test]
fn test_help_lists_commands() {
    Sandbox::new()
        .rigup()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install-all"))
        .stdout(predicate::str::contains("update-all"))
        .stdout(predicate::str::contains("restore"));
}

#[test]
fn test_version_command() {
    Sandbox::new()
        .rigup()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("rigup {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_json() {
    let sandbox = Sandbox::new();
    let json = sandbox.json(&["version"]);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_platform_json_has_os() {
    let sandbox = Sandbox::new();
    let json = sandbox.json(&["platform"]);
    assert!(json["os"].as_str().is_some_and(|os| !os.is_empty()));
}

// --- list ---

#[test]
fn test_list_json_shows_effective_auto_flags() {
    let sandbox = Sandbox::new();
    let json = sandbox.json(&["list"]);

    let tools = json["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 3);
    assert_eq!(tools[0]["name"], "rigup-fixture-ok");
    assert_eq!(tools[0]["auto"], true);
    assert_eq!(tools[0]["installed"], false);
    assert_eq!(tools[2]["auto"], false);
    assert_eq!(json["environments"][0]["name"], "fixture-zsh");
}

#[test]
fn test_list_reflects_overrides() {
    let sandbox = Sandbox::new();
    sandbox
        .rigup()
        .args(["config", "set", "tools.rigup-fixture-extra.auto", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set tools.rigup-fixture-extra.auto = true"));

    let json = sandbox.json(&["list"]);

    assert_eq!(json["tools"][2]["auto"], true);
    assert_eq!(json["tools"][2]["overridden"], true);
}

#[test]
fn test_list_fails_when_source_is_missing() {
    let sandbox = Sandbox::new();
    sandbox
        .rigup()
        .env("RIGUP_SOURCE", sandbox.dir.path().join("missing"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tools.yaml"));
}

// --- install / uninstall / verify ---

#[test]
fn test_install_mirrors_output_and_records_history() {
    let sandbox = Sandbox::new();
    sandbox
        .rigup()
        .args(["install", "rigup-fixture-ok"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed-rigup-fixture-ok on"))
        .stdout(predicate::str::contains("install rigup-fixture-ok"));

    let config = std::fs::read_to_string(sandbox.config_path()).expect("config written");
    assert!(config.contains("rigup-fixture-ok"));
    assert!(config.contains("action: install"));
}

#[test]
fn test_install_failure_exits_one_with_code() {
    let sandbox = Sandbox::new();
    sandbox
        .rigup()
        .args(["install", "rigup-fixture-broken"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nope"))
        .stderr(predicate::str::contains("failed with exit code 3"));

    assert!(!sandbox.config_path().exists(), "failures are not recorded");
}

#[test]
fn test_install_json_reports_transcript() {
    let sandbox = Sandbox::new();
    let json = sandbox.json(&["install", "rigup-fixture-ok"]);

    assert_eq!(json["name"], "rigup-fixture-ok");
    assert_eq!(json["kind"], "tool");
    assert_eq!(json["result"]["success"], true);
    assert_eq!(json["result"]["exit_code"], 0);
    let first = &json["result"]["transcript"][0];
    assert_eq!(first["stream"], "stdout");
    assert!(
        first["text"]
            .as_str()
            .is_some_and(|t| t.starts_with("installed-rigup-fixture-ok"))
    );
}

#[test]
fn test_install_unknown_tool_is_an_error() {
    let sandbox = Sandbox::new();
    sandbox
        .rigup()
        .args(["install", "no-such-tool"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tool 'no-such-tool'"));
}

#[test]
fn test_install_unknown_tool_json_error_object() {
    let sandbox = Sandbox::new();
    let json = sandbox.json(&["install", "no-such-tool"]);
    assert_eq!(json["error"], true);
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("no-such-tool"))
    );
}

#[test]
fn test_uninstall_runs_without_prompt_in_ci() {
    Sandbox::new()
        .rigup()
        .args(["uninstall", "rigup-fixture-ok"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed-rigup-fixture-ok"));
}

#[test]
fn test_uninstall_without_script_fails() {
    Sandbox::new()
        .rigup()
        .args(["uninstall", "rigup-fixture-broken"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("was not found in the script source"));
}

#[test]
fn test_verify_missing_tool_exits_one() {
    Sandbox::new()
        .rigup()
        .args(["verify", "rigup-fixture-ok"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("was not found in PATH"));
}

// --- environments ---

#[test]
fn test_apply_exports_environment_identity() {
    Sandbox::new()
        .rigup()
        .args(["apply", "fixture-zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env=fixture-zsh shell=zsh"));
}

#[test]
fn test_restore_runs_restore_script() {
    Sandbox::new()
        .rigup()
        .args(["restore", "fixture-zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("restored"));
}

// --- batches ---

#[test]
fn test_install_all_continues_past_failures() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .rigup()
        .args(["install-all", "--json"])
        .output()
        .expect("run rigup");

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["kind"], "install-all");
    let results = report["results"].as_array().expect("results");
    let names: Vec<&str> = results.iter().filter_map(|r| r["name"].as_str()).collect();
    assert_eq!(
        names,
        vec!["rigup-fixture-ok", "rigup-fixture-broken", "fixture-zsh"]
    );
    assert_eq!(results[0]["result"]["success"], true);
    assert_eq!(results[1]["result"]["exit_code"], 3);
    assert_eq!(results[2]["result"]["success"], true);
}

#[test]
fn test_install_all_human_summary() {
    Sandbox::new()
        .rigup()
        .arg("install-all")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("install-all finished: 2/3 succeeded"))
        .stderr(predicate::str::contains("rigup-fixture-broken"));
}

#[test]
fn test_update_all_with_missing_dependency_is_dependency_error() {
    let sandbox = Sandbox::new();
    write(
        &sandbox.source().join("tools.yaml"),
        "tools:\n  - name: lonely\n    auto_install: true\n    dependencies: [ghost]\n",
    );

    let json = sandbox.json(&["update-all"]);

    assert_eq!(json["error"], true);
    assert_eq!(json["code"], "dependency_error");
    assert!(
        json["message"]
            .as_str()
            .is_some_and(|m| m.contains("'lonely' requires 'ghost'"))
    );
}

// --- config ---

#[test]
fn test_config_show_json_after_set() {
    let sandbox = Sandbox::new();
    sandbox
        .rigup()
        .args(["config", "set", "source.url", "https://example.com/scripts"])
        .assert()
        .success();

    let json = sandbox.json(&["config", "show"]);

    assert_eq!(json["config"]["source"]["url"], "https://example.com/scripts");
    assert!(
        json["path"]
            .as_str()
            .is_some_and(|p| p.ends_with("config.yaml"))
    );
}

#[test]
fn test_config_set_unknown_key_fails() {
    Sandbox::new()
        .rigup()
        .args(["config", "set", "security.level", "strict"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown setting: security.level"));
}

#[test]
fn test_config_set_invalid_override_value_fails() {
    Sandbox::new()
        .rigup()
        .args(["config", "set", "tools.jq.auto", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Valid values: true, false, default"));
}
