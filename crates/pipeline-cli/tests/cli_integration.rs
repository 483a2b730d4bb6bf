use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// A `pipeline` invocation isolated from the user's config and environment.
fn pipeline(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pipeline").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("PIPELINE_API_URL")
        .env_remove("PIPELINE_API_TOKEN")
        .env_remove("PIPELINE_DEBUG_LOG")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(home: &TempDir, content: &str) {
    let dir = home.path().join(".config").join("clinic-pipeline");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), content).unwrap();
}

fn parse_json_output(output: &[u8]) -> Value {
    let text = String::from_utf8_lossy(output);
    let line = text.lines().last().expect("no output");
    serde_json::from_str(line).expect("Failed to parse JSON output")
}

mod general_tests {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let home = tempdir().unwrap();
        pipeline(home.path())
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("stage"))
            .stdout(predicate::str::contains("opportunity"))
            .stdout(predicate::str::contains("note"));
    }

    #[test]
    fn test_completions_need_no_api() {
        let home = tempdir().unwrap();
        pipeline(home.path())
            .args(["--api-url", "http://127.0.0.1:1", "completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("pipeline"));
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let home = tempdir().unwrap();
        let output = pipeline(home.path())
            .args(["config", "show"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let json = parse_json_output(&output);
        assert!(json["success"].as_bool().unwrap());
        assert_eq!(json["data"]["config"]["api"]["base_url"], "http://localhost:3000/api");
        assert_eq!(json["data"]["config"]["stage_delete_policy"], "block");
        assert_eq!(json["data"]["author_name"], "Usuário");
    }

    #[test]
    fn test_config_file_is_read_and_token_redacted() {
        let home = tempdir().unwrap();
        write_config(
            &home,
            r#"
author_name = "Ana"
stage_delete_policy = "cascade"

[api]
base_url = "https://clinic.example/api"
token = "secret-token"
timeout_secs = 5
"#,
        );

        let output = pipeline(home.path())
            .args(["config", "show"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let json = parse_json_output(&output);
        let config = &json["data"]["config"];
        assert_eq!(config["stage_delete_policy"], "cascade");
        assert_eq!(config["api"]["base_url"], "https://clinic.example/api");
        assert_eq!(config["api"]["timeout_secs"], 5);
        assert_eq!(config["api"]["token"], "********");
        assert_eq!(json["data"]["author_name"], "Ana");
        assert!(!String::from_utf8_lossy(&output).contains("secret-token"));
    }

    #[test]
    fn test_flag_overrides_environment() {
        let home = tempdir().unwrap();

        let output = pipeline(home.path())
            .env("PIPELINE_API_URL", "http://from-env.example/api")
            .args(["config", "show"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let json = parse_json_output(&output);
        assert_eq!(json["data"]["config"]["api"]["base_url"], "http://from-env.example/api");

        let output = pipeline(home.path())
            .env("PIPELINE_API_URL", "http://from-env.example/api")
            .args(["--api-url", "http://from-flag.example/api", "config", "show"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let json = parse_json_output(&output);
        assert_eq!(json["data"]["config"]["api"]["base_url"], "http://from-flag.example/api");
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let home = tempdir().unwrap();
        write_config(&home, "stage_delete_policy = [not toml");

        let output = pipeline(home.path())
            .args(["config", "show"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let json = parse_json_output(&output);
        assert_eq!(json["data"]["config"]["stage_delete_policy"], "block");
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_missing_required_args() {
        let home = tempdir().unwrap();
        pipeline(home.path())
            .args(["stage", "create"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("--name"));
    }

    #[test]
    fn test_invalid_uuid() {
        let home = tempdir().unwrap();
        pipeline(home.path())
            .args(["opportunity", "move", "--id", "not-a-uuid", "--stage-id", "also-not"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("invalid"));
    }

    #[test]
    fn test_unknown_label_color() {
        let home = tempdir().unwrap();
        pipeline(home.path())
            .args(["label", "create", "--name", "VIP", "--color", "teal"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unknown color"));
    }

    #[test]
    fn test_unknown_delete_policy() {
        let home = tempdir().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        pipeline(home.path())
            .args(["stage", "delete", "--id", &id, "--policy", "archive"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("archive"));
    }

    #[test]
    fn test_unreachable_api_reports_json_error() {
        let home = tempdir().unwrap();
        let output = pipeline(home.path())
            .args(["--api-url", "http://127.0.0.1:1", "stage", "list"])
            .assert()
            .failure()
            .code(1)
            .get_output()
            .stderr
            .clone();

        let json = parse_json_output(&output);
        assert_eq!(json["success"], false);
        assert!(!json["error"].as_str().unwrap().is_empty());
        assert!(json.get("data").is_none());
    }
}
