//! Integration tests for imgcache

mod properties;

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    const EVENTS: &str = r#"{"op":"add","image":{"id":"sha256:aaaaaaaaaaaaaaaa","size":1000,"repo_tags":["fedora:41"]},"at":"2024-01-15T10:00:00Z"}
{"op":"add","image":{"id":"sha256:bbbbbbbbbbbbbbbb","size":2000,"repo_tags":["alpine:3"]},"at":"2024-01-15T10:00:00Z"}
{"op":"mark","id":"sha256:aaaaaaaaaaaaaaaa","at":"2024-01-15T10:01:00Z"}
{"op":"mark","id":"sha256:bbbbbbbbbbbbbbbb","at":"2024-01-15T10:02:00Z"}
{"op":"lock","id":"sha256:aaaaaaaaaaaaaaaa","token":"job-1"}
{"op":"mark","id":"sha256:cccccccccccccccc"}
"#;

    /// Run with a config path inside the temp dir so the user's config is never read
    fn imgcache(temp: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("imgcache");
        cmd.arg("--config").arg(temp.join("config.toml"));
        cmd
    }

    fn write_events(temp: &TempDir) -> std::path::PathBuf {
        let path = temp.path().join("events.jsonl");
        std::fs::write(&path, EVENTS).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("imgcache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("container image eviction planner"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("imgcache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("imgcache"));
    }

    #[test]
    fn replay_plain_lists_unpinned() {
        let temp = TempDir::new().unwrap();
        let events = write_events(&temp);

        imgcache(temp.path())
            .args(["replay", "--format", "plain"])
            .arg(&events)
            .assert()
            .success()
            .stdout(predicate::str::diff("sha256:bbbbbbbbbbbbbbbb\n"));
    }

    #[test]
    fn replay_table_shows_summary() {
        let temp = TempDir::new().unwrap();
        let events = write_events(&temp);

        imgcache(temp.path())
            .arg("replay")
            .arg(&events)
            .assert()
            .success()
            .stdout(predicate::str::contains("alpine:3"))
            .stdout(predicate::str::contains("Pinned: sha256:aaaaaaaaaaaaaaaa"))
            .stdout(predicate::str::contains("skipped"));
    }

    #[test]
    fn replay_json_report() {
        let temp = TempDir::new().unwrap();
        let events = write_events(&temp);

        let output = imgcache(temp.path())
            .args(["replay", "--format", "json", "--now", "2024-01-15T10:12:00Z"])
            .arg(&events)
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["applied"], 5);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["total_size"], 3000);
        assert_eq!(report["order"], "lowest-first");
        assert_eq!(report["evictable"][0]["id"], "sha256:bbbbbbbbbbbbbbbb");
        assert_eq!(report["evictable"][0]["score"], 600.0);
    }

    #[test]
    fn replay_strict_fails_on_missing_image() {
        let temp = TempDir::new().unwrap();
        let events = write_events(&temp);

        imgcache(temp.path())
            .args(["replay", "--strict"])
            .arg(&events)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Image not found in cache"));
    }

    #[test]
    fn replay_missing_file_fails() {
        let temp = TempDir::new().unwrap();

        imgcache(temp.path())
            .args(["replay"])
            .arg(temp.path().join("nope.jsonl"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("reading event log"));
    }

    #[test]
    fn replay_bad_line_reports_number() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("events.jsonl");
        std::fs::write(&path, "{\"op\":\"mark\",\"id\":\"a\"}\nnot json\n").unwrap();

        imgcache(temp.path())
            .arg("replay")
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("line 2"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();

        imgcache(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();

        imgcache(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_set_changes_replay_order() {
        let temp = TempDir::new().unwrap();
        let events = write_events(&temp);

        imgcache(temp.path())
            .args(["config", "set", "cache.order", "highest-first"])
            .assert()
            .success();

        imgcache(temp.path())
            .args(["replay", "--format", "json"])
            .arg(&events)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"highest-first\""));
    }
}
