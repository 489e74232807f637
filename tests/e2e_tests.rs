//! End-to-end tests for the feraldeps CLI
//!
//! These tests verify:
//! - Offline scans print the report format and summary
//! - JSON output schema
//! - Ignore list management through subcommands
//! - Update, verify and revert on disk
//! - Exit codes are correct for various scenarios

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <properties>
    <text.version>1.9</text.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>org.apache.commons</groupId>
      <artifactId>commons-text</artifactId>
      <version>${text.version}</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>[4.0,5.0)</version>
      <scope>test</scope>
    </dependency>
  </dependencies>
</project>
"#;

/// Create a project directory containing a pom.xml
fn create_test_project() -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let pom = temp_dir.path().join("pom.xml");
    fs::write(&pom, POM).unwrap();
    (temp_dir, pom)
}

mod exit_codes {
    use super::*;

    #[test]
    fn test_help() {
        cargo_bin_cmd!("feraldeps").arg("--help").assert().code(0);
    }

    #[test]
    fn test_version() {
        cargo_bin_cmd!("feraldeps")
            .arg("--version")
            .assert()
            .code(0)
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_invalid_argument() {
        cargo_bin_cmd!("feraldeps")
            .arg("--invalid-option")
            .assert()
            .code(2);
    }

    #[test]
    fn test_missing_manifest_is_parse_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        cargo_bin_cmd!("feraldeps")
            .arg("--offline")
            .arg(temp_dir.path().join("pom.xml"))
            .assert()
            .code(3)
            .stdout(predicate::str::contains("failed to read manifest file"));
    }

    #[test]
    fn test_malformed_manifest_is_parse_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pom = temp_dir.path().join("pom.xml");
        fs::write(&pom, "<project><dependencies><dependency>").unwrap();

        cargo_bin_cmd!("feraldeps")
            .args(["--offline"])
            .arg(&pom)
            .assert()
            .code(3)
            .stdout(predicate::str::contains("✗"));
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let (temp_dir, pom) = create_test_project();
        fs::write(temp_dir.path().join("feraldeps.toml"), "concurrency = \"many\"").unwrap();

        cargo_bin_cmd!("feraldeps")
            .arg("--offline")
            .arg(&pom)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }
}

mod scan {
    use super::*;

    #[test]
    fn test_offline_text_report() {
        let (_temp_dir, pom) = create_test_project();

        cargo_bin_cmd!("feraldeps")
            .arg("--offline")
            .arg(&pom)
            .assert()
            .code(0)
            .stdout(predicate::str::starts_with("FeralDeps scan results:\n"))
            .stdout(predicate::str::contains(
                "• org.apache.commons:commons-text:1.9\n  Scope: compile\n  Version Constraint: LOCKED (specific version pinned)\n",
            ))
            .stdout(predicate::str::contains(
                "• junit:junit:[4.0,5.0)\n  Scope: test\n  Version Constraint: FLEXIBLE (version range allows upgrades)\n",
            ))
            .stdout(predicate::str::contains("Outdated").not())
            .stdout(predicate::str::contains("2 dependencies"));
    }

    #[test]
    fn test_offline_json_report() {
        let (_temp_dir, pom) = create_test_project();

        let output = cargo_bin_cmd!("feraldeps")
            .args(["--offline", "--json"])
            .arg(&pom)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["summary"]["files"], 1);
        assert_eq!(json["summary"]["dependencies"], 2);
        assert_eq!(json["cancelled"], false);

        let deps = json["manifests"][0]["dependencies"].as_array().unwrap();
        assert_eq!(deps[0]["version"], "1.9");
        assert_eq!(deps[0]["freshness"], "unknown");
        assert_eq!(deps[1]["version_constraint"], "FLEXIBLE");
    }

    #[test]
    fn test_quiet_hides_unremarkable_dependencies() {
        let (_temp_dir, pom) = create_test_project();

        cargo_bin_cmd!("feraldeps")
            .args(["--offline", "-q"])
            .arg(&pom)
            .assert()
            .code(0)
            .stdout(predicate::str::contains("• ").not())
            .stdout(predicate::str::contains("Summary:"));
    }

    #[test]
    fn test_multiple_manifests_with_one_failure() {
        let (temp_dir, pom) = create_test_project();

        cargo_bin_cmd!("feraldeps")
            .arg("--offline")
            .arg(&pom)
            .arg(temp_dir.path().join("absent.xml"))
            .assert()
            .code(3)
            .stdout(predicate::str::contains("commons-text"))
            .stdout(predicate::str::contains("1 manifest(s) could not be parsed"));
    }
}

mod ignore {
    use super::*;

    #[test]
    fn test_ignore_list_and_unignore() {
        let (temp_dir, pom) = create_test_project();

        cargo_bin_cmd!("feraldeps")
            .arg("ignore")
            .arg(&pom)
            .arg("org.apache.commons:commons-text:1.9")
            .assert()
            .code(0)
            .stdout(predicate::str::contains(
                "Ignored org.apache.commons:commons-text:1.9",
            ));

        let ignore_file = fs::read_to_string(temp_dir.path().join(".feraldeps-ignore")).unwrap();
        assert!(ignore_file.contains("org.apache.commons:commons-text:1.9\n"));

        cargo_bin_cmd!("feraldeps")
            .arg("ignored")
            .arg(&pom)
            .assert()
            .code(0)
            .stdout(predicate::str::contains(
                "  • org.apache.commons:commons-text:1.9",
            ));

        // Ignored dependencies are left out of the report
        cargo_bin_cmd!("feraldeps")
            .arg("--offline")
            .arg(&pom)
            .assert()
            .code(0)
            .stdout(predicate::str::contains("• org.apache.commons").not())
            .stdout(predicate::str::contains("1 ignored"));

        cargo_bin_cmd!("feraldeps")
            .args(["--offline", "--show-ignored"])
            .arg(&pom)
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Ignored dependencies:"));

        cargo_bin_cmd!("feraldeps")
            .arg("unignore")
            .arg(&pom)
            .arg("org.apache.commons:commons-text:1.9")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Unignored"));

        cargo_bin_cmd!("feraldeps")
            .arg("ignored")
            .arg(&pom)
            .assert()
            .code(0)
            .stdout(predicate::str::contains("(none)"));
    }

    #[test]
    fn test_ignore_rejects_incomplete_key() {
        let (_temp_dir, pom) = create_test_project();

        cargo_bin_cmd!("feraldeps")
            .arg("ignore")
            .arg(&pom)
            .arg("org.apache.commons:commons-text")
            .assert()
            .code(2);
    }
}

mod update {
    use super::*;

    #[test]
    fn test_update_without_verify() {
        let (_temp_dir, pom) = create_test_project();

        cargo_bin_cmd!("feraldeps")
            .arg("update")
            .arg(&pom)
            .args(["org.apache.commons:commons-text", "1.10.0"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains(
                "Updated org.apache.commons:commons-text: 1.9 → 1.10.0",
            ));

        let content = fs::read_to_string(&pom).unwrap();
        assert!(content.contains("      <version>1.10.0</version>\n"));
        // The property itself is not touched
        assert!(content.contains("<text.version>1.9</text.version>"));
    }

    #[test]
    fn test_update_unknown_dependency() {
        let (_temp_dir, pom) = create_test_project();

        cargo_bin_cmd!("feraldeps")
            .arg("update")
            .arg(&pom)
            .args(["org.absent:nothing", "1.0"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("could not find org.absent:nothing"));

        assert_eq!(fs::read_to_string(&pom).unwrap(), POM);
    }

    #[test]
    fn test_update_unparseable_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        let pom = temp_dir.path().join("pom.xml");
        fs::write(&pom, "<project>").unwrap();

        cargo_bin_cmd!("feraldeps")
            .arg("update")
            .arg(&pom)
            .args(["g:a", "1.0"])
            .assert()
            .code(3);
    }

    #[cfg(unix)]
    #[test]
    fn test_update_verified() {
        let (temp_dir, pom) = create_test_project();
        fs::write(
            temp_dir.path().join("feraldeps.toml"),
            "[verify]\ncommand = [\"sh\", \"-c\", \"echo compiled\"]\n",
        )
        .unwrap();

        cargo_bin_cmd!("feraldeps")
            .arg("update")
            .arg(&pom)
            .args(["junit:junit", "4.13.2", "--verify"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Update verified"));

        assert!(fs::read_to_string(&pom)
            .unwrap()
            .contains("<version>4.13.2</version>"));
    }

    #[cfg(unix)]
    #[test]
    fn test_update_failed_build_reverts() {
        let (temp_dir, pom) = create_test_project();
        fs::write(
            temp_dir.path().join("feraldeps.toml"),
            "[verify]\ncommand = [\"sh\", \"-c\", \"echo '[ERROR] COMPILATION ERROR'; exit 1\"]\n",
        )
        .unwrap();

        cargo_bin_cmd!("feraldeps")
            .arg("update")
            .arg(&pom)
            .args(["junit:junit", "5.0", "--verify"])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("Reverted to original version: [4.0,5.0)"))
            .stdout(predicate::str::contains("[ERROR] COMPILATION ERROR"));

        assert_eq!(fs::read_to_string(&pom).unwrap(), POM);
    }

    #[cfg(unix)]
    #[test]
    fn test_update_failed_build_kept() {
        let (temp_dir, pom) = create_test_project();
        fs::write(
            temp_dir.path().join("feraldeps.toml"),
            "[verify]\ncommand = [\"sh\", \"-c\", \"exit 1\"]\n",
        )
        .unwrap();

        cargo_bin_cmd!("feraldeps")
            .arg("update")
            .arg(&pom)
            .args(["junit:junit", "5.0", "--verify", "--on-failure", "keep", "--json"])
            .assert()
            .code(2)
            .stdout(predicate::str::contains("\"state\": \"failed_kept\""));

        assert!(fs::read_to_string(&pom)
            .unwrap()
            .contains("<version>5.0</version>"));
    }
}
