//! CLI argument parsing module for feraldeps

use crate::manifest::{MatchPolicy, MANIFEST_FILENAME};
use crate::update::{FailureAction, UpdateMode};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Parse a `groupId:artifactId` coordinate
fn parse_coordinate(s: &str) -> Result<(String, String), String> {
    let mut parts = s.trim().splitn(2, ':');
    let group_id = parts.next().unwrap_or_default();
    let artifact_id = parts.next().unwrap_or_default();

    if group_id.is_empty() || artifact_id.is_empty() || artifact_id.contains(':') {
        return Err(format!(
            "invalid coordinate '{}': expected groupId:artifactId",
            s
        ));
    }
    Ok((group_id.to_string(), artifact_id.to_string()))
}

/// Parse an ignore key `groupId:artifactId:version`
fn parse_ignore_key(s: &str) -> Result<String, String> {
    let key = s.trim();
    crate::ignore::parse_key(key)
        .map(|_| key.to_string())
        .ok_or_else(|| {
            format!(
                "invalid dependency '{}': expected groupId:artifactId:version",
                s
            )
        })
}

/// Maven dependency auditor
#[derive(Parser, Debug, Clone)]
#[command(
    name = "feraldeps",
    version,
    about = "Find outdated and vulnerable Maven dependencies and apply verified upgrades",
    args_conflicts_with_subcommands = true
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub scan: ScanArgs,

    // Output options
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output (debug logging, lookup errors)
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - only dependencies that need attention
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Arguments of the default scan command
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Manifest files to scan
    #[arg(default_value = MANIFEST_FILENAME)]
    pub manifests: Vec<PathBuf>,

    /// Skip Maven Central and OSV lookups
    #[arg(long)]
    pub offline: bool,

    /// List ignored dependencies after the report
    #[arg(long)]
    pub show_ignored: bool,

    /// Maximum number of concurrent lookups
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub concurrency: Option<u64>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Rewrite the version of one dependency, optionally verifying the build
    Update(UpdateArgs),

    /// Add groupId:artifactId:version to the project's ignore list
    Ignore(IgnoreArgs),

    /// Remove groupId:artifactId:version from the project's ignore list
    Unignore(IgnoreArgs),

    /// Show the project's ignore list
    Ignored {
        /// Manifest whose project ignore list is shown
        #[arg(default_value = MANIFEST_FILENAME)]
        manifest: PathBuf,
    },
}

/// Arguments of `update`
#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {
    /// Manifest to update
    pub manifest: PathBuf,

    /// Dependency as groupId:artifactId
    #[arg(value_parser = parse_coordinate)]
    pub coordinate: (String, String),

    /// Version to write
    pub version: String,

    /// Run the build after writing and handle failures
    #[arg(long)]
    pub verify: bool,

    /// What to do when verification fails
    #[arg(long, default_value = "revert", requires = "verify")]
    pub on_failure: FailureAction,

    /// Rewrite only the first matching dependency block
    #[arg(long)]
    pub first_only: bool,

    /// Verification timeout in seconds (0 disables)
    #[arg(long)]
    pub verify_timeout: Option<u64>,
}

impl UpdateArgs {
    /// Update mode selected by the flags
    pub fn mode(&self) -> UpdateMode {
        if self.verify {
            UpdateMode::Verify {
                on_failure: self.on_failure,
            }
        } else {
            UpdateMode::WriteOnly
        }
    }

    /// Match policy override, if any
    pub fn match_policy(&self) -> Option<MatchPolicy> {
        self.first_only.then_some(MatchPolicy::First)
    }
}

/// Arguments of `ignore` and `unignore`
#[derive(Args, Debug, Clone)]
pub struct IgnoreArgs {
    /// Manifest whose project ignore list is changed
    pub manifest: PathBuf,

    /// Dependency as groupId:artifactId:version
    #[arg(value_parser = parse_ignore_key)]
    pub dependency: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_args() {
        let args = CliArgs::parse_from(["feraldeps"]);
        assert!(args.command.is_none());
        assert_eq!(args.scan.manifests, vec![PathBuf::from("pom.xml")]);
        assert!(!args.scan.offline);
        assert!(!args.scan.show_ignored);
        assert!(args.scan.concurrency.is_none());
        assert!(!args.json);
        assert!(!args.verbose);
        assert!(!args.quiet);
    }

    #[test]
    fn test_multiple_manifests() {
        let args = CliArgs::parse_from(["feraldeps", "a/pom.xml", "b/pom.xml"]);
        assert_eq!(
            args.scan.manifests,
            vec![PathBuf::from("a/pom.xml"), PathBuf::from("b/pom.xml")]
        );
    }

    #[test]
    fn test_scan_flags() {
        let args = CliArgs::parse_from([
            "feraldeps",
            "--offline",
            "--show-ignored",
            "--concurrency",
            "3",
            "--json",
            "-q",
        ]);
        assert!(args.scan.offline);
        assert!(args.scan.show_ignored);
        assert_eq!(args.scan.concurrency, Some(3));
        assert!(args.json);
        assert!(args.quiet);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(CliArgs::try_parse_from(["feraldeps", "--concurrency", "0"]).is_err());
    }

    #[test]
    fn test_update_subcommand() {
        let args = CliArgs::parse_from([
            "feraldeps",
            "update",
            "pom.xml",
            "org.apache.commons:commons-text",
            "1.10.0",
        ]);
        let Some(Command::Update(update)) = args.command else {
            panic!("expected update subcommand");
        };
        assert_eq!(update.manifest, PathBuf::from("pom.xml"));
        assert_eq!(
            update.coordinate,
            ("org.apache.commons".to_string(), "commons-text".to_string())
        );
        assert_eq!(update.version, "1.10.0");
        assert_eq!(update.mode(), UpdateMode::WriteOnly);
        assert_eq!(update.match_policy(), None);
    }

    #[test]
    fn test_update_with_verify() {
        let args = CliArgs::parse_from([
            "feraldeps",
            "update",
            "pom.xml",
            "g:a",
            "2.0",
            "--verify",
            "--on-failure",
            "keep",
            "--first-only",
            "--verify-timeout",
            "60",
            "--json",
        ]);
        assert!(args.json);
        let Some(Command::Update(update)) = args.command else {
            panic!("expected update subcommand");
        };
        assert_eq!(
            update.mode(),
            UpdateMode::Verify {
                on_failure: FailureAction::Keep
            }
        );
        assert_eq!(update.match_policy(), Some(MatchPolicy::First));
        assert_eq!(update.verify_timeout, Some(60));
    }

    #[test]
    fn test_update_verify_defaults_to_revert() {
        let args = CliArgs::parse_from(["feraldeps", "update", "pom.xml", "g:a", "2.0", "--verify"]);
        let Some(Command::Update(update)) = args.command else {
            panic!("expected update subcommand");
        };
        assert_eq!(
            update.mode(),
            UpdateMode::Verify {
                on_failure: FailureAction::Revert
            }
        );
    }

    #[test]
    fn test_on_failure_requires_verify() {
        let result = CliArgs::try_parse_from([
            "feraldeps",
            "update",
            "pom.xml",
            "g:a",
            "2.0",
            "--on-failure",
            "ask",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_invalid_coordinate() {
        let result = CliArgs::try_parse_from(["feraldeps", "update", "pom.xml", "g-only", "2.0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_ignore_subcommands() {
        let args = CliArgs::parse_from(["feraldeps", "ignore", "pom.xml", "g:a:1.0"]);
        let Some(Command::Ignore(ignore)) = args.command else {
            panic!("expected ignore subcommand");
        };
        assert_eq!(ignore.dependency, "g:a:1.0");

        let args = CliArgs::parse_from(["feraldeps", "unignore", "pom.xml", "g:a:1.0"]);
        assert!(matches!(args.command, Some(Command::Unignore(_))));

        let args = CliArgs::parse_from(["feraldeps", "ignored"]);
        let Some(Command::Ignored { manifest }) = args.command else {
            panic!("expected ignored subcommand");
        };
        assert_eq!(manifest, PathBuf::from("pom.xml"));
    }

    #[test]
    fn test_ignore_key_validation() {
        assert!(CliArgs::try_parse_from(["feraldeps", "ignore", "pom.xml", "g:a"]).is_err());
        assert!(CliArgs::try_parse_from(["feraldeps", "ignore", "pom.xml", ":a:1"]).is_err());
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("junit:junit").unwrap(),
            ("junit".to_string(), "junit".to_string())
        );
        assert!(parse_coordinate("").is_err());
        assert!(parse_coordinate("a:").is_err());
        assert!(parse_coordinate("a:b:c").is_err());
    }
}
