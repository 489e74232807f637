//! feraldeps - Maven dependency auditor CLI tool
//!
//! Scans pom.xml files for outdated and vulnerable dependencies, manages a
//! per-project ignore list, and applies single-dependency upgrades with
//! optional build verification.

use anyhow::Context;
use clap::Parser;
use feraldeps::cli::{CliArgs, Command, IgnoreArgs, ScanArgs, UpdateArgs};
use feraldeps::config::{Config, ConfigOverrides};
use feraldeps::error::UpdateError;
use feraldeps::ignore::IgnoreRegistry;
use feraldeps::manifest::parse_manifest;
use feraldeps::oracle::{CachingOracle, OfflineOracle, RemoteOracle, VulnerabilityOracle};
use feraldeps::orchestrator::{CancelFlag, Orchestrator};
use feraldeps::output::{create_formatter, OutputConfig, OutputFormatter};
use feraldeps::update::{Applied, UpdateEngine};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;

/// An update could not be applied or did not verify
const EXIT_UPDATE_FAILED: u8 = 2;
/// At least one manifest could not be read or parsed
const EXIT_PARSE_FAILURE: u8 = 3;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    feraldeps::logging::init(args.verbose, args.quiet);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let output_config = OutputConfig::from_cli(
        args.json,
        args.verbose,
        args.quiet,
        args.scan.show_ignored,
    )
    .with_color(io::stdout().is_terminal());
    let formatter = create_formatter(output_config);

    match &args.command {
        None => scan(&args, &args.scan, formatter.as_ref()).await,
        Some(Command::Update(update_args)) => update(update_args, formatter.as_ref()).await,
        Some(Command::Ignore(ignore_args)) => {
            change_ignore(&args, ignore_args, true, formatter.as_ref())
        }
        Some(Command::Unignore(ignore_args)) => {
            change_ignore(&args, ignore_args, false, formatter.as_ref())
        }
        Some(Command::Ignored { manifest }) => {
            let config = Config::for_manifest(manifest)?;
            let registry = IgnoreRegistry::load(config.ignore_path(manifest));
            let mut stdout = io::stdout().lock();
            formatter.format_ignore_list(&registry, &mut stdout)?;
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Default command: report on every manifest
async fn scan(
    args: &CliArgs,
    scan_args: &ScanArgs,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    // Project settings come from the first manifest's directory
    let mut config = match scan_args.manifests.first() {
        Some(first) => Config::for_manifest(first)?,
        None => Config::default(),
    };
    config.apply_overrides(&ConfigOverrides {
        concurrency: scan_args.concurrency.map(|c| c as usize),
        ..Default::default()
    });

    if args.verbose {
        eprintln!("feraldeps v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Concurrency: {}", config.concurrency);
        if scan_args.offline {
            eprintln!("Mode: offline");
        }
    }

    let oracle: Arc<dyn VulnerabilityOracle> = if scan_args.offline {
        Arc::new(OfflineOracle)
    } else {
        let remote =
            RemoteOracle::from_config(&config.oracle).context("failed to create HTTP client")?;
        Arc::new(CachingOracle::new(remote))
    };

    let cancel = CancelFlag::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Cancelling after the current manifest...");
                cancel.cancel();
            }
        })
    };

    let show_progress = !args.json && !args.quiet && io::stderr().is_terminal();
    let orchestrator = Orchestrator::new(oracle)
        .with_concurrency(config.concurrency)
        .with_ignore_file(config.ignore_file.clone())
        .with_cancel_flag(cancel)
        .with_progress(show_progress);

    let session = orchestrator.scan(&scan_args.manifests).await;
    ctrl_c.abort();

    let mut stdout = io::stdout().lock();
    formatter.format_session(&session, &mut stdout)?;
    stdout.flush()?;

    if session.has_parse_failures() {
        Ok(ExitCode::from(EXIT_PARSE_FAILURE))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// `update` subcommand
async fn update(
    update_args: &UpdateArgs,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    let manifest = &update_args.manifest;
    let (group_id, artifact_id) = &update_args.coordinate;

    let mut config = Config::for_manifest(manifest)?;
    config.apply_overrides(&ConfigOverrides {
        verify_timeout_secs: update_args.verify_timeout,
        match_policy: update_args.match_policy(),
        ..Default::default()
    });

    // The current version is needed for reporting and for reverting
    let dependencies = match parse_manifest(manifest) {
        Ok(deps) => deps,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
        }
    };
    let Some(dependency) = dependencies
        .into_iter()
        .find(|d| &d.group_id == group_id && &d.artifact_id == artifact_id)
    else {
        let error = UpdateError::not_found(
            format!("{}:{}", group_id, artifact_id),
            &update_args.version,
            manifest,
        );
        eprintln!("Error: {}", error);
        return Ok(ExitCode::from(EXIT_UPDATE_FAILED));
    };

    let engine = UpdateEngine::from_config(&config);
    let applied = match engine
        .apply(&dependency, &update_args.version, manifest, update_args.mode())
        .await
    {
        Ok(applied) => applied,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(EXIT_UPDATE_FAILED));
        }
    };

    let outcome = match applied {
        Applied::Done(outcome) => outcome,
        Applied::NeedsDecision(pending) => {
            {
                let mut stderr = io::stderr().lock();
                formatter.format_update(pending.outcome(), &mut stderr)?;
            }
            if confirm_revert().await? {
                pending.revert().await?
            } else {
                pending.keep()
            }
        }
    };

    let mut stdout = io::stdout().lock();
    formatter.format_update(&outcome, &mut stdout)?;
    stdout.flush()?;

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_UPDATE_FAILED))
    }
}

/// Ask whether to revert a failed update; anything but "n" reverts
async fn confirm_revert() -> anyhow::Result<bool> {
    eprint!("Revert to the original version? [Y/n] ");
    io::stderr().flush()?;

    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;

    let answer = answer.trim().to_ascii_lowercase();
    Ok(!(answer == "n" || answer == "no"))
}

/// `ignore` and `unignore` subcommands
fn change_ignore(
    args: &CliArgs,
    ignore_args: &IgnoreArgs,
    ignore: bool,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    let config = Config::for_manifest(&ignore_args.manifest)?;
    let mut registry = IgnoreRegistry::load(config.ignore_path(&ignore_args.manifest));
    let key = &ignore_args.dependency;

    let changed = if ignore {
        registry.ignore_key(key)?
    } else {
        registry.unignore_key(key)?
    };

    if args.json {
        let mut stdout = io::stdout().lock();
        formatter.format_ignore_list(&registry, &mut stdout)?;
        stdout.flush()?;
    } else if !args.quiet {
        let message = match (ignore, changed) {
            (true, true) => format!("Ignored {}", key),
            (true, false) => format!("{} is already ignored", key),
            (false, true) => format!("Unignored {}", key),
            (false, false) => format!("{} was not ignored", key),
        };
        println!("{}", message);
    }

    Ok(ExitCode::SUCCESS)
}
