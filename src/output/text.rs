//! Text output formatter for human-readable display
//!
//! This module provides:
//! - One report block per dependency, in document order
//! - Locked-version warnings for outdated and vulnerable dependencies
//! - Remediation steps for vulnerable dependencies
//! - Update, verification and revert messages
//! - Summary with bucket counts

use crate::domain::DependencyReport;
use crate::ignore::IgnoreRegistry;
use crate::orchestrator::ScanSession;
use crate::output::{OutputFormatter, Verbosity};
use crate::update::{UpdateOutcome, UpdateState};
use colored::{ColoredString, Colorize};
use std::io::Write;

/// Text formatter for human-readable output
pub struct TextFormatter {
    /// Verbosity level
    verbosity: Verbosity,
    /// Whether to list ignored dependencies
    show_ignored: bool,
    /// Whether to use colors
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity, show_ignored: bool, color: bool) -> Self {
        Self {
            verbosity,
            show_ignored,
            color,
        }
    }

    /// Apply a style only when colors are enabled
    fn paint(&self, text: &str, style: fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    fn needs_attention(report: &DependencyReport) -> bool {
        report.is_outdated() || report.is_vulnerable()
    }

    /// Format one dependency block
    fn format_dependency(
        &self,
        report: &DependencyReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let dep = &report.dependency;
        let locked = report.version_class.is_locked();

        writeln!(writer, "• {}", self.paint(&dep.key(), |s| s.bold()))?;
        writeln!(writer, "  Scope: {}", dep.scope)?;
        writeln!(
            writer,
            "  Version Constraint: {}",
            report.version_class.description()
        )?;

        if report.is_outdated() {
            if let Some(latest) = &report.lookup.latest_version {
                writeln!(
                    writer,
                    "  {}{}",
                    self.paint("Outdated → latest: ", |s| s.yellow()),
                    self.paint(latest, |s| s.bright_white().bold())
                )?;
            }
            if locked {
                writeln!(
                    writer,
                    "  {}",
                    self.paint(
                        "⚠️  WARNING: Version is locked - upgrading may require code changes",
                        |s| s.yellow()
                    )
                )?;
            }
        }

        if report.is_vulnerable() {
            writeln!(
                writer,
                "  {}",
                self.paint("⚠️  Known vulnerable version", |s| s.red().bold())
            )?;
            if locked {
                writeln!(
                    writer,
                    "  {}",
                    self.paint(
                        "⚠️  CRITICAL: Vulnerable version is LOCKED - upgrade blocked by version constraint",
                        |s| s.red().bold()
                    )
                )?;
            }
            self.format_remediation(report, writer)?;
        }

        if self.verbosity == Verbosity::Verbose {
            for error in &report.lookup.errors {
                writeln!(
                    writer,
                    "  {}",
                    self.paint(&format!("Lookup failed: {}", error), |s| s.dimmed())
                )?;
            }
        }

        writeln!(writer)
    }

    /// Format remediation steps for a vulnerable dependency
    fn format_remediation(
        &self,
        report: &DependencyReport,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let Some(remediation) = &report.lookup.remediation else {
            return Ok(());
        };

        if remediation.has_remediation && !remediation.fixed_versions.is_empty() {
            writeln!(
                writer,
                "  {}",
                self.paint("URGENT Remediation: Upgrade to secure version:", |s| s.red())
            )?;
            for fixed in &remediation.fixed_versions {
                writeln!(
                    writer,
                    "    • <version>{}</version> (fixes vulnerabilities)",
                    fixed
                )?;
            }
            if !remediation.summary.is_empty() {
                writeln!(
                    writer,
                    "  {}",
                    self.paint(&format!("Issue: {}", remediation.summary), |s| s.dimmed())
                )?;
            }
        } else if let Some(latest) = &report.lookup.latest_version {
            writeln!(
                writer,
                "  {}",
                self.paint(
                    &format!(
                        "URGENT Remediation: Update to secure version <version>{}</version>",
                        latest
                    ),
                    |s| s.red()
                )
            )?;
        } else {
            writeln!(
                writer,
                "  {}",
                self.paint(
                    "Remediation: Find secure alternative at mvnrepository.com",
                    |s| s.red()
                )
            )?;
        }
        Ok(())
    }

    fn format_ignored_section(
        &self,
        session: &ScanSession,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let ignored = session.ignored();
        if ignored.is_empty() {
            return Ok(());
        }

        writeln!(writer, "{}", self.paint("Ignored dependencies:", |s| s.bold()))?;
        for report in ignored {
            let mut notes = Vec::new();
            if let Some(latest) = report.lookup.latest_version.as_deref() {
                if report.is_outdated() {
                    notes.push(format!("latest: {}", latest));
                }
            }
            if report.is_vulnerable() {
                notes.push("vulnerable".to_string());
            }
            let notes = if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join(", "))
            };
            writeln!(
                writer,
                "  {} {}{}",
                self.paint("•", |s| s.dimmed()),
                report.dependency.key(),
                self.paint(&notes, |s| s.dimmed())
            )?;
        }
        writeln!(writer)
    }

    fn format_summary(&self, session: &ScanSession, writer: &mut dyn Write) -> std::io::Result<()> {
        let summary = session.summary();

        writeln!(
            writer,
            "{} {} file(s), {} dependencies: {} outdated, {} vulnerable, {} ignored",
            self.paint("Summary:", |s| s.bold()),
            summary.files,
            summary.dependencies,
            self.paint(&summary.outdated.to_string(), |s| s.yellow()),
            self.paint(&summary.vulnerable.to_string(), |s| s.red()),
            self.paint(&summary.ignored.to_string(), |s| s.dimmed()),
        )?;
        if summary.parse_failures > 0 {
            writeln!(
                writer,
                "  {}",
                self.paint(
                    &format!("{} manifest(s) could not be parsed", summary.parse_failures),
                    |s| s.red()
                )
            )?;
        }
        if session.cancelled {
            writeln!(
                writer,
                "  {}",
                self.paint("Scan cancelled; results are partial", |s| s.yellow())
            )?;
        }
        Ok(())
    }

    fn format_output_tail(&self, outcome: &UpdateOutcome, writer: &mut dyn Write) -> std::io::Result<()> {
        if let Some(tail) = &outcome.output_tail {
            writeln!(writer)?;
            writeln!(writer, "Build output:")?;
            write!(writer, "{}", self.paint(tail, |s| s.dimmed()))?;
            if !tail.ends_with('\n') {
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}

impl OutputFormatter for TextFormatter {
    fn format_session(
        &self,
        session: &ScanSession,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(writer, "FeralDeps scan results:")?;
        writeln!(writer)?;

        let multiple = session.manifests.len() > 1;
        for manifest in &session.manifests {
            if let Some(error) = &manifest.error {
                writeln!(writer, "{} {}", self.paint("✗", |s| s.red()), error)?;
                writeln!(writer)?;
                continue;
            }

            if multiple {
                writeln!(
                    writer,
                    "{}",
                    self.paint(&manifest.path.display().to_string(), |s| s.bold().underline())
                )?;
                writeln!(writer)?;
            }

            for report in manifest.dependencies.iter().filter(|r| !r.ignored) {
                if self.verbosity == Verbosity::Quiet && !Self::needs_attention(report) {
                    continue;
                }
                self.format_dependency(report, writer)?;
            }
        }

        if self.show_ignored {
            self.format_ignored_section(session, writer)?;
        }

        self.format_summary(session, writer)
    }

    fn format_update(
        &self,
        outcome: &UpdateOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let change = format!(
            "{}: {} → {}",
            outcome.coordinate, outcome.old_version, outcome.new_version
        );
        let file = outcome.path.display();

        match outcome.state {
            UpdateState::Written => {
                let lines: Vec<String> = outcome.matched_lines.iter().map(|l| l.to_string()).collect();
                writeln!(writer, "{} Updated {}", self.paint("✓", |s| s.green()), change)?;
                writeln!(writer, "  File: {} (line {})", file, lines.join(", "))?;
                writeln!(writer, "  Please rescan the project to see the changes.")?;
            }
            UpdateState::Verified => {
                writeln!(writer, "{} Update verified: {}", self.paint("✓", |s| s.green()), change)?;
                writeln!(writer, "  File: {}", file)?;
                writeln!(writer, "  Project compiled successfully with the new version.")?;
                writeln!(writer, "  Please rescan the project to see the changes.")?;
            }
            UpdateState::Reverted => {
                writeln!(
                    writer,
                    "{} Compilation failed with new version: {}",
                    self.paint("✗", |s| s.red()),
                    change
                )?;
                writeln!(writer, "  Reverted to original version: {}", outcome.old_version)?;
                self.format_output_tail(outcome, writer)?;
            }
            UpdateState::FailedKept => {
                writeln!(
                    writer,
                    "{} Compilation failed with new version: {}",
                    self.paint("⚠️ ", |s| s.yellow()),
                    change
                )?;
                writeln!(
                    writer,
                    "  Kept {} in {}; the update may have introduced breaking changes.",
                    outcome.new_version, file
                )?;
                self.format_output_tail(outcome, writer)?;
            }
            UpdateState::Failed => {
                writeln!(
                    writer,
                    "{} WARNING: Compilation failed with new version!",
                    self.paint("⚠️ ", |s| s.yellow())
                )?;
                writeln!(writer, "  {}", change)?;
                writeln!(writer, "  The update may have introduced breaking changes.")?;
                self.format_output_tail(outcome, writer)?;
            }
            UpdateState::Pending | UpdateState::Testing => {
                writeln!(writer, "{} ({})", change, outcome.state)?;
            }
        }
        Ok(())
    }

    fn format_ignore_list(
        &self,
        registry: &IgnoreRegistry,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        writeln!(
            writer,
            "{} ({})",
            self.paint("Ignored dependencies", |s| s.bold()),
            registry.path().display()
        )?;
        if registry.is_empty() {
            writeln!(writer, "  {}", self.paint("(none)", |s| s.dimmed()))?;
        }
        for entry in registry.entries() {
            writeln!(writer, "  • {}", entry)?;
        }
        Ok(())
    }
}
