//! In-place version rewriting for pom.xml
//!
//! This module provides:
//! - A line-based rewrite that touches only matched `<version>` lines
//! - Configurable match policy (every matching block, or only the first)
//! - Atomic write-back so a manifest is never left half written
//!
//! Lines are matched textually: a block starts at a line that trims to
//! `<dependency>`, and its version line is rewritten once both
//! `<groupId>g</groupId>` and `<artifactId>a</artifactId>` have been seen.
//! Every other byte of the file, including line terminators, is preserved.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which `<dependency>` blocks a rewrite applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Every block with the same groupId and artifactId, whatever its version
    #[default]
    All,
    /// Only the first matching block in document order
    First,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(MatchPolicy::All),
            "first" => Ok(MatchPolicy::First),
            other => Err(format!(
                "invalid match policy '{}': expected 'all' or 'first'",
                other
            )),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::All => write!(f, "all"),
            MatchPolicy::First => write!(f, "first"),
        }
    }
}

/// Result of rewriting manifest text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The rewritten content
    pub content: String,
    /// 1-based numbers of the `<version>` lines that were rewritten
    pub matched_lines: Vec<usize>,
    /// Whether the content differs from the input
    pub changed: bool,
}

/// Split a line into its body and terminator (`\r\n`, `\n` or nothing)
fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}

/// Byte range of the `<version>...</version>` element on a line
///
/// Both tags must sit on the same line; a split element is left alone since
/// rewriting half of it would break the document.
fn version_element(body: &str) -> Option<(usize, usize)> {
    let start = body.find("<version>")?;
    let end = body[start..].find("</version>")? + start + "</version>".len();
    Some((start, end))
}

/// Replace the version element on a line, keeping what surrounds it
fn replace_version_element(body: &str, (start, end): (usize, usize), new_version: &str) -> String {
    format!(
        "{}<version>{}</version>{}",
        &body[..start],
        new_version,
        &body[end..]
    )
}

/// Rewrite the version of every matching dependency block
pub fn rewrite_version(
    content: &str,
    group_id: &str,
    artifact_id: &str,
    new_version: &str,
    policy: MatchPolicy,
) -> RewriteOutcome {
    let group_tag = format!("<groupId>{}</groupId>", group_id);
    let artifact_tag = format!("<artifactId>{}</artifactId>", artifact_id);

    let mut output = String::with_capacity(content.len() + new_version.len());
    let mut matched_lines = Vec::new();

    let mut in_target = false;
    let mut found_group = false;
    let mut found_artifact = false;
    let mut done = false;

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        let (body, terminator) = split_terminator(line);
        let trimmed = body.trim();

        if !done && trimmed == "<dependency>" {
            in_target = true;
            found_group = false;
            found_artifact = false;
        }

        if in_target {
            if body.contains(&group_tag) {
                found_group = true;
            }
            if body.contains(&artifact_tag) {
                found_artifact = true;
            }

            if let Some(element) = version_element(body).filter(|_| found_group && found_artifact) {
                output.push_str(&replace_version_element(body, element, new_version));
                output.push_str(terminator);
                matched_lines.push(idx + 1);
                in_target = false;
                if policy == MatchPolicy::First {
                    done = true;
                }
                continue;
            }

            if trimmed == "</dependency>" {
                in_target = false;
            }
        }

        output.push_str(line);
    }

    let changed = output != content;
    RewriteOutcome {
        content: output,
        matched_lines,
        changed,
    }
}

/// Read a manifest file
pub async fn read_manifest(path: &Path) -> std::io::Result<String> {
    tokio::fs::read_to_string(path).await
}

/// Write content to a manifest through a sibling temp file and rename
///
/// Readers observe either the old or the new content, never a mix.
pub async fn write_manifest(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp = temp_path(path);
    if let Err(e) = tokio::fs::write(&tmp, content).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Sibling temp file used for atomic replacement of `path`
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pom.xml".to_string());
    path.with_file_name(format!(".{}.feraldeps-tmp", name))
}
