use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

use crate::core::config::ProjectMetadata;

/// Placeholder replaced by the project name.
pub const PROJECT_PLACEHOLDER: &str = "@PROJECT@";
/// Placeholder replaced by the version string.
pub const VERSION_PLACEHOLDER: &str = "@VERSION@";
/// Placeholder replaced by the project URL.
pub const URL_PLACEHOLDER: &str = "@URL@";

/// Matches any of the known placeholders in one pass.
const PLACEHOLDER_PATTERN: &str = r"@(PROJECT|VERSION|URL)@";

/// The lines prepended to every generated amalgamation.
///
/// A `Preamble` is built once per run and only ever read afterwards, so the
/// same value is shared by every root file. A non-empty preamble always ends
/// with a newline, so the root's first line starts on a line of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preamble {
    lines: Vec<String>,
}

impl Preamble {
    /// A preamble that adds nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a template file and substitutes the project placeholders.
    ///
    /// Passing `None` yields an empty preamble. A template that cannot be read
    /// is an error; callers treat it as fatal for the whole run.
    ///
    /// # Arguments
    /// * `template`: Optional path to the template file.
    /// * `metadata`: The values substituted for `@PROJECT@`, `@VERSION@` and `@URL@`.
    ///
    /// # Returns
    /// `Result<Preamble>` holding the substituted lines, or an error naming the
    /// template path if it could not be read.
    pub fn load(template: Option<&Path>, metadata: &ProjectMetadata) -> Result<Self> {
        let Some(template) = template else {
            return Ok(Self::empty());
        };

        let content = fs::read_to_string(template).with_context(|| {
            format!("Failed to read preamble template '{}'", template.display())
        })?;

        Self::from_template(&content, metadata)
    }

    /// Builds a preamble from template text already in memory.
    ///
    /// # Arguments
    /// * `content`: The raw template text.
    /// * `metadata`: The placeholder values.
    ///
    /// # Returns
    /// `Result<Preamble>`; only fails if the placeholder pattern does not compile.
    pub fn from_template(content: &str, metadata: &ProjectMetadata) -> Result<Self> {
        let placeholders =
            Regex::new(PLACEHOLDER_PATTERN).context("Invalid placeholder pattern")?;

        let mut lines: Vec<String> = content
            .split_inclusive('\n')
            .map(|line| substitute(&placeholders, line, metadata))
            .collect();

        if let Some(last) = lines.last_mut()
            && !last.ends_with('\n')
        {
            last.push('\n');
        }

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Replaces every known placeholder in `line`, scanning the line once.
///
/// Text inserted for one placeholder is never scanned again, so a project
/// name that itself contains `@VERSION@` is copied through literally.
/// Unknown `@NAME@` tokens are left exactly as written.
///
/// # Arguments
/// * `placeholders`: The compiled `@(PROJECT|VERSION|URL)@` pattern.
/// * `line`: One template line, terminator included.
/// * `metadata`: The values to insert.
pub fn substitute(placeholders: &Regex, line: &str, metadata: &ProjectMetadata) -> String {
    placeholders
        .replace_all(line, |caps: &Captures| match &caps[1] {
            "PROJECT" => metadata.name.clone(),
            "VERSION" => metadata.version.clone(),
            "URL" => metadata.url.clone(),
            other => format!("@{other}@"),
        })
        .into_owned()
}
