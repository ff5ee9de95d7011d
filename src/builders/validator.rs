use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::builders::writer::OutputTarget;
use crate::core::config::AmalgamateConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Processing must not start.
    Error,
    /// Worth telling the user, harmless for the run.
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
}

impl ValidationIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.message),
            Severity::Warning => write!(f, "warning: {}", self.message),
        }
    }
}

/// The `ConfigValidator` trait checks a resolved run configuration before
/// any file is read.
pub trait ConfigValidator {
    /// Checks `config` without reading any input file.
    ///
    /// # Arguments
    /// * `config`: The resolved settings of the run.
    ///
    /// # Returns
    /// Every issue found; an empty list means the run may proceed. Only
    /// issues of [`Severity::Error`] block the run.
    fn validate_config(&self, config: &AmalgamateConfig) -> Result<Vec<ValidationIssue>>;
}

/// The checks applied to every invocation of the command line tool.
pub struct StandardValidator;

impl StandardValidator {
    pub fn new() -> Self {
        Self
    }

    /// The sibling extension ends up inside a file name, so it must not be
    /// empty or able to leave the source directory.
    fn check_extension(&self, ext: &str) -> Option<ValidationIssue> {
        if ext.is_empty() {
            return Some(ValidationIssue::error(
                "Output extension is empty; the source file would be overwritten",
            ));
        }
        if ext.contains(['/', '\\']) {
            return Some(ValidationIssue::error(format!(
                "Output extension '{ext}' must not contain a path separator"
            )));
        }
        None
    }

    fn same_file(a: &Path, b: &Path) -> bool {
        match (a.canonicalize(), b.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => normalized(a) == normalized(b),
        }
    }
}

/// Lexically drops `.` components so `./a.h` and `a.h` compare equal.
fn normalized(path: &Path) -> Vec<Component<'_>> {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &AmalgamateConfig) -> Result<Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        if config.files.is_empty() {
            issues.push(ValidationIssue::error("No input files given"));
        }

        for file in &config.files {
            if !file.is_file() {
                issues.push(ValidationIssue::error(format!(
                    "Input file not found: {}",
                    file.display()
                )));
            }
        }

        for dir in &config.incdirs {
            if !dir.is_dir() {
                issues.push(ValidationIssue::warning(format!(
                    "Include directory not found: {}",
                    dir.display()
                )));
            }
        }

        match &config.target {
            OutputTarget::Sibling { ext } => issues.extend(self.check_extension(ext)),
            OutputTarget::Directories(dirs) => {
                for dir in dirs {
                    if dir.exists() && !dir.is_dir() {
                        issues.push(ValidationIssue::error(format!(
                            "Output directory is a file: {}",
                            dir.display()
                        )));
                    } else if !dir.exists() {
                        issues.push(ValidationIssue::warning(format!(
                            "Output directory will be created: {}",
                            dir.display()
                        )));
                    }
                }
            }
        }

        // Writing over an input would destroy it before a later root reads it,
        // and two roots sharing a destination would silently lose one output.
        let mut claimed = HashSet::new();
        for file in config.files.iter().filter(|f| f.file_name().is_some()) {
            for destination in config.target.destinations(file)? {
                if config.files.iter().any(|f| Self::same_file(f, &destination)) {
                    issues.push(ValidationIssue::error(format!(
                        "Output '{}' would overwrite an input file",
                        destination.display()
                    )));
                }
                if !claimed.insert(normalized(&destination).into_iter().collect::<PathBuf>()) {
                    issues.push(ValidationIssue::error(format!(
                        "Output '{}' would be written by more than one input file",
                        destination.display()
                    )));
                }
            }
        }

        if let Some(preamble) = &config.preamble
            && !preamble.is_file()
        {
            issues.push(ValidationIssue::error(format!(
                "Preamble template not found: {}",
                preamble.display()
            )));
        }

        Ok(issues)
    }
}
