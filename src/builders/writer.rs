use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::AmalgamateError;

/// Where the amalgamation of each root file goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// One copy per directory, named after the root's base name.
    Directories(Vec<PathBuf>),
    /// A single file beside the root, named `<root file name>.<ext>`.
    Sibling { ext: String },
}

impl OutputTarget {
    /// Chooses the target from the configured output directories: any
    /// directory at all means fan-out, none means a sibling file.
    pub fn new(outdirs: Vec<PathBuf>, ext: impl Into<String>) -> Self {
        if outdirs.is_empty() {
            Self::Sibling { ext: ext.into() }
        } else {
            Self::Directories(outdirs)
        }
    }

    /// Computes every destination path for `root`, in configuration order.
    ///
    /// # Arguments
    /// * `root`: The root file being amalgamated.
    ///
    /// # Returns
    /// One path per output directory, or the single sibling path.
    ///
    /// # Errors
    /// Fails with [`AmalgamateError::NoFileName`] when `root` has no final
    /// component, e.g. `..` or `/`.
    pub fn destinations(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let file_name = root
            .file_name()
            .ok_or_else(|| AmalgamateError::NoFileName(root.to_path_buf()))?;

        Ok(match self {
            OutputTarget::Directories(dirs) => dirs.iter().map(|dir| dir.join(file_name)).collect(),
            OutputTarget::Sibling { ext } => {
                let mut name = file_name.to_os_string();
                name.push(".");
                name.push(ext);
                vec![root.with_file_name(name)]
            }
        })
    }
}

/// The `OutputSink` trait abstracts where rendered amalgamations are stored.
pub trait OutputSink {
    /// Writes `contents` to `destination`, replacing anything already there.
    ///
    /// # Arguments
    /// * `destination`: The full output path, as returned by
    ///   [`OutputTarget::destinations`].
    /// * `contents`: The rendered amalgamation.
    ///
    /// # Returns
    /// `Ok(())` once the output is stored. Implementations may be called
    /// several times for one root, once per destination.
    fn write(&mut self, destination: &Path, contents: &str) -> Result<()>;
}

/// Writes amalgamations to the filesystem, creating parent directories first.
#[derive(Debug, Default)]
pub struct FileSink;

impl FileSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for FileSink {
    fn write(&mut self, destination: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = destination.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory '{}'", parent.display())
            })?;
        }

        fs::write(destination, contents)
            .with_context(|| format!("Failed to write '{}'", destination.display()))?;
        Ok(())
    }
}

/// Keeps amalgamations in memory. Used by `--dry-run` and by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: BTreeMap<PathBuf, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            outputs: BTreeMap::new(),
        }
    }

    pub fn get(&self, destination: &Path) -> Option<&str> {
        self.outputs.get(destination).map(String::as_str)
    }

    pub fn outputs(&self) -> &BTreeMap<PathBuf, String> {
        &self.outputs
    }
}

impl OutputSink for MemorySink {
    fn write(&mut self, destination: &Path, contents: &str) -> Result<()> {
        self.outputs
            .insert(destination.to_path_buf(), contents.to_string());
        Ok(())
    }
}
