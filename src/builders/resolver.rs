use std::path::{Path, PathBuf};
use tracing::trace;

/// Trait defining how an include path is turned into a file on disk.
/// The engine only depends on this trait, which keeps the search strategy
/// swappable in tests.
pub trait IncludeResolver {
    /// Looks up the file an include directive refers to.
    ///
    /// # Arguments
    /// * `include`: The path exactly as written between the delimiters.
    ///
    /// # Returns
    /// The file to inline, or `None` when the directive should be left
    /// untouched.
    fn resolve(&self, include: &str) -> Option<PathBuf>;
}

/// An ordered list of search directories. The first directory containing
/// the requested file wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl IncludeResolver for SearchPath {
    fn resolve(&self, include: &str) -> Option<PathBuf> {
        let include = Path::new(include);
        for dir in &self.dirs {
            let candidate = dir.join(include);
            trace!(candidate = %candidate.display(), "probing include candidate");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}
