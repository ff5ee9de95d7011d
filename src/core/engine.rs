use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::builders::directives::{Directive, DirectiveMatcher, LineClassifier};
use crate::builders::preamble::Preamble;
use crate::builders::reporter::{RootReport, RunReport};
use crate::builders::resolver::{IncludeResolver, SearchPath};
use crate::builders::writer::{OutputSink, OutputTarget};
use crate::core::config::AmalgamateConfig;
use crate::core::error::AmalgamateError;

/// Knobs that change the shape of the expansion output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Emit `// end of <directive>` after every inlined file.
    pub end_markers: bool,
}

/// Counters gathered while expanding one root file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionStats {
    pub includes_inlined: usize,
    pub guards_neutralized: usize,
    /// Include paths left as live directives, in the order they were met.
    pub unresolved: Vec<String>,
}

/// Output lines produced by a single expansion frame. A nested frame's state
/// is moved into its parent once the nested file is done.
#[derive(Debug, Default)]
struct ExpansionState {
    lines: Vec<String>,
}

impl ExpansionState {
    fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    fn append(&mut self, child: ExpansionState) {
        self.lines.extend(child.lines);
    }

    /// Makes sure the last emitted line carries a newline so whatever follows
    /// starts on its own line.
    fn terminate_last_line(&mut self) {
        if let Some(last) = self.lines.last_mut()
            && !last.ends_with('\n')
        {
            last.push('\n');
        }
    }
}

/// The complete rendering of one root file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amalgamation {
    pub root: PathBuf,
    /// Preamble lines followed by the expansion, each with its line terminator.
    pub lines: Vec<String>,
    pub stats: ExpansionStats,
}

impl Amalgamation {
    pub fn render(&self) -> String {
        self.lines.concat()
    }
}

/// Rewrites a directive into an inert comment that keeps the original text.
pub fn neutralize(line: &str) -> String {
    format!("// {line}")
}

fn end_marker(line: &str) -> String {
    format!("// end of {}\n", line.trim())
}

/// Inlines locally resolvable includes, neutralizes guards and prefixes the
/// preamble.
///
/// The engine holds no global state: logging is configured by the caller and
/// everything else lives in the engine value, so independent engines can run
/// side by side.
pub struct AmalgamationEngine<C = DirectiveMatcher, R = SearchPath> {
    classifier: C,
    resolver: R,
    preamble: Preamble,
    options: ExpandOptions,
}

impl AmalgamationEngine {
    /// Builds the engine for a run. The preamble template is read here, once,
    /// so a missing template fails the run before any root is touched.
    pub fn new(config: &AmalgamateConfig) -> Result<Self> {
        let preamble = Preamble::load(config.preamble.as_deref(), &config.metadata)?;

        Ok(Self::with_parts(
            DirectiveMatcher::new()?,
            SearchPath::new(config.incdirs.clone()),
            preamble,
            ExpandOptions {
                end_markers: config.end_markers,
            },
        ))
    }
}

impl<C: LineClassifier, R: IncludeResolver> AmalgamationEngine<C, R> {
    /// Assembles an engine from explicit parts instead of a run config.
    ///
    /// # Arguments
    /// * `classifier`: Recognizes guard and include lines.
    /// * `resolver`: Maps include paths to files.
    /// * `preamble`: Already substituted lines put in front of every output.
    /// * `options`: Shape of the expansion output.
    pub fn with_parts(classifier: C, resolver: R, preamble: Preamble, options: ExpandOptions) -> Self {
        Self {
            classifier,
            resolver,
            preamble,
            options,
        }
    }

    pub fn preamble(&self) -> &Preamble {
        &self.preamble
    }

    /// Reads `root` and returns its amalgamation with the preamble in front.
    ///
    /// # Errors
    /// Fails when the root or any resolved include cannot be read, or when an
    /// include chain leads back to a file that is still being expanded.
    pub fn amalgamate(&self, root: &Path) -> Result<Amalgamation> {
        info!("reading from '{}'", root.display());
        let content = fs::read_to_string(root)
            .with_context(|| format!("Failed to read root file '{}'", root.display()))?;
        let canonical = fs::canonicalize(root)
            .with_context(|| format!("Failed to resolve root file '{}'", root.display()))?;

        let mut chain = vec![canonical];
        let mut stats = ExpansionStats::default();
        let state = self.expand(&content, &mut chain, &mut stats)?;

        let mut lines = Vec::with_capacity(self.preamble.lines().len() + state.lines.len());
        lines.extend(self.preamble.lines().iter().cloned());
        lines.extend(state.lines);

        Ok(Amalgamation {
            root: root.to_path_buf(),
            lines,
            stats,
        })
    }

    /// Expands one file's text. `chain` holds the canonical paths of every
    /// file currently being expanded, outermost first.
    fn expand(
        &self,
        content: &str,
        chain: &mut Vec<PathBuf>,
        stats: &mut ExpansionStats,
    ) -> Result<ExpansionState> {
        let mut state = ExpansionState::default();

        for line in content.split_inclusive('\n') {
            match self.classifier.classify(line) {
                Directive::Guard => {
                    stats.guards_neutralized += 1;
                    state.push(neutralize(line));
                }
                Directive::Include { path, delimiter } => {
                    trace!(depth = chain.len(), %delimiter, "searched {}", line.trim());
                    let Some(resolved) = self.resolver.resolve(path) else {
                        debug!("leaving unresolved include '{path}' in place");
                        stats.unresolved.push(path.to_string());
                        state.push(line.to_string());
                        continue;
                    };

                    state.push(neutralize(line));
                    state.terminate_last_line();
                    let child = self.expand_included(&resolved, chain, stats)?;
                    state.append(child);
                    stats.includes_inlined += 1;

                    if self.options.end_markers {
                        state.push(end_marker(line));
                    }
                }
                Directive::Plain => state.push(line.to_string()),
            }
        }

        Ok(state)
    }

    fn expand_included(
        &self,
        resolved: &Path,
        chain: &mut Vec<PathBuf>,
        stats: &mut ExpansionStats,
    ) -> Result<ExpansionState> {
        let includer = chain.last().cloned().unwrap_or_default();
        let content = fs::read_to_string(resolved).with_context(|| {
            format!(
                "Failed to read included file '{}' (included from '{}')",
                resolved.display(),
                includer.display()
            )
        })?;
        let canonical = fs::canonicalize(resolved)
            .with_context(|| format!("Failed to resolve included file '{}'", resolved.display()))?;

        if chain.contains(&canonical) {
            let mut cycle = chain.clone();
            cycle.push(canonical);
            return Err(AmalgamateError::IncludeCycle { chain: cycle }.into());
        }

        debug!(depth = chain.len(), "inlining '{}'", resolved.display());
        chain.push(canonical);
        let result = self.expand(&content, chain, stats);
        chain.pop();

        let mut child = result?;
        child.terminate_last_line();
        Ok(child)
    }

    /// Amalgamates every root in order and hands each result to `sink` once
    /// per destination. Stops at the first failure; destinations already
    /// written stay on disk.
    ///
    /// # Arguments
    /// * `roots`: The root files, processed in this order.
    /// * `target`: Decides the destination paths of each root.
    /// * `sink`: Receives every rendered output.
    ///
    /// # Returns
    /// A [`RunReport`] with one entry per root.
    pub fn generate(
        &self,
        roots: &[PathBuf],
        target: &OutputTarget,
        sink: &mut dyn OutputSink,
    ) -> Result<RunReport> {
        let mut report = RunReport::default();

        for root in roots {
            let amalgamation = self.amalgamate(root)?;
            let rendered = amalgamation.render();
            let destinations = target.destinations(root)?;

            for destination in &destinations {
                info!("writing to   '{}'", destination.display());
                sink.write(destination, &rendered)?;
            }

            report.roots.push(RootReport {
                root: root.clone(),
                line_count: amalgamation.lines.len(),
                stats: amalgamation.stats,
                destinations,
            });
        }

        Ok(report)
    }
}
