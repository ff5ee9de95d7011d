use anyhow::Result;
use std::path::PathBuf;

use crate::core::engine::ExpansionStats;

/// What happened to a single root file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootReport {
    pub root: PathBuf,
    pub stats: ExpansionStats,
    /// Lines in the rendered output, preamble included.
    pub line_count: usize,
    pub destinations: Vec<PathBuf>,
}

/// The summary of a whole run, roots in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub roots: Vec<RootReport>,
}

impl RunReport {
    pub fn total_includes(&self) -> usize {
        self.roots.iter().map(|r| r.stats.includes_inlined).sum()
    }

    pub fn total_outputs(&self) -> usize {
        self.roots.iter().map(|r| r.destinations.len()).sum()
    }
}

/// The `StatusReporter` trait turns a finished run into user-facing output.
pub trait StatusReporter {
    /// Presents the outcome of a run.
    ///
    /// # Arguments
    /// * `report`: Per-root results, in processing order.
    ///
    /// # Returns
    /// `Ok(())` once the report has been emitted; an error only when the
    /// report itself could not be written.
    fn generate_run_report(&self, report: &RunReport) -> Result<()>;
}

/// Prints the run summary to standard output.
pub struct ConsoleReporter {
    verbose: bool,
    dry_run: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool, dry_run: bool) -> Self {
        Self { verbose, dry_run }
    }

    /// Formats the one-line summary for a root file.
    fn format_root_status(&self, root: &RootReport) -> String {
        let status_icon = if root.stats.unresolved.is_empty() {
            "🟢"
        } else {
            "🟡"
        };

        format!(
            "{} {} ({} includes inlined, {} left external, {} guards neutralized, {} lines)",
            status_icon,
            root.root.display(),
            root.stats.includes_inlined,
            root.stats.unresolved.len(),
            root.stats.guards_neutralized,
            root.line_count
        )
    }
}

impl StatusReporter for ConsoleReporter {
    fn generate_run_report(&self, report: &RunReport) -> Result<()> {
        println!("📊 Amalgamation Report");
        println!("======================");

        if report.roots.is_empty() {
            println!("No files amalgamated.");
            return Ok(());
        }

        for root in &report.roots {
            println!("{}", self.format_root_status(root));

            let verb = if self.dry_run { "would write" } else { "wrote" };
            for destination in &root.destinations {
                println!("  └─ {verb} {}", destination.display());
            }

            if self.verbose {
                for include in &root.stats.unresolved {
                    println!("  └─ external: {include}");
                }
            }
        }

        println!("\n📈 Summary:");
        println!("  Root files: {}", report.roots.len());
        println!("  Includes inlined: {}", report.total_includes());
        println!("  Output files: {}", report.total_outputs());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RunReport {
        RunReport {
            roots: vec![
                RootReport {
                    root: "a.h".into(),
                    stats: ExpansionStats {
                        includes_inlined: 2,
                        guards_neutralized: 3,
                        unresolved: vec!["vector".to_string()],
                    },
                    line_count: 40,
                    destinations: vec!["out1/a.h".into(), "out2/a.h".into()],
                },
                RootReport {
                    root: "b.h".into(),
                    stats: ExpansionStats::default(),
                    line_count: 1,
                    destinations: vec!["b.h.amalgamated".into()],
                },
            ],
        }
    }

    #[test]
    fn test_totals() {
        let report = sample();
        assert_eq!(report.total_includes(), 2);
        assert_eq!(report.total_outputs(), 3);
    }

    #[test]
    fn test_root_status_line() {
        let reporter = ConsoleReporter::new(false, false);
        let report = sample();
        assert_eq!(
            reporter.format_root_status(&report.roots[0]),
            "🟡 a.h (2 includes inlined, 1 left external, 3 guards neutralized, 40 lines)"
        );
        assert!(reporter.format_root_status(&report.roots[1]).starts_with("🟢 b.h"));
    }
}
