use std::path::PathBuf;

/// Failures of the amalgamation engine that callers may want to tell apart.
///
/// Plain I/O failures are not listed here; they travel as `anyhow::Error`
/// with the offending path attached as context.
#[derive(Debug, thiserror::Error)]
pub enum AmalgamateError {
    #[error("no input files given")]
    NoInputFiles,

    #[error("include cycle detected: {}", format_chain(.chain))]
    IncludeCycle { chain: Vec<PathBuf> },

    #[error("cannot derive an output file name from '{}'", .0.display())]
    NoFileName(PathBuf),

    #[error("invalid invocation:\n{0}")]
    InvalidInvocation(String),
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_chain() {
        let err = AmalgamateError::IncludeCycle {
            chain: vec!["a.h".into(), "b.h".into(), "a.h".into()],
        };
        assert_eq!(err.to_string(), "include cycle detected: a.h -> b.h -> a.h");
    }
}
