use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::builders::reporter::{ConsoleReporter, RunReport, StatusReporter};
use crate::builders::validator::{ConfigValidator, StandardValidator};
use crate::builders::writer::{FileSink, MemorySink, OutputSink, OutputTarget};
use crate::core::config::{AmalgamateConfig, ConfigFormat, ConfigManager, Invocation};
use crate::core::engine::AmalgamationEngine;
use crate::core::error::AmalgamateError;
use crate::core::logging;

/// Entry point of a normal `amalgamate <FILES>...` invocation.
pub fn amalgamate_files(invocation: Invocation) -> Result<()> {
    let file_config = ConfigManager::load_for(&invocation)?;
    let config = AmalgamateConfig::resolve(invocation, file_config)?;
    logging::init_logging(config.log_level);

    let report = run(&config)?;

    let reporter = ConsoleReporter::new(config.verbose, config.dry_run);
    reporter.generate_run_report(&report)
}

/// Validates `config`, then amalgamates every root. Does not touch logging
/// or print anything besides log events.
///
/// # Arguments
/// * `config`: The resolved settings of the run.
///
/// # Returns
/// The report of the run. With `dry_run` set nothing is written, but the
/// report still lists every destination.
///
/// # Errors
/// Fails with [`AmalgamateError::NoInputFiles`] or
/// [`AmalgamateError::InvalidInvocation`] before any input is read, and with
/// the first expansion or write failure afterwards.
pub fn run(config: &AmalgamateConfig) -> Result<RunReport> {
    debug!(?config, "resolved configuration");
    check_invocation(config)?;
    log_startup(config);

    let engine = AmalgamationEngine::new(config)?;
    let mut sink: Box<dyn OutputSink> = if config.dry_run {
        Box::new(MemorySink::new())
    } else {
        Box::new(FileSink::new())
    };

    engine.generate(&config.files, &config.target, sink.as_mut())
}

fn check_invocation(config: &AmalgamateConfig) -> Result<()> {
    if config.files.is_empty() {
        return Err(AmalgamateError::NoInputFiles.into());
    }

    let issues = StandardValidator::new().validate_config(config)?;
    let mut errors = Vec::new();
    for issue in issues {
        if issue.is_error() {
            errors.push(issue.to_string());
        } else {
            warn!("{}", issue.message);
        }
    }

    if !errors.is_empty() {
        return Err(AmalgamateError::InvalidInvocation(errors.join("\n")).into());
    }
    Ok(())
}

fn log_startup(config: &AmalgamateConfig) {
    info!("files    = {:?}", display_all(&config.files));
    match &config.target {
        OutputTarget::Directories(dirs) => info!("outdirs  = {:?}", display_all(dirs)),
        OutputTarget::Sibling { ext } => info!("outdirs  = none (beside source, '.{ext}')"),
    }
    info!("incdirs  = {:?}", display_all(&config.incdirs));
    info!(
        "preamble = {}",
        config
            .preamble
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    );
}

fn display_all(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

/// Writes a starter config file for `amalgamate init`.
///
/// # Arguments
/// * `path`: Where to write; defaults to the format's standard file name.
/// * `format`: The serialization used for the new file.
pub fn initialize_config(path: Option<PathBuf>, format: ConfigFormat) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(format.default_file_name()));
    let config_manager = ConfigManager::new(path);

    if config_manager.initialize()? {
        println!(
            "✓ Wrote default configuration to {}",
            config_manager.get_config_path().display()
        );
    } else {
        println!(
            "Configuration already exists at {}; left untouched",
            config_manager.get_config_path().display()
        );
    }
    Ok(())
}
