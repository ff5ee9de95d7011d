//! Amalgamate C/C++ files.
//! Takes one or more root files and writes a single self-contained copy of
//! each, with every include found in the search directories pasted in place
//! and `#pragma once` commented out. Includes that cannot be found (system
//! headers, mostly) stay live directives.
use amalgamate::core::config::{ConfigFormat, Invocation};
use amalgamate::utils;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "amalgamate", version)]
#[command(about = "Amalgamate C/C++ files")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    invocation: Invocation,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter amalgamate config file
    Init {
        /// Where to write the config; its extension picks the format
        #[arg(long)]
        path: Option<PathBuf>,
        /// Format used when no path is given
        #[arg(long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path, format }) => utils::initialize_config(path, format),
        None => utils::amalgamate_files(cli.invocation),
    }
}
