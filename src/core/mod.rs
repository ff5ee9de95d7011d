// This file is the module declaration file for the `core` module.
// It declares the submodules contained within `src/core/` and exposes them
// to the rest of the crate.

// `config` module:
// Command-line arguments, the optional project config file (TOML, JSON or
// YAML) handled by `ConfigManager`, and the resolved `AmalgamateConfig` that
// layers the two.
pub mod config;

// `engine` module:
// The recursive expander. Inlines resolvable includes depth-first,
// neutralizes guards, prefixes the preamble and fans the result out.
pub mod engine;

pub mod error;
pub mod logging;
