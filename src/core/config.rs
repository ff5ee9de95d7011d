use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::writer::OutputTarget;
use crate::core::logging::LogLevel;

/// First config file name looked up in the working directory when no
/// `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "amalgamate.toml";

/// Suffix appended to the source name when no output directory applies.
pub const DEFAULT_EXTENSION: &str = "amalgamated";

/// Values substituted into the preamble template.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
    pub url: String,
}

/// The `[amalgamate]` section of the config file. Every field is optional;
/// the command line overrides whatever is set here.
///
/// Relative `incdirs`, `outdirs` and `preamble` are relative to the directory
/// holding the config file, not to the working directory.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AmalgamateSettings {
    pub incdirs: Vec<PathBuf>,
    pub outdirs: Vec<PathBuf>,
    pub ext: Option<String>,
    pub preamble: Option<PathBuf>,
    pub log: Option<LogLevel>,
    pub end_markers: bool,
}

/// The on-disk project configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    pub project: ProjectMetadata,
    pub amalgamate: AmalgamateSettings,
}

impl ProjectConfig {
    /// Joins every relative path of the `[amalgamate]` section onto `base`.
    ///
    /// # Arguments
    /// * `base`: The directory the config file lives in.
    pub fn rebase(&mut self, base: &Path) {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        let settings = &mut self.amalgamate;
        settings.incdirs.iter_mut().for_each(rebase);
        settings.outdirs.iter_mut().for_each(rebase);
        settings.preamble.iter_mut().for_each(rebase);
    }

    /// The config written by `amalgamate init`.
    pub fn template() -> Self {
        Self {
            project: ProjectMetadata {
                name: "my-project".to_string(),
                version: "0.0.0".to_string(),
                url: String::new(),
            },
            amalgamate: AmalgamateSettings {
                incdirs: vec![PathBuf::from("include")],
                outdirs: vec![],
                ext: Some(DEFAULT_EXTENSION.to_string()),
                preamble: None,
                log: Some(LogLevel::Info),
                end_markers: false,
            },
        }
    }
}

/// Serialization formats for the project config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Every format, in the order discovery looks for its default file.
    pub const ALL: [ConfigFormat; 3] = [ConfigFormat::Toml, ConfigFormat::Json, ConfigFormat::Yaml];

    /// Picks the format from a file extension; anything unknown is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Toml,
        }
    }

    pub fn default_file_name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => DEFAULT_CONFIG_FILE,
            ConfigFormat::Json => "amalgamate.json",
            ConfigFormat::Yaml => "amalgamate.yaml",
        }
    }
}

/// Command-line arguments of an amalgamation run.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Invocation {
    /// Files to amalgamate
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Output directory (repeatable); default saves files next to the source file
    #[arg(short = 'O', long = "outdir", value_name = "DIR")]
    pub outdirs: Vec<PathBuf>,

    /// Include search directory (repeatable, searched in order); default '.'
    #[arg(short = 'I', long = "incdir", value_name = "DIR")]
    pub incdirs: Vec<PathBuf>,

    /// Extension added to the output file name (default 'amalgamated');
    /// only applicable if no output directory is specified
    #[arg(long, value_name = "EXT")]
    pub ext: Option<String>,

    /// Preamble template prepended to every amalgamated file
    #[arg(long, value_name = "FILE")]
    pub preamble: Option<PathBuf>,

    /// Log level (default 'info')
    #[arg(short, long, value_enum)]
    pub log: Option<LogLevel>,

    /// Project config file (default: amalgamate.toml, .json or .yaml in the working directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Value for @PROJECT@ in the preamble
    #[arg(long)]
    pub project_name: Option<String>,

    /// Value for @VERSION@ in the preamble
    #[arg(long)]
    pub project_version: Option<String>,

    /// Value for @URL@ in the preamble
    #[arg(long)]
    pub project_url: Option<String>,

    /// Emit a closing marker comment after each inlined file
    #[arg(long)]
    pub end_markers: bool,

    /// Expand and report without writing any file
    #[arg(long)]
    pub dry_run: bool,

    /// List unresolved includes in the report
    #[arg(short, long)]
    pub verbose: bool,
}

/// Fully resolved settings of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AmalgamateConfig {
    pub files: Vec<PathBuf>,
    pub incdirs: Vec<PathBuf>,
    pub target: OutputTarget,
    pub preamble: Option<PathBuf>,
    pub metadata: ProjectMetadata,
    pub log_level: LogLevel,
    pub end_markers: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

impl AmalgamateConfig {
    /// Layers the command line over the project config file.
    ///
    /// List options given on the command line replace the file's list rather
    /// than extending it. Without any search directory the current working
    /// directory is searched.
    ///
    /// # Arguments
    /// * `invocation`: The parsed command line.
    /// * `file`: The project config, already rebased onto its directory.
    ///
    /// # Returns
    /// The settings the run uses, with every default filled in.
    pub fn resolve(invocation: Invocation, file: ProjectConfig) -> Result<Self> {
        let settings = file.amalgamate;

        let incdirs = if !invocation.incdirs.is_empty() {
            invocation.incdirs
        } else if !settings.incdirs.is_empty() {
            settings.incdirs
        } else {
            vec![std::env::current_dir().context("Failed to determine working directory")?]
        };

        let outdirs = if invocation.outdirs.is_empty() {
            settings.outdirs
        } else {
            invocation.outdirs
        };

        let ext = invocation
            .ext
            .or(settings.ext)
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        let metadata = ProjectMetadata {
            name: invocation.project_name.unwrap_or(file.project.name),
            version: invocation.project_version.unwrap_or(file.project.version),
            url: invocation.project_url.unwrap_or(file.project.url),
        };

        Ok(Self {
            files: invocation.files,
            incdirs,
            target: OutputTarget::new(outdirs, ext),
            preamble: invocation.preamble.or(settings.preamble),
            metadata,
            log_level: invocation.log.or(settings.log).unwrap_or_default(),
            end_markers: invocation.end_markers || settings.end_markers,
            dry_run: invocation.dry_run,
            verbose: invocation.verbose,
        })
    }
}

/// Loads and writes the project config file.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// The manager for the config file in the working directory.
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine working directory")?;
        Ok(Self::discover_in(&cwd))
    }

    /// Looks for `amalgamate.toml`, `amalgamate.json` and `amalgamate.yaml` in
    /// `dir`, in that order, so whatever `init` wrote is found again.
    ///
    /// # Arguments
    /// * `dir`: The directory to search.
    ///
    /// # Returns
    /// A manager for the first file that exists, or for `amalgamate.toml`
    /// when none does.
    pub fn discover_in(dir: &Path) -> Self {
        let config_path = ConfigFormat::ALL
            .iter()
            .map(|format| dir.join(format.default_file_name()))
            .find(|path| path.is_file())
            .unwrap_or_else(|| dir.join(DEFAULT_CONFIG_FILE));
        Self::new(config_path)
    }

    /// Picks the explicit `--config` path when given, otherwise discovers the
    /// default file. An explicit path must exist; the default one may not.
    pub fn load_for(invocation: &Invocation) -> Result<ProjectConfig> {
        match &invocation.config {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file '{}' does not exist", path.display());
                }
                ConfigManager::new(path.clone()).load_config()
            }
            None => ConfigManager::discover()?.load_config(),
        }
    }

    /// Writes the template config unless a file is already present.
    /// Returns `false` when nothing was written.
    pub fn initialize(&self) -> Result<bool> {
        if self.config_path.exists() {
            return Ok(false);
        }

        self.save_config(&ProjectConfig::template())?;
        Ok(true)
    }

    pub fn load_config(&self) -> Result<ProjectConfig> {
        if !self.config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file '{}'", self.config_path.display())
        })?;

        let mut config: ProjectConfig = match ConfigFormat::from_path(&self.config_path) {
            ConfigFormat::Json => {
                serde_json::from_str(&content).context("Failed to parse JSON config file")?
            }
            ConfigFormat::Yaml => {
                serde_yaml::from_str(&content).context("Failed to parse YAML config file")?
            }
            ConfigFormat::Toml => {
                toml::from_str(&content).context("Failed to parse TOML config file")?
            }
        };

        if let Some(base) = self.config_path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    pub fn save_config(&self, config: &ProjectConfig) -> Result<()> {
        let content = match ConfigFormat::from_path(&self.config_path) {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(config).context("Failed to serialize to JSON")?
            }
            ConfigFormat::Yaml => {
                serde_yaml::to_string(config).context("Failed to serialize to YAML")?
            }
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).context("Failed to serialize to TOML")?
            }
        };

        fs::write(&self.config_path, content).with_context(|| {
            format!("Failed to write config file '{}'", self.config_path.display())
        })?;
        Ok(())
    }

    pub fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
