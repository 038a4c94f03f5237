//! Configuration loading from TOML files.
//!
//! Lookup order:
//! 1. `--config <path>` on the command line
//! 2. `$PORTSTUDY_CONFIG` environment variable
//! 3. `~/.config/portstudy/config.toml`
//! 4. Built-in defaults (everything is optional)

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use portstudy_core::{LevelTable, Requirement};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub ports: PortsConfig,
    pub quiz: QuizConfig,
    pub progression: ProgressionConfig,
}

/// Save file location.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for save files. Default: `~/.port_study`, or `PortStudy` in the
    /// platform data dir on macOS and Windows.
    pub dir: Option<String>,
}

/// Port knowledge base.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    /// JSON file replacing the built-in port list.
    pub path: Option<String>,
}

/// Question generation settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    /// Answer options per multiple-choice question.
    pub choices: usize,
    pub standard_weight: u32,
    pub port_entry_weight: u32,
    /// First level at which typed port-number questions appear.
    pub port_entry_min_level: u8,
    pub port_weights: PortWeights,
}

/// How often ports of each difficulty are drawn.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PortWeights {
    pub beginner: u32,
    pub intermediate: u32,
    pub advanced: u32,
}

/// Level requirements. Empty means the built-in table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub levels: Vec<Requirement>,
}

// --- Defaults ---

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            choices: 4,
            standard_weight: 80,
            port_entry_weight: 20,
            port_entry_min_level: 4,
            port_weights: PortWeights::default(),
        }
    }
}

impl Default for PortWeights {
    fn default() -> Self {
        Self {
            beginner: 100,
            intermediate: 70,
            advanced: 30,
        }
    }
}

impl Config {
    pub fn level_table(&self) -> Result<LevelTable> {
        if self.progression.levels.is_empty() {
            return Ok(LevelTable::default());
        }
        LevelTable::new(self.progression.levels.clone()).context("invalid [progression] levels")
    }

    pub fn validate(&self) -> Result<()> {
        if self.quiz.choices < 2 {
            bail!("quiz.choices must be at least 2, got {}", self.quiz.choices);
        }
        if self.quiz.standard_weight == 0 && self.quiz.port_entry_weight == 0 {
            bail!("quiz.standard_weight and quiz.port_entry_weight cannot both be 0");
        }
        self.level_table()?;
        Ok(())
    }
}

/// Load config from disk. Returns defaults if no config file exists.
///
/// A path given explicitly must exist.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(p) = explicit {
        return read_config(p);
    }

    if let Some(p) = config_path() {
        if p.exists() {
            return read_config(&p);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(config)
}

/// Resolve the config file path.
fn config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(p) = std::env::var("PORTSTUDY_CONFIG") {
        return Some(PathBuf::from(p));
    }

    // 2. ~/.config/portstudy/config.toml
    dirs_home().map(|home| home.join(".config").join("portstudy").join("config.toml"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}

/// Show the active config path (for `portstudy config`).
pub fn show_config_path(explicit: Option<&Path>) -> String {
    match explicit.map(Path::to_path_buf).or_else(config_path) {
        Some(p) if p.exists() => format!("{} (loaded)", p.display()),
        Some(p) => format!("{} (not found, using defaults)", p.display()),
        None => "no config path resolved (using defaults)".into(),
    }
}
