mod catalog;
mod config;
mod display;
mod menu;
mod prompt;
mod question;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use portstudy_core::{
    LevelTable, LoadFailure, ProgressState, ProgressStore, ProgressionEngine, RecoveryChoice,
    RecoveryPrompt, StudyError,
};
use portstudy_store::{FileStore, SlotStatus};

use crate::config::Config;
use crate::menu::Session;
use crate::prompt::{RecoveryQuestion, Terminal};
use crate::question::QuestionGenerator;

#[derive(Parser)]
#[command(
    name = "portstudy",
    version,
    about = "Practice network port numbers with adaptive difficulty"
)]
struct Cli {
    /// Config file (default: $PORTSTUDY_CONFIG or ~/.config/portstudy/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the save files
    #[arg(long, global = true)]
    save_dir: Option<PathBuf>,

    /// Port knowledge base (JSON) replacing the built-in list
    #[arg(long, global = true)]
    ports: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive practice session (default)
    Practice,

    /// Show saved progress without starting a session
    Status,

    /// Check both save generations for damage
    Verify,

    /// Show the effective configuration
    Config,
}

/// Where earlier releases kept their saves, so existing progress is found:
/// `~/.port_study` on Linux and other unixes, `PortStudy` under the
/// platform data dir on macOS and Windows (`%APPDATA%`).
fn default_save_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| save_dir_in(dirs.home_dir(), dirs.data_dir()))
        .unwrap_or_else(|| PathBuf::from(".port_study"))
}

fn save_dir_in(home: &Path, data: &Path) -> PathBuf {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        data.join("PortStudy")
    } else {
        home.join(".port_study")
    }
}

fn save_dir(cli: &Cli, cfg: &Config) -> PathBuf {
    cli.save_dir
        .clone()
        .or_else(|| cfg.storage.dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_save_dir)
}

fn ports_path(cli: &Cli, cfg: &Config) -> Option<PathBuf> {
    cli.ports
        .clone()
        .or_else(|| cfg.ports.path.as_ref().map(PathBuf::from))
}

fn open_store(dir: &Path) -> Result<FileStore> {
    FileStore::new(dir).with_context(|| format!("failed to open save directory {}", dir.display()))
}

/// Gives up on unreadable saves without asking; used by read-only commands.
struct Decline;

impl RecoveryPrompt for Decline {
    fn choose(&mut self, _failure: &LoadFailure) -> RecoveryChoice {
        RecoveryChoice::Abort
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        None | Some(Commands::Practice) => cmd_practice(&cli, &cfg),
        Some(Commands::Status) => cmd_status(&cli, &cfg),
        Some(Commands::Verify) => cmd_verify(&cli, &cfg),
        Some(Commands::Config) => cmd_config(&cli, &cfg),
    }
}

fn cmd_practice(cli: &Cli, cfg: &Config) -> Result<()> {
    let table = cfg.level_table()?;
    let catalog = catalog::load_catalog(ports_path(cli, cfg).as_deref())?;
    let store = open_store(&save_dir(cli, cfg))?;
    let mut terminal = Terminal::new();

    let state = match store.load(&table, &mut RecoveryQuestion::new(&mut terminal)) {
        Ok(state) => state,
        Err(StudyError::RecoveryAborted { report }) => {
            eprintln!("\nExiting to prevent save data loss.");
            eprintln!("Please include this bug report when reporting the issue:\n");
            eprintln!("{report}");
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("failed to load progress"),
    };

    let engine = ProgressionEngine::new(table);
    let generator = QuestionGenerator::new(&catalog, &cfg.quiz);
    let mut session = Session::new(&store, &engine, generator, state);
    if !session.run(&mut terminal) {
        bail!(
            "progress could not be saved to {}",
            store.primary_path().display()
        );
    }
    Ok(())
}

fn cmd_status(cli: &Cli, cfg: &Config) -> Result<()> {
    let table = cfg.level_table()?;
    let dir = save_dir(cli, cfg);
    let store = open_store(&dir)?;

    let state = match store.load(&table, &mut Decline) {
        Ok(state) => state,
        Err(StudyError::RecoveryAborted { .. }) => {
            bail!(
                "no readable save in {} (run `portstudy verify` for details)",
                dir.display()
            )
        }
        Err(e) => return Err(e).context("failed to load progress"),
    };

    print_status(&state, &table);
    Ok(())
}

fn print_status(state: &ProgressState, table: &LevelTable) {
    let engine = ProgressionEngine::new(table.clone());
    let progress = engine.progress(state);
    println!("Level:    {} of {}", progress.level, table.max_level());
    if progress.at_max {
        println!("Maximum level reached.");
        return;
    }
    println!(
        "Accuracy: {:.1}% over {}/{} answers (need {}%)",
        progress.accuracy,
        progress.window_len,
        progress.window_capacity,
        progress.required_accuracy
    );
    println!(
        "Streak:   {}/{}",
        progress.streak, progress.streak_target
    );
    display::level_progress(&progress, &state.accuracy);
}

fn cmd_verify(cli: &Cli, cfg: &Config) -> Result<()> {
    let table = cfg.level_table()?;
    let store = open_store(&save_dir(cli, cfg))?;

    let reports = store.inspect(&table);
    let mut valid = 0;
    let mut invalid = 0;
    for report in &reports {
        print!("{:<8} {}: ", report.name, report.path.display());
        match &report.status {
            SlotStatus::Missing => println!("missing"),
            SlotStatus::Valid { level, saved_at } => {
                valid += 1;
                println!("ok (level {level}, saved {saved_at})");
            }
            SlotStatus::Invalid { kind, message } => {
                invalid += 1;
                println!("{kind}: {message}");
            }
        }
    }

    if invalid > 0 && valid == 0 {
        bail!("no readable save generation");
    }
    Ok(())
}

fn cmd_config(cli: &Cli, cfg: &Config) -> Result<()> {
    let table = cfg.level_table()?;
    println!("Config: {}", config::show_config_path(cli.config.as_deref()));
    println!();
    println!("[storage]");
    println!("  dir = {}", save_dir(cli, cfg).display());
    println!();
    println!("[ports]");
    println!(
        "  path = {}",
        ports_path(cli, cfg)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(built-in)".into())
    );
    println!();
    println!("[quiz]");
    println!("  choices = {}", cfg.quiz.choices);
    println!("  standard_weight = {}", cfg.quiz.standard_weight);
    println!("  port_entry_weight = {}", cfg.quiz.port_entry_weight);
    println!("  port_entry_min_level = {}", cfg.quiz.port_entry_min_level);
    let weights = cfg.quiz.port_weights;
    println!(
        "  port_weights = beginner {}, intermediate {}, advanced {}",
        weights.beginner, weights.intermediate, weights.advanced
    );
    println!();
    println!("[progression]");
    println!("  {:<7} {:>8} {:>7} {:>7}", "level", "accuracy", "streak", "window");
    for (i, req) in table.requirements().iter().enumerate() {
        println!(
            "  {:<7} {:>7}% {:>7} {:>7}",
            i + 1,
            req.accuracy,
            req.streak,
            req.window
        );
    }
    println!("  {:<7} (final)", table.max_level());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn test_default_save_dir_is_dot_port_study_in_home() {
        let dir = save_dir_in(Path::new("/home/ada"), Path::new("/home/ada/.local/share"));
        assert_eq!(dir, PathBuf::from("/home/ada/.port_study"));
    }

    #[test]
    #[cfg(any(target_os = "macos", target_os = "windows"))]
    fn test_default_save_dir_is_port_study_in_data_dir() {
        let data = Path::new("/Users/ada/Library/Application Support");
        let dir = save_dir_in(Path::new("/Users/ada"), data);
        assert_eq!(dir, data.join("PortStudy"));
    }

    #[test]
    fn test_save_dir_precedence() {
        let mut cfg = Config::default();
        cfg.storage.dir = Some("/srv/from-config".into());

        let cli = Cli::parse_from(["portstudy", "--save-dir", "/tmp/from-flag"]);
        assert_eq!(save_dir(&cli, &cfg), PathBuf::from("/tmp/from-flag"));

        let cli = Cli::parse_from(["portstudy", "status"]);
        assert_eq!(save_dir(&cli, &cfg), PathBuf::from("/srv/from-config"));

        assert_eq!(save_dir(&cli, &Config::default()), default_save_dir());
    }
}
