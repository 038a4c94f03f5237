use std::cell::Cell;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use portstudy_core::{
    ErrorKind, Level, LevelTable, LoadFailure, ProgressState, ProgressStore, RecoveryChoice,
    RecoveryPrompt, SaveRecord, StudyError, StudyResult,
};

use crate::report::BugReport;

pub const PRIMARY_FILE: &str = "game_state.json";
pub const BACKUP_FILE: &str = "game_state.backup.json";
pub const CORRUPT_FILE: &str = "game_state.corrupt.json";
const TEMP_FILE: &str = "game_state.json.tmp";

/// Save files in one directory: the current generation plus one backup.
///
/// Every save rotates the current file into the backup slot, so a save that
/// is later found unreadable still has the generation before it. After a
/// load in which the current file could not be read, that file is never
/// rotated over the backup: it is moved to the corrupt slot instead.
pub struct FileStore {
    primary: PathBuf,
    backup: PathBuf,
    corrupt: PathBuf,
    temp: PathBuf,
    primary_trusted: Cell<bool>,
}

/// Outcome of reading one save slot.
enum Slot {
    Missing,
    Valid {
        state: ProgressState,
        saved_at: String,
    },
    Invalid {
        error: StudyError,
        raw: Option<Vec<u8>>,
    },
}

/// Per-slot health, for `verify`.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotStatus {
    Missing,
    Valid { level: Level, saved_at: String },
    Invalid { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone)]
pub struct SlotReport {
    pub name: &'static str,
    pub path: PathBuf,
    pub status: SlotStatus,
}

impl FileStore {
    pub fn new(dir: &Path) -> StudyResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            primary: dir.join(PRIMARY_FILE),
            backup: dir.join(BACKUP_FILE),
            corrupt: dir.join(CORRUPT_FILE),
            temp: dir.join(TEMP_FILE),
            primary_trusted: Cell::new(true),
        })
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    pub fn corrupt_path(&self) -> &Path {
        &self.corrupt
    }

    /// Check both generations without changing anything.
    pub fn inspect(&self, table: &LevelTable) -> Vec<SlotReport> {
        [("primary", &self.primary), ("backup", &self.backup)]
            .into_iter()
            .map(|(name, path)| {
                let status = match read_slot(path, table) {
                    Slot::Missing => SlotStatus::Missing,
                    Slot::Valid { state, saved_at } => SlotStatus::Valid {
                        level: state.difficulty,
                        saved_at,
                    },
                    Slot::Invalid { error, .. } => SlotStatus::Invalid {
                        kind: error.kind(),
                        message: error.to_string(),
                    },
                };
                SlotReport {
                    name,
                    path: path.clone(),
                    status,
                }
            })
            .collect()
    }

    fn write_generation(&self, state: &ProgressState) -> StudyResult<()> {
        let json = state.to_json()?;
        {
            let mut file = File::create(&self.temp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }

        if self.primary.exists() {
            if self.primary_trusted.get() {
                fs::rename(&self.primary, &self.backup)?;
            } else {
                warn!(
                    path = %self.corrupt.display(),
                    "setting unreadable save aside, backup left untouched"
                );
                fs::rename(&self.primary, &self.corrupt)?;
            }
        }

        fs::rename(&self.temp, &self.primary)?;
        Ok(())
    }
}

fn read_slot(path: &Path, table: &LevelTable) -> Slot {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Slot::Missing,
        Err(e) => {
            return Slot::Invalid {
                error: e.into(),
                raw: None,
            }
        }
    };

    match parse_slot(&raw, table) {
        Ok((state, saved_at)) => Slot::Valid { state, saved_at },
        Err(error) => Slot::Invalid {
            error,
            raw: Some(raw),
        },
    }
}

fn parse_slot(raw: &[u8], table: &LevelTable) -> StudyResult<(ProgressState, String)> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| StudyError::Decode(format!("save file is not UTF-8: {e}")))?;
    let record: SaveRecord = serde_json::from_str(text)?;
    let state = ProgressState::from_record(&record, table)?;
    Ok((state, record.timestamp))
}

/// One line per failed generation, newest first. A native backtrace would
/// only show this reporting code, not where the save went bad.
fn capture_trace(attempts: &[(&str, &Path, &StudyError)]) -> String {
    attempts
        .iter()
        .map(|(name, path, error)| {
            format!("{name} ({}): {}: {error}", path.display(), error.kind())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl ProgressStore for FileStore {
    fn save(&self, state: &ProgressState) -> bool {
        match self.write_generation(state) {
            Ok(()) => {
                self.primary_trusted.set(true);
                debug!(level = state.difficulty, "progress saved");
                true
            }
            Err(e) => {
                error!(path = %self.primary.display(), "error saving progress: {e}");
                let _ = fs::remove_file(&self.temp);
                false
            }
        }
    }

    fn load(
        &self,
        table: &LevelTable,
        prompt: &mut dyn RecoveryPrompt,
    ) -> StudyResult<ProgressState> {
        let primary_failure = match read_slot(&self.primary, table) {
            Slot::Valid { state, .. } => {
                self.primary_trusted.set(true);
                return Ok(state);
            }
            Slot::Missing => None,
            Slot::Invalid { error, raw } => {
                warn!("primary save failed ({}): {error}; trying backup", error.kind());
                self.primary_trusted.set(false);
                Some((error, raw))
            }
        };

        let backup_failure = match read_slot(&self.backup, table) {
            Slot::Valid { state, .. } => {
                info!(level = state.difficulty, "progress restored from backup");
                return Ok(state);
            }
            Slot::Missing => None,
            Slot::Invalid { error, raw } => {
                warn!("backup save failed ({}): {error}", error.kind());
                Some((error, raw))
            }
        };

        let mut attempts = Vec::new();
        if let Some((error, _)) = &primary_failure {
            attempts.push(("primary", self.primary.as_path(), error));
        }
        if let Some((error, _)) = &backup_failure {
            attempts.push(("backup", self.backup.as_path(), error));
        }
        let Some(&(_, _, last)) = attempts.last() else {
            info!("no save found, starting at level 1");
            return Ok(ProgressState::new(table));
        };

        let failure = LoadFailure {
            kind: last.kind(),
            message: last.to_string(),
        };
        let trace = capture_trace(&attempts);
        let raw = primary_failure
            .as_ref()
            .and_then(|(_, raw)| raw.clone())
            .or_else(|| backup_failure.as_ref().and_then(|(_, raw)| raw.clone()));

        match prompt.choose(&failure) {
            RecoveryChoice::StartFresh => {
                info!("discarding unreadable save, starting at level 1");
                Ok(ProgressState::new(table))
            }
            RecoveryChoice::Abort => {
                let report = BugReport::new(failure.kind, failure.message, trace, raw);
                Err(StudyError::RecoveryAborted {
                    report: report.render(),
                })
            }
        }
    }
}
