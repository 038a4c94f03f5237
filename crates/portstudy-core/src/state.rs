use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::codec::{self, ACCURACY_KEY, STREAK_KEY};
use crate::error::{StudyError, StudyResult};
use crate::level::{Level, LevelTable};
use crate::window::{AccuracyWindow, StreakWindow};

/// Save format understood by this build. Other versions are rejected.
pub const FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    // Saves written before the field existed were version 1.
    1
}

/// On-disk shape of a save file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Informational only, never validated.
    #[serde(default)]
    pub timestamp: String,
    pub difficulty: i64,
    pub accuracy_window: String,
    pub streak_window: String,
}

/// Everything that survives between sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub difficulty: Level,
    pub accuracy: AccuracyWindow,
    pub streak: StreakWindow,
}

impl ProgressState {
    /// Level 1 with empty windows.
    pub fn new(table: &LevelTable) -> Self {
        Self::at_level(1, table)
    }

    pub fn at_level(difficulty: Level, table: &LevelTable) -> Self {
        Self {
            difficulty,
            accuracy: AccuracyWindow::new(table.window_capacity(difficulty)),
            streak: StreakWindow::new(),
        }
    }

    pub fn to_record(&self) -> SaveRecord {
        SaveRecord {
            version: FORMAT_VERSION,
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            difficulty: i64::from(self.difficulty),
            accuracy_window: codec::encode(self.accuracy.iter(), ACCURACY_KEY),
            streak_window: codec::encode(self.streak.outcomes(), STREAK_KEY),
        }
    }

    /// Rebuild state from a record.
    ///
    /// Blobs holding more entries than the level's window are cut down to the
    /// newest entries rather than rejected; the checksum already vouches for
    /// their content.
    pub fn from_record(record: &SaveRecord, table: &LevelTable) -> StudyResult<Self> {
        if record.version != FORMAT_VERSION {
            return Err(StudyError::Version {
                found: record.version,
                supported: FORMAT_VERSION,
            });
        }

        let difficulty = Level::try_from(record.difficulty)
            .ok()
            .filter(|&level| table.contains(level))
            .ok_or_else(|| {
                StudyError::Decode(format!(
                    "difficulty {} outside 1..={}",
                    record.difficulty,
                    table.max_level()
                ))
            })?;

        let capacity = table.window_capacity(difficulty);
        let accuracy = codec::decode(&record.accuracy_window, ACCURACY_KEY, capacity)?;
        let streak = codec::decode(&record.streak_window, STREAK_KEY, capacity)?;

        Ok(Self {
            difficulty,
            accuracy,
            streak: StreakWindow::with_len(streak.len()),
        })
    }

    pub fn to_json(&self) -> StudyResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn from_json(json: &str, table: &LevelTable) -> StudyResult<Self> {
        let record: SaveRecord = serde_json::from_str(json)?;
        Self::from_record(&record, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state(table: &LevelTable) -> ProgressState {
        let mut state = ProgressState::at_level(2, table);
        state.accuracy.extend([true, true, false, true]);
        state.streak = StreakWindow::with_len(3);
        state
    }

    #[test]
    fn test_record_round_trip() {
        let table = LevelTable::default();
        let state = sample_state(&table);
        let json = state.to_json().unwrap();
        let restored = ProgressState::from_json(&json, &table).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.accuracy.capacity(), 90);
    }

    #[test]
    fn test_fresh_state_has_empty_blobs() {
        let table = LevelTable::default();
        let record = ProgressState::new(&table).to_record();
        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.difficulty, 1);
        assert!(record.accuracy_window.is_empty());
        assert!(record.streak_window.is_empty());
    }

    #[test]
    fn test_rejects_other_versions() {
        let table = LevelTable::default();
        for version in [0, 2, 99] {
            let mut record = sample_state(&table).to_record();
            record.version = version;
            let err = ProgressState::from_record(&record, &table).unwrap_err();
            assert!(matches!(err, StudyError::Version { found, .. } if found == version));
        }
    }

    #[test]
    fn test_missing_version_reads_as_one() {
        let table = LevelTable::default();
        let json = r#"{"difficulty": 3, "accuracy_window": "", "streak_window": ""}"#;
        let state = ProgressState::from_json(json, &table).unwrap();
        assert_eq!(state.difficulty, 3);
    }

    #[test]
    fn test_rejects_out_of_range_difficulty() {
        let table = LevelTable::default();
        for difficulty in [0, 6, -1, 300] {
            let mut record = ProgressState::new(&table).to_record();
            record.difficulty = difficulty;
            assert!(matches!(
                ProgressState::from_record(&record, &table),
                Err(StudyError::Decode(_))
            ));
        }
    }

    #[test]
    fn test_max_level_uses_previous_capacity() {
        let table = LevelTable::default();
        let state = ProgressState::at_level(5, &table);
        let restored = ProgressState::from_record(&state.to_record(), &table).unwrap();
        assert_eq!(restored.difficulty, 5);
        assert_eq!(restored.accuracy.capacity(), 90);
    }

    #[test]
    fn test_swapped_blobs_fail_integrity() {
        let table = LevelTable::default();
        let mut record = sample_state(&table).to_record();
        std::mem::swap(&mut record.accuracy_window, &mut record.streak_window);
        assert!(matches!(
            ProgressState::from_record(&record, &table),
            Err(StudyError::Integrity { .. })
        ));
    }

    #[test]
    fn test_oversized_window_is_truncated_to_level_capacity() {
        let table = LevelTable::default();
        let mut record = ProgressState::new(&table).to_record();
        let mut outcomes = vec![false; 10];
        outcomes.extend(vec![true; 45]);
        record.accuracy_window = codec::encode(outcomes, ACCURACY_KEY);
        let state = ProgressState::from_record(&record, &table).unwrap();
        assert_eq!(state.accuracy.len(), 45);
        assert_eq!(state.accuracy.correct(), 45);
    }

    #[test]
    fn test_garbage_json_is_serialization_error() {
        let table = LevelTable::default();
        assert!(matches!(
            ProgressState::from_json("{\"difficulty\": 1, \"accur", &table),
            Err(StudyError::Serialization(_))
        ));
    }
}
