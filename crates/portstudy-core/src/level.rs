use serde::{Deserialize, Serialize};

use crate::error::{StudyError, StudyResult};

/// Difficulty level, 1-based.
pub type Level = u8;

/// What a learner must show at one level to advance to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Minimum rolling accuracy, in percent.
    pub accuracy: u32,
    /// Qualifying correct answers needed in a row.
    pub streak: u32,
    /// Size of the rolling accuracy window.
    pub window: usize,
}

impl Requirement {
    pub const fn new(accuracy: u32, streak: u32, window: usize) -> Self {
        Self {
            accuracy,
            streak,
            window,
        }
    }
}

const DEFAULT_REQUIREMENTS: [Requirement; 4] = [
    Requirement::new(75, 15, 45),
    Requirement::new(80, 20, 90),
    Requirement::new(85, 30, 90),
    Requirement::new(87, 35, 90),
];

/// Requirements for every level below the maximum. The maximum level is
/// one past the last entry and has no requirement of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    requirements: Vec<Requirement>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self {
            requirements: DEFAULT_REQUIREMENTS.to_vec(),
        }
    }
}

impl LevelTable {
    pub fn new(requirements: Vec<Requirement>) -> StudyResult<Self> {
        if requirements.is_empty() {
            return Err(StudyError::InvalidLevelTable(
                "at least one level is required".into(),
            ));
        }
        if requirements.len() >= Level::MAX as usize {
            return Err(StudyError::InvalidLevelTable(format!(
                "too many levels: {}",
                requirements.len()
            )));
        }
        for (i, req) in requirements.iter().enumerate() {
            let level = i + 1;
            if req.accuracy > 100 {
                return Err(StudyError::InvalidLevelTable(format!(
                    "level {level}: accuracy {} is above 100%",
                    req.accuracy
                )));
            }
            if req.window == 0 || req.window > u16::MAX as usize {
                return Err(StudyError::InvalidLevelTable(format!(
                    "level {level}: window {} out of range 1..=65535",
                    req.window
                )));
            }
            // The streak is stored at the window's capacity.
            if req.streak as usize > req.window {
                return Err(StudyError::InvalidLevelTable(format!(
                    "level {level}: streak {} is longer than window {}",
                    req.streak, req.window
                )));
            }
        }
        Ok(Self { requirements })
    }

    pub fn max_level(&self) -> Level {
        self.requirements.len() as Level + 1
    }

    pub fn contains(&self, level: Level) -> bool {
        (1..=self.max_level()).contains(&level)
    }

    /// Requirement to leave `level`. `None` at the maximum level.
    pub fn requirement(&self, level: Level) -> Option<&Requirement> {
        if level == 0 {
            return None;
        }
        self.requirements.get(level as usize - 1)
    }

    /// The maximum level reuses the previous level's window size.
    pub fn effective_level(&self, level: Level) -> Level {
        level.clamp(1, self.max_level() - 1)
    }

    pub fn window_capacity(&self, level: Level) -> usize {
        self.requirements[self.effective_level(level) as usize - 1].window
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = LevelTable::default();
        assert_eq!(table.max_level(), 5);
        assert_eq!(table.requirement(1), Some(&Requirement::new(75, 15, 45)));
        assert_eq!(table.requirement(5), None);
        assert_eq!(table.requirement(0), None);
    }

    #[test]
    fn test_max_level_reuses_previous_window() {
        let table = LevelTable::default();
        assert_eq!(table.window_capacity(1), 45);
        assert_eq!(table.window_capacity(4), 90);
        assert_eq!(table.window_capacity(5), 90);
        assert_eq!(table.effective_level(5), 4);
    }

    #[test]
    fn test_contains() {
        let table = LevelTable::default();
        assert!(!table.contains(0));
        assert!(table.contains(1));
        assert!(table.contains(5));
        assert!(!table.contains(6));
    }

    #[test]
    fn test_rejects_empty_table() {
        assert!(matches!(
            LevelTable::new(Vec::new()),
            Err(StudyError::InvalidLevelTable(_))
        ));
    }

    #[test]
    fn test_rejects_bad_requirements() {
        assert!(LevelTable::new(vec![Requirement::new(101, 5, 10)]).is_err());
        assert!(LevelTable::new(vec![Requirement::new(50, 5, 0)]).is_err());
        assert!(LevelTable::new(vec![Requirement::new(50, 5, 70_000)]).is_err());
    }

    #[test]
    fn test_rejects_streak_longer_than_window() {
        let err = LevelTable::new(vec![Requirement::new(50, 10, 6)]).unwrap_err();
        assert!(matches!(err, StudyError::InvalidLevelTable(_)));
        assert!(err.to_string().contains("streak 10"));
        assert!(LevelTable::new(vec![Requirement::new(50, 6, 6)]).is_ok());
    }

    #[test]
    fn test_single_level_table() {
        let table = LevelTable::new(vec![Requirement::new(50, 3, 6)]).unwrap();
        assert_eq!(table.max_level(), 2);
        assert_eq!(table.window_capacity(2), 6);
    }
}
