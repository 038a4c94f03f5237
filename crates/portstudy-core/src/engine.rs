//! Level-up / level-down state machine.
//!
//! Every check works on integer counts over the live window. Percentages
//! are only produced for display.

use tracing::info;

use crate::level::{Level, LevelTable};
use crate::state::ProgressState;
use crate::window::{AccuracyWindow, StreakWindow};

/// Samples required before a regression is considered, at minimum.
const MIN_REGRESSION_SAMPLES: usize = 5;
/// How far below the previous level's accuracy requirement triggers a
/// regression, in percentage points.
const REGRESSION_MARGIN: u32 = 10;

/// Result of processing one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    LevelUp(Level),
    LevelDown(Level),
}

/// Snapshot of where the learner stands, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub level: Level,
    pub at_max: bool,
    pub accuracy: f64,
    pub required_accuracy: u32,
    pub meets_accuracy: bool,
    pub streak: usize,
    pub streak_target: u32,
    pub window_len: usize,
    pub window_capacity: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ProgressionEngine {
    table: LevelTable,
}

impl ProgressionEngine {
    pub fn new(table: LevelTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &LevelTable {
        &self.table
    }

    /// Apply one answered question to `state`.
    pub fn record_answer(&self, state: &mut ProgressState, correct: bool) -> Transition {
        // No requirement, no bookkeeping.
        let Some(req) = self.table.requirement(state.difficulty).copied() else {
            return Transition::Unchanged;
        };

        state.accuracy.push(correct);
        let meets = state.accuracy.meets(req.accuracy);

        if meets {
            if correct {
                state.streak.extend_one();
            }
        } else {
            state.streak.reset();
        }

        if meets && state.streak.len() >= req.streak as usize {
            state.difficulty += 1;
            self.reset_windows(state);
            info!(level = state.difficulty, "level up");
            return Transition::LevelUp(state.difficulty);
        }

        if self.should_regress(state) {
            state.difficulty -= 1;
            self.reset_windows(state);
            info!(level = state.difficulty, "level down");
            return Transition::LevelDown(state.difficulty);
        }

        Transition::Unchanged
    }

    fn should_regress(&self, state: &ProgressState) -> bool {
        if state.difficulty <= 1 {
            return false;
        }
        let Some(previous) = self.table.requirement(state.difficulty - 1) else {
            return false;
        };

        let window = &state.accuracy;
        let min_samples = MIN_REGRESSION_SAMPLES.max(window.capacity() / 3);
        if window.len() < min_samples {
            return false;
        }

        let floor = previous.accuracy.saturating_sub(REGRESSION_MARGIN);
        !window.meets(floor)
    }

    fn reset_windows(&self, state: &mut ProgressState) {
        state.streak = StreakWindow::new();
        state.accuracy = AccuracyWindow::new(self.table.window_capacity(state.difficulty));
    }

    pub fn progress(&self, state: &ProgressState) -> Progress {
        let req = self.table.requirement(state.difficulty);
        Progress {
            level: state.difficulty,
            at_max: req.is_none(),
            accuracy: state.accuracy.accuracy(),
            required_accuracy: req.map_or(0, |r| r.accuracy),
            meets_accuracy: req.is_some_and(|r| state.accuracy.meets(r.accuracy)),
            streak: state.streak.len(),
            streak_target: req.map_or(0, |r| r.streak),
            window_len: state.accuracy.len(),
            window_capacity: state.accuracy.capacity(),
        }
    }
}
