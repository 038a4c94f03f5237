use crate::error::{ErrorKind, StudyResult};
use crate::level::LevelTable;
use crate::state::ProgressState;

pub trait ProgressStore {
    /// Persist `state`. Failures are logged and reported as `false`; the
    /// caller keeps playing on the in-memory state.
    fn save(&self, state: &ProgressState) -> bool;

    /// Restore the last saved state, falling back to older generations and
    /// finally to `prompt` when nothing readable is left.
    fn load(
        &self,
        table: &LevelTable,
        prompt: &mut dyn RecoveryPrompt,
    ) -> StudyResult<ProgressState>;
}

/// Why automatic recovery gave up.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    StartFresh,
    Abort,
}

/// Asks the user what to do when no save generation can be read.
pub trait RecoveryPrompt {
    fn choose(&mut self, failure: &LoadFailure) -> RecoveryChoice;
}
