pub mod codec;
pub mod engine;
pub mod error;
pub mod level;
pub mod ports;
pub mod state;
pub mod store;
pub mod window;

pub use codec::{ACCURACY_KEY, STREAK_KEY};
pub use engine::{Progress, ProgressionEngine, Transition};
pub use error::{ErrorKind, StudyError, StudyResult};
pub use level::{Level, LevelTable, Requirement};
pub use ports::{PortCatalog, PortDifficulty, PortInfo, Transport};
pub use state::{ProgressState, SaveRecord, FORMAT_VERSION};
pub use store::{LoadFailure, ProgressStore, RecoveryChoice, RecoveryPrompt};
pub use window::{AccuracyWindow, BoundedWindow, StreakWindow};
