mod report;
mod store;

pub use report::BugReport;
pub use store::{FileStore, SlotReport, SlotStatus, BACKUP_FILE, CORRUPT_FILE, PRIMARY_FILE};
