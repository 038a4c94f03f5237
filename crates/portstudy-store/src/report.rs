use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;

use portstudy_core::{ErrorKind, FORMAT_VERSION};

const HEADER: &str = "#### SAVE BUGCHECK STATE DUMP ####";
const FOOTER: &str = "##################################";

/// Everything needed to file a bug about an unreadable save.
#[derive(Debug, Clone)]
pub struct BugReport {
    pub timestamp: String,
    pub kind: ErrorKind,
    pub message: String,
    pub trace: String,
    /// Raw bytes of the unreadable save, if any could be read.
    pub raw_save: Option<Vec<u8>>,
}

impl BugReport {
    pub fn new(kind: ErrorKind, message: String, trace: String, raw_save: Option<Vec<u8>>) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            kind,
            message,
            trace,
            raw_save,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            HEADER.to_string(),
            format!("{} - {}: {}", self.timestamp, self.kind, self.message),
            String::new(),
            format!(
                "VERSION: {} (save format {FORMAT_VERSION})",
                env!("CARGO_PKG_VERSION")
            ),
            String::new(),
            "STACK TRACE:".to_string(),
            self.trace.clone(),
        ];

        if let Some(raw) = self.raw_save.as_deref().filter(|raw| !raw.is_empty()) {
            lines.push(String::new());
            lines.push("CURRENT STATE:".to_string());
            lines.push(STANDARD.encode(raw));
        }

        lines.push(FOOTER.to_string());
        lines.join("\n")
    }
}
