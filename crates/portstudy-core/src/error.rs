use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("save data integrity check failed: checksum {stored:#06x}, expected {computed:#06x}")]
    Integrity { stored: u16, computed: u16 },

    #[error("malformed save data: {0}")]
    Decode(String),

    #[error("incompatible save format version: {found} (supported: {supported})")]
    Version { found: u32, supported: u32 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid level table: {0}")]
    InvalidLevelTable(String),

    #[error("save recovery aborted by user")]
    RecoveryAborted { report: String },
}

impl StudyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Integrity { .. } => ErrorKind::Integrity,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Version { .. } => ErrorKind::Version,
            Self::Io(_) => ErrorKind::Io,
            Self::Serialization(_) => ErrorKind::Parse,
            Self::Config(_) | Self::InvalidLevelTable(_) => ErrorKind::Config,
            Self::RecoveryAborted { .. } => ErrorKind::Aborted,
        }
    }
}

/// Flat error tag used in bug reports and `verify` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Integrity,
    Decode,
    Version,
    Io,
    Parse,
    Config,
    Aborted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integrity => write!(f, "IntegrityError"),
            Self::Decode => write!(f, "DecodeError"),
            Self::Version => write!(f, "VersionError"),
            Self::Io => write!(f, "IoError"),
            Self::Parse => write!(f, "ParseError"),
            Self::Config => write!(f, "ConfigError"),
            Self::Aborted => write!(f, "RecoveryAborted"),
        }
    }
}

pub type StudyResult<T> = Result<T, StudyError>;
