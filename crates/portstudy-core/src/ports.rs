use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StudyError, StudyResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transport {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
    #[serde(rename = "TCP/UDP")]
    TcpUdp,
}

impl Transport {
    pub const ALL: [Transport; 3] = [Self::Tcp, Self::Udp, Self::TcpUdp];
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
            Self::TcpUdp => write!(f, "TCP/UDP"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PortDifficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl fmt::Display for PortDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortInfo {
    pub protocol: String,
    pub transport: Transport,
    pub common_usage: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub difficulty: PortDifficulty,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similar_ports: Vec<String>,
}

/// Port number string to port facts, ordered by key.
#[derive(Debug, Clone, Default)]
pub struct PortCatalog {
    ports: BTreeMap<String, PortInfo>,
}

impl PortCatalog {
    pub fn from_json(json: &str) -> StudyResult<Self> {
        let ports: BTreeMap<String, PortInfo> = serde_json::from_str(json)?;
        if ports.is_empty() {
            return Err(StudyError::Config("port catalog is empty".into()));
        }
        for port in ports.keys() {
            if !matches!(port.parse::<u16>(), Ok(n) if n > 0) {
                return Err(StudyError::Config(format!("invalid port number: {port:?}")));
            }
        }
        Ok(Self { ports })
    }

    pub fn get(&self, port: &str) -> Option<&PortInfo> {
        self.ports.get(port)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PortInfo)> {
        self.ports.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}
