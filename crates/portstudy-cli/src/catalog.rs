use std::path::Path;

use anyhow::{Context, Result};

use portstudy_core::PortCatalog;

const BUILTIN_PORTS: &str = include_str!("../data/ports.json");

/// Load the port knowledge base from `path`, or the built-in list.
pub fn load_catalog(path: Option<&Path>) -> Result<PortCatalog> {
    let Some(path) = path else {
        return PortCatalog::from_json(BUILTIN_PORTS).context("built-in port list is invalid");
    };

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("port data not found at {}", path.display()))?;
    PortCatalog::from_json(&content)
        .with_context(|| format!("port data at {} is corrupted or invalid", path.display()))
}
