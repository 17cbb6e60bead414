use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Connection parameters for the graph store, read from the `[neo4j]`
/// section of `config.toml`. A missing file falls back to defaults so
/// the extraction stages work without any store configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "12345678".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub neo4j: Neo4jSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let settings: Settings =
            toml::from_str(&raw).with_context(|| format!("Invalid config file: {:?}", path))?;
        Ok(settings)
    }
}
