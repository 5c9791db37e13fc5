//! Generator configuration, read from RON.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::property::{RonProperties, Schema, SchemaError};

/// Settings for one generator: where documents go and what they contain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Folder (locator) new NPC documents are created in. Empty is the vault root.
    pub npc_folder: String,
    pub schema: Schema,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "Config")]
struct RonConfig {
    #[serde(default)]
    npc_folder: String,
    #[serde(default)]
    properties: RonProperties,
}

impl GeneratorConfig {
    pub fn new(npc_folder: impl Into<String>, schema: Schema) -> Self {
        Self {
            npc_folder: npc_folder.into(),
            schema,
        }
    }

    /// Load a configuration from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<GeneratorConfig, SchemaError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a configuration from a RON string. Every property type is
    /// checked here, so a bad schema fails before any source is touched.
    pub fn parse_ron(input: &str) -> Result<GeneratorConfig, SchemaError> {
        let raw: RonConfig = ron::from_str(input)?;
        Ok(GeneratorConfig {
            npc_folder: raw.npc_folder,
            schema: Schema::from_ron_properties(raw.properties)?,
        })
    }

    pub fn to_ron_string(&self) -> Result<String, SchemaError> {
        let raw = RonConfig {
            npc_folder: self.npc_folder.clone(),
            properties: self.schema.to_ron_properties(),
        };
        Ok(ron::ser::to_string_pretty(
            &raw,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn save_to_ron(&self, path: &Path) -> Result<(), SchemaError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}
