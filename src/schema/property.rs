//! Property schema — the ordered set of typed, sourced NPC properties.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("property '{property}' declares unknown type '{kind}'")]
    UnknownPropertyType { property: String, kind: String },
    #[error("property '{0}' already exists")]
    DuplicateProperty(String),
    #[error("property name must not be empty")]
    EmptyPropertyName,
    #[error("property '{0}' is not defined")]
    MissingProperty(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
}

/// The closed set of frontmatter property kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Text,
    Link,
    List,
    Number,
    Checkbox,
    Date,
    DateTime,
}

impl PropertyType {
    pub const ALL: [PropertyType; 7] = [
        Self::Text,
        Self::Link,
        Self::List,
        Self::Number,
        Self::Checkbox,
        Self::Date,
        Self::DateTime,
    ];

    /// The tag used in configuration files.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
            Self::List => "list",
            Self::Number => "number",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::DateTime => "dateTime",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Parses a configuration tag. Tags are matched exactly.
impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// One named, typed property and the locator its value is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    pub kind: PropertyType,
    pub source: String,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, kind: PropertyType, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            source: source.into(),
        }
    }
}

/// Ordered property definitions. Names are unique; declared order is the
/// order properties are resolved and emitted in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    properties: Vec<PropertyDefinition>,
}

/// Configuration shape of a single property entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RonProperty {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub source: String,
}

/// The `properties` block of a configuration, entries in file order.
///
/// Read as a map but kept as a list, so a repeated name survives parsing
/// and is rejected by [`Schema::add_property`] instead of silently
/// replacing the earlier definition.
#[derive(Debug, Clone, Default)]
pub(crate) struct RonProperties(pub Vec<(String, RonProperty)>);

impl Serialize for RonProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, prop)| (name, prop)))
    }
}

impl<'de> Deserialize<'de> for RonProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RonProperties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of property name to definition")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, RonProperty>()? {
                    entries.push(entry);
                }
                Ok(RonProperties(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a schema from definitions, rejecting empty and duplicate names.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = PropertyDefinition>,
    ) -> Result<Schema, SchemaError> {
        let mut schema = Schema::new();
        for def in definitions {
            schema.add_property(def)?;
        }
        Ok(schema)
    }

    /// Append a property definition.
    pub fn add_property(&mut self, def: PropertyDefinition) -> Result<(), SchemaError> {
        if def.name.trim().is_empty() {
            return Err(SchemaError::EmptyPropertyName);
        }
        if self.get(&def.name).is_some() {
            return Err(SchemaError::DuplicateProperty(def.name));
        }
        self.properties.push(def);
        Ok(())
    }

    /// Point an existing property at a different source locator.
    pub fn set_source(&mut self, name: &str, source: impl Into<String>) -> Result<(), SchemaError> {
        let def = self
            .properties
            .iter_mut()
            .find(|d| d.name == name)
            .ok_or_else(|| SchemaError::MissingProperty(name.to_string()))?;
        def.source = source.into();
        Ok(())
    }

    pub fn remove_property(&mut self, name: &str) -> Option<PropertyDefinition> {
        let idx = self.properties.iter().position(|d| d.name == name)?;
        Some(self.properties.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyDefinition> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub(crate) fn from_ron_properties(raw: RonProperties) -> Result<Schema, SchemaError> {
        let mut schema = Schema::new();
        for (name, prop) in raw.0 {
            let kind = prop
                .kind
                .parse::<PropertyType>()
                .map_err(|kind| SchemaError::UnknownPropertyType {
                    property: name.clone(),
                    kind,
                })?;
            schema.add_property(PropertyDefinition {
                name,
                kind,
                source: prop.source,
            })?;
        }
        Ok(schema)
    }

    pub(crate) fn to_ron_properties(&self) -> RonProperties {
        RonProperties(
            self.properties
                .iter()
                .map(|d| {
                    (
                        d.name.clone(),
                        RonProperty {
                            kind: d.kind.tag().to_string(),
                            source: d.source.clone(),
                        },
                    )
                })
                .collect(),
        )
    }
}
