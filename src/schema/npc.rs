//! NPC records and the generation requests that seed them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::property::Schema;

/// Identifier used for documents whose NPC has no name.
pub const DEFAULT_NPC_NAME: &str = "new_npc";

/// The document identifier for an NPC name: the name verbatim, or the
/// default when empty.
pub fn document_identifier(name: &str) -> &str {
    if name.is_empty() {
        DEFAULT_NPC_NAME
    } else {
        name
    }
}

/// The raw, untyped state of one property.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RawValue {
    /// No value yet; the resolver will try to fill it.
    #[default]
    Unresolved,
    /// A concrete value, either entered explicitly or drawn from a source.
    Resolved(String),
}

impl RawValue {
    /// Blank input counts as "no value".
    pub fn from_input(input: &str) -> Self {
        if input.trim().is_empty() {
            Self::Unresolved
        } else {
            Self::Resolved(input.to_string())
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::Unresolved => None,
        }
    }
}

/// Everything a caller knows up front about the NPC to generate.
///
/// Assembled whole by the caller (a form, a CLI, a test) and handed to the
/// generator in one piece.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overrides: IndexMap<String, String>,
}

impl BuildRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: IndexMap::new(),
        }
    }

    pub fn with_value(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(property.into(), value.into());
        self
    }
}

/// A single NPC being generated. Property keys follow schema order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub name: String,
    properties: IndexMap<String, RawValue>,
}

impl Npc {
    /// Start a record with every schema property unresolved.
    pub fn new(name: impl Into<String>, schema: &Schema) -> Self {
        let properties = schema
            .iter()
            .map(|def| (def.name.clone(), RawValue::Unresolved))
            .collect();
        Self {
            name: name.into(),
            properties,
        }
    }

    /// Build a record from a request. Returns the record together with any
    /// override names the schema does not define; those are ignored.
    pub fn from_request(schema: &Schema, request: &BuildRequest) -> (Self, Vec<String>) {
        let mut npc = Self::new(request.name.clone(), schema);
        let mut unknown = Vec::new();
        for (property, value) in &request.overrides {
            if !npc.set_input(property, value) {
                unknown.push(property.clone());
            }
        }
        (npc, unknown)
    }

    /// Record explicit input for a property. Returns false when the
    /// property is not part of this record.
    pub fn set_input(&mut self, property: &str, input: &str) -> bool {
        match self.properties.get_mut(property) {
            Some(slot) => {
                *slot = RawValue::from_input(input);
                true
            }
            None => false,
        }
    }

    /// Fill an unresolved property. A property that already holds a value
    /// is left as it is; returns whether the value was stored.
    pub fn fill(&mut self, property: &str, value: String) -> bool {
        match self.properties.get_mut(property) {
            Some(slot) if !slot.is_resolved() => {
                *slot = RawValue::Resolved(value);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, property: &str) -> Option<&RawValue> {
        self.properties.get(property)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn identifier(&self) -> &str {
        document_identifier(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::property::{PropertyDefinition, PropertyType};

    fn schema() -> Schema {
        Schema::from_definitions([
            PropertyDefinition::new("race", PropertyType::Link, "Races"),
            PropertyDefinition::new("age", PropertyType::Number, "Tables/ages"),
        ])
        .unwrap()
    }

    #[test]
    fn new_record_is_unresolved() {
        let npc = Npc::new("Gronk", &schema());
        assert!(npc.properties().all(|(_, v)| *v == RawValue::Unresolved));
        assert_eq!(npc.properties().count(), 2);
    }

    #[test]
    fn request_overrides_applied() {
        let request = BuildRequest::named("Gronk")
            .with_value("race", "Orc")
            .with_value("age", "  ")
            .with_value("mood", "grumpy");
        let (npc, unknown) = Npc::from_request(&schema(), &request);
        assert_eq!(npc.get("race"), Some(&RawValue::Resolved("Orc".to_string())));
        assert_eq!(npc.get("age"), Some(&RawValue::Unresolved));
        assert_eq!(unknown, vec!["mood".to_string()]);
    }

    #[test]
    fn fill_never_overwrites() {
        let mut npc = Npc::new("", &schema());
        assert!(npc.fill("race", "Elf".to_string()));
        assert!(!npc.fill("race", "Dwarf".to_string()));
        assert_eq!(npc.get("race").and_then(RawValue::as_str), Some("Elf"));
        assert!(!npc.fill("missing", "x".to_string()));
    }

    #[test]
    fn identifier_falls_back_to_default() {
        assert_eq!(Npc::new("Gronk", &schema()).identifier(), "Gronk");
        assert_eq!(Npc::new("", &schema()).identifier(), "new_npc");
    }

    #[test]
    fn properties_follow_schema_order() {
        let request = BuildRequest::new()
            .with_value("age", "30")
            .with_value("race", "Orc");
        let (npc, _) = Npc::from_request(&schema(), &request);
        let keys: Vec<&str> = npc.properties().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["race", "age"]);
    }
}
