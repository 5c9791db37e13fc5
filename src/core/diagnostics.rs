//! Non-fatal, per-property problems found while generating an NPC.

use std::fmt;

use crate::schema::property::PropertyType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The source locator matched nothing, even with the implicit suffix,
    /// or could not be read.
    InvalidSourcePath {
        property: String,
        locator: String,
        reason: String,
    },
    /// The source resolved but had no usable candidates.
    EmptyCandidateSet { property: String, locator: String },
    /// The value could not be read as the property's type; the property
    /// is left out of the document.
    TypeCoercionFailure {
        property: String,
        kind: PropertyType,
        raw: String,
        reason: String,
    },
    /// The request supplied a value for a property the schema lacks.
    UnknownOverride { property: String },
}

impl Diagnostic {
    pub fn property(&self) -> &str {
        match self {
            Self::InvalidSourcePath { property, .. }
            | Self::EmptyCandidateSet { property, .. }
            | Self::TypeCoercionFailure { property, .. }
            | Self::UnknownOverride { property } => property,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSourcePath {
                property,
                locator,
                reason,
            } => write!(f, "{}: invalid source '{}' ({})", property, locator, reason),
            Self::EmptyCandidateSet { property, locator } => {
                write!(f, "{}: source '{}' has no candidates", property, locator)
            }
            Self::TypeCoercionFailure {
                property,
                kind,
                raw,
                reason,
            } => write!(
                f,
                "{}: '{}' is not a valid {} ({})",
                property, raw, kind, reason
            ),
            Self::UnknownOverride { property } => {
                write!(f, "{}: not defined in the schema, value ignored", property)
            }
        }
    }
}
