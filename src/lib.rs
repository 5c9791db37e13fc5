//! Random NPC — schema-driven character profile generation.
//!
//! Fills a user-defined schema of typed properties with values drawn at
//! random from lists and folders in a markdown vault, then writes each
//! character out as a document with a frontmatter block and a heading.

pub mod core;
pub mod schema;
