//! The generation pipeline: request → resolved record → typed values →
//! document → storage.
//!
//! Properties are resolved one at a time in schema order. Per-property
//! problems become [`Diagnostic`]s; only schema and persistence failures
//! abort a request.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::coerce::{coerce, PropertyValue};
use crate::core::diagnostics::Diagnostic;
use crate::core::selector::pick;
use crate::core::source::{self, SourceError};
use crate::core::storage::{join_locator, Storage, StorageError};
use crate::core::synth::synthesize;
use crate::schema::config::GeneratorConfig;
use crate::schema::npc::{document_identifier, BuildRequest, Npc, RawValue};
use crate::schema::property::{Schema, SchemaError};

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("failed to create NPC document '{path}': {source}")]
    DocumentCreationFailure {
        path: String,
        #[source]
        source: StorageError,
    },
    #[error("frontmatter serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A batch that stopped part way. `created` holds every NPC persisted
/// before `source` ended the batch.
#[derive(Debug, Error)]
#[error("batch stopped after {} of {requested} NPCs: {source}", .created.len())]
pub struct BatchError {
    pub created: Vec<GeneratedNpc>,
    pub requested: usize,
    #[source]
    pub source: GenerateError,
}

/// Fill every unresolved property of `npc` from its configured source.
///
/// Properties that already hold a value are never touched. A property whose
/// source is missing or empty stays unresolved.
pub fn resolve_properties<S, R>(
    schema: &Schema,
    npc: &mut Npc,
    storage: &S,
    rng: &mut R,
) -> Vec<Diagnostic>
where
    S: Storage + ?Sized,
    R: Rng + ?Sized,
{
    let mut diagnostics = Vec::new();

    for def in schema.iter() {
        if npc.get(&def.name).map_or(true, RawValue::is_resolved) {
            continue;
        }

        let candidates = match source::resolve(storage, &def.source) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(property = %def.name, "{}", e);
                let reason = match &e {
                    SourceError::InvalidSourcePath(_) => "not found".to_string(),
                    SourceError::Unreadable { source, .. } => source.to_string(),
                };
                diagnostics.push(Diagnostic::InvalidSourcePath {
                    property: def.name.clone(),
                    locator: e.locator().to_string(),
                    reason,
                });
                continue;
            }
        };

        match pick(&candidates, rng) {
            Some(value) => {
                debug!(property = %def.name, value, "resolved from '{}'", def.source);
                npc.fill(&def.name, value.to_string());
            }
            None => {
                warn!(property = %def.name, "source '{}' has no candidates", def.source);
                diagnostics.push(Diagnostic::EmptyCandidateSet {
                    property: def.name.clone(),
                    locator: def.source.clone(),
                });
            }
        }
    }

    diagnostics
}

/// Coerce every resolved property to its declared kind, in schema order.
/// Unresolved properties are skipped; values that fail coercion are
/// reported and left out.
pub fn typed_properties(schema: &Schema, npc: &Npc) -> (Vec<(String, PropertyValue)>, Vec<Diagnostic>) {
    let mut values = Vec::new();
    let mut diagnostics = Vec::new();

    for def in schema.iter() {
        let Some(raw) = npc.get(&def.name).and_then(RawValue::as_str) else {
            continue;
        };
        match coerce(raw, def.kind) {
            Ok(value) => values.push((def.name.clone(), value)),
            Err(e) => {
                warn!(property = %def.name, kind = %def.kind, "{}", e);
                diagnostics.push(Diagnostic::TypeCoercionFailure {
                    property: def.name.clone(),
                    kind: def.kind,
                    raw: raw.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    (values, diagnostics)
}

/// Result of one generation request.
#[derive(Debug, Clone)]
pub struct GeneratedNpc {
    pub npc: Npc,
    /// Document identifier (the file's base name).
    pub identifier: String,
    /// Locator the document was (or would be) stored under.
    pub path: String,
    pub document: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generates NPC documents for one configuration. Built via
/// `NpcGenerator::builder()`.
pub struct NpcGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    seed: Option<u64>,
}

/// Builder for constructing an `NpcGenerator`.
pub struct NpcGeneratorBuilder {
    config: Option<GeneratorConfig>,
    config_path: Option<String>,
    seed: Option<u64>,
}

impl NpcGenerator {
    pub fn builder() -> NpcGeneratorBuilder {
        NpcGeneratorBuilder {
            config: None,
            config_path: None,
            seed: None,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Run a request up to, but not including, persistence.
    pub fn draft<S: Storage + ?Sized>(
        &mut self,
        storage: &S,
        request: &BuildRequest,
    ) -> Result<GeneratedNpc, GenerateError> {
        let schema = &self.config.schema;
        let (mut npc, unknown) = Npc::from_request(schema, request);

        let mut diagnostics: Vec<Diagnostic> = unknown
            .into_iter()
            .map(|property| {
                warn!(property = %property, "override for undefined property ignored");
                Diagnostic::UnknownOverride { property }
            })
            .collect();

        diagnostics.extend(resolve_properties(schema, &mut npc, storage, &mut self.rng));

        let (values, coercion_diagnostics) = typed_properties(schema, &npc);
        diagnostics.extend(coercion_diagnostics);

        let document = synthesize(
            &npc.name,
            values.iter().map(|(name, value)| (name.as_str(), value)),
        )?;

        let identifier = npc.identifier().to_string();
        let path = join_locator(
            &self.config.npc_folder,
            &format!("{}{}", identifier, storage.implicit_suffix()),
        );

        Ok(GeneratedNpc {
            npc,
            identifier,
            path,
            document,
            diagnostics,
        })
    }

    /// Run a request and persist the document. Nothing is written unless
    /// the whole document was produced.
    pub fn generate<S: Storage + ?Sized>(
        &mut self,
        storage: &S,
        request: &BuildRequest,
    ) -> Result<GeneratedNpc, GenerateError> {
        let mut generated = self.draft(storage, request)?;
        let path = storage
            .create_document(&generated.path, &generated.document)
            .map_err(|source| GenerateError::DocumentCreationFailure {
                path: generated.path.clone(),
                source,
            })?;
        info!(
            path = %path,
            diagnostics = generated.diagnostics.len(),
            "created NPC '{}'",
            generated.identifier
        );
        generated.path = path;
        Ok(generated)
    }

    /// Generate `count` independent NPCs from one request. Every NPC after
    /// the first gets a numbered name so the batch does not collide with
    /// itself. The batch stops at the first failure; the error carries the
    /// NPCs already written.
    pub fn generate_batch<S: Storage + ?Sized>(
        &mut self,
        storage: &S,
        request: &BuildRequest,
        count: usize,
    ) -> Result<Vec<GeneratedNpc>, BatchError> {
        let base = document_identifier(&request.name).to_string();
        let mut created = Vec::with_capacity(count);
        for i in 0..count {
            let mut req = request.clone();
            if i > 0 {
                req.name = format!("{} {}", base, i + 1);
            }
            match self.generate(storage, &req) {
                Ok(generated) => created.push(generated),
                Err(source) => {
                    warn!(created = created.len(), requested = count, "batch stopped: {}", source);
                    return Err(BatchError {
                        created,
                        requested: count,
                        source,
                    });
                }
            }
        }
        Ok(created)
    }
}

impl NpcGeneratorBuilder {
    pub fn config(mut self, config: GeneratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the configuration from a RON file when building.
    pub fn config_file(mut self, path: &str) -> Self {
        self.config_path = Some(path.to_string());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<NpcGenerator, GenerateError> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => GeneratorConfig::load_from_ron(Path::new(&path))?,
            (None, None) => GeneratorConfig::default(),
        };

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(NpcGenerator {
            config,
            rng,
            seed: self.seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;
    use crate::schema::property::{PropertyDefinition, PropertyType};
    use rand::rngs::mock::StepRng;

    fn schema() -> Schema {
        Schema::from_definitions([
            PropertyDefinition::new("race", PropertyType::Link, "Races"),
            PropertyDefinition::new("job", PropertyType::Text, "Tables/jobs"),
            PropertyDefinition::new("age", PropertyType::Number, "Tables/ages"),
            PropertyDefinition::new("hostile", PropertyType::Checkbox, "Tables/missing"),
            PropertyDefinition::new("quirk", PropertyType::Text, "Tables/empty"),
        ])
        .unwrap()
    }

    fn storage() -> MemoryStorage {
        MemoryStorage::new()
            .with_document("Races/Elf.md", "")
            .with_document("Races/Orc.md", "")
            .with_document("Tables/jobs.md", "Smith\nBaker")
            .with_document("Tables/ages.md", "old\n")
            .with_document("Tables/empty.md", "\n\n")
    }

    fn build_generator(seed: u64) -> NpcGenerator {
        NpcGenerator::builder()
            .config(GeneratorConfig::new("NPCs", schema()))
            .seed(seed)
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_fills_from_sources() {
        let schema = schema();
        let mut npc = Npc::new("Gronk", &schema);
        let mut rng = StepRng::new(0, 0);
        let diagnostics = resolve_properties(&schema, &mut npc, &storage(), &mut rng);

        assert_eq!(npc.get("race").and_then(RawValue::as_str), Some("Elf"));
        assert_eq!(npc.get("job").and_then(RawValue::as_str), Some("Smith"));
        assert_eq!(npc.get("age").and_then(RawValue::as_str), Some("old"));
        assert_eq!(npc.get("hostile"), Some(&RawValue::Unresolved));
        assert_eq!(npc.get("quirk"), Some(&RawValue::Unresolved));

        assert_eq!(diagnostics.len(), 2);
        assert!(matches!(&diagnostics[0], Diagnostic::InvalidSourcePath { property, .. } if property == "hostile"));
        assert!(matches!(&diagnostics[1], Diagnostic::EmptyCandidateSet { property, .. } if property == "quirk"));
    }

    #[test]
    fn explicit_values_untouched() {
        let schema = schema();
        let request = BuildRequest::named("Gronk")
            .with_value("race", "Goblin")
            .with_value("hostile", "yes");
        let (mut npc, _) = Npc::from_request(&schema, &request);
        let mut rng = StepRng::new(0, 0);
        resolve_properties(&schema, &mut npc, &storage(), &mut rng);

        assert_eq!(npc.get("race").and_then(RawValue::as_str), Some("Goblin"));
        assert_eq!(npc.get("hostile").and_then(RawValue::as_str), Some("yes"));
    }

    #[test]
    fn coercion_failures_reported() {
        let schema = schema();
        let mut npc = Npc::new("Gronk", &schema);
        npc.fill("age", "old".to_string());
        npc.fill("race", "Orc".to_string());
        let (values, diagnostics) = typed_properties(&schema, &npc);

        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0, "race");
        assert!(matches!(
            &diagnostics[..],
            [Diagnostic::TypeCoercionFailure { property, kind: PropertyType::Number, .. }] if property == "age"
        ));
    }

    #[test]
    fn generate_writes_document() {
        let storage = storage();
        let mut generator = build_generator(42);
        let request = BuildRequest::named("Gronk").with_value("age", "42");
        let generated = generator.generate(&storage, &request).unwrap();

        assert_eq!(generated.identifier, "Gronk");
        assert_eq!(generated.path, "NPCs/Gronk.md");
        let stored = storage.document("NPCs/Gronk.md").unwrap();
        assert_eq!(stored, generated.document);
        assert!(stored.contains("\"age\":42"));
        assert!(stored.contains("\"tags\":[\"npc\"]"));
        assert!(!stored.contains("hostile"));
        assert!(!stored.contains("quirk"));
    }

    #[test]
    fn unnamed_npc_uses_default_identifier() {
        let storage = storage();
        let mut generator = build_generator(1);
        let generated = generator.generate(&storage, &BuildRequest::new()).unwrap();
        assert_eq!(generated.identifier, "new_npc");
        assert_eq!(generated.path, "NPCs/new_npc.md");
    }

    #[test]
    fn existing_document_is_fatal() {
        let storage = storage().with_document("NPCs/Gronk.md", "original");
        let mut generator = build_generator(1);
        let err = generator
            .generate(&storage, &BuildRequest::named("Gronk"))
            .unwrap_err();
        assert!(matches!(err, GenerateError::DocumentCreationFailure { .. }));
        assert_eq!(storage.document("NPCs/Gronk.md").as_deref(), Some("original"));
    }

    #[test]
    fn same_seed_same_document() {
        let a = build_generator(7).draft(&storage(), &BuildRequest::named("A")).unwrap();
        let b = build_generator(7).draft(&storage(), &BuildRequest::named("A")).unwrap();
        assert_eq!(a.document, b.document);
    }

    #[test]
    fn draft_does_not_persist() {
        let storage = storage();
        let before = storage.document_count();
        build_generator(3).draft(&storage, &BuildRequest::named("Gronk")).unwrap();
        assert_eq!(storage.document_count(), before);
    }

    #[test]
    fn batch_numbers_names() {
        let storage = storage();
        let mut generator = build_generator(5);
        let batch = generator
            .generate_batch(&storage, &BuildRequest::named("Gronk"), 3)
            .unwrap();
        let paths: Vec<&str> = batch.iter().map(|g| g.path.as_str()).collect();
        assert_eq!(paths, vec!["NPCs/Gronk.md", "NPCs/Gronk 2.md", "NPCs/Gronk 3.md"]);
    }

    #[test]
    fn failed_batch_reports_created_npcs() {
        let storage = storage().with_document("NPCs/Gronk 2.md", "hand written");
        let mut generator = build_generator(5);
        let err = generator
            .generate_batch(&storage, &BuildRequest::named("Gronk"), 3)
            .unwrap_err();

        assert_eq!(err.requested, 3);
        let paths: Vec<&str> = err.created.iter().map(|g| g.path.as_str()).collect();
        assert_eq!(paths, vec!["NPCs/Gronk.md"]);
        assert!(matches!(
            &err.source,
            GenerateError::DocumentCreationFailure { path, .. } if path == "NPCs/Gronk 2.md"
        ));
        assert!(storage.document("NPCs/Gronk.md").is_some());
        assert_eq!(storage.document("NPCs/Gronk 2.md").as_deref(), Some("hand written"));
        assert!(storage.document("NPCs/Gronk 3.md").is_none());
    }

    #[test]
    fn unknown_override_reported() {
        let mut generator = build_generator(9);
        let generated = generator
            .draft(&storage(), &BuildRequest::named("Gronk").with_value("mood", "sly"))
            .unwrap();
        assert!(generated
            .diagnostics
            .contains(&Diagnostic::UnknownOverride { property: "mood".to_string() }));
    }

    #[test]
    fn builder_with_seed() {
        let generator = NpcGenerator::builder().seed(12345).build().unwrap();
        assert_eq!(generator.seed(), Some(12345));
        assert!(generator.config().schema.is_empty());
    }
}
