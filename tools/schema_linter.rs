//! Schema Linter — checks a generator configuration and its sources.
//!
//! Usage: schema_linter <config.ron> [--vault <dir>]
use random_npc::core::source::{self, SourceError};
use random_npc::core::storage::{Storage, VaultStorage};
use random_npc::schema::config::GeneratorConfig;
use random_npc::schema::property::{PropertyType, SchemaError};
use std::path::Path;
use std::process;

const USAGE: &str = "Usage: schema_linter <config.ron> [--vault <dir>]";

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("{}", USAGE);
        process::exit(0);
    }

    let config_path = &args[1];
    let mut vault_root = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--vault" if i + 1 < args.len() => {
                i += 1;
                vault_root = Some(args[i].clone());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    let (errors, warnings) = match GeneratorConfig::load_from_ron(Path::new(config_path)) {
        Ok(config) => {
            println!("Loaded {} properties", config.schema.len());
            let storage = vault_root.map(VaultStorage::new);
            lint_config(&config, storage.as_ref())
        }
        // Schema problems are lint findings; anything else means there is
        // nothing to lint.
        Err(SchemaError::DuplicateProperty(name)) => (
            vec![format!("Property '{}' is defined more than once", name)],
            Vec::new(),
        ),
        Err(e @ (SchemaError::UnknownPropertyType { .. } | SchemaError::EmptyPropertyName)) => {
            (vec![e.to_string()], Vec::new())
        }
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    println!("\n=== Schema Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_config(config: &GeneratorConfig, storage: Option<&VaultStorage>) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if config.schema.is_empty() {
        warnings.push("No properties defined; documents will only carry tags".to_string());
    }

    for def in config.schema.iter() {
        if def.source.trim().is_empty() {
            warnings.push(format!(
                "Property '{}' has no source and can only be set explicitly",
                def.name
            ));
            continue;
        }

        if def.name == "tags" && !matches!(def.kind, PropertyType::List | PropertyType::Text) {
            warnings.push(format!(
                "Property 'tags' is a {}; only list and text values extend the npc tag",
                def.kind
            ));
        }

        let Some(storage) = storage else {
            continue;
        };

        if !storage.exists(&def.source) && storage.exists(&format!("{}{}", def.source, storage.implicit_suffix())) {
            warnings.push(format!(
                "Property '{}' source '{}' only resolves with '{}' appended",
                def.name,
                def.source,
                storage.implicit_suffix()
            ));
        }

        match source::resolve(storage, &def.source) {
            Ok(candidates) if candidates.is_empty() => warnings.push(format!(
                "Property '{}' source '{}' has no candidates",
                def.name, def.source
            )),
            Ok(_) => {}
            Err(SourceError::InvalidSourcePath(locator)) => errors.push(format!(
                "Property '{}' source '{}' does not exist",
                def.name, locator
            )),
            Err(e) => errors.push(format!("Property '{}': {}", def.name, e)),
        }
    }

    if let Some(storage) = storage {
        if !config.npc_folder.is_empty() && !storage.exists(&config.npc_folder) {
            warnings.push(format!(
                "NPC folder '{}' does not exist yet and will be created",
                config.npc_folder
            ));
        }
    }

    (errors, warnings)
}
