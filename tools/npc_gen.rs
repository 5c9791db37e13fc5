//! NPC Generator — creates random NPC documents in a vault.
//!
//! Usage: npc_gen --config <file.ron> --vault <dir> [--name <name>]
//!                [--set <property>=<value>]... [--seed <n>] [--count <n>] [--dry-run]
use random_npc::core::pipeline::{GeneratedNpc, NpcGenerator};
use random_npc::core::storage::VaultStorage;
use random_npc::schema::npc::BuildRequest;
use std::process;

const USAGE: &str = "Usage: npc_gen --config <file.ron> --vault <dir> [--name <name>] \
[--set <property>=<value>]... [--seed <n>] [--count <n>] [--dry-run]";

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = None;
    let mut vault = None;
    let mut request = BuildRequest::new();
    let mut seed = None;
    let mut count = 1usize;
    let mut dry_run = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config = Some(args[i].clone());
            }
            "--vault" if i + 1 < args.len() => {
                i += 1;
                vault = Some(args[i].clone());
            }
            "--name" if i + 1 < args.len() => {
                i += 1;
                request.name = args[i].clone();
            }
            "--set" if i + 1 < args.len() => {
                i += 1;
                match args[i].split_once('=') {
                    Some((property, value)) => {
                        request = request.with_value(property.trim(), value);
                    }
                    None => {
                        eprintln!("Error: --set expects <property>=<value>, got '{}'", args[i]);
                        process::exit(1);
                    }
                }
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = Some(args[i].parse::<u64>().unwrap_or_else(|_| {
                    eprintln!("Error: --seed must be a non-negative integer");
                    process::exit(1);
                }));
            }
            "--count" if i + 1 < args.len() => {
                i += 1;
                count = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Error: --count must be a positive integer");
                    process::exit(1);
                });
            }
            "--dry-run" => dry_run = true,
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config_path = config.unwrap_or_else(|| {
        eprintln!("Error: --config is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });
    let vault_root = vault.unwrap_or_else(|| {
        eprintln!("Error: --vault is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });
    if count == 0 {
        eprintln!("Error: --count must be a positive integer");
        process::exit(1);
    }

    let mut builder = NpcGenerator::builder().config_file(&config_path);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let mut generator = builder.build().unwrap_or_else(|e| {
        eprintln!("ERROR: {}", e);
        process::exit(1);
    });

    let storage = VaultStorage::new(&vault_root);

    if dry_run {
        for _ in 0..count {
            match generator.draft(&storage, &request) {
                Ok(generated) => {
                    println!("--- {} ---", generated.path);
                    println!("{}", generated.document);
                    print_diagnostics(&generated);
                }
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    process::exit(1);
                }
            }
        }
        return;
    }

    match generator.generate_batch(&storage, &request, count) {
        Ok(batch) => {
            for generated in &batch {
                println!("Created new NPC: {}", generated.identifier);
                print_diagnostics(generated);
            }
        }
        Err(e) => {
            for generated in &e.created {
                println!("Created new NPC: {}", generated.identifier);
                print_diagnostics(generated);
            }
            eprintln!("ERROR: {}", e);
            eprintln!(
                "Failed to create NPC file ({} of {} created)",
                e.created.len(),
                e.requested
            );
            process::exit(1);
        }
    }
}

fn print_diagnostics(generated: &GeneratedNpc) {
    for diagnostic in &generated.diagnostics {
        println!("  WARNING: {}", diagnostic);
    }
}
