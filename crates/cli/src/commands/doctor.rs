//! `docent doctor`: diagnose configuration, provider and corpus.

use std::path::Path;

use docent_config::{AppConfig, RetrievalConfig, RetrievalMode};

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Docent doctor, system diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let config_path = super::config_path(explicit);
    let config = if config_path.exists() {
        match AppConfig::load_with_overrides(&config_path) {
            Ok(config) => {
                println!("  [ok]   Config file valid: {}", config_path.display());
                config
            }
            Err(e) => {
                println!("  [fail] Config file invalid: {e}");
                println!("\n  1 issue found, fix the config before continuing.");
                return Ok(());
            }
        }
    } else {
        println!("  [warn] No config file, using defaults (run `docent onboard`)");
        issues += 1;
        AppConfig::default()
    };

    let router = docent_providers::router::build_from_config(&config);
    match router.default() {
        Some(provider) => match provider.health_check().await {
            Ok(true) => println!(
                "  [ok]   Provider '{}' reachable (model {})",
                config.default_provider, config.active_model()
            ),
            Ok(false) => {
                println!("  [fail] Provider '{}' responded but is unhealthy", config.default_provider);
                issues += 1;
            }
            Err(e) => {
                println!("  [fail] Provider '{}' unreachable: {e}", config.default_provider);
                issues += 1;
            }
        },
        None => {
            println!("  [fail] Provider '{}' not configured", config.default_provider);
            issues += 1;
        }
    }

    let chunks = docent_index::load_chunks(&config.retrieval);
    if chunks.is_empty() {
        println!("  [warn] Corpus is empty, set [retrieval].corpus_paths or DOCENT_CORPUS");
        issues += 1;
    } else {
        println!("  [ok]   Corpus indexed into {} chunks", chunks.len());
    }

    println!("  [info] Retrieval mode: {}", describe_retrieval(&config.retrieval));

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

fn describe_retrieval(config: &RetrievalConfig) -> String {
    match config.mode {
        RetrievalMode::Keyword => "keyword (term overlap). Set [retrieval].mode = \"vector\" \
             to rank by embedding similarity if the provider serves /embeddings"
            .to_string(),
        RetrievalMode::Vector => format!("vector (embeddings from '{}')", config.embedding_model),
        RetrievalMode::Hybrid => format!(
            "hybrid (keyword + embeddings from '{}')",
            config.embedding_model
        ),
    }
}
