//! `docent onboard`: first-time setup.

use std::path::Path;

use docent_config::AppConfig;

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_path(explicit);

    println!("Docent, first-time setup");
    println!("========================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if dir.exists() {
            println!("  Config directory exists: {}", dir.display());
        } else {
            std::fs::create_dir_all(dir)?;
            println!("  Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("  Created config.toml at: {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Point [retrieval].corpus_paths at your documents");
    println!("  2. Pick a provider (ollama runs locally, no key needed)");
    println!("  3. Run: docent chat\n");

    Ok(())
}
