//! `docent serve`: start the HTTP API server.

use std::path::Path;

pub async fn run(
    explicit: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(explicit)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Docent API");
    println!("  Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("  Retrieval: {:?}", config.retrieval.mode);

    docent_gateway::start(config).await?;

    Ok(())
}
