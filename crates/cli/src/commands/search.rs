//! `docent search`: print the passages the index returns for a query.

use std::path::Path;

pub async fn run(
    explicit: Option<&Path>,
    query: &str,
    k: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(explicit)?;

    let router = docent_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    let retriever = docent_index::build_retriever(&config.retrieval, provider).await?;

    let passages = retriever.search(query, k.max(1)).await?;
    if passages.is_empty() {
        println!("No passages matched ({} indexed).", retriever.len());
        return Ok(());
    }

    for (rank, passage) in passages.iter().enumerate() {
        println!("[{}] {} (score {:.3})", rank + 1, passage.source, passage.score);
        for line in passage.content.lines() {
            println!("    {line}");
        }
        println!();
    }

    Ok(())
}
