//! `docent chat`: interactive question/answer session over stdin.
//!
//! Every line is a question answered against the corpus. The end keyword
//! prints the quiz for the conversation and exits.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docent_agent::{AskOutcome, ChatService, SessionRegistry};
use docent_config::AppConfig;
use docent_core::quiz::Quiz;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    explicit: Option<&Path>,
    corpus: Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(explicit)?;
    if !corpus.is_empty() {
        config.retrieval.corpus_paths = corpus.iter().map(|p| p.display().to_string()).collect();
    }

    let service = build_service(&config).await?;
    let (session_id, _) = service.create_session().await;
    let stats = service.stats().await;

    println!();
    println!("  Docent, interactive mode");
    println!();
    println!("  Provider:  {}", stats.provider);
    println!("  Model:     {}", stats.model);
    println!("  Index:     {} ({} chunks)", stats.retriever, stats.indexed_chunks);
    println!();
    println!("  Ask a question and press Enter.");
    println!("  Type '{}' to finish and get your quiz.", service.end_keyword());
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            prompt()?;
            continue;
        }

        eprint!("  ...");
        let outcome = service.ask(&line, Some(session_id.as_str())).await;
        eprint!("\r     \r");

        match outcome {
            Ok(AskOutcome::Answer { answer, .. }) => {
                println!();
                for line in answer.lines() {
                    println!("  Docent > {line}");
                }
                println!();
            }
            Ok(AskOutcome::Ended { quiz, .. }) => {
                print_quiz(&quiz);
                return Ok(());
            }
            Err(e) => {
                eprintln!("  [Error] {e}");
                println!();
            }
        }

        prompt()?;
    }

    println!();
    println!("  Input closed before '{}', no quiz generated.", service.end_keyword());
    Ok(())
}

/// Wire provider, index and registry into a chat service.
pub async fn build_service(config: &AppConfig) -> Result<ChatService, Box<dyn std::error::Error>> {
    let router = docent_providers::router::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;
    let retriever = docent_index::build_retriever(&config.retrieval, provider.clone()).await?;
    if retriever.is_empty() {
        eprintln!("  Warning: corpus is empty, answers will not be grounded in any document");
    }

    let registry = Arc::new(SessionRegistry::new());
    Ok(ChatService::from_config(config, provider, retriever, registry))
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_quiz(quiz: &Quiz) {
    println!();
    println!("  Session ended. Your quiz:");
    println!();
    for (number, item) in quiz.items().iter().enumerate() {
        println!("  {}. {}", number + 1, item.question);
        for (letter, option) in ('a'..='z').zip(&item.options) {
            println!("     {letter}) {option}");
        }
        println!("     Answer: {}", item.answer);
        println!();
    }
}
