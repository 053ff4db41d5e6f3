//! Shared test helpers: scripted provider and stub retriever.

use async_trait::async_trait;
use docent_core::error::{ProviderError, RetrievalError};
use docent_core::message::Message;
use docent_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use docent_core::retrieval::{Passage, Retriever};
use std::sync::Mutex;
use std::time::Duration;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next result in the queue.
/// Panics if more calls are made than results provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<Result<ProviderResponse, ProviderError>>>,
    call_count: Mutex<usize>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Create a provider that returns a single text response.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(make_text_response(text))])
    }

    /// Create a provider that returns each text in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    /// Sleep before answering (use with a paused tokio clock).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// The user prompt of the n-th request.
    pub fn prompt(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let response = {
            let mut count = self.call_count.lock().unwrap();
            let responses = self.responses.lock().unwrap();

            if *count >= responses.len() {
                panic!(
                    "SequentialMockProvider: no more responses (call #{}, have {})",
                    *count,
                    responses.len()
                );
            }

            let response = responses[*count].clone();
            *count += 1;
            self.requests.lock().unwrap().push(request);
            response
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A retriever that returns fixed passages, or fails when `unavailable`.
pub struct StubRetriever {
    passages: Vec<Passage>,
    unavailable: bool,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StubRetriever {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            passages: texts
                .iter()
                .map(|t| Passage::new(*t).with_source("stub.txt"))
                .collect(),
            unavailable: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(&[])
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    fn name(&self) -> &str {
        "stub"
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, RetrievalError> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        if self.unavailable {
            return Err(RetrievalError::Unavailable("stub index offline".into()));
        }
        Ok(self.passages.iter().take(k).cloned().collect())
    }

    fn len(&self) -> usize {
        self.passages.len()
    }
}

/// A well-formed five-question quiz as the backend would print it.
pub fn quiz_json() -> String {
    let items: Vec<serde_json::Value> = (1..=5)
        .map(|i| {
            serde_json::json!({
                "question": format!("Question {i} about X?"),
                "options": ["A concept", "A tool", "A place", "A person"],
                "answer": "A concept",
            })
        })
        .collect();
    serde_json::to_string_pretty(&items).unwrap()
}
