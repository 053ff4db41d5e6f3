//! Chat service: one entry point for every transport.
//!
//! Composes the session registry, the answerer and the quiz synthesizer,
//! and implements the session lifecycle: each question keeps the session
//! active, the end keyword turns it into a quiz and removes it.

use chrono::{DateTime, Utc};
use docent_core::error::SessionError;
use docent_core::message::{Message, SessionId};
use docent_core::provider::Provider;
use docent_core::quiz::Quiz;
use docent_core::retrieval::Retriever;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::answerer::{Answerer, DEFAULT_TOP_K};
use crate::generation::Generator;
use crate::quiz::QuizSynthesizer;
use crate::registry::{SessionRegistry, SessionSummary};

pub const DEFAULT_END_KEYWORD: &str = "exit";

/// The result of one `ask` call.
#[derive(Debug, Clone)]
pub enum AskOutcome {
    Answer { session_id: SessionId, answer: String },
    Ended { session_id: SessionId, quiz: Quiz },
}

impl AskOutcome {
    pub fn session_id(&self) -> &SessionId {
        match self {
            AskOutcome::Answer { session_id, .. } | AskOutcome::Ended { session_id, .. } => {
                session_id
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub active_sessions: usize,
    pub indexed_chunks: usize,
    pub retriever: String,
    pub provider: String,
    pub model: String,
}

pub struct ChatService {
    registry: Arc<SessionRegistry>,
    answerer: Answerer,
    synthesizer: QuizSynthesizer,
    top_k: usize,
    end_keyword: String,
}

impl ChatService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        answerer: Answerer,
        synthesizer: QuizSynthesizer,
    ) -> Self {
        Self {
            registry,
            answerer,
            synthesizer,
            top_k: DEFAULT_TOP_K,
            end_keyword: DEFAULT_END_KEYWORD.into(),
        }
    }

    /// Wire everything from configuration.
    pub fn from_config(
        config: &docent_config::AppConfig,
        provider: Arc<dyn Provider>,
        retriever: Arc<dyn Retriever>,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        let generator = Generator::from_config(provider, config);
        let synthesizer = QuizSynthesizer::from_config(generator.clone(), &config.quiz);
        let answerer = Answerer::new(retriever, generator);

        Self::new(registry, answerer, synthesizer)
            .with_top_k(config.retrieval.top_k)
            .with_end_keyword(&config.session.end_keyword)
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_end_keyword(mut self, keyword: &str) -> Self {
        self.end_keyword = keyword.trim().to_lowercase();
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn end_keyword(&self) -> &str {
        &self.end_keyword
    }

    /// Whether `query` is the end-of-session keyword (trimmed, case-insensitive).
    pub fn is_end_signal(&self, query: &str) -> bool {
        query.trim().to_lowercase() == self.end_keyword
    }

    /// Handle one user input.
    ///
    /// A normal question is answered within the resolved session. The end
    /// keyword ends the named session and returns its quiz; it never creates
    /// a session, so it fails with `NotFound` when the id is absent or unknown.
    pub async fn ask(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> docent_core::Result<AskOutcome> {
        if self.is_end_signal(query) {
            let id = session_id.ok_or_else(|| SessionError::NotFound("(none)".into()))?;
            let quiz = self.end_session(id).await?;
            return Ok(AskOutcome::Ended {
                session_id: SessionId::from(id),
                quiz,
            });
        }

        loop {
            let (id, session) = self.registry.resolve(session_id).await;
            let mut memory = session.lock().await;
            if session.is_closed() {
                debug!(session_id = %id, "Session closed while waiting, re-resolving");
                continue;
            }

            let answer = self.answerer.answer(&mut memory, query, self.top_k).await?;
            session.touch();
            return Ok(AskOutcome::Answer {
                session_id: id,
                answer,
            });
        }
    }

    /// Synthesize the quiz for `id`, then remove the session.
    ///
    /// If synthesis fails the session stays registered with its memory
    /// intact, so the caller can retry.
    pub async fn end_session(&self, id: &str) -> docent_core::Result<Quiz> {
        let session = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        let mut memory = session.lock().await;
        if session.is_closed() {
            return Err(SessionError::NotFound(id.to_string()).into());
        }

        let quiz = self.synthesizer.synthesize(&memory).await?;
        self.registry.remove_locked(&session, &mut memory).await?;

        info!(session_id = %id, questions = quiz.len(), "Session ended with quiz");
        Ok(quiz)
    }

    /// Register an empty session.
    pub async fn create_session(&self) -> (SessionId, DateTime<Utc>) {
        let (id, session) = self.registry.create().await;
        (id, session.created_at())
    }

    /// Remove a session without producing a quiz.
    pub async fn discard(&self, id: &str) -> Result<(), SessionError> {
        self.registry.end(id).await.map(|_| ())
    }

    /// Ordered turns of an active session.
    pub async fn transcript(&self, id: &str) -> Result<Vec<Message>, SessionError> {
        let session = self
            .registry
            .get(id)
            .await
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let memory = session.lock().await;
        if session.is_closed() {
            return Err(SessionError::NotFound(id.to_string()));
        }
        Ok(memory.as_ordered_turns().to_vec())
    }

    pub async fn summaries(&self) -> Vec<SessionSummary> {
        self.registry.summaries().await
    }

    pub async fn stats(&self) -> ServiceStats {
        let retriever = self.answerer.retriever();
        let generator = self.answerer.generator();
        ServiceStats {
            active_sessions: self.registry.len().await,
            indexed_chunks: retriever.len(),
            retriever: retriever.name().to_string(),
            provider: generator.provider_name().to_string(),
            model: generator.model().to_string(),
        }
    }
}
