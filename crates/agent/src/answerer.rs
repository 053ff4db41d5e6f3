//! Retrieval-augmented answerer.
//!
//! # Flow
//!
//! 1. Retrieve up to `k` passages for the question
//! 2. Build a prompt from prior turns, passages and the question
//! 3. Generate once
//! 4. Append the user/assistant pair, only after generation succeeded

use docent_core::memory::ConversationMemory;
use docent_core::message::Role;
use docent_core::retrieval::{Passage, Retriever};
use std::sync::Arc;
use tracing::{debug, info};

use crate::generation::Generator;
use crate::prompt::{ANSWER_SYSTEM, answer_prompt};

pub const DEFAULT_TOP_K: usize = 3;

pub struct Answerer {
    retriever: Arc<dyn Retriever>,
    generator: Generator,
}

/// What one answered turn produced.
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub passages: Vec<Passage>,
}

impl Answerer {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Generator) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    pub fn retriever(&self) -> &Arc<dyn Retriever> {
        &self.retriever
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    /// Answer `question` in the context of `memory` and record the turn pair.
    ///
    /// On any failure `memory` is left exactly as it was.
    pub async fn answer(
        &self,
        memory: &mut ConversationMemory,
        question: &str,
        k: usize,
    ) -> docent_core::Result<String> {
        self.answer_with_sources(memory, question, k)
            .await
            .map(|r| r.answer)
    }

    /// Like [`answer`](Self::answer), also returning the grounding passages.
    pub async fn answer_with_sources(
        &self,
        memory: &mut ConversationMemory,
        question: &str,
        k: usize,
    ) -> docent_core::Result<AnswerResult> {
        let passages = self.retriever.search(question, k).await?;
        debug!(passages = passages.len(), k, "Passages retrieved");

        let prompt = answer_prompt(memory.as_ordered_turns(), &passages, question);
        let answer = self
            .generator
            .generate_with_system(Some(ANSWER_SYSTEM), &prompt)
            .await?;

        memory.append(Role::User, question);
        memory.append(Role::Assistant, answer.clone());

        info!(
            passages = passages.len(),
            answer_len = answer.len(),
            turns = memory.len(),
            "Answer generated"
        );

        Ok(AnswerResult { answer, passages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use docent_core::error::{Error, GenerationError, ProviderError};

    fn answerer(provider: Arc<SequentialMockProvider>, retriever: Arc<StubRetriever>) -> Answerer {
        Answerer::new(retriever, Generator::new(provider, "mock-model"))
    }

    #[tokio::test]
    async fn answer_appends_turn_pair() {
        let provider = Arc::new(SequentialMockProvider::single_text(
            "X is explained as a concept.",
        ));
        let retriever = Arc::new(StubRetriever::new(&["X is a concept."]));
        let answerer = answerer(provider.clone(), retriever.clone());
        let mut memory = ConversationMemory::new();

        let answer = answerer
            .answer(&mut memory, "What is X?", DEFAULT_TOP_K)
            .await
            .unwrap();

        assert_eq!(answer, "X is explained as a concept.");
        let turns = memory.as_ordered_turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "What is X?");
        assert_eq!(turns[1].role, Role::Assistant);
        assert_eq!(retriever.queries(), vec![("What is X?".to_string(), 3)]);
        assert!(provider.prompt(0).contains("X is a concept."));
    }

    #[tokio::test]
    async fn n_answers_give_2n_alternating_turns() {
        let provider = Arc::new(SequentialMockProvider::texts(&["a1", "a2", "a3"]));
        let answerer = answerer(provider, Arc::new(StubRetriever::new(&[])));
        let mut memory = ConversationMemory::new();

        for q in ["q1", "q2", "q3"] {
            answerer.answer(&mut memory, q, 3).await.unwrap();
        }

        let turns = memory.as_ordered_turns();
        assert_eq!(turns.len(), 6);
        let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "a1", "q2", "a2", "q3", "a3"]);
        for (i, turn) in turns.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected);
        }
    }

    #[tokio::test]
    async fn later_prompts_include_prior_turns() {
        let provider = Arc::new(SequentialMockProvider::texts(&["first answer", "second"]));
        let answerer = answerer(provider.clone(), Arc::new(StubRetriever::new(&[])));
        let mut memory = ConversationMemory::new();

        answerer.answer(&mut memory, "first question", 3).await.unwrap();
        answerer.answer(&mut memory, "follow up", 3).await.unwrap();

        let second_prompt = provider.prompt(1);
        assert!(second_prompt.contains("User: first question"));
        assert!(second_prompt.contains("Assistant: first answer"));
    }

    #[tokio::test]
    async fn failed_generation_leaves_memory_unchanged() {
        let provider = Arc::new(SequentialMockProvider::new(vec![
            Ok(make_text_response("a1")),
            Ok(make_text_response("a2")),
            Err(ProviderError::ApiError {
                status_code: 500,
                message: "boom".into(),
            }),
        ]));
        let answerer = answerer(provider, Arc::new(StubRetriever::new(&[])));
        let mut memory = ConversationMemory::new();

        answerer.answer(&mut memory, "q1", 3).await.unwrap();
        answerer.answer(&mut memory, "q2", 3).await.unwrap();
        let err = answerer.answer(&mut memory, "q3", 3).await.unwrap_err();

        assert!(matches!(err, Error::Generation(GenerationError::Backend(_))));
        assert_eq!(memory.len(), 4);
    }

    #[tokio::test]
    async fn retrieval_failure_propagates_without_generation() {
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let answerer = answerer(provider.clone(), Arc::new(StubRetriever::unavailable()));
        let mut memory = ConversationMemory::new();

        let err = answerer.answer(&mut memory, "q", 3).await.unwrap_err();
        assert!(matches!(err, Error::Retrieval(_)));
        assert!(memory.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_retrieval_still_answers() {
        let provider = Arc::new(SequentialMockProvider::single_text("I don't know."));
        let answerer = answerer(provider, Arc::new(StubRetriever::new(&[])));
        let mut memory = ConversationMemory::new();

        let result = answerer
            .answer_with_sources(&mut memory, "Unrelated?", 3)
            .await
            .unwrap();
        assert!(result.passages.is_empty());
        assert_eq!(memory.len(), 2);
    }
}
