//! The conversational core of Docent.
//!
//! A question flows through the crate like this:
//!
//! 1. **Resolve** the session (or create one) in the [`SessionRegistry`]
//! 2. **Retrieve** passages for the question
//! 3. **Generate** a grounded answer from prior turns + passages + question
//! 4. **Append** the user/assistant pair to the session's memory
//!
//! The end keyword instead runs the [`QuizSynthesizer`] over the whole
//! conversation and removes the session.

pub mod answerer;
pub mod generation;
pub mod prompt;
pub mod quiz;
pub mod registry;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use answerer::{AnswerResult, Answerer, DEFAULT_TOP_K};
pub use generation::Generator;
pub use quiz::{QuizSynthesizer, extract_json_array, parse_quiz};
pub use registry::{Session, SessionRegistry, SessionSummary, spawn_reaper};
pub use service::{AskOutcome, ChatService, ServiceStats};
