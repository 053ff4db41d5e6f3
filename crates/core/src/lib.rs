//! # Docent Core
//!
//! Domain types, capability traits, and error definitions for the Docent
//! document question-answering service. This crate has **zero framework
//! dependencies**; it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators (the language-model backend and the
//! retrieval index) are defined as traits here. Implementations live in
//! `docent-providers` and `docent-index`. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod quiz;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use error::{
    Error, GenerationError, ProviderError, QuizFormatError, Result, RetrievalError, SessionError,
};
pub use memory::ConversationMemory;
pub use message::{Message, Role, SessionId};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use quiz::{Quiz, QuizItem, QuizShape};
pub use retrieval::{Passage, Retriever};
