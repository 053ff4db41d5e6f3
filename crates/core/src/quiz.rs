//! Quiz domain types and structural validation.
//!
//! A quiz is generated content: it is trusted as the source of truth and
//! only checked for well-formedness, never for factual correctness.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::QuizFormatError;

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// The expected dimensions of a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizShape {
    pub questions: usize,
    pub options: usize,
}

impl Default for QuizShape {
    fn default() -> Self {
        Self {
            questions: 5,
            options: 4,
        }
    }
}

/// An ordered sequence of quiz items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quiz(pub Vec<QuizItem>);

impl Quiz {
    /// Check the quiz against `shape`. All-or-nothing: the first defect fails the quiz.
    pub fn validate(&self, shape: QuizShape) -> Result<(), QuizFormatError> {
        if self.0.len() != shape.questions {
            return Err(QuizFormatError::QuestionCount {
                expected: shape.questions,
                found: self.0.len(),
            });
        }

        for (index, item) in self.0.iter().enumerate() {
            item.validate(index, shape.options)?;
        }

        Ok(())
    }

    pub fn items(&self) -> &[QuizItem] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl QuizItem {
    fn validate(&self, index: usize, option_count: usize) -> Result<(), QuizFormatError> {
        if self.question.trim().is_empty() {
            return Err(QuizFormatError::EmptyQuestion { index });
        }

        if self.options.len() != option_count {
            return Err(QuizFormatError::OptionCount {
                index,
                expected: option_count,
                found: self.options.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.options.len());
        for option in &self.options {
            if !seen.insert(option.as_str()) {
                return Err(QuizFormatError::DuplicateOption {
                    index,
                    option: option.clone(),
                });
            }
        }

        if !self.options.contains(&self.answer) {
            return Err(QuizFormatError::AnswerNotInOptions {
                index,
                answer: self.answer.clone(),
            });
        }

        Ok(())
    }
}
