//! Quiz synthesizer: turns a finished conversation into a multiple-choice quiz.
//!
//! Parsing is strict with exactly one recovery step: if the raw completion
//! is not a JSON array, the first balanced `[` … `]` region is cut out and
//! parsed on its own. The parsed quiz must then pass [`Quiz::validate`].

use docent_core::error::QuizFormatError;
use docent_core::memory::ConversationMemory;
use docent_core::quiz::{Quiz, QuizShape};
use tracing::{debug, info, warn};

use crate::generation::Generator;
use crate::prompt::{QUIZ_SYSTEM, quiz_prompt, render_transcript};

pub struct QuizSynthesizer {
    generator: Generator,
    shape: QuizShape,
}

impl QuizSynthesizer {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            shape: QuizShape::default(),
        }
    }

    pub fn with_shape(mut self, shape: QuizShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn from_config(generator: Generator, config: &docent_config::QuizConfig) -> Self {
        Self {
            generator: generator.with_temperature(config.temperature),
            shape: QuizShape {
                questions: config.question_count,
                options: config.option_count,
            },
        }
    }

    pub fn shape(&self) -> QuizShape {
        self.shape
    }

    /// One generation call over the rendered transcript. Never touches `memory`.
    pub async fn synthesize(&self, memory: &ConversationMemory) -> docent_core::Result<Quiz> {
        let transcript = render_transcript(memory.as_ordered_turns());
        let prompt = quiz_prompt(&transcript, self.shape);

        let raw = self
            .generator
            .generate_with_system(Some(QUIZ_SYSTEM), &prompt)
            .await?;

        let quiz = parse_quiz(&raw, self.shape).inspect_err(|e| {
            warn!(error = %e, raw_len = raw.len(), "Quiz output rejected");
        })?;

        info!(questions = quiz.len(), turns = memory.len(), "Quiz synthesized");
        Ok(quiz)
    }
}

/// Parse and validate a raw completion.
pub fn parse_quiz(raw: &str, shape: QuizShape) -> Result<Quiz, QuizFormatError> {
    let quiz = match serde_json::from_str::<Quiz>(raw.trim()) {
        Ok(quiz) => quiz,
        Err(direct) => {
            debug!(error = %direct, "Direct quiz parse failed, trying bracketed region");
            let region = extract_json_array(raw)
                .ok_or_else(|| QuizFormatError::Unparseable(direct.to_string()))?;
            serde_json::from_str::<Quiz>(region)
                .map_err(|e| QuizFormatError::Unparseable(e.to_string()))?
        }
    };

    quiz.validate(shape)?;
    Ok(quiz)
}

/// The first outermost balanced `[` … `]` region of `text`.
///
/// Brackets inside JSON string literals do not count toward nesting.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + i]);
                }
            }
            _ => {}
        }
    }

    None
}
