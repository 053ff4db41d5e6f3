//! Prompt construction for answering and quiz synthesis.

use docent_core::message::{Message, Role};
use docent_core::quiz::QuizShape;
use docent_core::retrieval::Passage;
use std::fmt::Write;

/// System instruction for grounded answers.
pub const ANSWER_SYSTEM: &str = "You are a study assistant answering questions about a set of \
documents. Use the provided context passages and the conversation so far. If the context does \
not contain the answer, say that you don't know rather than making one up.";

/// System instruction for quiz synthesis.
pub const QUIZ_SYSTEM: &str = "You write multiple-choice quizzes. Reply with JSON only.";

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
        Role::System => "System",
    }
}

/// Render turns as `Role: content` lines, oldest first.
pub fn render_transcript(turns: &[Message]) -> String {
    let mut out = String::new();
    for turn in turns {
        let _ = writeln!(out, "{}: {}", role_label(turn.role), turn.content.trim());
    }
    out
}

/// Numbered context block; each passage tagged with its source when known.
pub fn render_passages(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return "(no relevant passages found)\n".to_string();
    }

    let mut out = String::new();
    for (i, passage) in passages.iter().enumerate() {
        if passage.source.is_empty() {
            let _ = writeln!(out, "[{}] {}", i + 1, passage.content.trim());
        } else {
            let _ = writeln!(
                out,
                "[{}] ({}) {}",
                i + 1,
                passage.source,
                passage.content.trim()
            );
        }
    }
    out
}

/// The answer prompt: prior turns, then grounding passages, then the question.
pub fn answer_prompt(history: &[Message], passages: &[Passage], question: &str) -> String {
    let mut prompt = String::new();

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        prompt.push_str(&render_transcript(history));
        prompt.push('\n');
    }

    prompt.push_str("Context:\n");
    prompt.push_str(&render_passages(passages));
    prompt.push('\n');

    let _ = write!(prompt, "Question: {}\nAnswer:", question.trim());
    prompt
}

/// The quiz prompt over a rendered transcript.
pub fn quiz_prompt(transcript: &str, shape: QuizShape) -> String {
    format!(
        "Here is a study conversation between a user and an assistant:\n\n\
         {transcript}\n\
         Write exactly {questions} multiple-choice questions that test the material discussed above. \
         Each question must have exactly {options} distinct options and exactly one correct answer, \
         and the answer must be copied verbatim from the options.\n\n\
         Respond with a JSON array only, in this form:\n\
         [{{\"question\": \"...\", \"options\": [{placeholders}], \"answer\": \"...\"}}]",
        questions = shape.questions,
        options = shape.options,
        placeholders = vec!["\"...\""; shape.options].join(", "),
    )
}
