//! Completion text → structured questions.
//!
//! Expected block layout:
//!
//! ```text
//! Question: <text>
//! A) <option>
//! B) <option>
//! C) <option>
//! D) <option>
//! Correct Answer: <A|B|C|D>
//! ```
//!
//! Field text runs up to the next marker and may span lines. Several blocks
//! are separated by a line of `---`.

use serde::{Deserialize, Serialize};

pub const BLOCK_SEPARATOR: &str = "---";

const QUESTION_MARKER: &str = "Question: ";
const ANSWER_MARKER: &str = "Correct Answer: ";
const OPTION_MARKERS: [(&str, &str); 4] = [
    ("A) ", "\nB)"),
    ("B) ", "\nC)"),
    ("C) ", "\nD)"),
    ("D) ", "\nCorrect Answer:"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub options: [String; 4],
    /// Index into `options`.
    pub correct_answer: usize,
    pub category: String,
}

impl GeneratedQuestion {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer]
    }

    pub fn correct_letter(&self) -> char {
        (b'A' + self.correct_answer as u8) as char
    }
}

/// Parse a single question block. `None` if any marker is missing.
pub fn parse_question(block: &str, category: &str) -> Option<GeneratedQuestion> {
    let block = block.replace("\r\n", "\n");

    let (question, mut pos) = between(&block, QUESTION_MARKER, "\nA)")?;

    let mut options: [String; 4] = Default::default();
    for (slot, (start, end)) in options.iter_mut().zip(OPTION_MARKERS) {
        let (text, next) = between(&block[pos..], start, end)?;
        *slot = text.trim().to_string();
        pos += next;
    }

    let rest = &block[pos..];
    let letter_at = rest.find(ANSWER_MARKER)? + ANSWER_MARKER.len();
    let correct_answer = match rest[letter_at..].chars().next()? {
        'A' => 0,
        'B' => 1,
        'C' => 2,
        'D' => 3,
        _ => return None,
    };

    Some(GeneratedQuestion {
        question: question.trim().to_string(),
        options,
        correct_answer,
        category: category.to_string(),
    })
}

/// Parse every well-formed block in a multi-question completion, skipping
/// blocks that do not follow the layout.
pub fn parse_questions(content: &str, category: &str) -> Vec<GeneratedQuestion> {
    content
        .split(BLOCK_SEPARATOR)
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .filter_map(|block| {
            let parsed = parse_question(block, category);
            if parsed.is_none() {
                tracing::warn!("Failed to parse question format in block: {}", block);
            }
            parsed
        })
        .collect()
}

/// Text between the first `start` and the following `end`, plus the offset
/// where `end` begins.
fn between<'a>(text: &'a str, start: &str, end: &str) -> Option<(&'a str, usize)> {
    let from = text.find(start)? + start.len();
    let len = text[from..].find(end)?;
    Some((&text[from..from + len], from + len))
}
