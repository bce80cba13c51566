//! Free-text justification heuristics.
//!
//! The same checks gate both individual stage submissions and, applied to the
//! concatenation of every justification, the debrief pipeline's nonsense
//! filter, so low-effort input never reaches the paid reasoning model.

use serde::Serialize;

pub const MIN_CHARS: usize = 50;
pub const MIN_WORDS: usize = 8;
/// Runs of 5+ identical consecutive characters read as garbage typing.
const MAX_CHAR_RUN: usize = 4;
const MIN_ALPHABETIC_RATIO: f32 = 0.30;
const MIN_UNIQUE_WORD_RATIO: f32 = 0.50;
/// The unique-word check only applies to inputs with more words than this.
const UNIQUE_RATIO_WORD_FLOOR: usize = 10;

/// One of the five distinct rejection classes. User-correctable; returned as
/// a structured outcome, never raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JustificationIssue {
    #[error("justification is {length} characters; write at least {MIN_CHARS} explaining your reasoning")]
    TooShort { length: usize },
    #[error("justification has {words} words; use at least {MIN_WORDS} to explain your reasoning")]
    TooFewWords { words: usize },
    #[error("justification contains a long run of repeated '{character}' characters")]
    RepeatedCharacters { character: char },
    #[error("justification does not read as written text; most of it is non-alphabetic")]
    LowAlphabeticRatio,
    #[error("justification repeats the same words too often to evaluate")]
    RepetitivePadding,
}

/// Judge whether free-text input is substantive enough to score.
/// Pure and deterministic; the first failing check's issue is returned.
pub fn validate_justification(text: &str) -> Result<(), JustificationIssue> {
    let trimmed = text.trim();

    let length = trimmed.chars().count();
    if length < MIN_CHARS {
        return Err(JustificationIssue::TooShort { length });
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if words.len() < MIN_WORDS {
        return Err(JustificationIssue::TooFewWords { words: words.len() });
    }

    if let Some(character) = longest_run_over(trimmed, MAX_CHAR_RUN) {
        return Err(JustificationIssue::RepeatedCharacters { character });
    }

    let alphabetic = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    if (alphabetic as f32) / (length as f32) < MIN_ALPHABETIC_RATIO {
        return Err(JustificationIssue::LowAlphabeticRatio);
    }

    if words.len() > UNIQUE_RATIO_WORD_FLOOR {
        let unique = words
            .iter()
            .map(|word| word.to_lowercase())
            .collect::<std::collections::HashSet<_>>()
            .len();
        if (unique as f32) / (words.len() as f32) < MIN_UNIQUE_WORD_RATIO {
            return Err(JustificationIssue::RepetitivePadding);
        }
    }

    Ok(())
}

fn longest_run_over(text: &str, limit: usize) -> Option<char> {
    let mut previous: Option<char> = None;
    let mut run = 0usize;

    for ch in text.chars() {
        if Some(ch) == previous {
            run += 1;
            if run > limit {
                return Some(ch);
            }
        } else {
            previous = Some(ch);
            run = 1;
        }
    }

    None
}
