//! Best-effort recovery of structured output from the reasoning model.
//!
//! The model is asked for JSON but returns raw text that may be fenced in
//! code-block markers, truncated mid-object, or not JSON at all. Parsing
//! proceeds in tiers; the final tier synthesizes a neutral result and never
//! fails, so malformed model output can never corrupt a user-visible score.

use serde::Deserialize;
use tracing::warn;

use super::domain::{CompetencyScore, SCORE_MAX, SCORE_MID, SCORE_MIN};

/// Which recovery tier produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairTier {
    Direct,
    DelimiterRepair,
    NeutralFallback,
}

/// Normalized parse result, whichever tier produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDebrief {
    pub scores: Vec<CompetencyScore>,
    pub key_insight: String,
    pub summary: String,
    pub tier: RepairTier,
}

#[derive(Debug, Deserialize)]
struct RawDebrief {
    scores: Vec<RawScore>,
    #[serde(rename = "keyInsight", default)]
    key_insight: Option<String>,
    #[serde(rename = "summaryText", default)]
    summary_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScore {
    competency_name: String,
    score: f32,
    #[serde(default)]
    justification: String,
    #[serde(default)]
    strength: Option<String>,
    #[serde(default)]
    weakness: Option<String>,
    #[serde(default)]
    actionable_advice: Option<String>,
}

/// Parse raw model output, repairing truncation where possible and falling
/// back to a neutral midpoint result when the text cannot be trusted.
pub fn parse_model_output(raw: &str, competencies: &[String]) -> ParsedDebrief {
    let stripped = strip_code_fences(raw);

    if let Some(parsed) = try_parse(&stripped, RepairTier::Direct) {
        return parsed;
    }

    if looks_truncated(&stripped) {
        let repaired = close_open_delimiters(&stripped);
        if let Some(parsed) = try_parse(&repaired, RepairTier::DelimiterRepair) {
            return parsed;
        }
    }

    warn!("model output unparseable after repair; using neutral fallback");
    neutral_fallback(competencies)
}

fn try_parse(text: &str, tier: RepairTier) -> Option<ParsedDebrief> {
    let raw: RawDebrief = serde_json::from_str(text).ok()?;
    if raw.scores.is_empty() {
        return None;
    }

    let scores = raw
        .scores
        .into_iter()
        .map(|score| CompetencyScore {
            name: score.competency_name,
            score: score.score.clamp(SCORE_MIN, SCORE_MAX),
            justification: score.justification,
            strength: score.strength,
            weakness: score.weakness,
            advice: score.actionable_advice,
        })
        .collect();

    Some(ParsedDebrief {
        scores,
        key_insight: raw.key_insight.unwrap_or_default(),
        summary: raw.summary_text.unwrap_or_default(),
        tier,
    })
}

/// Tier 3: every competency at the midpoint. Deliberately distinct from the
/// nonsense filter's minimum-score result: the participant did provide
/// effort; the model output is what could not be trusted.
pub fn neutral_fallback(competencies: &[String]) -> ParsedDebrief {
    let scores = competencies
        .iter()
        .map(|name| CompetencyScore {
            name: name.clone(),
            score: SCORE_MID,
            justification:
                "We could not fully analyze this response, so a neutral score was assigned."
                    .to_string(),
            strength: None,
            weakness: None,
            advice: None,
        })
        .collect();

    ParsedDebrief {
        scores,
        key_insight: "Your responses were recorded; a detailed breakdown was not available for this attempt.".to_string(),
        summary: "Thank you for completing the simulation. Your decisions showed engagement with the case; try generating the debrief again for a full analysis.".to_string(),
        tier: RepairTier::NeutralFallback,
    }
}

/// Strip leading/trailing code-fence markers, with or without a language tag.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // Drop the language tag line ("json", "JSON", or empty).
    let body = match rest.split_once('\n') {
        Some((_tag, body)) => body,
        None => rest,
    };
    let body = body.trim();
    body.strip_suffix("```").unwrap_or(body).trim().to_string()
}

/// Truncation heuristic: trailing comma, or more opening than closing
/// delimiters.
fn looks_truncated(text: &str) -> bool {
    let trimmed = text.trim_end();
    if trimmed.ends_with(',') {
        return true;
    }

    let opens = trimmed.matches(['{', '[']).count();
    let closes = trimmed.matches(['}', ']']).count();
    opens > closes
}

/// Append the missing closers for every unclosed `{`/`[`, tracking string
/// literals so braces inside values are not miscounted. An unterminated
/// string is closed first, and a dangling trailing comma is dropped.
fn close_open_delimiters(text: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&ch) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut repaired = text.trim_end().to_string();
    if in_string {
        repaired.push('"');
    }
    if repaired.ends_with(',') {
        repaired.pop();
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }
    repaired
}
