use crate::config::{AUTO_RESOLVE_CONFIDENCE, DEFAULT_CONFIDENCE};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Longest reasoning snippet returned by the paragraph fallbacks
const REASONING_MAX_CHARS: usize = 200;
/// A first paragraph shorter than this is not considered a summary
const PARAGRAPH_MIN_CHARS: usize = 50;

fn confidence_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)confidence[:\s]+([0-9.]+)",
            r"(?i)([0-9.]+)%\s*confidence",
            r"(?i)certainty[:\s]+([0-9.]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static regex"))
        .collect()
    })
}

fn reasoning_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)reasoning[:\s]+([^\n]+)",
            r"(?i)because[:\s]+([^\n]+)",
            r"(?i)analysis[:\s]+([^\n]+)",
            r"(?i)root cause[:\s]+([^\n]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static regex"))
        .collect()
    })
}

/// Pull a confidence score in `[0, 1]` out of generated text.
///
/// Explicit numbers win (`confidence: 0.8`, `85% confidence`, `certainty: 0.9`);
/// a number above 100 is ignored. Without one, hedging or assertive wording
/// decides, and anything else gets 0.7.
pub fn extract_confidence(text: &str) -> f64 {
    for pattern in confidence_patterns() {
        let value = pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_leading_number(m.as_str()));

        if let Some(value) = value {
            if value <= 1.0 {
                return value;
            }
            if value <= 100.0 {
                return value / 100.0;
            }
        }
    }

    let lower = text.to_lowercase();
    if lower.contains("uncertain") || lower.contains("not sure") {
        return 0.4;
    }
    if lower.contains("confident") || lower.contains("recommended") {
        return 0.8;
    }

    DEFAULT_CONFIDENCE
}

/// Pull a one-line justification out of generated text.
pub fn extract_reasoning(text: &str) -> String {
    for pattern in reasoning_patterns() {
        if let Some(m) = pattern.captures(text).and_then(|caps| caps.get(1)) {
            return m.as_str().trim().to_string();
        }
    }

    let first_paragraph = text.split("\n\n").next().unwrap_or_default();
    if first_paragraph.chars().count() > PARAGRAPH_MIN_CHARS {
        return first_paragraph.chars().take(REASONING_MAX_CHARS).collect();
    }

    text.chars().take(REASONING_MAX_CHARS).collect()
}

/// Pull an ordered list of resolution steps out of generated text.
///
/// Numbered items (`1. Do this`) anywhere in the text take precedence. Failing
/// that, bulleted lines under a `Resolution Steps:` heading are used.
pub fn extract_steps(text: &str) -> Vec<String> {
    static NUMBERED_RE: OnceLock<Regex> = OnceLock::new();
    let numbered =
        NUMBERED_RE.get_or_init(|| Regex::new(r"\d+\.\s+([^\n]+)").expect("static regex"));

    let steps: Vec<String> = numbered
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect();
    if !steps.is_empty() {
        return steps;
    }

    static SECTION_RE: OnceLock<Regex> = OnceLock::new();
    let section = SECTION_RE.get_or_init(|| {
        Regex::new(r"(?is)(?:\*\*)?Resolution Steps:(?:\*\*)?(.*?)(?:\*\*|$)").expect("static regex")
    });
    static BULLET_RE: OnceLock<Regex> = OnceLock::new();
    let bullet =
        BULLET_RE.get_or_init(|| Regex::new(r"^[\d.\-*]+\s*(.+)$").expect("static regex"));

    let Some(body) = section.captures(text).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    body.as_str()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| bullet.captures(line).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Leading decimal number of a `[0-9.]+` capture; `"0.85."` reads as 0.85
fn parse_leading_number(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        } else if !c.is_ascii_digit() {
            break;
        }
        end = i + c.len_utf8();
    }
    s[..end].parse::<f64>().ok()
}

/// Structured view of a generated resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSummary {
    pub confidence: f64,
    pub reasoning: String,
    pub steps: Vec<String>,
    pub can_auto_resolve: bool,
}

impl ResolutionSummary {
    pub fn from_response(text: &str) -> Self {
        let extracted = extract_confidence(text);
        // An explicit zero is treated as "no signal"
        let confidence = if extracted == 0.0 {
            DEFAULT_CONFIDENCE
        } else {
            extracted
        };

        ResolutionSummary {
            confidence,
            reasoning: extract_reasoning(text),
            steps: extract_steps(text),
            can_auto_resolve: confidence > AUTO_RESOLVE_CONFIDENCE,
        }
    }
}
