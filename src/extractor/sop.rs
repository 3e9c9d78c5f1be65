use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

const DEFAULT_VALIDATION: &str = "Verify the system is functioning normally";
const DEFAULT_ROLLBACK: &str = "Reverse the changes if issues persist";
const DEFAULT_CATEGORY: &str = "General";

/// Standard operating procedure derived from a resolved issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SopDocument {
    pub title: String,
    pub problem: String,
    pub symptoms: String,
    pub cause: String,
    pub steps: Vec<String>,
    pub validation: String,
    pub rollback: String,
    pub category: String,
}

/// What is known about the resolved issue, used wherever generated text falls short
#[derive(Debug, Clone, Default)]
pub struct SopFallback {
    pub issue_title: String,
    pub symptoms: Option<String>,
    pub root_cause: Option<String>,
    pub resolution: String,
    pub category: Option<String>,
}

/// Fields a model may or may not produce
#[derive(Debug, Default, Deserialize)]
struct GeneratedSop {
    problem: Option<String>,
    symptoms: Option<String>,
    cause: Option<String>,
    steps: Option<Value>,
    validation: Option<String>,
    rollback: Option<String>,
}

impl SopDocument {
    /// Build an SOP from generated text.
    ///
    /// The first `{ ... }` span is parsed as JSON; fields it lacks (or the
    /// whole document, when nothing parses) come from `fallback`.
    pub fn from_response(text: &str, fallback: &SopFallback) -> Self {
        static JSON_RE: OnceLock<Regex> = OnceLock::new();
        let json_re = JSON_RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));

        let generated = match json_re.find(text) {
            Some(m) => match serde_json::from_str::<GeneratedSop>(m.as_str()) {
                Ok(sop) => sop,
                Err(e) => {
                    tracing::warn!("Error parsing SOP: {}", e);
                    GeneratedSop::default()
                }
            },
            None => GeneratedSop::default(),
        };

        Self::merge(generated, fallback)
    }

    /// SOP built purely from the resolved issue
    pub fn from_fallback(fallback: &SopFallback) -> Self {
        Self::merge(GeneratedSop::default(), fallback)
    }

    fn merge(generated: GeneratedSop, fallback: &SopFallback) -> Self {
        let steps = generated
            .steps
            .and_then(steps_from_value)
            .unwrap_or_else(|| vec![fallback.resolution.clone()]);

        SopDocument {
            title: format!("SOP: {}", fallback.issue_title),
            problem: generated
                .problem
                .unwrap_or_else(|| fallback.issue_title.clone()),
            symptoms: generated.symptoms.unwrap_or_else(|| {
                fallback
                    .symptoms
                    .clone()
                    .unwrap_or_else(|| "Not specified".to_string())
            }),
            cause: generated.cause.unwrap_or_else(|| {
                fallback
                    .root_cause
                    .clone()
                    .unwrap_or_else(|| "Identified during investigation".to_string())
            }),
            steps,
            validation: generated
                .validation
                .unwrap_or_else(|| DEFAULT_VALIDATION.to_string()),
            rollback: generated
                .rollback
                .unwrap_or_else(|| DEFAULT_ROLLBACK.to_string()),
            category: fallback
                .category
                .clone()
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        }
    }
}

/// Steps may arrive as an array of strings, an array of anything, or one string
fn steps_from_value(value: Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s]),
        _ => None,
    }
}

/// Text indexed in the vector store for an SOP
pub fn sop_index_text(sop: &SopDocument) -> String {
    let steps = serde_json::to_string(&sop.steps).unwrap_or_default();
    format!(
        "{}\nProblem: {}\nSteps: {}\nValidation: {}",
        sop.title, sop.problem, steps, sop.validation
    )
}
