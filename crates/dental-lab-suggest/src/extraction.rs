//! Suggestion extraction from model output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extraction errors.
#[derive(Error, Debug)]
pub enum SuggestionError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
}

pub type SuggestionResult<T> = Result<T, SuggestionError>;

/// Suggested values for one field, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionOutput {
    pub suggestions: Vec<String>,
}

/// Parse a model reply into suggestions.
///
/// Accepts `{"suggestions": [...]}` or a bare JSON array of strings, with any
/// text around it. Blank and repeated suggestions are dropped.
pub fn parse_suggestions(reply: &str) -> SuggestionResult<SuggestionOutput> {
    let object_start = reply.find('{');
    let array_start = reply.find('[');

    let raw = match (object_start, array_start) {
        (Some(o), a) if a.map_or(true, |a| o < a) => {
            let end = reply.rfind('}').ok_or_else(|| {
                SuggestionError::InvalidFormat("No closing brace found in response".into())
            })?;
            serde_json::from_str::<SuggestionOutput>(slice(reply, o, end)?)?.suggestions
        }
        (_, Some(a)) => {
            let end = reply.rfind(']').ok_or_else(|| {
                SuggestionError::InvalidFormat("No closing bracket found in response".into())
            })?;
            serde_json::from_str::<Vec<String>>(slice(reply, a, end)?)?
        }
        _ => {
            return Err(SuggestionError::InvalidFormat(
                "No JSON found in response".into(),
            ))
        }
    };

    Ok(SuggestionOutput {
        suggestions: clean(raw),
    })
}

fn slice(reply: &str, start: usize, end: usize) -> SuggestionResult<&str> {
    if end < start {
        return Err(SuggestionError::InvalidFormat(
            "Closing delimiter before opening one".into(),
        ));
    }
    Ok(&reply[start..=end])
}

/// Trim, drop blanks and repeats, keep order.
pub(crate) fn clean(raw: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .collect()
}
