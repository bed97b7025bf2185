//! Offline suggestions from the lab's fixed vocabularies.

use strsim::{jaro_winkler, normalized_levenshtein};

use dental_lab_core::models::{split_tokens, Material, ProsthesisType, Token};

use crate::extraction::{clean, SuggestionOutput};
use crate::prompts::SuggestionInput;

/// Most suggestions returned for one field.
const MAX_SUGGESTIONS: usize = 5;

/// Minimum similarity for a candidate to be offered.
const MIN_SIMILARITY: f64 = 0.55;

/// VITA classical shade guide.
pub const COMMON_SHADES: [&str; 16] = [
    "A1", "A2", "A3", "A3.5", "A4", "B1", "B2", "B3", "B4", "C1", "C2", "C3", "C4", "D2", "D3",
    "D4",
];

/// Which vocabulary a form field draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Material,
    ProsthesisType,
    Shade,
    Dentist,
    Unknown,
}

impl FieldKind {
    /// Guess the field from its description.
    pub fn from_description(description: &str) -> Self {
        let d = description.to_lowercase();
        if d.contains("material") {
            FieldKind::Material
        } else if d.contains("prosthesis") || d.contains("restoration type") {
            FieldKind::ProsthesisType
        } else if d.contains("shade") {
            FieldKind::Shade
        } else if d.contains("dentist") || d.contains("doctor") {
            FieldKind::Dentist
        } else {
            FieldKind::Unknown
        }
    }

    /// Multi-value fields are completed one comma-separated token at a time.
    fn is_multi_value(&self) -> bool {
        matches!(self, FieldKind::Material | FieldKind::ProsthesisType)
    }
}

/// Ranks known values against what has been typed so far.
#[derive(Debug, Clone, Default)]
pub struct VocabularySuggester {
    dentists: Vec<String>,
}

impl VocabularySuggester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known dentist names, e.g. from existing cases.
    pub fn with_dentists<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dentists = clean(names.into_iter().map(Into::into).collect());
        self
    }

    fn candidates(&self, kind: FieldKind) -> Vec<String> {
        match kind {
            FieldKind::Material => Material::STANDARD.iter().map(|m| m.label().to_string()).collect(),
            FieldKind::ProsthesisType => ProsthesisType::STANDARD
                .iter()
                .map(|p| p.label().to_string())
                .collect(),
            FieldKind::Shade => COMMON_SHADES.iter().map(|s| s.to_string()).collect(),
            FieldKind::Dentist => self.dentists.clone(),
            FieldKind::Unknown => Vec::new(),
        }
    }

    /// Suggest values for a field.
    ///
    /// With nothing typed, the vocabulary comes back in form order. Otherwise
    /// candidates are ranked by similarity to the typed text (for
    /// multi-value fields, to the last token), and values already chosen are
    /// left out.
    pub fn suggest(&self, input: &SuggestionInput) -> SuggestionOutput {
        let kind = FieldKind::from_description(&input.field_description);
        let candidates = self.candidates(kind);

        let (typed, chosen): (String, Vec<String>) = if kind.is_multi_value() {
            let complete = !input.existing_data.trim_end().ends_with(',')
                && !input.existing_data.is_empty();
            let mut tokens: Vec<String> = split_tokens(&input.existing_data)
                .map(|t| t.to_lowercase())
                .collect();
            let last = if complete { tokens.pop() } else { None };
            (last.unwrap_or_default(), tokens)
        } else {
            (input.existing_data.trim().to_lowercase(), Vec::new())
        };

        let open: Vec<String> = candidates
            .into_iter()
            .filter(|c| !chosen.contains(&c.to_lowercase()))
            .collect();

        let suggestions = if typed.is_empty() {
            open.into_iter().take(MAX_SUGGESTIONS).collect()
        } else {
            rank(&typed, open)
        };

        SuggestionOutput { suggestions }
    }
}

fn rank(typed: &str, candidates: Vec<String>) -> Vec<String> {
    let mut scored: Vec<(f64, String)> = candidates
        .into_iter()
        .map(|c| (score(typed, &c.to_lowercase()), c))
        .filter(|(s, _)| *s >= MIN_SIMILARITY)
        .collect();

    // Stable sort keeps vocabulary order among ties
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, c)| c)
        .collect()
}

/// Prefix matches score 1.0; otherwise Jaro-Winkler and Levenshtein combined.
fn score(typed: &str, candidate: &str) -> f64 {
    if candidate.starts_with(typed) {
        return 1.0;
    }
    jaro_winkler(typed, candidate) * 0.6 + normalized_levenshtein(typed, candidate) * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(field: &str, existing: &str) -> SuggestionInput {
        SuggestionInput {
            field_description: field.into(),
            existing_data: existing.into(),
            contextual_information: String::new(),
        }
    }

    #[test]
    fn test_field_kind() {
        assert_eq!(FieldKind::from_description("Material used"), FieldKind::Material);
        assert_eq!(FieldKind::from_description("Prosthesis Type"), FieldKind::ProsthesisType);
        assert_eq!(FieldKind::from_description("Shade"), FieldKind::Shade);
        assert_eq!(FieldKind::from_description("Dentist Name"), FieldKind::Dentist);
        assert_eq!(FieldKind::from_description("Notes"), FieldKind::Unknown);
    }

    #[test]
    fn test_empty_field_lists_vocabulary() {
        let output = VocabularySuggester::new().suggest(&input("Material", ""));
        assert_eq!(
            output.suggestions,
            vec!["Zolid", "Zirconia", "Nickel Free", "N-Guard", "Implant"]
        );
    }

    #[test]
    fn test_prefix_ranks_first() {
        let output = VocabularySuggester::new().suggest(&input("Material", "Zir"));
        assert_eq!(output.suggestions[0], "Zirconia");
    }

    #[test]
    fn test_typo_still_matches() {
        let output = VocabularySuggester::new().suggest(&input("Material", "zirconai"));
        assert_eq!(output.suggestions.first().map(String::as_str), Some("Zirconia"));
    }

    #[test]
    fn test_multi_value_skips_chosen() {
        let output = VocabularySuggester::new().suggest(&input("Material", "Zirconia, "));
        assert!(!output.suggestions.contains(&"Zirconia".to_string()));
        assert_eq!(output.suggestions[0], "Zolid");
    }

    #[test]
    fn test_shade_suggestions() {
        let output = VocabularySuggester::new().suggest(&input("Shade", "b"));
        assert_eq!(output.suggestions, vec!["B1", "B2", "B3", "B4"]);
    }

    #[test]
    fn test_dentist_names() {
        let suggester =
            VocabularySuggester::new().with_dentists(vec!["Dr. Smith", "Dr. Jones", "Dr. Smith"]);
        let output = suggester.suggest(&input("Dentist Name", "dr. sm"));
        assert_eq!(output.suggestions[0], "Dr. Smith");
        assert_eq!(output.suggestions.iter().filter(|s| *s == "Dr. Smith").count(), 1);
    }

    #[test]
    fn test_unknown_field() {
        let output = VocabularySuggester::new().suggest(&input("Notes", "rush"));
        assert!(output.suggestions.is_empty());
    }
}
