//! Prompts for field suggestions.

use serde::{Deserialize, Serialize};

/// What the entry form knows about the field being filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionInput {
    /// Description of the data entry field.
    pub field_description: String,
    /// Existing data in the field, if any.
    #[serde(default)]
    pub existing_data: String,
    /// Any additional context that might be relevant.
    #[serde(default)]
    pub contextual_information: String,
}

/// System prompt for dental lab data entry.
pub const SYSTEM_PROMPT: &str = r#"You are an AI assistant helping dental technicians with data entry in a dental lab management application.

You will provide smart suggestions for completing a data entry field, based on the field's description, any existing data in the field, and any contextual information provided.

The suggestions should be relevant to common dental lab terminology, materials, and procedures."#;

/// User prompt for one field.
pub fn make_suggestion_prompt(input: &SuggestionInput) -> String {
    format!(
        r#"Field Description: {}
Existing Data: {}
Contextual Information: {}

Return a JSON object with a "suggestions" array of strings."#,
        input.field_description, input.existing_data, input.contextual_information
    )
}

/// JSON grammar constraint so a local model can only answer in the expected shape.
pub const JSON_GRAMMAR: &str = r#"
root ::= object
object ::= "{" ws "\"suggestions\"" ws ":" ws suggestions ws "}"
suggestions ::= "[" ws (string (ws "," ws string)*)? ws "]"
string ::= "\"" ([^"\\] | "\\" .)* "\""
ws ::= [ \t\n]*
"#;

/// Example exchanges for better suggestions.
pub const FEW_SHOT_EXAMPLES: &[(&str, &str, &str, &str)] = &[
    (
        "Material used for the prosthesis",
        "Zir",
        "Posterior bridge, teeth 35-37",
        r#"{"suggestions":["Zirconia","Zolid","Implant"]}"#,
    ),
    (
        "Shade code (VITA classical)",
        "A",
        "Anterior crown for a young patient",
        r#"{"suggestions":["A1","A2","A3"]}"#,
    ),
];

/// Build a complete prompt with system context and optional few-shot examples.
pub fn build_suggestion_prompt(input: &SuggestionInput, include_examples: bool) -> String {
    let mut prompt = String::new();

    prompt.push_str("<|system|>\n");
    prompt.push_str(SYSTEM_PROMPT);
    prompt.push_str("\n<|end|>\n");

    if include_examples {
        for (field, existing, context, output) in FEW_SHOT_EXAMPLES {
            let example = SuggestionInput {
                field_description: field.to_string(),
                existing_data: existing.to_string(),
                contextual_information: context.to_string(),
            };
            prompt.push_str("<|user|>\n");
            prompt.push_str(&make_suggestion_prompt(&example));
            prompt.push_str("\n<|end|>\n");
            prompt.push_str("<|assistant|>\n");
            prompt.push_str(output);
            prompt.push_str("\n<|end|>\n");
        }
    }

    prompt.push_str("<|user|>\n");
    prompt.push_str(&make_suggestion_prompt(input));
    prompt.push_str("\n<|end|>\n");
    prompt.push_str("<|assistant|>\n");

    prompt
}
