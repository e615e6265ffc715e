//! Guide data model: the seven-section guide and its derived presentation steps.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The structured guide returned by the model.
///
/// Every field is optional: an absent (or empty) field means the section is
/// omitted by the on-screen renderer and the PDF export alike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub talking_points: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fun_facts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historical_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussion_questions: Option<Vec<String>>,
    /// Newline-delimited `Label (timing): body` entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_flow: Option<String>,
}

impl GuideDocument {
    /// Builds a guide from whatever JSON object the model produced.
    ///
    /// No schema is enforced: unknown keys are ignored, a field with the wrong
    /// JSON type is treated as absent, and a bare string where a list is
    /// expected becomes a one-item list.
    pub fn from_model_json(value: &Value) -> Self {
        Self {
            overview: string_field(value, "overview"),
            visual_analysis: string_field(value, "visualAnalysis"),
            talking_points: list_field(value, "talkingPoints"),
            fun_facts: list_field(value, "funFacts"),
            historical_context: string_field(value, "historicalContext"),
            discussion_questions: list_field(value, "discussionQuestions"),
            presentation_flow: string_field(value, "presentationFlow"),
        }
    }

    /// Presentation flow parsed into steps; empty when the section is absent.
    pub fn presentation_steps(&self) -> Vec<PresentationStep> {
        self.presentation_flow
            .as_deref()
            .map(parse_presentation_flow)
            .unwrap_or_default()
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

fn list_field(value: &Value, key: &str) -> Option<Vec<String>> {
    match value.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        Value::String(single) => Some(vec![single.clone()]),
        _ => None,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Presentation flow
// ────────────────────────────────────────────────────────────────────────────

/// One timed step of the presentation flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentationStep {
    /// `Label (timing)`, or empty when the line did not match the step pattern.
    pub title: String,
    pub body: String,
}

/// Optional dash, optional bold markers, a title ending in `(timing)`, a colon, the body.
static STEP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:-\s*)?(?:\*\*)?(.+?\([^)]+\))(?:\*\*)?:\s*(.*)$")
        .expect("step pattern is a valid regex")
});

/// Parses a single presentation-flow line.
pub fn parse_step(line: &str) -> PresentationStep {
    match STEP_PATTERN.captures(line) {
        Some(caps) => PresentationStep {
            title: caps[1].to_string(),
            body: caps[2].to_string(),
        },
        None => PresentationStep {
            title: String::new(),
            body: line.to_string(),
        },
    }
}

/// Splits the flow on newlines, skips blank lines, and parses each remaining line.
pub fn parse_presentation_flow(flow: &str) -> Vec<PresentationStep> {
    flow.split('\n')
        .filter(|line| !line.trim().is_empty())
        .map(parse_step)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_step_with_timing() {
        let step = parse_step("Opening Hook (30 sec): Start with a question.");
        assert_eq!(step.title, "Opening Hook (30 sec)");
        assert_eq!(step.body, "Start with a question.");
    }

    #[test]
    fn test_parse_step_without_timing_or_colon() {
        let line = "Thank the group and invite questions";
        let step = parse_step(line);
        assert_eq!(step.title, "");
        assert_eq!(step.body, line);
    }

    #[test]
    fn test_parse_step_strips_dash_and_bold_markers() {
        let step = parse_step("- **Visual Analysis (3 min)**: Gesture to the left panel.");
        assert_eq!(step.title, "Visual Analysis (3 min)");
        assert_eq!(step.body, "Gesture to the left panel.");
    }

    #[test]
    fn test_parse_step_title_only_has_empty_body() {
        let step = parse_step("Closing (1 min):");
        assert_eq!(step.title, "Closing (1 min)");
        assert_eq!(step.body, "");
    }

    #[test]
    fn test_parse_flow_skips_blank_lines() {
        let flow = "Opening Hook (30 sec): Ask.\n\n   \nClose (1 min): Thank everyone.\n";
        let steps = parse_presentation_flow(flow);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1].title, "Close (1 min)");
    }

    #[test]
    fn test_from_model_json_reads_all_sections() {
        let value = json!({
            "overview": "A quiet harbor at dawn.",
            "visualAnalysis": "The eye lands on the sun.",
            "talkingPoints": ["one", "two", "three"],
            "funFacts": ["fact"],
            "historicalContext": "Painted in 1872.",
            "discussionQuestions": ["What do you see?"],
            "presentationFlow": "Opening (30 sec): Look."
        });
        let guide = GuideDocument::from_model_json(&value);
        assert_eq!(guide.overview.as_deref(), Some("A quiet harbor at dawn."));
        assert_eq!(guide.talking_points.as_ref().map(Vec::len), Some(3));
        assert_eq!(guide.presentation_steps()[0].title, "Opening (30 sec)");
    }

    #[test]
    fn test_from_model_json_is_lenient() {
        let value = json!({
            "overview": 42,
            "funFacts": "just one fact",
            "talkingPoints": ["kept", 7, null],
            "unexpected": true
        });
        let guide = GuideDocument::from_model_json(&value);
        assert!(guide.overview.is_none());
        assert_eq!(guide.fun_facts, Some(vec!["just one fact".to_string()]));
        assert_eq!(guide.talking_points, Some(vec!["kept".to_string()]));
        assert!(guide.presentation_steps().is_empty());
    }

    #[test]
    fn test_guide_serializes_camel_case_and_skips_absent() {
        let guide = GuideDocument {
            visual_analysis: Some("x".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&guide).unwrap();
        assert_eq!(value, json!({ "visualAnalysis": "x" }));
    }
}
