//! The oracle's structured judgment of one command's output.

use serde::{Deserialize, Serialize};

use super::error::OracleError;

/// Verdict returned by the oracle for a single analysis step.
///
/// Only `flagged` is required on the wire. Absent and empty optional fields
/// both mean "nothing suggested".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Verdict {
    pub flagged: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

impl Verdict {
    /// A non-flagged verdict with the given description.
    pub fn clear(description: impl Into<String>) -> Self {
        Self {
            flagged: false,
            description: description.into(),
            ..Default::default()
        }
    }

    /// A flagged verdict with no follow-up suggestion.
    pub fn flagged(description: impl Into<String>) -> Self {
        Self {
            flagged: true,
            description: description.into(),
            ..Default::default()
        }
    }

    /// Attach a follow-up suggestion.
    pub fn with_follow_up(mut self, prompt: impl Into<String>, command: impl Into<String>) -> Self {
        self.follow_up_prompt = Some(prompt.into());
        self.follow_up_command = Some(command.into());
        self
    }

    /// Attach an alert message.
    pub fn with_alert(mut self, alert: impl Into<String>) -> Self {
        self.alert = Some(alert.into());
        self
    }

    /// The suggested `(prompt, command)` pair, if both halves are non-blank.
    pub fn follow_up(&self) -> Option<(&str, &str)> {
        let prompt = self.follow_up_prompt.as_deref().filter(|p| !p.trim().is_empty())?;
        let command = self.follow_up_command.as_deref().filter(|c| !c.trim().is_empty())?;
        Some((prompt, command))
    }

    fn normalize(mut self) -> Self {
        self.follow_up_prompt = non_empty(self.follow_up_prompt);
        self.follow_up_command = non_empty(self.follow_up_command);
        self.alert = non_empty(self.alert);
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse the oracle's reply text into a [`Verdict`].
///
/// The reply must be exactly one JSON object (surrounding whitespace is
/// tolerated). Prose around the object, code fences, malformed JSON or a
/// missing `flagged` field are all schema errors.
pub fn parse_verdict(raw: &str) -> Result<Verdict, OracleError> {
    serde_json::from_str::<Verdict>(raw)
        .map(Verdict::normalize)
        .map_err(|e| OracleError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_verdict() {
        let verdict = parse_verdict(r#"{"flagged": false, "description": "clear"}"#).unwrap();
        assert!(!verdict.flagged);
        assert_eq!(verdict.description, "clear");
        assert!(verdict.follow_up().is_none());
        assert!(verdict.alert.is_none());
    }

    #[test]
    fn test_parse_full_verdict() {
        let raw = r#"{
            "flagged": true,
            "description": "unknown listener on 4444",
            "follow_up_prompt": "Which process owns the port?",
            "follow_up_command": "lsof -i :4444",
            "alert": "possible reverse shell"
        }"#;
        let verdict = parse_verdict(raw).unwrap();
        assert!(verdict.flagged);
        assert_eq!(
            verdict.follow_up(),
            Some(("Which process owns the port?", "lsof -i :4444"))
        );
        assert_eq!(verdict.alert.as_deref(), Some("possible reverse shell"));
    }

    #[test]
    fn test_empty_optional_fields_are_absent() {
        let raw = r#"{"flagged": true, "description": "x", "follow_up_prompt": "", "follow_up_command": "ls", "alert": "  "}"#;
        let verdict = parse_verdict(raw).unwrap();
        assert!(verdict.follow_up_prompt.is_none());
        assert!(verdict.follow_up().is_none());
        assert!(verdict.alert.is_none());
    }

    #[test]
    fn test_follow_up_ignores_blank_halves() {
        assert!(Verdict::flagged("x").with_follow_up("deeper", "").follow_up().is_none());
        assert!(Verdict::flagged("x").with_follow_up("", "echo f").follow_up().is_none());
        assert!(Verdict::flagged("x").with_follow_up(" ", "echo f").follow_up().is_none());
        assert_eq!(
            Verdict::flagged("x").with_follow_up("deeper", "echo f").follow_up(),
            Some(("deeper", "echo f"))
        );
    }

    #[test]
    fn test_missing_flagged_is_schema_error() {
        let err = parse_verdict(r#"{"description": "no flag"}"#).unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_wrapped_text_is_schema_error() {
        let err = parse_verdict("Here is my analysis: {\"flagged\": false}").unwrap_err();
        assert!(err.is_schema());

        let err = parse_verdict("```json\n{\"flagged\": false}\n```").unwrap_err();
        assert!(err.is_schema());

        let err = parse_verdict("{\"flagged\": false} Let me know if you need more.").unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_malformed_json_is_schema_error() {
        assert!(parse_verdict("{\"flagged\": tru").unwrap_err().is_schema());
        assert!(parse_verdict("").unwrap_err().is_schema());
        assert!(parse_verdict("{\"flagged\": \"yes\"}").unwrap_err().is_schema());
    }

    #[test]
    fn test_surrounding_whitespace_is_tolerated() {
        let verdict = parse_verdict("\n  {\"flagged\": false, \"description\": \"ok\"}\n").unwrap();
        assert_eq!(verdict.description, "ok");
    }
}
