//! Turns raw predictor stdout into a [`PredictionResult`].
//!
//! Predictors are loosely controlled processes whose stdout often carries
//! framework warnings around the JSON payload. Decoding walks an ordered list
//! of strategies and settles on [`PredictionResult::degraded`] when none of
//! them yields a result, so it never fails.

use log::{debug, warn};

use crate::result::PredictionResult;

/// A single way of reading a result out of trimmed predictor output.
pub type Strategy = fn(&str) -> Option<PredictionResult>;

/// Strategies in order of preference.
pub const STRATEGIES: &[(&str, Strategy)] = &[("strict", parse_strict), ("embedded", parse_embedded)];

pub fn decode(stdout: &str) -> PredictionResult {
    let text = stdout.trim();

    for (name, strategy) in STRATEGIES {
        if let Some(result) = strategy(text) {
            debug!("Decoded predictor output with the {} strategy", name);
            return result;
        }
    }

    warn!("Could not decode predictor output: {:?}", text);
    PredictionResult::degraded()
}

/// The whole text is the JSON payload.
pub fn parse_strict(text: &str) -> Option<PredictionResult> {
    match serde_json::from_str(text) {
        Ok(result) => Some(result),
        Err(e) => {
            debug!("Strict parse of predictor output failed: {}", e);
            None
        }
    }
}

/// The payload is whatever lies between the first `{` and the last `}`.
pub fn parse_embedded(text: &str) -> Option<PredictionResult> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    let candidate = &text[start..=end];
    debug!("Extracted JSON from predictor output: {}", candidate);

    match serde_json::from_str(candidate) {
        Ok(result) => Some(result),
        Err(e) => {
            debug!("Embedded JSON is not a prediction: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{Label, DEGRADED_NOTE};
    use serde_json::json;

    fn decoded(stdout: &str) -> serde_json::Value {
        serde_json::to_value(decode(stdout)).unwrap()
    }

    #[test]
    fn clean_json_is_returned_unchanged() {
        assert_eq!(
            decoded(r#"{"prediction":"FAKE","confidence":92.3}"#),
            json!({"prediction": "FAKE", "confidence": 92.3})
        );
    }

    #[test]
    fn json_after_warnings_is_extracted() {
        assert_eq!(
            decoded("WARNING: deprecated\n{\"prediction\":\"REAL\",\"confidence\":88}\n"),
            json!({"prediction": "REAL", "confidence": 88})
        );
    }

    #[test]
    fn json_between_log_lines_is_extracted() {
        let stdout = "loading model...\n{\"prediction\":\"FAKE\",\"confidence\":61}\ndone in 0.4s";
        assert_eq!(decode(stdout), PredictionResult::new(Label::Fake, 61u8));
    }

    #[test]
    fn garbage_degrades() {
        let result = decode("not json at all");

        assert_eq!(result.prediction, Label::Unknown);
        assert_eq!(result.confidence.as_f64(), 50.0);
        assert_eq!(result.note.as_deref(), Some(DEGRADED_NOTE));
    }

    #[test]
    fn empty_output_degrades() {
        assert_eq!(decode("   \n"), PredictionResult::degraded());
    }

    #[test]
    fn reversed_braces_degrade() {
        assert_eq!(decode("} nothing here {"), PredictionResult::degraded());
    }

    #[test]
    fn error_payload_degrades() {
        assert_eq!(
            decode(r#"{"error": "Model file not found at src/lib/model.h5"}"#),
            PredictionResult::degraded()
        );
    }

    #[test]
    fn strict_strategy_rejects_noise() {
        assert!(parse_strict("WARN {\"prediction\":\"REAL\",\"confidence\":1}").is_none());
        assert!(parse_embedded("WARN {\"prediction\":\"REAL\",\"confidence\":1}").is_some());
    }

    #[test]
    fn embedded_strategy_spans_first_to_last_brace() {
        // Two objects make the span invalid JSON.
        let stdout = r#"{"a":1} {"prediction":"REAL","confidence":70}"#;
        assert!(parse_embedded(stdout).is_none());
        assert_eq!(decode(stdout), PredictionResult::degraded());
    }

    #[test]
    fn note_from_predictor_is_kept() {
        let result = decode(r#"{"prediction":"REAL","confidence":55,"note":"low light"}"#);
        assert_eq!(result.note.as_deref(), Some("low light"));
    }
}
