use serde::{Deserialize, Serialize};
use serde_json::Number;

/// Note attached to the result substituted for undecodable predictor output.
pub const DEGRADED_NOTE: &str = "Could not process result, using default values";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Real,
    Fake,
    Unknown,
}

/// Confidence percentage in `[0, 100]`.
///
/// Values outside the range are clamped to the nearest bound. Values inside
/// it keep the exact JSON representation the predictor produced, so `88`
/// stays an integer and `92.3` stays a float on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Number", into = "Number")]
pub struct Confidence(Number);

impl Confidence {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;

    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or(0.0)
    }
}

impl From<Number> for Confidence {
    fn from(n: Number) -> Self {
        match n.as_f64() {
            Some(v) if v < f64::from(Self::MIN) => Confidence(Number::from(Self::MIN)),
            Some(v) if v > f64::from(Self::MAX) => Confidence(Number::from(Self::MAX)),
            Some(_) => Confidence(n),
            None => Confidence(Number::from(Self::MIN)),
        }
    }
}

impl From<u8> for Confidence {
    fn from(v: u8) -> Self {
        Confidence::from(Number::from(v))
    }
}

impl From<Confidence> for Number {
    fn from(c: Confidence) -> Number {
        c.0
    }
}

/// Verdict returned to the client. Serialized with the `prediction` key
/// that the front-end reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: Label,

    pub confidence: Confidence,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PredictionResult {
    pub fn new(prediction: Label, confidence: impl Into<Confidence>) -> Self {
        PredictionResult {
            prediction,
            confidence: confidence.into(),
            note: None,
        }
    }

    /// The `UNKNOWN`/50 result used when the predictor output cannot be read.
    pub fn degraded() -> Self {
        PredictionResult {
            prediction: Label::Unknown,
            confidence: Confidence::from(50u8),
            note: Some(DEGRADED_NOTE.to_owned()),
        }
    }
}
