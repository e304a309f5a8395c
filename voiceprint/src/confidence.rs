use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VoiceprintError;

/// Human-readable confidence bucket for a similarity score.
///
/// Independent of the verification threshold: a "Low" score can still pass
/// a lowered threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "Very Low")]
    VeryLow,
    #[serde(rename = "Low")]
    Low,
    #[serde(rename = "Moderate")]
    Moderate,
    #[serde(rename = "High")]
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower bounds of the confidence buckets.
///
/// A score must be strictly greater than a bound to enter the bucket above
/// it, so boundary values land in the lower bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceScale {
    /// Scores above this are `VeryHigh` (default: 0.7).
    pub very_high: f32,
    /// Scores above this are at least `High` (default: 0.5).
    pub high: f32,
    /// Scores above this are at least `Moderate` (default: 0.35).
    pub moderate: f32,
    /// Scores above this are at least `Low` (default: 0.25).
    pub low: f32,
}

impl Default for ConfidenceScale {
    fn default() -> Self {
        Self {
            very_high: 0.7,
            high: 0.5,
            moderate: 0.35,
            low: 0.25,
        }
    }
}

impl ConfidenceScale {
    /// Maps a score to its bucket.
    pub fn classify(&self, score: f32) -> Confidence {
        if score > self.very_high {
            Confidence::VeryHigh
        } else if score > self.high {
            Confidence::High
        } else if score > self.moderate {
            Confidence::Moderate
        } else if score > self.low {
            Confidence::Low
        } else {
            Confidence::VeryLow
        }
    }

    /// Checks that the bounds are finite, within [-1, 1] and strictly
    /// descending.
    pub fn validate(&self) -> Result<(), VoiceprintError> {
        let bounds = [self.very_high, self.high, self.moderate, self.low];
        if bounds.iter().any(|b| !b.is_finite() || !(-1.0..=1.0).contains(b)) {
            return Err(VoiceprintError::Config(format!(
                "confidence bounds must lie in [-1, 1], got {bounds:?}"
            )));
        }
        if bounds.windows(2).any(|w| w[0] <= w[1]) {
            return Err(VoiceprintError::Config(format!(
                "confidence bounds must be strictly descending, got {bounds:?}"
            )));
        }
        Ok(())
    }
}

/// Classifies a score with the default scale.
pub fn classify(score: f32) -> Confidence {
    ConfidenceScale::default().classify(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets() {
        assert_eq!(classify(0.95), Confidence::VeryHigh);
        assert_eq!(classify(0.6), Confidence::High);
        assert_eq!(classify(0.4), Confidence::Moderate);
        assert_eq!(classify(0.3), Confidence::Low);
        assert_eq!(classify(0.1), Confidence::VeryLow);
        assert_eq!(classify(-0.8), Confidence::VeryLow);
    }

    #[test]
    fn boundaries_take_lower_bucket() {
        assert_eq!(classify(0.7), Confidence::High);
        assert_eq!(classify(0.70001), Confidence::VeryHigh);
        assert_eq!(classify(0.5), Confidence::Moderate);
        assert_eq!(classify(0.35), Confidence::Low);
        assert_eq!(classify(0.25), Confidence::VeryLow);
        assert_eq!(classify(0.25001), Confidence::Low);
    }

    #[test]
    fn nan_is_very_low() {
        assert_eq!(classify(f32::NAN), Confidence::VeryLow);
    }

    #[test]
    fn labels() {
        assert_eq!(Confidence::VeryHigh.to_string(), "Very High");
        assert_eq!(Confidence::VeryLow.to_string(), "Very Low");
        assert_eq!(
            serde_json::to_string(&Confidence::Moderate).unwrap(),
            "\"Moderate\""
        );
        assert_eq!(
            serde_json::from_str::<Confidence>("\"Very High\"").unwrap(),
            Confidence::VeryHigh
        );
    }

    #[test]
    fn scale_validation() {
        assert!(ConfidenceScale::default().validate().is_ok());

        let flat = ConfidenceScale {
            high: 0.7,
            ..ConfidenceScale::default()
        };
        assert!(flat.validate().is_err());

        let out_of_range = ConfidenceScale {
            very_high: 1.5,
            ..ConfidenceScale::default()
        };
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn custom_scale() {
        let strict = ConfidenceScale {
            very_high: 0.9,
            high: 0.8,
            moderate: 0.7,
            low: 0.6,
        };
        assert_eq!(strict.classify(0.75), Confidence::Moderate);
        assert_eq!(strict.classify(0.6), Confidence::VeryLow);
    }
}
