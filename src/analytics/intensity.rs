//! Five-band color intensity for sector/heatmap tiles.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorIntensity {
    VeryNegative,
    Negative,
    Neutral,
    Positive,
    VeryPositive,
}

impl ColorIntensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorIntensity::VeryNegative => "very-negative",
            ColorIntensity::Negative => "negative",
            ColorIntensity::Neutral => "neutral",
            ColorIntensity::Positive => "positive",
            ColorIntensity::VeryPositive => "very-positive",
        }
    }
}

impl std::fmt::Display for ColorIntensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band a percentage change. Thresholds are inclusive; NaN is neutral.
pub fn classify(change_percent: f64) -> ColorIntensity {
    if change_percent >= 3.0 {
        ColorIntensity::VeryPositive
    } else if change_percent >= 1.0 {
        ColorIntensity::Positive
    } else if change_percent <= -3.0 {
        ColorIntensity::VeryNegative
    } else if change_percent <= -1.0 {
        ColorIntensity::Negative
    } else {
        ColorIntensity::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(classify(3.0), ColorIntensity::VeryPositive);
        assert_eq!(classify(2.999), ColorIntensity::Positive);
        assert_eq!(classify(1.0), ColorIntensity::Positive);
        assert_eq!(classify(0.999), ColorIntensity::Neutral);
        assert_eq!(classify(-0.999), ColorIntensity::Neutral);
        assert_eq!(classify(-1.0), ColorIntensity::Negative);
        assert_eq!(classify(-3.0), ColorIntensity::VeryNegative);
    }

    #[test]
    fn test_non_finite_inputs() {
        assert_eq!(classify(f64::NAN), ColorIntensity::Neutral);
        assert_eq!(classify(f64::INFINITY), ColorIntensity::VeryPositive);
        assert_eq!(classify(f64::NEG_INFINITY), ColorIntensity::VeryNegative);
    }

    #[test]
    fn test_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ColorIntensity::VeryPositive).unwrap(),
            "\"very-positive\""
        );
        assert_eq!(ColorIntensity::Negative.to_string(), "negative");
    }
}
