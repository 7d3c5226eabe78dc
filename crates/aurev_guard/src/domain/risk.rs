//! Risk level classification.
//!
//! Different producers bucket scores differently: the scoring stub uses
//! thirds of 0..=100, the Masumi agent adds a CRITICAL band, and the AI
//! model agent reports a 0..=4 class.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
    Critical,
    Unknown,
}

impl RiskLevel {
    /// Bucket a 0..=100 scan score.
    pub fn from_score(score: u8) -> Self {
        match score {
            67.. => RiskLevel::High,
            34.. => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }

    /// Bucket a score the way the Masumi decision agent does.
    pub fn from_agent_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Map the AI model agent's 0..=4 risk class.
    pub fn from_model_class(class: i64) -> Self {
        match class {
            0 => RiskLevel::VeryLow,
            1 => RiskLevel::Low,
            2 => RiskLevel::Medium,
            3 => RiskLevel::High,
            4 => RiskLevel::VeryHigh,
            _ => RiskLevel::Unknown,
        }
    }

    /// Recommended action for a Masumi risk band.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "Block immediately",
            RiskLevel::High | RiskLevel::VeryHigh => "Review and potentially block",
            RiskLevel::Medium => "Monitor closely",
            _ => "Allow with standard monitoring",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "VERY_LOW",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::VeryHigh => "VERY_HIGH",
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_buckets() {
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(33), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(34), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(66), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(67), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100), RiskLevel::High);
    }

    #[test]
    fn test_agent_buckets() {
        assert_eq!(RiskLevel::from_agent_score(39.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_agent_score(40.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_agent_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_agent_score(80.0), RiskLevel::Critical);
        assert_eq!(
            RiskLevel::from_agent_score(95.0).recommendation(),
            "Block immediately"
        );
    }

    #[test]
    fn test_model_classes() {
        assert_eq!(RiskLevel::from_model_class(0), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_model_class(4), RiskLevel::VeryHigh);
        assert_eq!(RiskLevel::from_model_class(7), RiskLevel::Unknown);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_value(RiskLevel::VeryHigh).unwrap(),
            serde_json::json!("VERY_HIGH")
        );
        let level: RiskLevel = serde_json::from_str("\"MEDIUM\"").unwrap();
        assert_eq!(level, RiskLevel::Medium);
    }
}
