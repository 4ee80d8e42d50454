use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::super::catalog::STANDARD_QUESTION_COUNT;
use super::super::domain::PreferenceStrength;

/// Named threshold preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringProfile {
    Basic,
    #[default]
    Professional,
}

impl ScoringProfile {
    pub const fn label(self) -> &'static str {
        match self {
            ScoringProfile::Basic => "basic",
            ScoringProfile::Professional => "professional",
        }
    }
}

impl FromStr for ScoringProfile {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(ScoringProfile::Basic),
            "professional" | "enhanced" => Ok(ScoringProfile::Professional),
            other => Err(format!("unknown scoring profile '{other}'")),
        }
    }
}

/// Strength cut-offs; a strength below `slight_below` is SLIGHT, and so on upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClarityThresholds {
    pub slight_below: f64,
    pub moderate_below: f64,
    pub clear_below: f64,
}

impl ClarityThresholds {
    pub const BASIC: Self = Self {
        slight_below: 0.60,
        moderate_below: 0.75,
        clear_below: 0.90,
    };

    pub const PROFESSIONAL: Self = Self {
        slight_below: 0.56,
        moderate_below: 0.66,
        clear_below: 0.76,
    };

    pub fn classify(&self, strength: f64) -> PreferenceStrength {
        if strength < self.slight_below {
            PreferenceStrength::Slight
        } else if strength < self.moderate_below {
            PreferenceStrength::Moderate
        } else if strength < self.clear_below {
            PreferenceStrength::Clear
        } else {
            PreferenceStrength::VeryClear
        }
    }
}

/// Rule flagging a dimension as borderline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BorderlinePolicy {
    /// Winning share below `threshold`.
    WinningShare { threshold: f64 },
    /// Share within `neutral_band` of one half, or a weak statistical signal.
    Statistical {
        neutral_band: f64,
        min_confidence: f64,
        max_standard_error: f64,
    },
}

impl BorderlinePolicy {
    pub const BASIC: Self = BorderlinePolicy::WinningShare { threshold: 0.55 };

    pub const PROFESSIONAL: Self = BorderlinePolicy::Statistical {
        neutral_band: 0.10,
        min_confidence: 0.70,
        max_standard_error: 0.15,
    };
}

/// How a neutral (3) raw response becomes a forced choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeutralResponsePolicy {
    /// Neutral responses alternate A, B, A, ... in the order they occur.
    #[default]
    Alternate,
    OptionA,
    OptionB,
}

impl FromStr for NeutralResponsePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "alternate" => Ok(NeutralResponsePolicy::Alternate),
            "option_a" | "a" => Ok(NeutralResponsePolicy::OptionA),
            "option_b" | "b" => Ok(NeutralResponsePolicy::OptionB),
            other => Err(format!("unknown neutral response policy '{other}'")),
        }
    }
}

/// Scoring configuration covering thresholds, borderline rule and statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub profile: ScoringProfile,
    pub expected_question_count: usize,
    pub thresholds: ClarityThresholds,
    pub borderline: BorderlinePolicy,
    pub include_statistics: bool,
    pub neutral_policy: NeutralResponsePolicy,
}

impl ScoringConfig {
    pub const STANDARD_QUESTION_COUNT: usize = STANDARD_QUESTION_COUNT;

    pub fn basic() -> Self {
        Self {
            profile: ScoringProfile::Basic,
            expected_question_count: STANDARD_QUESTION_COUNT,
            thresholds: ClarityThresholds::BASIC,
            borderline: BorderlinePolicy::BASIC,
            include_statistics: false,
            neutral_policy: NeutralResponsePolicy::Alternate,
        }
    }

    pub fn professional() -> Self {
        Self {
            profile: ScoringProfile::Professional,
            expected_question_count: STANDARD_QUESTION_COUNT,
            thresholds: ClarityThresholds::PROFESSIONAL,
            borderline: BorderlinePolicy::PROFESSIONAL,
            include_statistics: true,
            neutral_policy: NeutralResponsePolicy::Alternate,
        }
    }

    pub fn for_profile(profile: ScoringProfile) -> Self {
        match profile {
            ScoringProfile::Basic => Self::basic(),
            ScoringProfile::Professional => Self::professional(),
        }
    }

    /// Swaps the preset while keeping question count and neutral policy.
    pub fn with_profile(&self, profile: ScoringProfile) -> Self {
        Self::for_profile(profile)
            .with_question_count(self.expected_question_count)
            .with_neutral_policy(self.neutral_policy)
    }

    pub fn with_question_count(mut self, count: usize) -> Self {
        self.expected_question_count = count;
        self
    }

    pub fn with_neutral_policy(mut self, policy: NeutralResponsePolicy) -> Self {
        self.neutral_policy = policy;
        self
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::professional()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_thresholds_are_lower_bound_inclusive() {
        let thresholds = ClarityThresholds::BASIC;
        assert_eq!(thresholds.classify(0.5999), PreferenceStrength::Slight);
        assert_eq!(thresholds.classify(0.60), PreferenceStrength::Moderate);
        assert_eq!(thresholds.classify(0.75), PreferenceStrength::Clear);
        assert_eq!(thresholds.classify(0.90), PreferenceStrength::VeryClear);
        assert_eq!(thresholds.classify(1.0), PreferenceStrength::VeryClear);
    }

    #[test]
    fn professional_thresholds_are_stricter() {
        let thresholds = ClarityThresholds::PROFESSIONAL;
        assert_eq!(thresholds.classify(0.555), PreferenceStrength::Slight);
        assert_eq!(thresholds.classify(0.56), PreferenceStrength::Moderate);
        assert_eq!(thresholds.classify(0.66), PreferenceStrength::Clear);
        assert_eq!(thresholds.classify(0.76), PreferenceStrength::VeryClear);
    }

    #[test]
    fn with_profile_keeps_instrument_settings() {
        let config = ScoringConfig::basic()
            .with_question_count(40)
            .with_neutral_policy(NeutralResponsePolicy::OptionA);
        let swapped = config.with_profile(ScoringProfile::Professional);
        assert_eq!(swapped.thresholds, ClarityThresholds::PROFESSIONAL);
        assert_eq!(swapped.expected_question_count, 40);
        assert_eq!(swapped.neutral_policy, NeutralResponsePolicy::OptionA);
        assert!(swapped.include_statistics);
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!(
            "option-b".parse::<NeutralResponsePolicy>(),
            Ok(NeutralResponsePolicy::OptionB)
        );
        assert_eq!("Basic".parse::<ScoringProfile>(), Ok(ScoringProfile::Basic));
        assert!("fuzzy".parse::<NeutralResponsePolicy>().is_err());
    }
}
