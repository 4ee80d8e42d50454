//! Response-pattern validation for stored sessions.
//!
//! Looks at how a respondent answered (runs, bias, timing, balance) rather than what the
//! answers mean, and condenses the signals into a validity score with recommendations.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::catalog::QuestionCatalog;
use super::domain::{AnswerOption, AssessmentSession, Dimension, SessionId};
use super::scoring::statistics::{mean, sample_variance};

const MAX_CONSECUTIVE_SAME: usize = 8;
const MIN_SECONDS_PER_QUESTION: f64 = 3.0;
const EXTREME_BIAS_SHARE: f64 = 0.8;
const MIN_DIMENSION_BALANCE: f64 = 0.2;
const INCONSISTENT_VARIANCE: f64 = 0.2;
const UNMEASURED_SECONDS_PER_QUESTION: f64 = 30.0;

const RAPID_COMPLETION_PENALTY: f64 = 0.2;
const UNIFORM_RESPONSES_PENALTY: f64 = 0.3;
const EXTREME_BIAS_PENALTY: f64 = 0.25;
const INCONSISTENT_RESPONSES_PENALTY: f64 = 0.15;
const INCOMPLETE_ENGAGEMENT_PENALTY: f64 = 0.35;

/// Validity band of a response pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityLevel {
    Excellent,
    Good,
    Acceptable,
    Poor,
}

impl ValidityLevel {
    pub const PASS_THRESHOLD: f64 = 0.55;

    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ValidityLevel::Excellent
        } else if score >= 0.70 {
            ValidityLevel::Good
        } else if score >= Self::PASS_THRESHOLD {
            ValidityLevel::Acceptable
        } else {
            ValidityLevel::Poor
        }
    }
}

/// Pairwise transitions between consecutive answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transitions {
    pub a_to_a: usize,
    pub b_to_b: usize,
    pub a_to_b: usize,
    pub b_to_a: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingAnalysis {
    pub measured: bool,
    pub total_seconds: f64,
    pub average_seconds_per_question: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePattern {
    pub total_responses: usize,
    pub option_a: usize,
    pub option_b: usize,
    pub transitions: Transitions,
    pub longest_run: usize,
    pub total_runs: usize,
    /// Share of all answers that fall in each dimension.
    pub dimension_balance: BTreeMap<Dimension, f64>,
    pub timing: TimingAnalysis,
}

impl ResponsePattern {
    pub fn share_a(&self) -> f64 {
        if self.total_responses == 0 {
            0.5
        } else {
            self.option_a as f64 / self.total_responses as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFlags {
    pub rapid_completion: bool,
    pub uniform_responses: bool,
    pub extreme_bias: bool,
    pub inconsistent_responses: bool,
    pub incomplete_engagement: bool,
}

impl QualityFlags {
    pub const NAMES: [&'static str; 5] = [
        "rapid_completion",
        "uniform_responses",
        "extreme_bias",
        "inconsistent_responses",
        "incomplete_engagement",
    ];

    pub fn as_array(&self) -> [bool; 5] {
        [
            self.rapid_completion,
            self.uniform_responses,
            self.extreme_bias,
            self.inconsistent_responses,
            self.incomplete_engagement,
        ]
    }

    pub fn any(&self) -> bool {
        self.as_array().iter().any(|flag| *flag)
    }
}

/// Descriptive statistics of the A=1 / B=0 answer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeasures {
    pub mean: f64,
    pub variance: f64,
    pub range: f64,
    pub entropy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub session_id: SessionId,
    pub validity_score: f64,
    pub level: ValidityLevel,
    pub passed: bool,
    pub pattern: ResponsePattern,
    pub flags: QualityFlags,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measures: Option<ResponseMeasures>,
}

/// Validates the answer pattern of one session against the catalog ordering.
pub fn validate_session(
    session: &AssessmentSession,
    catalog: &QuestionCatalog,
) -> ValidationReport {
    let mut ordered: Vec<(Option<(u16, Dimension)>, AnswerOption)> = session
        .answers
        .iter()
        .map(|(question_id, option)| {
            let placement = catalog
                .get(*question_id)
                .map(|question| (question.order_number, question.dimension));
            (placement, *option)
        })
        .collect();
    ordered.sort_by_key(|(placement, _)| placement.map(|(order, _)| order).unwrap_or(u16::MAX));

    let sequence: Vec<AnswerOption> = ordered.iter().map(|(_, option)| *option).collect();
    let pattern = analyze_pattern(session, &ordered, &sequence);

    let flags = QualityFlags {
        rapid_completion: pattern.timing.average_seconds_per_question < MIN_SECONDS_PER_QUESTION,
        uniform_responses: pattern.longest_run > MAX_CONSECUTIVE_SAME,
        extreme_bias: pattern.total_responses > 0
            && (pattern.share_a() > EXTREME_BIAS_SHARE
                || pattern.share_a() < 1.0 - EXTREME_BIAS_SHARE),
        inconsistent_responses: inconsistent_dimensions(&ordered) > 2,
        incomplete_engagement: disengaged(&pattern),
    };

    let validity_score = validity_score(&pattern, &flags);
    let level = ValidityLevel::from_score(validity_score);

    ValidationReport {
        session_id: session.id.clone(),
        validity_score,
        level,
        passed: validity_score >= ValidityLevel::PASS_THRESHOLD,
        recommendations: recommendations(&flags, validity_score, &pattern),
        measures: response_measures(&sequence),
        pattern,
        flags,
    }
}

fn analyze_pattern(
    session: &AssessmentSession,
    ordered: &[(Option<(u16, Dimension)>, AnswerOption)],
    sequence: &[AnswerOption],
) -> ResponsePattern {
    let total_responses = sequence.len();
    let option_a = sequence
        .iter()
        .filter(|option| **option == AnswerOption::A)
        .count();

    let mut transitions = Transitions::default();
    for pair in sequence.windows(2) {
        match (pair[0], pair[1]) {
            (AnswerOption::A, AnswerOption::A) => transitions.a_to_a += 1,
            (AnswerOption::B, AnswerOption::B) => transitions.b_to_b += 1,
            (AnswerOption::A, AnswerOption::B) => transitions.a_to_b += 1,
            (AnswerOption::B, AnswerOption::A) => transitions.b_to_a += 1,
        }
    }

    let (longest_run, total_runs) = if sequence.is_empty() {
        (0, 0)
    } else {
        let mut longest = 1;
        let mut current = 1;
        let mut runs = 1;
        for pair in sequence.windows(2) {
            if pair[0] == pair[1] {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 1;
                runs += 1;
            }
        }
        (longest, runs)
    };

    let dimension_balance = Dimension::ALL
        .iter()
        .map(|dimension| {
            let count = ordered
                .iter()
                .filter(|(placement, _)| placement.map(|(_, dim)| dim) == Some(*dimension))
                .count();
            let share = if total_responses == 0 {
                0.0
            } else {
                count as f64 / total_responses as f64
            };
            (*dimension, share)
        })
        .collect();

    let timing = match session.completed_at {
        Some(completed_at) if total_responses > 0 => {
            let total_seconds =
                (completed_at - session.started_at).num_milliseconds().max(0) as f64 / 1000.0;
            TimingAnalysis {
                measured: true,
                total_seconds,
                average_seconds_per_question: total_seconds / total_responses as f64,
            }
        }
        _ => TimingAnalysis {
            measured: false,
            total_seconds: UNMEASURED_SECONDS_PER_QUESTION * total_responses as f64,
            average_seconds_per_question: UNMEASURED_SECONDS_PER_QUESTION,
        },
    };

    ResponsePattern {
        total_responses,
        option_a,
        option_b: total_responses - option_a,
        transitions,
        longest_run,
        total_runs,
        dimension_balance,
        timing,
    }
}

fn inconsistent_dimensions(ordered: &[(Option<(u16, Dimension)>, AnswerOption)]) -> usize {
    Dimension::ALL
        .iter()
        .filter(|dimension| {
            let values: Vec<f64> = ordered
                .iter()
                .filter(|(placement, _)| placement.map(|(_, dim)| dim) == Some(**dimension))
                .map(|(_, option)| binary(*option))
                .collect();
            values.len() > 2 && sample_variance(&values) > INCONSISTENT_VARIANCE
        })
        .count()
}

fn disengaged(pattern: &ResponsePattern) -> bool {
    let share_a = pattern.share_a();
    let expected_runs = pattern.total_responses as f64 / 2.0;
    let indicators = [
        pattern.longest_run > 6,
        pattern.total_responses > 0 && (share_a > 0.9 || share_a < 0.1),
        pattern.timing.average_seconds_per_question < 5.0,
        expected_runs > 0.0 && (pattern.total_runs as f64) < expected_runs * 0.3,
    ];
    indicators.iter().filter(|indicator| **indicator).count() >= 2
}

fn validity_score(pattern: &ResponsePattern, flags: &QualityFlags) -> f64 {
    let penalties = [
        RAPID_COMPLETION_PENALTY,
        UNIFORM_RESPONSES_PENALTY,
        EXTREME_BIAS_PENALTY,
        INCONSISTENT_RESPONSES_PENALTY,
        INCOMPLETE_ENGAGEMENT_PENALTY,
    ];
    let mut score = 1.0
        - flags
            .as_array()
            .iter()
            .zip(penalties)
            .filter(|(raised, _)| **raised)
            .map(|(_, penalty)| penalty)
            .sum::<f64>();

    if pattern.longest_run > 10 {
        score -= 0.2;
    } else if pattern.longest_run > 8 {
        score -= 0.1;
    }

    if pattern.total_responses > 0 {
        let share_a = pattern.share_a();
        if share_a > 0.85 || share_a < 0.15 {
            score -= 0.15;
        }
    }

    let min_balance = pattern
        .dimension_balance
        .values()
        .copied()
        .fold(f64::INFINITY, f64::min);
    if !min_balance.is_finite() || min_balance < MIN_DIMENSION_BALANCE {
        score -= 0.1;
    }

    score.clamp(0.0, 1.0)
}

fn recommendations(
    flags: &QualityFlags,
    validity_score: f64,
    pattern: &ResponsePattern,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if flags.rapid_completion {
        recommendations.push(
            "Consider retaking the assessment with more time to reflect on each question"
                .to_string(),
        );
    }
    if flags.uniform_responses {
        recommendations.push(
            "Long runs of identical answers suggest disengagement; consider retesting in a different setting"
                .to_string(),
        );
    }
    if flags.extreme_bias {
        recommendations.push(
            "Strong bias toward one option detected; results may not reflect actual preferences"
                .to_string(),
        );
    }
    if flags.inconsistent_responses {
        recommendations.push(
            "Answers within several dimensions are inconsistent; discuss results with a qualified counselor"
                .to_string(),
        );
    }
    if flags.incomplete_engagement {
        recommendations.push(
            "Results may not reflect actual preferences because engagement looked incomplete"
                .to_string(),
        );
    }
    if validity_score < ValidityLevel::PASS_THRESHOLD {
        recommendations.push(
            "Assessment quality is below the acceptable level; retesting is strongly recommended"
                .to_string(),
        );
    }
    if ValidityLevel::from_score(validity_score) == ValidityLevel::Excellent {
        recommendations.push("Excellent response quality; results are highly reliable".to_string());
    }
    if pattern.longest_run > 12 {
        recommendations.push(
            "Extremely uniform answer pattern; check that every question was read carefully"
                .to_string(),
        );
    }

    recommendations
}

fn binary(option: AnswerOption) -> f64 {
    match option {
        AnswerOption::A => 1.0,
        AnswerOption::B => 0.0,
    }
}

fn response_measures(sequence: &[AnswerOption]) -> Option<ResponseMeasures> {
    if sequence.is_empty() {
        return None;
    }

    let values: Vec<f64> = sequence.iter().map(|option| binary(*option)).collect();
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    let share_a = mean(&values);
    let entropy = [share_a, 1.0 - share_a]
        .iter()
        .filter(|probability| **probability > 0.0)
        .map(|probability| -probability * probability.log2())
        .sum();

    Some(ResponseMeasures {
        mean: share_a,
        variance: sample_variance(&values),
        range: max - min,
        entropy,
    })
}

/// Aggregate view over many validation reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_assessments: usize,
    pub mean_validity: f64,
    pub median_validity: f64,
    pub min_validity: f64,
    pub max_validity: f64,
    pub std_validity: f64,
    pub level_distribution: BTreeMap<ValidityLevel, usize>,
    pub pass_rate: f64,
    pub flag_frequencies: BTreeMap<String, f64>,
}

impl ValidationSummary {
    pub fn from_reports(reports: &[ValidationReport]) -> Option<Self> {
        if reports.is_empty() {
            return None;
        }

        let total = reports.len() as f64;
        let mut scores: Vec<f64> = reports.iter().map(|report| report.validity_score).collect();
        scores.sort_by(f64::total_cmp);

        let median_validity = if scores.len() % 2 == 0 {
            let upper = scores.len() / 2;
            (scores[upper - 1] + scores[upper]) / 2.0
        } else {
            scores[scores.len() / 2]
        };

        let mut level_distribution: BTreeMap<ValidityLevel, usize> = [
            ValidityLevel::Excellent,
            ValidityLevel::Good,
            ValidityLevel::Acceptable,
            ValidityLevel::Poor,
        ]
        .into_iter()
        .map(|level| (level, 0))
        .collect();
        for report in reports {
            *level_distribution.entry(report.level).or_default() += 1;
        }

        let flag_frequencies = QualityFlags::NAMES
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let raised = reports
                    .iter()
                    .filter(|report| report.flags.as_array()[index])
                    .count();
                (name.to_string(), raised as f64 / total)
            })
            .collect();

        Some(Self {
            total_assessments: reports.len(),
            mean_validity: mean(&scores),
            median_validity,
            min_validity: scores[0],
            max_validity: scores[scores.len() - 1],
            std_validity: sample_variance(&scores).sqrt(),
            level_distribution,
            pass_rate: reports.iter().filter(|report| report.passed).count() as f64 / total,
            flag_frequencies,
        })
    }
}

/// Validates many sessions in parallel; report order follows input order.
pub fn validate_batch(
    sessions: &[AssessmentSession],
    catalog: &QuestionCatalog,
) -> Vec<ValidationReport> {
    sessions
        .par_iter()
        .map(|session| validate_session(session, catalog))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::domain::{DeploymentMode, Language, QuestionId};
    use chrono::{Duration, TimeZone, Utc};

    // blocks of three: EI and TF questions get A, SN and JP questions get B
    fn alternating_blocks(id: u32) -> AnswerOption {
        if ((id - 1) / 3) % 2 == 0 {
            AnswerOption::A
        } else {
            AnswerOption::B
        }
    }

    fn session_with(
        options: impl Fn(u32) -> AnswerOption,
        seconds: Option<i64>,
    ) -> AssessmentSession {
        let started_at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut session = AssessmentSession::new(
            SessionId("session-test".to_string()),
            Language::En,
            DeploymentMode::Standard,
            started_at,
        );
        for id in 1..=36 {
            session.answers.insert(QuestionId(id), options(id));
        }
        session.completed_at = seconds.map(|seconds| started_at + Duration::seconds(seconds));
        session
    }

    #[test]
    fn varied_unhurried_answers_pass_as_excellent() {
        let session = session_with(alternating_blocks, Some(36 * 20));
        let report = validate_session(&session, &QuestionCatalog::standard());

        assert!(!report.flags.any(), "unexpected flags {:?}", report.flags);
        assert_eq!(report.validity_score, 1.0);
        assert_eq!(report.level, ValidityLevel::Excellent);
        assert!(report.passed);
        assert!(report.pattern.timing.measured);
        assert!((report.pattern.timing.average_seconds_per_question - 20.0).abs() < 1e-9);
    }

    #[test]
    fn uniform_rushed_answers_fail() {
        let session = session_with(|_| AnswerOption::A, Some(36));
        let report = validate_session(&session, &QuestionCatalog::standard());

        assert!(report.flags.rapid_completion);
        assert!(report.flags.uniform_responses);
        assert!(report.flags.extreme_bias);
        assert!(report.flags.incomplete_engagement);
        assert!(!report.flags.inconsistent_responses);
        assert_eq!(report.pattern.longest_run, 36);
        assert_eq!(report.pattern.total_runs, 1);
        assert_eq!(report.validity_score, 0.0);
        assert_eq!(report.level, ValidityLevel::Poor);
        assert!(!report.passed);
        assert!(report
            .recommendations
            .iter()
            .any(|text| text.contains("retesting is strongly recommended")));
        let measures = report.measures.expect("measures present");
        assert_eq!(measures.entropy, 0.0);
        assert_eq!(measures.range, 0.0);
    }

    #[test]
    fn missing_completion_time_uses_unmeasured_default() {
        let session = session_with(
            |id| {
                if id % 2 == 0 {
                    AnswerOption::A
                } else {
                    AnswerOption::B
                }
            },
            None,
        );
        let report = validate_session(&session, &QuestionCatalog::standard());
        assert!(!report.pattern.timing.measured);
        assert!(!report.flags.rapid_completion);
        assert_eq!(report.pattern.transitions.a_to_b + report.pattern.transitions.b_to_a, 35);
        let measures = report.measures.expect("measures present");
        assert!((measures.entropy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn summary_aggregates_levels_and_flags() {
        let catalog = QuestionCatalog::standard();
        let sessions = vec![
            session_with(alternating_blocks, Some(720)),
            session_with(|_| AnswerOption::B, Some(36)),
        ];
        let reports = validate_batch(&sessions, &catalog);
        let summary = ValidationSummary::from_reports(&reports).expect("summary");

        assert_eq!(summary.total_assessments, 2);
        assert_eq!(summary.max_validity, 1.0);
        assert_eq!(summary.min_validity, 0.0);
        assert!((summary.median_validity - 0.5).abs() < 1e-12);
        assert_eq!(summary.pass_rate, 0.5);
        assert_eq!(summary.level_distribution[&ValidityLevel::Excellent], 1);
        assert_eq!(summary.level_distribution[&ValidityLevel::Poor], 1);
        assert_eq!(summary.level_distribution[&ValidityLevel::Good], 0);
        assert_eq!(summary.flag_frequencies["uniform_responses"], 0.5);
        assert!(ValidationSummary::from_reports(&[]).is_none());
    }
}
