use serde::{Deserialize, Serialize};

use super::super::domain::{AnswerOption, Dimension, Question};
use super::strength::DimensionScore;

/// Effective confidence assigned to a dimension decided by the tie-break rule.
pub const TIE_BREAK_CONFIDENCE: f64 = 0.51;

const Z_95: f64 = 1.96;
const MAX_BINARY_VARIANCE: f64 = 0.25;
const RETEST_QUALITY_FLOOR: f64 = 0.55;
const RETEST_CONFIDENCE_FLOOR: f64 = 0.6;
const LOW_CONFIDENCE: f64 = 0.5;

/// Confidence that `winning` of `total` answers reflects a real preference.
pub fn confidence_level(winning: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let n = f64::from(total);
    let p = f64::from(winning) / n;
    let confidence = if total > 5 {
        let margin = Z_95 * (p * (1.0 - p) / n).sqrt();
        if margin > 0.0 {
            ((p - 0.5).abs() / margin).min(1.0)
        } else {
            1.0
        }
    } else {
        (p - 0.5).abs() * 2.0
    };

    confidence.clamp(0.0, 1.0)
}

pub fn standard_error(p: f64, total: u32) -> f64 {
    if total == 0 {
        return 1.0;
    }
    (p * (1.0 - p) / f64::from(total)).sqrt()
}

pub fn z_score(p: f64) -> f64 {
    (p - 0.5) / 0.5
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub(crate) fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let average = mean(values);
    values
        .iter()
        .map(|value| (value - average).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64
}

fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|value| *value <= 0.0) {
        return 0.0;
    }
    let log_sum: f64 = values.iter().map(|value| value.ln()).sum();
    (log_sum / values.len() as f64).exp()
}

/// Per-dimension statistical diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionStatistics {
    pub dimension: Dimension,
    pub confidence: f64,
    pub standard_error: f64,
    pub z_score: f64,
    /// Confidence used for the type confidence; fixed for tie-broken dimensions.
    pub effective_confidence: f64,
}

impl DimensionStatistics {
    pub(crate) fn from_score(score: &DimensionScore) -> Self {
        let total = score.total();
        let confidence = confidence_level(score.winning_count(), total);
        let effective_confidence = if score.tie_broken {
            TIE_BREAK_CONFIDENCE
        } else {
            confidence
        };

        Self {
            dimension: score.dimension,
            confidence,
            standard_error: standard_error(score.strength, total),
            z_score: z_score(score.strength),
            effective_confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Excellent,
    Good,
    Acceptable,
    Questionable,
}

impl QualityLevel {
    pub fn from_score(quality: f64) -> Self {
        if quality >= 0.85 {
            QualityLevel::Excellent
        } else if quality >= 0.70 {
            QualityLevel::Good
        } else if quality >= 0.55 {
            QualityLevel::Acceptable
        } else {
            QualityLevel::Questionable
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            QualityLevel::Excellent => "excellent",
            QualityLevel::Good => "good",
            QualityLevel::Acceptable => "acceptable",
            QualityLevel::Questionable => "questionable",
        }
    }
}

/// Statistical extension attached to professional results. Never alters the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalReport {
    pub dimensions: Vec<DimensionStatistics>,
    pub type_confidence: f64,
    pub average_confidence: f64,
    pub internal_consistency: f64,
    pub response_consistency: f64,
    pub extreme_response_bias: f64,
    pub acquiescence_bias: f64,
    pub assessment_quality: f64,
    pub quality_level: QualityLevel,
    pub retest_recommended: bool,
    pub stability_score: f64,
    pub confidence_interval: (f64, f64),
    pub exploration_areas: Vec<String>,
    pub confidence_notes: Vec<String>,
}

impl StatisticalReport {
    pub(crate) fn compute(
        scores: &[DimensionScore],
        responses: &[(&Question, AnswerOption)],
        borderline: &[Dimension],
    ) -> Self {
        let dimensions: Vec<DimensionStatistics> =
            scores.iter().map(DimensionStatistics::from_score).collect();
        let effective: Vec<f64> = dimensions
            .iter()
            .map(|stats| stats.effective_confidence)
            .collect();
        let confidences: Vec<f64> = dimensions.iter().map(|stats| stats.confidence).collect();

        // The tie-break floor only feeds the type confidence.
        let type_confidence = geometric_mean(&effective).clamp(0.0, 1.0);
        let average_confidence = mean(&confidences);
        let internal_consistency = internal_consistency(responses);
        let response_consistency = response_consistency(responses);
        let extreme_response_bias = extreme_response_bias(responses);
        let acquiescence_bias = acquiescence_bias(responses);

        let assessment_quality = mean(&[
            internal_consistency,
            response_consistency,
            1.0 - extreme_response_bias,
            1.0 - acquiescence_bias,
            average_confidence,
        ])
        .clamp(0.0, 1.0);

        let retest_recommended =
            assessment_quality < RETEST_QUALITY_FLOOR || type_confidence < RETEST_CONFIDENCE_FLOOR;

        let average_strength = mean(
            &scores
                .iter()
                .map(|score| (score.strength - 0.5).abs() * 2.0)
                .collect::<Vec<_>>(),
        );
        let statistical_quality = (internal_consistency + response_consistency) / 2.0;
        let bias_penalty = (extreme_response_bias + acquiescence_bias) / 2.0;
        let stability_score = (0.4 * average_strength
            + 0.3 * average_confidence
            + 0.2 * statistical_quality
            - 0.1 * bias_penalty)
            .clamp(0.0, 1.0);

        let confidence_interval = confidence_interval(&confidences);
        let quality_level = QualityLevel::from_score(assessment_quality);
        let exploration_areas = exploration_areas(&dimensions, borderline);

        let mut report = Self {
            dimensions,
            type_confidence,
            average_confidence,
            internal_consistency,
            response_consistency,
            extreme_response_bias,
            acquiescence_bias,
            assessment_quality,
            quality_level,
            retest_recommended,
            stability_score,
            confidence_interval,
            exploration_areas,
            confidence_notes: Vec::new(),
        };
        report.confidence_notes = confidence_notes(&report, scores);
        report
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionStatistics> {
        self.dimensions
            .iter()
            .find(|stats| stats.dimension == dimension)
    }
}

fn internal_consistency(responses: &[(&Question, AnswerOption)]) -> f64 {
    let per_dimension: Vec<f64> = Dimension::ALL
        .iter()
        .filter_map(|dimension| {
            let values: Vec<f64> = responses
                .iter()
                .filter(|(question, _)| question.dimension == *dimension)
                .map(|(_, option)| match option {
                    AnswerOption::A => 1.0,
                    AnswerOption::B => 0.0,
                })
                .collect();
            (values.len() > 1).then(|| {
                (1.0 - sample_variance(&values) / MAX_BINARY_VARIANCE).clamp(0.0, 1.0)
            })
        })
        .collect();

    if per_dimension.is_empty() {
        0.5
    } else {
        mean(&per_dimension)
    }
}

/// Runs-based consistency over the answer sequence in catalog order.
fn response_consistency(responses: &[(&Question, AnswerOption)]) -> f64 {
    if responses.len() < 2 {
        return 1.0;
    }

    let runs = 1 + responses
        .windows(2)
        .filter(|pair| pair[0].1 != pair[1].1)
        .count();
    let expected_runs = responses.len() as f64 / 2.0;
    let ratio = runs as f64 / expected_runs;
    (1.0 - (ratio - 1.0).abs()).clamp(0.0, 1.0)
}

fn extreme_response_bias(responses: &[(&Question, AnswerOption)]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let share_a = responses
        .iter()
        .filter(|(_, option)| *option == AnswerOption::A)
        .count() as f64
        / responses.len() as f64;
    ((share_a - 0.5).abs() * 2.0).clamp(0.0, 1.0)
}

fn acquiescence_bias(responses: &[(&Question, AnswerOption)]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    let share_first = responses
        .iter()
        .filter(|(question, option)| question.maps_to_first(*option))
        .count() as f64
        / responses.len() as f64;
    ((share_first - 0.5).abs() * 2.0).clamp(0.0, 1.0)
}

fn confidence_interval(confidences: &[f64]) -> (f64, f64) {
    let average = mean(confidences);
    let spread = if confidences.len() > 1 {
        sample_variance(confidences).sqrt()
    } else {
        0.1
    };
    let margin = Z_95 * spread;
    ((average - margin).max(0.0), (average + margin).min(1.0))
}

fn exploration_areas(dimensions: &[DimensionStatistics], borderline: &[Dimension]) -> Vec<String> {
    let mut areas: Vec<String> = borderline
        .iter()
        .map(|dimension| exploration_prompt(*dimension).to_string())
        .collect();

    for stats in dimensions {
        if stats.confidence < LOW_CONFIDENCE && !borderline.contains(&stats.dimension) {
            areas.push(format!(
                "Further clarification needed for the {} dimension",
                stats.dimension
            ));
        }
    }

    areas
}

fn exploration_prompt(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::EI => "Energy source: explore whether you recharge with others or alone",
        Dimension::SN => "Information gathering: explore whether you trust facts or patterns",
        Dimension::TF => "Decision making: explore whether logic or values lead your choices",
        Dimension::JP => "Lifestyle: explore whether you prefer structure or flexibility",
    }
}

fn confidence_notes(report: &StatisticalReport, scores: &[DimensionScore]) -> Vec<String> {
    let mut notes = vec![format!(
        "Overall assessment quality is {} ({:.0}%)",
        report.quality_level.label(),
        report.assessment_quality * 100.0
    )];

    if report.extreme_response_bias > 0.7 {
        notes.push("Responses lean heavily toward one option; results may be skewed".to_string());
    }
    if report.acquiescence_bias > 0.7 {
        notes.push("Responses favor one pole of every pair; consider a retest".to_string());
    }
    if report.internal_consistency < 0.6 {
        notes.push("Answers within some dimensions are inconsistent".to_string());
    }

    for (stats, score) in report.dimensions.iter().zip(scores) {
        if stats.confidence < LOW_CONFIDENCE {
            notes.push(format!(
                "{} preference is uncertain ({:.0}% confidence)",
                stats.dimension,
                stats.confidence * 100.0
            ));
        } else if score.strength >= 0.8 {
            notes.push(format!(
                "Very clear {} preference on {}",
                score.preferred, stats.dimension
            ));
        }
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_uses_margin_for_larger_samples() {
        assert_eq!(confidence_level(9, 9), 1.0);
        let six_of_nine = confidence_level(6, 9);
        assert!((six_of_nine - 0.5410).abs() < 1e-3, "got {six_of_nine}");
        assert_eq!(confidence_level(2, 4), 0.0);
        assert!((confidence_level(4, 5) - 0.6).abs() < 1e-12);
        assert_eq!(confidence_level(0, 0), 0.0);
    }

    #[test]
    fn standard_error_and_z_score() {
        assert!((standard_error(0.5, 4) - 0.25).abs() < 1e-12);
        assert_eq!(standard_error(0.7, 0), 1.0);
        assert_eq!(z_score(1.0), 1.0);
        assert_eq!(z_score(0.5), 0.0);
    }

    #[test]
    fn geometric_mean_of_equal_values_is_that_value() {
        let value = geometric_mean(&[TIE_BREAK_CONFIDENCE; 4]);
        assert!((value - TIE_BREAK_CONFIDENCE).abs() < 1e-12);
        assert_eq!(geometric_mean(&[0.0, 1.0]), 0.0);
    }

    #[test]
    fn interval_stays_inside_unit_range() {
        let (low, high) = confidence_interval(&[1.0, 1.0, 0.2, 0.9]);
        assert!(low >= 0.0 && high <= 1.0 && low <= high);
        let (low, high) = confidence_interval(&[0.5]);
        assert!((low - 0.304).abs() < 1e-9 && (high - 0.696).abs() < 1e-9);
    }

    #[test]
    fn quality_levels_follow_cut_offs() {
        assert_eq!(QualityLevel::from_score(0.85), QualityLevel::Excellent);
        assert_eq!(QualityLevel::from_score(0.75), QualityLevel::Good);
        assert_eq!(QualityLevel::from_score(0.6), QualityLevel::Acceptable);
        assert_eq!(QualityLevel::from_score(0.54), QualityLevel::Questionable);
    }
}
