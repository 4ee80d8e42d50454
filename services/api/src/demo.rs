use crate::infra::build_services;
use chrono::Utc;
use clap::Args;
use masark::assessment::{
    Answer, AnswerOption, AssessmentServiceError, DeploymentMode, Dimension, Language,
    PersonalityTypeCode, QuestionCatalog, ScoringEngine, ScoringProfile, ScoringResult,
    ValidationHarness,
};
use masark::config::AppConfig;
use masark::error::AppError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Responses on the 1-5 scale, in catalog order (e.g. 1,4,3,5,...)
    #[arg(long, value_delimiter = ',', num_args = 1.., required = true)]
    pub(crate) responses: Vec<i64>,
    /// Threshold preset: basic or professional (defaults to configuration)
    #[arg(long)]
    pub(crate) profile: Option<ScoringProfile>,
    /// Print the full result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// Synthetic respondents for the accuracy and distribution runs
    #[arg(long, default_value_t = 100)]
    pub(crate) samples: usize,
    /// Seed for the deterministic generator
    #[arg(long, default_value_t = 42)]
    pub(crate) seed: u64,
    /// Print the full report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Type the simulated respondent leans toward
    #[arg(long, default_value = "INTJ")]
    pub(crate) target: PersonalityTypeCode,
    /// Probability that each answer agrees with the target type
    #[arg(long, default_value_t = 0.85, value_parser = parse_probability)]
    pub(crate) consistency: f64,
    /// Seed for the simulated respondent
    #[arg(long, default_value_t = 7)]
    pub(crate) seed: u64,
    /// Interface language recorded on the session (en or ar)
    #[arg(long, default_value = "en")]
    pub(crate) language: String,
    /// Number of career matches to list
    #[arg(long, default_value_t = 5)]
    pub(crate) careers: usize,
}

fn parse_probability(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("`{raw}` must be between 0 and 1"))
    }
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (service, _) = build_services(&config)?;
    let result = service.score_raw(&args.responses, args.profile)?;

    if args.json {
        println!("{}", to_json(&result)?);
    } else {
        render_result(&result);
    }
    Ok(())
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let catalog = crate::infra::load_catalog(&config)?;
    let engine = ScoringEngine::new(config.scoring.scoring_config());
    let harness = ValidationHarness::new(&engine, &catalog);
    let report = harness
        .run(args.samples, args.seed)
        .map_err(AssessmentServiceError::from)?;

    if args.json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }

    println!(
        "Validation harness (seed {}, {} samples, {} profile)",
        args.seed,
        args.samples,
        engine.config().profile.label()
    );
    println!(
        "- Accuracy: {:.1}% ({} of {})",
        report.accuracy.overall_accuracy * 100.0,
        report.accuracy.correct_predictions,
        report.accuracy.total_tests
    );
    for level in &report.accuracy.by_consistency {
        println!(
            "  - consistency {:.2}: {:.1}% over {} samples",
            level.consistency,
            level.tally.accuracy() * 100.0,
            level.tally.total
        );
    }
    for (dimension, accuracy) in &report.accuracy.dimension_accuracy {
        println!("  - {}: {:.1}%", dimension.label(), accuracy * 100.0);
    }

    println!("- Edge cases:");
    for case in &report.edge_cases {
        match (&case.personality_type, &case.error) {
            (Some(code), _) => println!(
                "  - {}: {} (borderline: {})",
                case.name,
                code,
                format_dimensions(&case.borderline_dimensions)
            ),
            (None, Some(error)) => println!("  - {}: error: {}", case.name, error),
            (None, None) => println!("  - {}: no result", case.name),
        }
    }

    println!(
        "- Random responders produced {} distinct types",
        report.distribution.unique_types
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (service, matcher) = build_services(&config)?;
    let language = if args.language.eq_ignore_ascii_case("ar") {
        Language::Ar
    } else {
        Language::En
    };

    println!("Masark assessment demo");
    let session = service.start_session(language, DeploymentMode::Standard, Utc::now())?;
    println!("- Session {} started", session.id);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let answers = simulated_answers(
        service.catalog(),
        args.target,
        args.consistency,
        &mut rng,
    );
    let session = service.record_answers(&session.id, &answers, Utc::now())?;
    println!(
        "- Recorded {} answers (status: {})",
        session.answers.len(),
        session.status_label()
    );

    let result = service.calculate(&session.id, None, Utc::now())?;
    println!("- Simulated respondent leaned toward {}", args.target);
    render_result(&result);

    let report = service.validate_session(&session.id)?;
    println!(
        "- Response validity {:.2} ({:?}, {})",
        report.validity_score,
        report.level,
        if report.passed { "passed" } else { "review" }
    );
    for recommendation in report.recommendations.iter().take(3) {
        println!("  - {}", recommendation);
    }

    match matcher.top_matches(result.type_code, args.careers) {
        Ok(matches) if matches.is_empty() => {
            println!("- No career matrix loaded; set MASARK_CAREER_MATRIX to list careers")
        }
        Ok(matches) => {
            println!("- Career matches:");
            for career in matches {
                println!(
                    "  {}. {} [{}] fit {:.2}",
                    career.rank, career.name_en, career.cluster, career.score
                );
            }
        }
        Err(error) => println!("- Career lookup skipped: {}", error),
    }

    Ok(())
}

fn simulated_answers<R: Rng>(
    catalog: &QuestionCatalog,
    target: PersonalityTypeCode,
    consistency: f64,
    rng: &mut R,
) -> Vec<Answer> {
    catalog
        .active_questions()
        .map(|question| {
            let agrees = rng.gen_bool(consistency);
            let a_matches = question.letter_for(AnswerOption::A) == target.letter(question.dimension);
            let option = if agrees == a_matches {
                AnswerOption::A
            } else {
                AnswerOption::B
            };
            Answer::new(question.id, option)
        })
        .collect()
}

fn render_result(result: &ScoringResult) {
    println!(
        "- Personality type {} ({} profile)",
        result.type_code,
        result.profile.label()
    );
    for score in &result.dimensions {
        println!(
            "  - {}: {} {}/{} ({:.0}%), {}{}",
            score.dimension.label(),
            score.preferred.as_char(),
            score.winning_count(),
            score.total(),
            score.strength * 100.0,
            score.clarity.label(),
            if score.tie_broken { ", tie broken" } else { "" }
        );
    }
    if !result.borderline_dimensions.is_empty() {
        println!(
            "  - Borderline: {}",
            format_dimensions(&result.borderline_dimensions)
        );
    }
    if let Some(statistics) = &result.statistics {
        println!(
            "  - Confidence {:.2}, quality {:.2} ({:?}){}",
            statistics.type_confidence,
            statistics.assessment_quality,
            statistics.quality_level,
            if statistics.retest_recommended {
                ", retest recommended"
            } else {
                ""
            }
        );
    }
}

fn format_dimensions(dimensions: &[Dimension]) -> String {
    if dimensions.is_empty() {
        return "none".to_string();
    }
    dimensions
        .iter()
        .map(|dimension| dimension.code())
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Io(err.into()))
}
