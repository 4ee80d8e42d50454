use std::sync::Arc;

use masark::assessment::{
    AnswerOption, CatalogImporter, Dimension, PersonalityTypeCode, PreferenceStrength,
    QuestionCatalog, ScoringConfig, ScoringEngine, ValidationHarness,
};
use masark::careers::{CareerMatcher, CareerMatrixImporter, NoCache};

/// Standard layout, with every second question in a block keyed to the second letter and
/// one retired question at the end.
fn catalog_csv() -> String {
    let mut csv = String::from("id,order_number,dimension,option_a_maps_to_first,active\n");
    let codes = ["E/I", "S/N", "T/F", "J/P"];
    for position in 0..36u32 {
        let dimension = codes[((position / 3) % 4) as usize];
        let keyed_first = if position % 3 == 1 { "no" } else { "yes" };
        csv.push_str(&format!(
            "{},{},{},{},true\n",
            position + 1,
            position + 1,
            dimension,
            keyed_first
        ));
    }
    csv.push_str("37,37,EI,yes,false\n");
    csv
}

fn imported_catalog() -> QuestionCatalog {
    CatalogImporter::from_reader(catalog_csv().as_bytes()).expect("catalog imports")
}

#[test]
fn imported_catalog_respects_reverse_keyed_questions() {
    let catalog = imported_catalog();
    assert_eq!(catalog.questions().len(), 37);
    assert_eq!(catalog.active_count(), 36);
    for dimension in Dimension::ALL {
        assert_eq!(catalog.active_count_for(dimension), 9);
    }

    let engine = ScoringEngine::default();
    let result = engine
        .score_raw_responses(&catalog, &[1; 36])
        .expect("scores");

    // Option A everywhere: two of three questions per block favour the first letter.
    assert_eq!(result.type_code.to_string(), "ESTJ");
    let ei = result.dimension(Dimension::EI);
    assert_eq!((ei.first_count, ei.second_count), (6, 3));
    assert_eq!(ei.clarity, PreferenceStrength::Clear);
}

#[test]
fn intended_answers_score_as_the_intended_type() {
    let catalog = imported_catalog();
    let engine = ScoringEngine::new(ScoringConfig::basic());

    for code in PersonalityTypeCode::all() {
        let answers: Vec<_> = catalog
            .active_questions()
            .map(|question| {
                let wanted = code.letter(question.dimension);
                let option = if question.letter_for(AnswerOption::A) == wanted {
                    AnswerOption::A
                } else {
                    AnswerOption::B
                };
                masark::assessment::Answer::new(question.id, option)
            })
            .collect();

        let result = engine.score_answers(&catalog, &answers).expect("scores");
        assert_eq!(result.type_code, code);
        assert!(result.borderline_dimensions.is_empty());
    }
}

#[test]
fn harness_is_reproducible_for_a_seed() {
    let catalog = QuestionCatalog::standard();
    let engine = ScoringEngine::default();
    let harness = ValidationHarness::new(&engine, &catalog);

    let first = harness.run(32, 7).expect("harness runs");
    let second = harness.run(32, 7).expect("harness runs");

    assert_eq!(first.accuracy.total_tests, second.accuracy.total_tests);
    assert_eq!(
        first.accuracy.correct_predictions,
        second.accuracy.correct_predictions
    );
    assert_eq!(
        first.distribution.type_counts,
        second.distribution.type_counts
    );
    assert!(first.edge_cases.iter().all(|case| case.error.is_none()));
}

#[test]
fn scored_type_feeds_career_matches() {
    let matrix = CareerMatrixImporter::from_reader(
        "type_code,career_id,name_en,name_ar,cluster,score\n\
ESTJ,mgmt-01,Operations Manager,مدير عمليات,Business,0.93\n\
ESTJ,law-04,Judge,قاضٍ,Law,0.81\n\
INFP,art-02,Writer,كاتب,Arts,0.9\n"
            .as_bytes(),
    )
    .expect("matrix imports");
    let matcher = CareerMatcher::new(Arc::new(matrix), Arc::new(NoCache));

    let catalog = QuestionCatalog::standard();
    let result = ScoringEngine::default()
        .score_raw_responses(&catalog, &[2; 36])
        .expect("scores");

    let matches = matcher
        .top_matches(result.type_code, 5)
        .expect("matches");
    let ids: Vec<&str> = matches.iter().map(|m| m.career_id.as_str()).collect();
    assert_eq!(ids, vec!["mgmt-01", "law-04"]);
}
