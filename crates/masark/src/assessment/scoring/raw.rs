use serde_json::Value;

use super::super::catalog::QuestionCatalog;
use super::super::domain::{Answer, AnswerOption};
use super::config::NeutralResponsePolicy;
use super::ScoringError;

pub const MIN_RESPONSE: i64 = 1;
pub const NEUTRAL_RESPONSE: i64 = 3;
pub const MAX_RESPONSE: i64 = 5;

/// Converts JSON response values into integers, rejecting anything outside 1..=5.
pub fn parse_response_values(values: &[Value]) -> Result<Vec<i64>, ScoringError> {
    values
        .iter()
        .enumerate()
        .map(|(position, value)| {
            value
                .as_i64()
                .filter(|response| (MIN_RESPONSE..=MAX_RESPONSE).contains(response))
                .ok_or_else(|| ScoringError::InvalidResponseValue {
                    position,
                    value: value.to_string(),
                })
        })
        .collect()
}

/// Maps one 1-5 response to a forced choice; neutral responses consult `neutral`.
fn map_response(
    position: usize,
    response: i64,
    neutral: &mut NeutralSequence,
) -> Result<AnswerOption, ScoringError> {
    match response {
        MIN_RESPONSE..=2 => Ok(AnswerOption::A),
        NEUTRAL_RESPONSE => Ok(neutral.next_option()),
        4..=MAX_RESPONSE => Ok(AnswerOption::B),
        _ => Err(ScoringError::InvalidResponseValue {
            position,
            value: response.to_string(),
        }),
    }
}

struct NeutralSequence {
    policy: NeutralResponsePolicy,
    seen: usize,
}

impl NeutralSequence {
    fn new(policy: NeutralResponsePolicy) -> Self {
        Self { policy, seen: 0 }
    }

    fn next_option(&mut self) -> AnswerOption {
        let option = match self.policy {
            NeutralResponsePolicy::OptionA => AnswerOption::A,
            NeutralResponsePolicy::OptionB => AnswerOption::B,
            NeutralResponsePolicy::Alternate if self.seen % 2 == 0 => AnswerOption::A,
            NeutralResponsePolicy::Alternate => AnswerOption::B,
        };
        self.seen += 1;
        option
    }
}

/// Pairs raw responses with active questions in catalog order.
pub(crate) fn answers_from_responses(
    catalog: &QuestionCatalog,
    responses: &[i64],
    policy: NeutralResponsePolicy,
    expected: usize,
) -> Result<Vec<Answer>, ScoringError> {
    if let Some((position, response)) = responses
        .iter()
        .enumerate()
        .find(|(_, response)| !(MIN_RESPONSE..=MAX_RESPONSE).contains(*response))
    {
        return Err(ScoringError::InvalidResponseValue {
            position,
            value: response.to_string(),
        });
    }

    if responses.len() != expected {
        return Err(ScoringError::IncompleteAssessment {
            expected,
            found: responses.len(),
        });
    }

    let mut neutral = NeutralSequence::new(policy);
    catalog
        .active_questions()
        .zip(responses)
        .enumerate()
        .map(|(position, (question, response))| {
            map_response(position, *response, &mut neutral)
                .map(|option| Answer::new(question.id, option))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(responses: &[i64], policy: NeutralResponsePolicy) -> Vec<AnswerOption> {
        let catalog = QuestionCatalog::standard();
        answers_from_responses(&catalog, responses, policy, responses.len().max(36))
            .expect("responses map")
            .into_iter()
            .map(|answer| answer.selected_option)
            .collect()
    }

    #[test]
    fn low_values_pick_a_and_high_values_pick_b() {
        let mut responses = vec![1; 36];
        responses[1] = 2;
        responses[2] = 4;
        responses[3] = 5;
        let mapped = options(&responses, NeutralResponsePolicy::Alternate);
        assert_eq!(
            &mapped[..4],
            &[AnswerOption::A, AnswerOption::A, AnswerOption::B, AnswerOption::B]
        );
    }

    #[test]
    fn neutral_alternates_in_order_of_occurrence() {
        let mut responses = vec![5; 36];
        for position in [0, 4, 9, 30] {
            responses[position] = 3;
        }
        let mapped = options(&responses, NeutralResponsePolicy::Alternate);
        assert_eq!(mapped[0], AnswerOption::A);
        assert_eq!(mapped[4], AnswerOption::B);
        assert_eq!(mapped[9], AnswerOption::A);
        assert_eq!(mapped[30], AnswerOption::B);
    }

    #[test]
    fn fixed_neutral_policies_pick_one_side() {
        let responses = vec![3; 36];
        assert!(options(&responses, NeutralResponsePolicy::OptionA)
            .iter()
            .all(|option| *option == AnswerOption::A));
        assert!(options(&responses, NeutralResponsePolicy::OptionB)
            .iter()
            .all(|option| *option == AnswerOption::B));
    }

    #[test]
    fn out_of_range_values_are_rejected_with_position() {
        let catalog = QuestionCatalog::standard();
        let mut responses = vec![2; 36];
        responses[7] = 6;
        assert_eq!(
            answers_from_responses(&catalog, &responses, NeutralResponsePolicy::Alternate, 36),
            Err(ScoringError::InvalidResponseValue {
                position: 7,
                value: "6".to_string()
            })
        );
    }

    #[test]
    fn wrong_length_is_incomplete() {
        let catalog = QuestionCatalog::standard();
        assert_eq!(
            answers_from_responses(&catalog, &[1; 35], NeutralResponsePolicy::Alternate, 36),
            Err(ScoringError::IncompleteAssessment {
                expected: 36,
                found: 35
            })
        );
    }

    #[test]
    fn json_values_must_be_integers_in_range() {
        let parsed = parse_response_values(&[json!(1), json!(5), json!(3)]).expect("valid");
        assert_eq!(parsed, vec![1, 5, 3]);

        for (bad, rendered) in [
            (json!(2.5), "2.5"),
            (json!("4"), "\"4\""),
            (json!(0), "0"),
            (json!(null), "null"),
        ] {
            match parse_response_values(&[json!(1), bad]) {
                Err(ScoringError::InvalidResponseValue { position, value }) => {
                    assert_eq!(position, 1);
                    assert_eq!(value, rendered);
                }
                other => panic!("expected invalid response value, got {other:?}"),
            }
        }
    }
}
