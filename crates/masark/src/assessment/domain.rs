use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for catalog questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Identifier wrapper for assessment sessions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four preference pairs, always iterated in EI, SN, TF, JP order.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    EI,
    SN,
    TF,
    JP,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [Dimension::EI, Dimension::SN, Dimension::TF, Dimension::JP];

    pub const fn first(self) -> Letter {
        match self {
            Dimension::EI => Letter::E,
            Dimension::SN => Letter::S,
            Dimension::TF => Letter::T,
            Dimension::JP => Letter::J,
        }
    }

    pub const fn second(self) -> Letter {
        match self {
            Dimension::EI => Letter::I,
            Dimension::SN => Letter::N,
            Dimension::TF => Letter::F,
            Dimension::JP => Letter::P,
        }
    }

    /// Letter assigned when both poles received the same number of answers.
    pub const fn tie_break(self) -> Letter {
        self.second()
    }

    pub const fn index(self) -> usize {
        match self {
            Dimension::EI => 0,
            Dimension::SN => 1,
            Dimension::TF => 2,
            Dimension::JP => 3,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Dimension::EI => "EI",
            Dimension::SN => "SN",
            Dimension::TF => "TF",
            Dimension::JP => "JP",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Dimension::EI => "Extraversion / Introversion",
            Dimension::SN => "Sensing / Intuition",
            Dimension::TF => "Thinking / Feeling",
            Dimension::JP => "Judging / Perceiving",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '/' | ' '))
            .collect::<String>()
            .to_ascii_uppercase();

        match normalized.as_str() {
            "EI" => Ok(Dimension::EI),
            "SN" => Ok(Dimension::SN),
            "TF" => Ok(Dimension::TF),
            "JP" => Ok(Dimension::JP),
            _ => Err(format!("unknown personality dimension '{value}'")),
        }
    }
}

/// A single preference letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Letter {
    E,
    I,
    S,
    N,
    T,
    F,
    J,
    P,
}

impl Letter {
    pub const fn as_char(self) -> char {
        match self {
            Letter::E => 'E',
            Letter::I => 'I',
            Letter::S => 'S',
            Letter::N => 'N',
            Letter::T => 'T',
            Letter::F => 'F',
            Letter::J => 'J',
            Letter::P => 'P',
        }
    }

    pub const fn dimension(self) -> Dimension {
        match self {
            Letter::E | Letter::I => Dimension::EI,
            Letter::S | Letter::N => Dimension::SN,
            Letter::T | Letter::F => Dimension::TF,
            Letter::J | Letter::P => Dimension::JP,
        }
    }

    pub fn from_char(value: char) -> Option<Self> {
        match value.to_ascii_uppercase() {
            'E' => Some(Letter::E),
            'I' => Some(Letter::I),
            'S' => Some(Letter::S),
            'N' => Some(Letter::N),
            'T' => Some(Letter::T),
            'F' => Some(Letter::F),
            'J' => Some(Letter::J),
            'P' => Some(Letter::P),
            _ => None,
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Forced-choice option picked for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AnswerOption {
    A,
    B,
}

impl FromStr for AnswerOption {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "A" | "a" => Ok(AnswerOption::A),
            "B" | "b" => Ok(AnswerOption::B),
            other => Err(format!("selected option must be A or B, got '{other}'")),
        }
    }
}

/// Catalog item; immutable once an assessment has started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub order_number: u16,
    pub dimension: Dimension,
    pub option_a_maps_to_first: bool,
    pub active: bool,
}

impl Question {
    /// Whether `option` counts toward the first letter of the question's dimension.
    pub fn maps_to_first(&self, option: AnswerOption) -> bool {
        match option {
            AnswerOption::A => self.option_a_maps_to_first,
            AnswerOption::B => !self.option_a_maps_to_first,
        }
    }

    pub fn letter_for(&self, option: AnswerOption) -> Letter {
        if self.maps_to_first(option) {
            self.dimension.first()
        } else {
            self.dimension.second()
        }
    }
}

/// One selected option for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub selected_option: AnswerOption,
}

impl Answer {
    pub fn new(question_id: QuestionId, selected_option: AnswerOption) -> Self {
        Self {
            question_id,
            selected_option,
        }
    }
}

/// Clarity band of a preference, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PreferenceStrength {
    Slight,
    Moderate,
    Clear,
    VeryClear,
}

impl PreferenceStrength {
    pub const fn label(self) -> &'static str {
        match self {
            PreferenceStrength::Slight => "slight",
            PreferenceStrength::Moderate => "moderate",
            PreferenceStrength::Clear => "clear",
            PreferenceStrength::VeryClear => "very clear",
        }
    }
}

/// Four-letter type code in EI, SN, TF, JP order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonalityTypeCode([Letter; 4]);

impl PersonalityTypeCode {
    /// Builds a code from one letter per dimension; `None` when a letter is out of place.
    pub fn from_letters(letters: [Letter; 4]) -> Option<Self> {
        let aligned = Dimension::ALL
            .iter()
            .zip(letters.iter())
            .all(|(dimension, letter)| letter.dimension() == *dimension);
        aligned.then_some(Self(letters))
    }

    /// Caller guarantees each letter belongs to the dimension at its position.
    pub(crate) fn from_aligned(letters: [Letter; 4]) -> Self {
        Self(letters)
    }

    pub fn letters(&self) -> [Letter; 4] {
        self.0
    }

    pub fn letter(&self, dimension: Dimension) -> Letter {
        self.0[dimension.index()]
    }

    /// All sixteen type codes.
    pub fn all() -> Vec<Self> {
        let mut codes = Vec::with_capacity(16);
        for ei in [Letter::E, Letter::I] {
            for sn in [Letter::S, Letter::N] {
                for tf in [Letter::T, Letter::F] {
                    for jp in [Letter::J, Letter::P] {
                        codes.push(Self([ei, sn, tf, jp]));
                    }
                }
            }
        }
        codes
    }
}

impl fmt::Display for PersonalityTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for letter in self.0 {
            write!(f, "{letter}")?;
        }
        Ok(())
    }
}

impl FromStr for PersonalityTypeCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let chars: Vec<char> = trimmed.chars().collect();
        if chars.len() != 4 {
            return Err(format!("personality type '{trimmed}' must have four letters"));
        }

        let mut letters = [Letter::E; 4];
        for (slot, (raw, dimension)) in letters.iter_mut().zip(chars.iter().zip(Dimension::ALL)) {
            let letter = Letter::from_char(*raw)
                .filter(|letter| letter.dimension() == dimension)
                .ok_or_else(|| {
                    format!(
                        "personality type '{trimmed}' has '{raw}' where {} expects {} or {}",
                        dimension,
                        dimension.first(),
                        dimension.second()
                    )
                })?;
            *slot = letter;
        }

        Ok(Self(letters))
    }
}

impl TryFrom<String> for PersonalityTypeCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PersonalityTypeCode> for String {
    fn from(value: PersonalityTypeCode) -> Self {
        value.to_string()
    }
}

/// Interface language chosen for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

/// Deployment flavour the session was started under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentMode {
    #[default]
    Standard,
    Mawhiba,
}

/// Result fields written back to a session after a successful calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub type_code: PersonalityTypeCode,
    /// Share of the first letter (E, S, T, J) per dimension.
    pub strengths: BTreeMap<Dimension, f64>,
    pub clarity: BTreeMap<Dimension, PreferenceStrength>,
    pub computed_at: DateTime<Utc>,
}

/// Session state owned by the caller's store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: SessionId,
    pub language: Language,
    pub deployment_mode: DeploymentMode,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub answers: BTreeMap<QuestionId, AnswerOption>,
    pub outcome: Option<SessionOutcome>,
}

impl AssessmentSession {
    pub fn new(
        id: SessionId,
        language: Language,
        deployment_mode: DeploymentMode,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            language,
            deployment_mode,
            started_at,
            completed_at: None,
            answers: BTreeMap::new(),
            outcome: None,
        }
    }

    pub fn answer_list(&self) -> Vec<Answer> {
        self.answers
            .iter()
            .map(|(question_id, option)| Answer::new(*question_id, *option))
            .collect()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn status_label(&self) -> &'static str {
        match (&self.outcome, &self.completed_at) {
            (Some(_), _) => "scored",
            (None, Some(_)) => "completed",
            (None, None) => "in_progress",
        }
    }
}
