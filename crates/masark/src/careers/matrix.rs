use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assessment::PersonalityTypeCode;

/// One career's fit for one personality type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerFit {
    pub career_id: String,
    pub name_en: String,
    pub name_ar: String,
    pub cluster: String,
    pub score: f64,
}

/// Personality type to career fit scores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CareerMatrix {
    fits: BTreeMap<PersonalityTypeCode, Vec<CareerFit>>,
}

impl CareerMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_code: PersonalityTypeCode, fit: CareerFit) {
        let entries = self.fits.entry(type_code).or_default();
        match entries
            .iter_mut()
            .find(|existing| existing.career_id == fit.career_id)
        {
            Some(existing) => *existing = fit,
            None => entries.push(fit),
        }
    }

    pub fn fits_for(&self, type_code: PersonalityTypeCode) -> &[CareerFit] {
        self.fits
            .get(&type_code)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }

    pub fn type_count(&self) -> usize {
        self.fits.len()
    }
}

#[derive(Debug)]
pub enum CareerImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidType { line: u64, value: String },
    InvalidScore { line: u64, score: f64 },
}

impl std::fmt::Display for CareerImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CareerImportError::Io(err) => write!(f, "failed to read career matrix: {}", err),
            CareerImportError::Csv(err) => write!(f, "invalid career matrix CSV: {}", err),
            CareerImportError::InvalidType { line, value } => {
                write!(f, "line {line}: '{value}' is not a personality type")
            }
            CareerImportError::InvalidScore { line, score } => {
                write!(f, "line {line}: fit score {score} is outside 0..=1")
            }
        }
    }
}

impl std::error::Error for CareerImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CareerImportError::Io(err) => Some(err),
            CareerImportError::Csv(err) => Some(err),
            CareerImportError::InvalidType { .. } | CareerImportError::InvalidScore { .. } => None,
        }
    }
}

impl From<std::io::Error> for CareerImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CareerImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct CareerRow {
    type_code: String,
    career_id: String,
    name_en: String,
    #[serde(default)]
    name_ar: String,
    #[serde(default)]
    cluster: String,
    score: f64,
}

/// Loads a matrix from CSV (`type_code,career_id,name_en,name_ar,cluster,score`).
pub struct CareerMatrixImporter;

impl CareerMatrixImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<CareerMatrix, CareerImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<CareerMatrix, CareerImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut matrix = CareerMatrix::new();

        for (index, record) in csv_reader.deserialize::<CareerRow>().enumerate() {
            let row = record?;
            let line = index as u64 + 2;

            let type_code = row
                .type_code
                .parse::<PersonalityTypeCode>()
                .map_err(|_| CareerImportError::InvalidType {
                    line,
                    value: row.type_code.clone(),
                })?;
            if !(0.0..=1.0).contains(&row.score) {
                return Err(CareerImportError::InvalidScore {
                    line,
                    score: row.score,
                });
            }

            matrix.insert(
                type_code,
                CareerFit {
                    career_id: row.career_id,
                    name_en: row.name_en,
                    name_ar: row.name_ar,
                    cluster: row.cluster,
                    score: row.score,
                },
            );
        }

        Ok(matrix)
    }
}
