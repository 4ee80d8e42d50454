//! Career recommendations keyed by personality type.
//!
//! Matching sits outside the scoring core: the matcher reads a fit matrix and consults an
//! injected cache, and nothing in `assessment` depends on it.

mod matrix;
pub mod router;

pub use matrix::{CareerFit, CareerImportError, CareerMatrix, CareerMatrixImporter};
pub use router::career_router;

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assessment::PersonalityTypeCode;

pub const DEFAULT_MATCH_LIMIT: usize = 10;
pub const MAX_MATCH_LIMIT: usize = 50;

/// A ranked career recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerMatch {
    pub rank: usize,
    pub career_id: String,
    pub name_en: String,
    pub name_ar: String,
    pub cluster: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CareerCacheKey {
    pub type_code: PersonalityTypeCode,
    pub limit: usize,
}

/// Cache consulted by the matcher before ranking the matrix.
pub trait CareerMatchCache: Send + Sync {
    fn get(&self, key: &CareerCacheKey) -> Option<Vec<CareerMatch>>;
    fn put(&self, key: CareerCacheKey, matches: Vec<CareerMatch>);
}

/// Cache that never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CareerMatchCache for NoCache {
    fn get(&self, _key: &CareerCacheKey) -> Option<Vec<CareerMatch>> {
        None
    }

    fn put(&self, _key: CareerCacheKey, _matches: Vec<CareerMatch>) {}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CareerMatchError {
    #[error("limit must be between 1 and {max}, got {limit}")]
    InvalidLimit { limit: usize, max: usize },
    #[error("invalid personality type: {0}")]
    InvalidType(String),
}

/// Ranks careers for a type: score descending, ties by career id.
pub struct CareerMatcher<C> {
    matrix: Arc<CareerMatrix>,
    cache: Arc<C>,
}

impl<C> CareerMatcher<C>
where
    C: CareerMatchCache + 'static,
{
    pub fn new(matrix: Arc<CareerMatrix>, cache: Arc<C>) -> Self {
        Self { matrix, cache }
    }

    pub fn matrix(&self) -> &CareerMatrix {
        &self.matrix
    }

    pub fn top_matches(
        &self,
        type_code: PersonalityTypeCode,
        limit: usize,
    ) -> Result<Vec<CareerMatch>, CareerMatchError> {
        if limit == 0 || limit > MAX_MATCH_LIMIT {
            return Err(CareerMatchError::InvalidLimit {
                limit,
                max: MAX_MATCH_LIMIT,
            });
        }

        let key = CareerCacheKey { type_code, limit };
        if let Some(cached) = self.cache.get(&key) {
            debug!(%type_code, limit, "career matches served from cache");
            return Ok(cached);
        }

        let mut fits: Vec<&CareerFit> = self.matrix.fits_for(type_code).iter().collect();
        fits.sort_by(|left, right| {
            right
                .score
                .partial_cmp(&left.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.career_id.cmp(&right.career_id))
        });

        let matches: Vec<CareerMatch> = fits
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, fit)| CareerMatch {
                rank: index + 1,
                career_id: fit.career_id.clone(),
                name_en: fit.name_en.clone(),
                name_ar: fit.name_ar.clone(),
                cluster: fit.cluster.clone(),
                score: fit.score,
            })
            .collect();

        self.cache.put(key, matches.clone());
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCache {
        entries: Mutex<Vec<(CareerCacheKey, Vec<CareerMatch>)>>,
    }

    impl CareerMatchCache for RecordingCache {
        fn get(&self, key: &CareerCacheKey) -> Option<Vec<CareerMatch>> {
            self.entries
                .lock()
                .expect("cache mutex poisoned")
                .iter()
                .find(|(stored, _)| stored == key)
                .map(|(_, matches)| matches.clone())
        }

        fn put(&self, key: CareerCacheKey, matches: Vec<CareerMatch>) {
            self.entries
                .lock()
                .expect("cache mutex poisoned")
                .push((key, matches));
        }
    }

    fn fit(id: &str, score: f64) -> CareerFit {
        CareerFit {
            career_id: id.to_string(),
            name_en: format!("Career {id}"),
            name_ar: String::new(),
            cluster: "General".to_string(),
            score,
        }
    }

    fn matrix() -> Arc<CareerMatrix> {
        let code: PersonalityTypeCode = "INTJ".parse().expect("type");
        let mut matrix = CareerMatrix::new();
        for (id, score) in [("c-3", 0.7), ("c-1", 0.9), ("c-2", 0.7), ("c-4", 0.2)] {
            matrix.insert(code, fit(id, score));
        }
        Arc::new(matrix)
    }

    #[test]
    fn ranks_by_score_then_career_id() {
        let matcher = CareerMatcher::new(matrix(), Arc::new(NoCache));
        let matches = matcher
            .top_matches("INTJ".parse().expect("type"), 3)
            .expect("matches");
        let ids: Vec<&str> = matches.iter().map(|m| m.career_id.as_str()).collect();
        assert_eq!(ids, vec!["c-1", "c-2", "c-3"]);
        assert_eq!(matches[2].rank, 3);
    }

    #[test]
    fn unknown_type_yields_no_matches() {
        let matcher = CareerMatcher::new(matrix(), Arc::new(NoCache));
        let matches = matcher
            .top_matches("ESFP".parse().expect("type"), 5)
            .expect("matches");
        assert!(matches.is_empty());
    }

    #[test]
    fn rejects_out_of_range_limits() {
        let matcher = CareerMatcher::new(matrix(), Arc::new(NoCache));
        let code = "INTJ".parse().expect("type");
        assert_eq!(
            matcher.top_matches(code, 0),
            Err(CareerMatchError::InvalidLimit { limit: 0, max: 50 })
        );
        assert!(matcher.top_matches(code, 51).is_err());
    }

    #[test]
    fn second_lookup_is_served_from_cache() {
        let cache = Arc::new(RecordingCache::default());
        let matcher = CareerMatcher::new(matrix(), Arc::clone(&cache));
        let code = "INTJ".parse().expect("type");

        let first = matcher.top_matches(code, 2).expect("matches");
        let second = matcher.top_matches(code, 2).expect("matches");
        assert_eq!(first, second);
        assert_eq!(cache.entries.lock().expect("cache mutex poisoned").len(), 1);
    }
}
