use masark::assessment::{
    AssessmentService, AssessmentSession, CatalogImporter, QuestionCatalog, RepositoryError,
    SessionId, SessionOutcome, SessionStore,
};
use masark::careers::{
    CareerCacheKey, CareerMatch, CareerMatchCache, CareerMatcher, CareerMatrix,
    CareerMatrixImporter,
};
use masark::config::AppConfig;
use masark::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SharedAssessment = Arc<AssessmentService<InMemorySessionStore>>;
pub(crate) type SharedMatcher = Arc<CareerMatcher<InMemoryCareerCache>>;

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("session store lock poisoned".to_string())
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, AssessmentSession>>>,
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: AssessmentSession) -> Result<AssessmentSession, RepositoryError> {
        let mut guard = self.sessions.lock().map_err(|_| poisoned())?;
        if guard.contains_key(&session.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn update(&self, session: AssessmentSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().map_err(|_| poisoned())?;
        if guard.contains_key(&session.id) {
            guard.insert(session.id.clone(), session);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<AssessmentSession>, RepositoryError> {
        let guard = self.sessions.lock().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }

    fn write_outcome(
        &self,
        id: &SessionId,
        outcome: SessionOutcome,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().map_err(|_| poisoned())?;
        let session = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        session.outcome = Some(outcome);
        Ok(())
    }
}

#[derive(Default)]
struct LruEntries {
    entries: HashMap<CareerCacheKey, Vec<CareerMatch>>,
    order: VecDeque<CareerCacheKey>,
}

impl LruEntries {
    fn touch(&mut self, key: &CareerCacheKey) {
        if let Some(position) = self.order.iter().position(|existing| existing == key) {
            if let Some(existing) = self.order.remove(position) {
                self.order.push_back(existing);
            }
        }
    }
}

/// Bounded least-recently-used cache for career matches. Capacity zero disables caching.
pub(crate) struct InMemoryCareerCache {
    capacity: usize,
    state: Mutex<LruEntries>,
}

impl InMemoryCareerCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(LruEntries::default()),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.entries.len())
            .unwrap_or(0)
    }
}

impl CareerMatchCache for InMemoryCareerCache {
    fn get(&self, key: &CareerCacheKey) -> Option<Vec<CareerMatch>> {
        let mut state = self.state.lock().ok()?;
        let matches = state.entries.get(key).cloned()?;
        state.touch(key);
        Some(matches)
    }

    fn put(&self, key: CareerCacheKey, matches: Vec<CareerMatch>) {
        if self.capacity == 0 {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };

        if state.entries.insert(key.clone(), matches).is_some() {
            state.touch(&key);
        } else {
            state.order.push_back(key);
        }

        while state.entries.len() > self.capacity {
            match state.order.pop_front() {
                Some(evicted) => {
                    state.entries.remove(&evicted);
                }
                None => break,
            }
        }
    }
}

pub(crate) fn load_catalog(config: &AppConfig) -> Result<QuestionCatalog, AppError> {
    match &config.scoring.catalog_path {
        Some(path) => {
            let catalog = CatalogImporter::from_path(path)?;
            info!(path = %path.display(), questions = catalog.active_count(), "question catalog loaded");
            Ok(catalog)
        }
        None => Ok(QuestionCatalog::standard()),
    }
}

pub(crate) fn load_career_matrix(config: &AppConfig) -> Result<CareerMatrix, AppError> {
    match &config.careers.matrix_path {
        Some(path) => {
            let matrix = CareerMatrixImporter::from_path(path)?;
            info!(path = %path.display(), types = matrix.type_count(), "career matrix loaded");
            Ok(matrix)
        }
        None => Ok(CareerMatrix::new()),
    }
}

/// Wires the assessment service and career matcher from configuration.
pub(crate) fn build_services(
    config: &AppConfig,
) -> Result<(SharedAssessment, SharedMatcher), AppError> {
    let catalog = Arc::new(load_catalog(config)?);
    let assessment = Arc::new(AssessmentService::new(
        Arc::new(InMemorySessionStore::default()),
        catalog,
        config.scoring.scoring_config(),
    ));

    let matcher = Arc::new(CareerMatcher::new(
        Arc::new(load_career_matrix(config)?),
        Arc::new(InMemoryCareerCache::new(config.careers.cache_capacity)),
    ));

    Ok((assessment, matcher))
}
