use chrono::Utc;
use jobswipe::config::AppConfig;
use jobswipe::workflows::swipe::{
    Application, ApplicationId, ApplicationPatch, ApplicationRepository, CandidateId,
    HttpCompletionClient, Job, JobId, JobRepository, MatchScoreRefiner, NewApplication,
    Notification, Notifier, NotifyError, RecruiterId, RepositoryError, SkillOverlapScorer,
    SwipeService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub(crate) type ApiService =
    SwipeService<InMemoryJobRepository, InMemoryApplicationRepository, HttpCompletionClient>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    jobs: Arc<Mutex<HashMap<JobId, Job>>>,
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        if guard.contains_key(&job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        Ok(guard.get(id).cloned())
    }

    fn active(&self) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        let mut active: Vec<Job> = guard.values().filter(|job| job.is_active).cloned().collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(active)
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryApplicationRepository {
    fn matching(&self, predicate: impl Fn(&Application) -> bool) -> Vec<Application> {
        let guard = self.records.lock().unwrap_or_else(|p| p.into_inner());
        let mut matches: Vec<Application> = guard
            .values()
            .filter(|application| predicate(application))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        matches
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn create(&self, draft: NewApplication) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().unwrap_or_else(|p| p.into_inner());
        let duplicate = guard.values().any(|existing| {
            existing.candidate_id == draft.candidate_id && existing.job_id == draft.job_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict);
        }

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let id = ApplicationId(format!("app-{sequence:06}"));
        let application = Application::from_new(id.clone(), draft);
        guard.insert(id, application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().unwrap_or_else(|p| p.into_inner());
        Ok(guard.get(id).cloned())
    }

    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.matching(|application| &application.candidate_id == candidate_id))
    }

    fn for_recruiter(
        &self,
        recruiter_id: &RecruiterId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self.matching(|application| &application.recruiter_id == recruiter_id))
    }

    fn update(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().unwrap_or_else(|p| p.into_inner());
        let application = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        patch.apply(application, Utc::now());
        Ok(application.clone())
    }
}

/// Notifier that forwards every notice to the structured log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            kind = ?notification.kind,
            title = %notification.title,
            detail = %notification.detail,
            "notification"
        );
        Ok(())
    }
}

/// Load postings into the store, skipping identifiers that are already present.
pub(crate) fn seed_jobs(repository: &InMemoryJobRepository, jobs: Vec<Job>) -> usize {
    let mut loaded = 0;
    for job in jobs {
        let id = job.id.clone();
        match repository.insert(job) {
            Ok(_) => loaded += 1,
            Err(err) => warn!(job_id = %id, error = %err, "skipping job posting"),
        }
    }
    loaded
}

pub(crate) fn build_service(
    config: &AppConfig,
    jobs: InMemoryJobRepository,
    applications: InMemoryApplicationRepository,
) -> ApiService {
    let service = SwipeService::new(
        Arc::new(jobs),
        Arc::new(applications),
        Arc::new(SkillOverlapScorer),
        Arc::new(LogNotifier),
        config.swipe.settings(),
    );

    let settings = &config.refiner;
    let Some(endpoint) = settings.endpoint.as_deref() else {
        info!("match score refinement disabled; REFINER_ENDPOINT is not set");
        return service;
    };

    match HttpCompletionClient::new(
        endpoint,
        settings.api_key.as_str(),
        settings.model.as_str(),
        settings.timeout,
    ) {
        Ok(client) => {
            info!(endpoint, model = %settings.model, "match score refinement enabled");
            service.with_refiner(MatchScoreRefiner::new(client, settings.refiner_config()))
        }
        Err(err) => {
            warn!(endpoint, error = %err, "refinement client could not be built; continuing without it");
            service
        }
    }
}
