use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::swipe::domain::{
    Application, ApplicationId, ApplicationPatch, ApplicationStatus, CandidateId,
    CandidateProfile, CompanyId, ExperienceLevel, Job, JobId, JobLocation, MatchScore,
    NewApplication, RecruiterId, RoleType,
};
use crate::workflows::swipe::refiner::{CompletionClient, CompletionError};
use crate::workflows::swipe::repository::{
    ApplicationRepository, JobRepository, Notification, NotificationKind, Notifier, NotifyError,
    RepositoryError,
};
use crate::workflows::swipe::scoring::MatchScorer;
use crate::workflows::swipe::session::{SessionEvent, SessionObserver};
use crate::workflows::swipe::{
    JobFeedSupplier, MatchScoreRefiner, RefinerConfig, SwipeService, SwipeSettings,
};

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn live_job(id: &str, minutes_ago: i64) -> Job {
    let created_at = base_time() - Duration::minutes(minutes_ago);
    Job {
        id: JobId(id.to_string()),
        company_id: CompanyId("co-acme".to_string()),
        company_name: "Acme Robotics".to_string(),
        posted_by: RecruiterId("rec-1".to_string()),
        title: format!("Engineer {id}"),
        role_type: RoleType::FullTime,
        experience_level: ExperienceLevel::OneToThreeYears,
        domain: "Software Engineering".to_string(),
        required_skills: vec!["Rust".to_string(), "SQL".to_string()],
        location: JobLocation {
            city: "Pune".to_string(),
            remote_allowed: true,
        },
        salary_range: None,
        description: format!("Build services for {id}."),
        openings: 1,
        screening_questions: Vec::new(),
        is_active: true,
        created_at,
        updated_at: created_at,
    }
}

/// Three live postings, newest first.
pub(super) fn live_jobs() -> Vec<Job> {
    vec![
        live_job("job-1", 10),
        live_job("job-2", 20),
        live_job("job-3", 30),
    ]
}

pub(super) fn candidate() -> CandidateProfile {
    let mut profile = CandidateProfile::anonymous(CandidateId("cand-1".to_string()));
    profile.full_name = "Asha Rao".to_string();
    profile.headline = "Backend developer".to_string();
    profile.skills = vec!["Rust".to_string(), "SQL".to_string()];
    profile.resume_url = Some("https://files.example/asha.pdf".to_string());
    profile
}

pub(super) fn application_for(candidate: &str, job: &str, score: f64) -> NewApplication {
    NewApplication {
        candidate_id: CandidateId(candidate.to_string()),
        job_id: JobId(job.to_string()),
        recruiter_id: RecruiterId("rec-1".to_string()),
        company_id: CompanyId("co-acme".to_string()),
        answers: Vec::new(),
        resume_url: String::new(),
        match_score: MatchScore::new(score).expect("valid score"),
        status: ApplicationStatus::Pending,
        created_at: base_time(),
        updated_at: base_time(),
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryJobs {
    jobs: Arc<Mutex<Vec<Job>>>,
}

impl MemoryJobs {
    pub(super) fn with(jobs: Vec<Job>) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(jobs)),
        }
    }
}

impl JobRepository for MemoryJobs {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut guard = self.jobs.lock().expect("job mutex poisoned");
        if guard.iter().any(|existing| existing.id == job.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        Ok(guard.iter().find(|job| &job.id == id).cloned())
    }

    fn active(&self) -> Result<Vec<Job>, RepositoryError> {
        let guard = self.jobs.lock().expect("job mutex poisoned");
        let mut active: Vec<Job> = guard.iter().filter(|job| job.is_active).cloned().collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(active)
    }
}

pub(super) struct UnavailableJobs;

impl JobRepository for UnavailableJobs {
    fn insert(&self, _job: Job) -> Result<Job, RepositoryError> {
        Err(RepositoryError::Unavailable("jobs offline".to_string()))
    }

    fn fetch(&self, _id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("jobs offline".to_string()))
    }

    fn active(&self) -> Result<Vec<Job>, RepositoryError> {
        Err(RepositoryError::Unavailable("jobs offline".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    records: Arc<Mutex<Vec<Application>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryApplications {
    pub(super) fn all(&self) -> Vec<Application> {
        self.records
            .lock()
            .expect("application mutex poisoned")
            .clone()
    }

    pub(super) fn seeded(drafts: Vec<NewApplication>) -> Self {
        let store = Self::default();
        for draft in drafts {
            store.create(draft).expect("seed application");
        }
        store
    }
}

impl ApplicationRepository for MemoryApplications {
    fn create(&self, draft: NewApplication) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("application mutex poisoned");
        if guard
            .iter()
            .any(|app| app.candidate_id == draft.candidate_id && app.job_id == draft.job_id)
        {
            return Err(RepositoryError::Conflict);
        }
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let application = Application::from_new(ApplicationId(format!("app-{id:06}")), draft);
        guard.push(application.clone());
        Ok(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard.iter().find(|app| &app.id == id).cloned())
    }

    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard
            .iter()
            .filter(|app| &app.candidate_id == candidate_id)
            .cloned()
            .collect())
    }

    fn for_recruiter(
        &self,
        recruiter_id: &RecruiterId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records.lock().expect("application mutex poisoned");
        Ok(guard
            .iter()
            .filter(|app| &app.recruiter_id == recruiter_id)
            .cloned()
            .collect())
    }

    fn update(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, RepositoryError> {
        let mut guard = self.records.lock().expect("application mutex poisoned");
        let application = guard
            .iter_mut()
            .find(|app| &app.id == id)
            .ok_or(RepositoryError::NotFound)?;
        patch.apply(application, Utc::now());
        Ok(application.clone())
    }
}

/// Fails the first `failures` writes with a transient error, then delegates.
pub(super) struct FlakyApplications {
    failures_left: AtomicU32,
    pub(super) inner: MemoryApplications,
}

impl FlakyApplications {
    pub(super) fn failing(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            inner: MemoryApplications::default(),
        }
    }
}

impl ApplicationRepository for FlakyApplications {
    fn create(&self, draft: NewApplication) -> Result<Application, RepositoryError> {
        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Unavailable("write timed out".to_string()));
        }
        self.inner.create(draft)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn for_candidate(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.for_candidate(candidate_id)
    }

    fn for_recruiter(
        &self,
        recruiter_id: &RecruiterId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.for_recruiter(recruiter_id)
    }

    fn update(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, RepositoryError> {
        self.inner.update(id, patch)
    }
}

pub(super) struct UnavailableApplications;

impl ApplicationRepository for UnavailableApplications {
    fn create(&self, _draft: NewApplication) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_candidate(
        &self,
        _candidate_id: &CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_recruiter(
        &self,
        _recruiter_id: &RecruiterId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _id: &ApplicationId,
        _patch: ApplicationPatch,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Rejects every write as a duplicate while holding no applications.
pub(super) struct ConflictingApplications;

impl ApplicationRepository for ConflictingApplications {
    fn create(&self, _draft: NewApplication) -> Result<Application, RepositoryError> {
        Err(RepositoryError::Conflict)
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }

    fn for_candidate(
        &self,
        _candidate_id: &CandidateId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(Vec::new())
    }

    fn for_recruiter(
        &self,
        _recruiter_id: &RecruiterId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(Vec::new())
    }

    fn update(
        &self,
        _id: &ApplicationId,
        _patch: ApplicationPatch,
    ) -> Result<Application, RepositoryError> {
        Err(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }

    pub(super) fn kinds(&self) -> Vec<NotificationKind> {
        self.events().into_iter().map(|event| event.kind).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FixedScorer(pub(super) f64);

impl MatchScorer for FixedScorer {
    fn score(&self, _candidate: &CandidateProfile, _job: &Job) -> MatchScore {
        MatchScore::new(self.0).expect("fixed score in range")
    }
}

pub(super) enum Scripted {
    Respond(Value),
    Fail(&'static str),
    Hang,
}

/// Completion backend replaying a fixed script, one entry per call.
#[derive(Default)]
pub(super) struct ScriptedCompletion {
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub(super) fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }
}

impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, prompt: &str) -> Result<Value, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt.to_string());
        let next = self.script.lock().expect("script mutex poisoned").pop_front();

        match next {
            Some(Scripted::Respond(value)) => Ok(value),
            Some(Scripted::Fail(message)) => Err(CompletionError::Transport(message.to_string())),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(CompletionError::Transport("script exhausted".to_string())),
        }
    }
}

pub(super) fn refiner_config() -> RefinerConfig {
    RefinerConfig {
        timeout: std::time::Duration::from_secs(5),
        max_attempts: 2,
        retry_backoff: std::time::Duration::from_millis(100),
    }
}

#[derive(Default)]
pub(super) struct RecordingObserver {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingObserver {
    pub(super) fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().expect("observer mutex poisoned").clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_event(&self, event: &SessionEvent) {
        self.events
            .lock()
            .expect("observer mutex poisoned")
            .push(event.clone());
    }
}

pub(super) type TestService = SwipeService<MemoryJobs, MemoryApplications, Arc<ScriptedCompletion>>;

pub(super) struct Harness {
    pub(super) service: TestService,
    pub(super) applications: MemoryApplications,
    pub(super) notifier: MemoryNotifier,
}

/// Service over `jobs` with a fixed initial score of 78 and no refiner.
pub(super) fn build_service(jobs: Vec<Job>) -> Harness {
    build_service_with(jobs, MemoryApplications::default())
}

pub(super) fn build_service_with(jobs: Vec<Job>, applications: MemoryApplications) -> Harness {
    let notifier = MemoryNotifier::default();
    let service = SwipeService::new(
        Arc::new(MemoryJobs::with(jobs)),
        Arc::new(applications.clone()),
        Arc::new(FixedScorer(78.0)),
        Arc::new(notifier.clone()),
        SwipeSettings::default(),
    );
    Harness {
        service,
        applications,
        notifier,
    }
}

pub(super) fn build_refining_service(
    jobs: Vec<Job>,
    completion: Arc<ScriptedCompletion>,
) -> Harness {
    let harness = build_service(jobs);
    let service = harness
        .service
        .with_refiner(MatchScoreRefiner::new(completion, refiner_config()));
    Harness {
        service,
        applications: harness.applications,
        notifier: harness.notifier,
    }
}

pub(super) fn feed_supplier(
    jobs: Vec<Job>,
    applications: MemoryApplications,
) -> JobFeedSupplier<MemoryJobs, MemoryApplications> {
    JobFeedSupplier::new(Arc::new(MemoryJobs::with(jobs)), Arc::new(applications))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_status(response: &Response, expected: StatusCode) {
    assert_eq!(response.status(), expected);
}
