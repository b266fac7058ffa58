use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::domain::{
    Application, ApplicationStatus, CandidateProfile, Job, JobId, NewApplication,
};
use super::repository::{
    ApplicationRepository, Notification, NotificationKind, Notifier, RepositoryError,
};
use super::scoring::MatchScorer;

/// Retry policy for persisting applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecorderError {
    #[error("cannot record application: {0}")]
    Invalid(&'static str),
    /// The candidate already applied to this job; carries the stored application.
    #[error("application {} already exists for this job", .0.id)]
    Duplicate(Box<Application>),
    #[error("application store rejected the write after {attempts} attempt(s): {source}")]
    Store {
        attempts: u32,
        #[source]
        source: RepositoryError,
    },
    #[error("recording task was cancelled before completing")]
    Cancelled,
}

/// Creates exactly one application per committed right swipe.
///
/// The feed never offers a job the candidate already applied to. A job restored by undo
/// can still be swiped right again; the store's conflict is then reported as
/// [`RecorderError::Duplicate`] without a failure notice.
pub struct ApplicationRecorder<A> {
    applications: Arc<A>,
    scorer: Arc<dyn MatchScorer>,
    notifier: Arc<dyn Notifier>,
    config: RecorderConfig,
}

impl<A> Clone for ApplicationRecorder<A> {
    fn clone(&self) -> Self {
        Self {
            applications: Arc::clone(&self.applications),
            scorer: Arc::clone(&self.scorer),
            notifier: Arc::clone(&self.notifier),
            config: self.config,
        }
    }
}

impl<A> ApplicationRecorder<A>
where
    A: ApplicationRepository + 'static,
{
    pub fn new(
        applications: Arc<A>,
        scorer: Arc<dyn MatchScorer>,
        notifier: Arc<dyn Notifier>,
        config: RecorderConfig,
    ) -> Self {
        Self {
            applications,
            scorer,
            notifier,
            config,
        }
    }

    /// Build the pending application document for `job`.
    pub fn draft(
        &self,
        candidate: &CandidateProfile,
        job: &Job,
    ) -> Result<NewApplication, RecorderError> {
        if candidate.candidate_id.0.trim().is_empty() {
            return Err(RecorderError::Invalid("candidate id is missing"));
        }
        if job.id.0.trim().is_empty() {
            return Err(RecorderError::Invalid("job id is missing"));
        }

        let now = Utc::now();
        Ok(NewApplication {
            candidate_id: candidate.candidate_id.clone(),
            job_id: job.id.clone(),
            recruiter_id: job.posted_by.clone(),
            company_id: job.company_id.clone(),
            answers: Vec::new(),
            resume_url: candidate.resume_url.clone().unwrap_or_default(),
            match_score: self.scorer.score(candidate, job),
            status: ApplicationStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Persist the application, retrying transient store failures with doubling backoff.
    pub async fn record_now(
        &self,
        candidate: &CandidateProfile,
        job: &Job,
    ) -> Result<Application, RecorderError> {
        let draft = self.draft(candidate, job)?;
        let max_attempts = self.config.max_attempts.max(1);
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 1;

        loop {
            match self.applications.create(draft.clone()) {
                Ok(application) => {
                    info!(
                        application_id = %application.id,
                        candidate_id = %application.candidate_id,
                        job_id = %application.job_id,
                        match_score = application.match_score.value(),
                        attempt,
                        "application recorded"
                    );
                    self.publish(Notification::new(
                        NotificationKind::ApplicationSent,
                        "Application sent",
                        format!("You've applied for the {} position.", job.title),
                    ));
                    return Ok(application);
                }
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    warn!(
                        job_id = %job.id,
                        attempt,
                        retry_in_ms = backoff.as_millis() as u64,
                        error = %err,
                        "application write failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => {
                    if err == RepositoryError::Conflict {
                        if let Some(existing) = self.existing(candidate, job) {
                            info!(
                                application_id = %existing.id,
                                job_id = %job.id,
                                "application already exists, ignoring duplicate"
                            );
                            return Err(RecorderError::Duplicate(Box::new(existing)));
                        }
                    }
                    error!(job_id = %job.id, attempt, error = %err, "application write failed");
                    self.publish(Notification::new(
                        NotificationKind::ApplicationFailed,
                        "Application not sent",
                        format!("We couldn't submit your application for {}.", job.title),
                    ));
                    return Err(RecorderError::Store {
                        attempts: attempt,
                        source: err,
                    });
                }
            }
        }
    }

    /// Fire-and-forget variant: spawns the write and returns a handle to observe it.
    pub fn record(&self, candidate: CandidateProfile, job: Job) -> RecordingHandle {
        let recorder = self.clone();
        let job_id = job.id.clone();
        let task = tokio::spawn(async move { recorder.record_now(&candidate, &job).await });
        RecordingHandle { job_id, task }
    }

    fn existing(&self, candidate: &CandidateProfile, job: &Job) -> Option<Application> {
        match self.applications.for_candidate(&candidate.candidate_id) {
            Ok(applications) => applications
                .into_iter()
                .find(|application| application.job_id == job.id),
            Err(err) => {
                warn!(job_id = %job.id, error = %err, "existing application lookup failed");
                None
            }
        }
    }

    fn publish(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(notification) {
            warn!(error = %err, "notification dropped");
        }
    }
}

/// Completion handle for a spawned recording.
#[derive(Debug)]
pub struct RecordingHandle {
    job_id: JobId,
    task: JoinHandle<Result<Application, RecorderError>>,
}

impl RecordingHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    pub async fn outcome(self) -> Result<Application, RecorderError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => {
                if err.is_panic() {
                    error!(job_id = %self.job_id, "recording task panicked");
                }
                Err(RecorderError::Cancelled)
            }
        }
    }
}
