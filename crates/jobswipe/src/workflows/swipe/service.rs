use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationPatch, ApplicationStatus, CandidateId,
    CandidateProfile, Job, JobId, RecruiterId, SwipeDirection,
};
use super::feed::{Feed, FeedError, FeedSource, JobFeedSupplier};
use super::gesture::{CardFeedback, GestureInterpreter, GestureThresholds};
use super::recorder::{ApplicationRecorder, RecorderConfig, RecorderError};
use super::refiner::{
    CompletionClient, MatchScoreRefiner, RefineError, RefineOutcome, RefineRequest, RefinedScore,
};
use super::repository::{
    ApplicationRepository, JobRepository, Notification, NotificationKind, Notifier,
    RepositoryError,
};
use super::review::{ApplicantView, ApplicationReview, ReviewError};
use super::scoring::MatchScorer;
use super::session::{
    CommitOutcome, ReleaseOutcome, SessionError, SessionObserver, SessionState, SwipeSession,
    UndoOutcome,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tunables for the swipe pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SwipeSettings {
    pub thresholds: GestureThresholds,
    pub recorder: RecorderConfig,
}

struct ActiveSession {
    candidate: CandidateProfile,
    source: FeedSource,
    session: SwipeSession,
}

/// Service composing the feed supplier, per-candidate sessions, recorder and refiner.
///
/// Session mutations happen under a short-lived lock and never await; persistence and
/// refinement run on spawned tasks so the deck keeps moving while they complete.
/// A candidate holds at most one session: opening a new one discards the previous.
pub struct SwipeService<J, A, C> {
    feeds: JobFeedSupplier<J, A>,
    recorder: ApplicationRecorder<A>,
    refiner: Option<Arc<MatchScoreRefiner<C>>>,
    review: ApplicationReview<A>,
    applications: Arc<A>,
    notifier: Arc<dyn Notifier>,
    interpreter: GestureInterpreter,
    observers: Vec<Arc<dyn SessionObserver>>,
    sessions: Mutex<HashMap<SessionId, ActiveSession>>,
    session_sequence: AtomicU64,
}

impl<J, A, C> SwipeService<J, A, C>
where
    J: JobRepository + 'static,
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    pub fn new(
        jobs: Arc<J>,
        applications: Arc<A>,
        scorer: Arc<dyn MatchScorer>,
        notifier: Arc<dyn Notifier>,
        settings: SwipeSettings,
    ) -> Self {
        let feeds = JobFeedSupplier::new(jobs, Arc::clone(&applications));
        Self::with_feed_supplier(feeds, applications, scorer, notifier, settings)
    }

    pub fn with_feed_supplier(
        feeds: JobFeedSupplier<J, A>,
        applications: Arc<A>,
        scorer: Arc<dyn MatchScorer>,
        notifier: Arc<dyn Notifier>,
        settings: SwipeSettings,
    ) -> Self {
        let recorder = ApplicationRecorder::new(
            Arc::clone(&applications),
            scorer,
            Arc::clone(&notifier),
            settings.recorder,
        );
        let review = ApplicationReview::new(Arc::clone(&applications), Arc::clone(&notifier));

        Self {
            feeds,
            recorder,
            refiner: None,
            review,
            applications,
            notifier,
            interpreter: GestureInterpreter::new(settings.thresholds),
            observers: Vec::new(),
            sessions: Mutex::new(HashMap::new()),
            session_sequence: AtomicU64::new(1),
        }
    }

    /// Enable asynchronous score refinement after each recorded application.
    pub fn with_refiner(mut self, refiner: MatchScoreRefiner<C>) -> Self {
        self.refiner = Some(Arc::new(refiner));
        self
    }

    /// Register an observer attached to every session opened afterwards.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn refinement_enabled(&self) -> bool {
        self.refiner.is_some()
    }

    pub fn feed(&self, candidate_id: &CandidateId) -> Result<Feed, SwipeServiceError> {
        Ok(self.feeds.feed(candidate_id)?)
    }

    /// Load a fresh feed for `candidate` and start a session over it.
    pub fn open_session(
        &self,
        candidate: CandidateProfile,
    ) -> Result<SessionSnapshot, SwipeServiceError> {
        let feed = self.feeds.feed(&candidate.candidate_id)?;

        let mut session = SwipeSession::new(self.interpreter);
        for observer in &self.observers {
            session.subscribe(Arc::clone(observer));
        }
        session.initialize(feed.jobs);

        let session_id = self.next_session_id();
        info!(
            %session_id,
            candidate_id = %candidate.candidate_id,
            source = ?feed.source,
            size = session.total(),
            "swipe session opened"
        );

        let active = ActiveSession {
            candidate,
            source: feed.source,
            session,
        };
        let snapshot = SessionSnapshot::capture(&session_id, &active);

        let mut sessions = self.lock_sessions();
        sessions.retain(|previous_id, previous| {
            let same_candidate =
                previous.candidate.candidate_id == active.candidate.candidate_id;
            if same_candidate {
                info!(
                    session_id = %previous_id,
                    candidate_id = %previous.candidate.candidate_id,
                    "swipe session replaced"
                );
            }
            !same_candidate
        });
        sessions.insert(session_id, active);
        Ok(snapshot)
    }

    /// Number of sessions currently held.
    pub fn open_sessions(&self) -> usize {
        self.lock_sessions().len()
    }

    pub fn snapshot(&self, session_id: &SessionId) -> Result<SessionSnapshot, SwipeServiceError> {
        self.with_session(session_id, |id, active| {
            Ok(SessionSnapshot::capture(id, active))
        })
    }

    pub fn close(&self, session_id: &SessionId) -> Result<(), SwipeServiceError> {
        if self.lock_sessions().remove(session_id).is_none() {
            return Err(SwipeServiceError::SessionNotFound(session_id.clone()));
        }
        info!(%session_id, "swipe session closed");
        Ok(())
    }

    pub fn drag(
        &self,
        session_id: &SessionId,
        offset_x: f32,
    ) -> Result<DragView, SwipeServiceError> {
        self.with_session(session_id, |_, active| {
            let feedback = active.session.drag(offset_x)?;
            let preview = active.session.interpreter().preview(feedback.offset_x);
            Ok(DragView { feedback, preview })
        })
    }

    /// Release the drag; `None` means the card snapped back.
    pub fn release(
        &self,
        session_id: &SessionId,
        velocity_x: f32,
    ) -> Result<Option<SwipeReceipt>, SwipeServiceError> {
        let committed = self.with_session(session_id, |_, active| {
            match active.session.release(velocity_x)? {
                ReleaseOutcome::Committed(outcome) => {
                    Ok(Some((outcome, active.source, active.candidate.clone())))
                }
                ReleaseOutcome::SnappedBack => Ok(None),
            }
        })?;

        Ok(committed.map(|(outcome, source, candidate)| {
            self.follow_up(session_id, outcome, source, candidate)
        }))
    }

    /// Commit the top card in `direction` without a gesture (button press).
    pub fn swipe(
        &self,
        session_id: &SessionId,
        direction: SwipeDirection,
    ) -> Result<SwipeReceipt, SwipeServiceError> {
        let (outcome, source, candidate) = self.with_session(session_id, |_, active| {
            let outcome = active.session.commit(direction)?;
            Ok((outcome, active.source, active.candidate.clone()))
        })?;

        Ok(self.follow_up(session_id, outcome, source, candidate))
    }

    /// Finish the exit animation of the last commit, unblocking the next card.
    pub fn settle(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<SwipeDirection>, SwipeServiceError> {
        self.with_session(session_id, |_, active| Ok(active.session.settle()))
    }

    pub fn undo(&self, session_id: &SessionId) -> Result<UndoOutcome, SwipeServiceError> {
        self.with_session(session_id, |_, active| {
            let mut outcome = active.session.undo()?;
            if active.source == FeedSource::Demo {
                outcome.application_retained = false;
            } else if outcome.application_retained {
                info!(
                    %session_id,
                    job_id = %outcome.job.id,
                    "undo restored a card whose application was already sent"
                );
            }
            Ok(outcome)
        })
    }

    pub fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, SwipeServiceError> {
        self.applications
            .fetch(application_id)?
            .ok_or_else(|| SwipeServiceError::ApplicationNotFound(application_id.clone()))
    }

    pub fn review(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, SwipeServiceError> {
        match self.review.set_status(application_id, status) {
            Err(ReviewError::Repository(RepositoryError::NotFound)) => Err(
                SwipeServiceError::ApplicationNotFound(application_id.clone()),
            ),
            other => Ok(other?),
        }
    }

    pub fn applicants(
        &self,
        recruiter_id: &RecruiterId,
        job_id: Option<&JobId>,
    ) -> Result<Vec<ApplicantView>, SwipeServiceError> {
        Ok(self.review.applicants(recruiter_id, job_id)?)
    }

    /// Run a one-off refinement; fails when no completion backend is configured.
    pub async fn refine(&self, request: &RefineRequest) -> Result<RefinedScore, SwipeServiceError> {
        let refiner = self
            .refiner
            .as_ref()
            .ok_or(SwipeServiceError::RefinementDisabled)?;
        Ok(refiner.refine(request).await?)
    }

    fn follow_up(
        &self,
        session_id: &SessionId,
        outcome: CommitOutcome,
        source: FeedSource,
        candidate: CandidateProfile,
    ) -> SwipeReceipt {
        let mut receipt = SwipeReceipt {
            job_id: outcome.job.id.clone(),
            direction: outcome.direction,
            remaining: outcome.remaining,
            source,
            pipeline: None,
        };

        if !outcome.applies() {
            return receipt;
        }

        match source {
            FeedSource::Demo => {
                info!(%session_id, job_id = %outcome.job.id, "demo job liked, nothing persisted");
                self.publish(Notification::new(
                    NotificationKind::DemoLike,
                    "Liked (demo)",
                    format!(
                        "You liked the {} position. This is a demo job.",
                        outcome.job.title
                    ),
                ));
            }
            FeedSource::Live => {
                receipt.pipeline = Some(self.spawn_pipeline(candidate, outcome.job));
            }
        }

        receipt
    }

    fn spawn_pipeline(&self, candidate: CandidateProfile, job: Job) -> PipelineHandle {
        let recorder = self.recorder.clone();
        let refiner = self.refiner.clone();
        let applications = Arc::clone(&self.applications);
        let notifier = Arc::clone(&self.notifier);
        let job_id = job.id.clone();

        let task = tokio::spawn(run_pipeline(
            recorder,
            refiner,
            applications,
            notifier,
            candidate,
            job,
        ));

        PipelineHandle { job_id, task }
    }

    fn publish(&self, notification: Notification) {
        if let Err(err) = self.notifier.notify(notification) {
            warn!(error = %err, "notification dropped");
        }
    }

    fn with_session<T>(
        &self,
        session_id: &SessionId,
        action: impl FnOnce(&SessionId, &mut ActiveSession) -> Result<T, SwipeServiceError>,
    ) -> Result<T, SwipeServiceError> {
        let mut sessions = self.lock_sessions();
        let active = sessions
            .get_mut(session_id)
            .ok_or_else(|| SwipeServiceError::SessionNotFound(session_id.clone()))?;
        action(session_id, active)
    }

    fn next_session_id(&self) -> SessionId {
        let id = self.session_sequence.fetch_add(1, Ordering::Relaxed);
        SessionId(format!("session-{id:06}"))
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionId, ActiveSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Record the application, then refine its score when a refiner is configured.
///
/// An application that already exists for the job is returned as stored, unrefined.
/// A refinement that fails, or whose update cannot be stored, leaves the initial score.
async fn run_pipeline<A, C>(
    recorder: ApplicationRecorder<A>,
    refiner: Option<Arc<MatchScoreRefiner<C>>>,
    applications: Arc<A>,
    notifier: Arc<dyn Notifier>,
    candidate: CandidateProfile,
    job: Job,
) -> Result<PipelineOutcome, RecorderError>
where
    A: ApplicationRepository + 'static,
    C: CompletionClient + 'static,
{
    let application = match recorder.record_now(&candidate, &job).await {
        Ok(application) => application,
        Err(RecorderError::Duplicate(existing)) => {
            return Ok(PipelineOutcome {
                application: *existing,
                refinement: None,
            });
        }
        Err(err) => return Err(err),
    };

    let Some(refiner) = refiner else {
        return Ok(PipelineOutcome {
            application,
            refinement: None,
        });
    };

    let refinement = refiner
        .refine_or_keep(
            application.match_score,
            &job_brief(&job),
            &candidate.summary(),
        )
        .await;

    let application = match &refinement {
        RefineOutcome::Refined(refined) => {
            let patch = ApplicationPatch::match_score(refined.refined_match_score);
            match applications.update(&application.id, patch) {
                Ok(updated) => {
                    let notification = Notification::new(
                        NotificationKind::ScoreRefined,
                        "Score refined",
                        format!("Your match for {} is {}.", job.title, updated.match_score),
                    );
                    if let Err(err) = notifier.notify(notification) {
                        warn!(error = %err, "notification dropped");
                    }
                    updated
                }
                Err(err) => {
                    warn!(
                        application_id = %application.id,
                        error = %err,
                        "refined score not saved, keeping initial score"
                    );
                    application
                }
            }
        }
        RefineOutcome::KeptInitial { .. } => application,
    };

    Ok(PipelineOutcome {
        application,
        refinement: Some(refinement),
    })
}

fn job_brief(job: &Job) -> String {
    let mut lines = vec![
        format!("Title: {}", job.title),
        format!("Company: {}", job.company_name),
        format!(
            "Role: {} ({} experience)",
            job.role_type.label(),
            job.experience_level.label()
        ),
    ];
    if !job.domain.is_empty() {
        lines.push(format!("Domain: {}", job.domain));
    }
    if !job.required_skills.is_empty() {
        lines.push(format!("Required skills: {}", job.required_skills.join(", ")));
    }
    lines.push(job.description.clone());
    lines.join("\n")
}

/// Serializable view of a session for API responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub candidate_id: CandidateId,
    pub state: SessionState,
    pub source: FeedSource,
    pub top: Option<Job>,
    pub remaining: usize,
    pub swiped: usize,
    pub commit_in_flight: bool,
    pub can_undo: bool,
}

impl SessionSnapshot {
    fn capture(session_id: &SessionId, active: &ActiveSession) -> Self {
        let session = &active.session;
        Self {
            session_id: session_id.clone(),
            candidate_id: active.candidate.candidate_id.clone(),
            state: session.state(),
            source: active.source,
            top: session.top().cloned(),
            remaining: session.remaining(),
            swiped: session.history().len(),
            commit_in_flight: session.is_commit_in_flight(),
            can_undo: session.can_undo(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DragView {
    pub feedback: CardFeedback,
    pub preview: Option<SwipeDirection>,
}

/// What a committed swipe set in motion.
#[derive(Debug)]
pub struct SwipeReceipt {
    pub job_id: JobId,
    pub direction: SwipeDirection,
    pub remaining: usize,
    pub source: FeedSource,
    /// Present for right swipes on live jobs.
    pub pipeline: Option<PipelineHandle>,
}

impl SwipeReceipt {
    pub fn application_queued(&self) -> bool {
        self.pipeline.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    pub application: Application,
    pub refinement: Option<RefineOutcome>,
}

/// Handle to the record-then-refine task spawned for a right swipe.
///
/// Dropping the handle detaches the task; it still runs to completion.
#[derive(Debug)]
pub struct PipelineHandle {
    job_id: JobId,
    task: JoinHandle<Result<PipelineOutcome, RecorderError>>,
}

impl PipelineHandle {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    pub async fn outcome(self) -> Result<PipelineOutcome, RecorderError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => {
                if err.is_panic() {
                    error!(job_id = %self.job_id, "application pipeline panicked");
                }
                Err(RecorderError::Cancelled)
            }
        }
    }
}

/// Error raised by the swipe service.
#[derive(Debug, thiserror::Error)]
pub enum SwipeServiceError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("swipe session {0} not found")]
    SessionNotFound(SessionId),
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Refine(#[from] RefineError),
    #[error("match score refinement is not configured")]
    RefinementDisabled,
}
