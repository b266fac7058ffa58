use serde::{Deserialize, Serialize};

use super::domain::{
    Application, ApplicationId, ApplicationPatch, CandidateId, Job, JobId, NewApplication,
    RecruiterId,
};

/// Read/write access to the `jobs` collection.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    /// Postings with `isActive == true`, newest first.
    fn active(&self) -> Result<Vec<Job>, RepositoryError>;
}

/// Read/write access to the `applications` collection.
pub trait ApplicationRepository: Send + Sync {
    /// Persist a new application; the store assigns the identifier.
    fn create(&self, draft: NewApplication) -> Result<Application, RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn for_candidate(&self, candidate_id: &CandidateId)
        -> Result<Vec<Application>, RepositoryError>;
    fn for_recruiter(&self, recruiter_id: &RecruiterId)
        -> Result<Vec<Application>, RepositoryError>;
    fn update(
        &self,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<Application, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Whether a later attempt of the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}

/// Outbound hook for non-blocking user-facing notices (toasts, push, e-mail adapters).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ApplicationSent,
    DemoLike,
    ApplicationFailed,
    ScoreRefined,
    StatusChanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Notifier that discards everything, for callers without a notification channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}
