use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Application, ApplicationId, ApplicationPatch, ApplicationStatus, JobId, MatchTier,
    RecruiterId,
};
use super::repository::{
    ApplicationRepository, Notification, NotificationKind, Notifier, RepositoryError,
};

/// Recruiter-side access to the applications attached to their postings.
pub struct ApplicationReview<A> {
    applications: Arc<A>,
    notifier: Arc<dyn Notifier>,
}

impl<A> ApplicationReview<A>
where
    A: ApplicationRepository,
{
    pub fn new(applications: Arc<A>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            applications,
            notifier,
        }
    }

    /// Applicants for `recruiter_id`, optionally narrowed to one job, best match first.
    pub fn applicants(
        &self,
        recruiter_id: &RecruiterId,
        job_id: Option<&JobId>,
    ) -> Result<Vec<ApplicantView>, ReviewError> {
        let mut applications = self.applications.for_recruiter(recruiter_id)?;
        if let Some(job_id) = job_id {
            applications.retain(|application| &application.job_id == job_id);
        }

        applications.sort_by(|a, b| {
            b.match_score
                .value()
                .total_cmp(&a.match_score.value())
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        Ok(applications.iter().map(ApplicantView::from).collect())
    }

    /// Move an application to `Accepted` or `Rejected`.
    ///
    /// Re-applying the current status returns the record unchanged without notifying.
    pub fn set_status(
        &self,
        application_id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Application, ReviewError> {
        if status == ApplicationStatus::Pending {
            return Err(ReviewError::InvalidTransition {
                to: status.label(),
            });
        }

        let current = self
            .applications
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;

        if current.status == status {
            return Ok(current);
        }

        let updated = self
            .applications
            .update(application_id, ApplicationPatch::status(status))?;

        info!(
            application_id = %updated.id,
            from = current.status.label(),
            to = status.label(),
            "application status changed"
        );

        let notification = Notification::new(
            NotificationKind::StatusChanged,
            "Application updated",
            format!("Application {} is now {}.", updated.id, status.label()),
        );
        if let Err(err) = self.notifier.notify(notification) {
            warn!(error = %err, "notification dropped");
        }

        Ok(updated)
    }
}

/// Row rendered in a recruiter's applicant list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    pub application_id: ApplicationId,
    pub candidate_id: String,
    pub job_id: JobId,
    pub match_score: f64,
    pub tier: MatchTier,
    pub status: ApplicationStatus,
    pub resume_url: String,
    pub applied_at: DateTime<Utc>,
}

impl From<&Application> for ApplicantView {
    fn from(application: &Application) -> Self {
        Self {
            application_id: application.id.clone(),
            candidate_id: application.candidate_id.0.clone(),
            job_id: application.job_id.clone(),
            match_score: application.match_score.value(),
            tier: application.match_score.tier(),
            status: application.status,
            resume_url: application.resume_url.clone(),
            applied_at: application.created_at,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("applications cannot be moved back to {to}")]
    InvalidTransition { to: &'static str },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
