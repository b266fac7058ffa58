use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::domain::{Application, CandidateId, Job, JobId};
use super::repository::{ApplicationRepository, JobRepository, RepositoryError};
use super::seed;

/// Where the jobs in a feed came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    Live,
    Demo,
}

/// Ordered pool of jobs a candidate may still swipe on.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub jobs: Vec<Job>,
    pub source: FeedSource,
}

impl Feed {
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.jobs.iter().any(|job| &job.id == job_id)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("unable to load applications for candidate {candidate_id}: {source}")]
    Applications {
        candidate_id: CandidateId,
        #[source]
        source: RepositoryError,
    },
}

/// Builds a feed from live postings, the candidate's applications and the demo set.
///
/// Live postings that are inactive or already applied to are dropped, keeping the
/// source order. When nothing live survives, the demo set is filtered by the same
/// applied-job rule and served instead.
pub fn assemble_feed(live: Vec<Job>, applied: &[Application], demo: &[Job]) -> Feed {
    let applied_ids: HashSet<&JobId> = applied.iter().map(|app| &app.job_id).collect();

    let available: Vec<Job> = live
        .into_iter()
        .filter(|job| job.is_active && !applied_ids.contains(&job.id))
        .collect();

    if !available.is_empty() {
        return Feed {
            jobs: available,
            source: FeedSource::Live,
        };
    }

    let jobs = demo
        .iter()
        .filter(|job| !applied_ids.contains(&job.id))
        .cloned()
        .collect();

    Feed {
        jobs,
        source: FeedSource::Demo,
    }
}

/// Supplies per-candidate feeds from the job and application stores.
pub struct JobFeedSupplier<J, A> {
    jobs: Arc<J>,
    applications: Arc<A>,
    demo_jobs: Vec<Job>,
}

impl<J, A> JobFeedSupplier<J, A>
where
    J: JobRepository,
    A: ApplicationRepository,
{
    pub fn new(jobs: Arc<J>, applications: Arc<A>) -> Self {
        Self::with_demo_jobs(jobs, applications, seed::demo_jobs())
    }

    pub fn with_demo_jobs(jobs: Arc<J>, applications: Arc<A>, demo_jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            applications,
            demo_jobs,
        }
    }

    pub fn demo_jobs(&self) -> &[Job] {
        &self.demo_jobs
    }

    /// Compute the feed for `candidate_id`. No side effects; safe to call repeatedly.
    ///
    /// An unreachable job store is treated like an empty one so the demo set still
    /// loads. An unreachable application store is an error: without it the
    /// already-applied exclusion cannot be honoured.
    pub fn feed(&self, candidate_id: &CandidateId) -> Result<Feed, FeedError> {
        let applied = self
            .applications
            .for_candidate(candidate_id)
            .map_err(|source| FeedError::Applications {
                candidate_id: candidate_id.clone(),
                source,
            })?;

        let live = match self.jobs.active() {
            Ok(jobs) => jobs,
            Err(err) => {
                warn!(%candidate_id, error = %err, "live job store unavailable, using demo feed");
                Vec::new()
            }
        };

        let feed = assemble_feed(live, &applied, &self.demo_jobs);
        debug!(
            %candidate_id,
            source = ?feed.source,
            size = feed.len(),
            applied = applied.len(),
            "feed assembled"
        );
        Ok(feed)
    }
}
