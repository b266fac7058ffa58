//! Asynchronous match score refinement through a text completion backend.
//!
//! The refiner never blocks the swipe flow: every failure mode is a recoverable
//! [`RefineError`], and [`MatchScoreRefiner::refine_or_keep`] collapses those into
//! keeping the initial score.

mod client;
mod prompt;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::domain::{MatchScore, MatchScoreError};

pub use client::{CompletionClient, CompletionError, HttpCompletionClient};

/// Inputs for one refinement call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineRequest {
    pub initial_match_score: f64,
    pub job_description: String,
    pub candidate_profile: String,
}

/// Validated refinement result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefinedScore {
    pub refined_match_score: MatchScore,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// The backend answered outside `[0, 100]` and the value was pulled into range.
    pub clamped: bool,
}

/// Outcome of [`MatchScoreRefiner::refine_or_keep`].
#[derive(Debug, Clone, PartialEq)]
pub enum RefineOutcome {
    Refined(RefinedScore),
    KeptInitial { score: MatchScore, reason: String },
}

impl RefineOutcome {
    pub fn score(&self) -> MatchScore {
        match self {
            RefineOutcome::Refined(refined) => refined.refined_match_score,
            RefineOutcome::KeptInitial { score, .. } => *score,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RefineError {
    #[error("invalid refinement input: {0}")]
    InvalidInput(#[from] MatchScoreError),
    #[error("completion backend timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Completion(#[from] CompletionError),
    #[error("completion output did not match the schema: {0}")]
    Malformed(String),
}

impl RefineError {
    fn is_retryable(&self) -> bool {
        !matches!(self, RefineError::InvalidInput(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefinerConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for RefinerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRefinement {
    refined_match_score: f64,
    #[serde(default)]
    reasoning: Option<String>,
}

/// Adjusts a heuristic match score using the job description and candidate profile.
#[derive(Debug)]
pub struct MatchScoreRefiner<C> {
    client: C,
    config: RefinerConfig,
}

impl<C> MatchScoreRefiner<C>
where
    C: CompletionClient,
{
    pub fn new(client: C, config: RefinerConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Ask the backend for a refined score, retrying transient failures.
    pub async fn refine(&self, request: &RefineRequest) -> Result<RefinedScore, RefineError> {
        MatchScore::new(request.initial_match_score)?;

        let prompt = prompt::render(request);
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(&prompt).await {
                Ok(refined) => return Ok(refined),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(attempt, error = %err, "match score refinement failed, retrying");
                    tokio::time::sleep(self.config.retry_backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Refine, falling back to `initial` on any failure.
    pub async fn refine_or_keep(
        &self,
        initial: MatchScore,
        job_description: &str,
        candidate_profile: &str,
    ) -> RefineOutcome {
        let request = RefineRequest {
            initial_match_score: initial.value(),
            job_description: job_description.to_string(),
            candidate_profile: candidate_profile.to_string(),
        };

        match self.refine(&request).await {
            Ok(refined) => {
                info!(
                    initial = initial.value(),
                    refined = refined.refined_match_score.value(),
                    clamped = refined.clamped,
                    "match score refined"
                );
                RefineOutcome::Refined(refined)
            }
            Err(err) => {
                warn!(initial = initial.value(), error = %err, "keeping initial match score");
                RefineOutcome::KeptInitial {
                    score: initial,
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<RefinedScore, RefineError> {
        let output = tokio::time::timeout(self.config.timeout, self.client.complete(prompt))
            .await
            .map_err(|_| RefineError::Timeout(self.config.timeout))??;

        validate_output(output)
    }
}

/// Check the backend output against the schema and pull the score into range.
fn validate_output(output: Value) -> Result<RefinedScore, RefineError> {
    let raw: RawRefinement =
        serde_json::from_value(output).map_err(|err| RefineError::Malformed(err.to_string()))?;

    let (score, clamped) = MatchScore::clamped(raw.refined_match_score)
        .ok_or_else(|| RefineError::Malformed("refinedMatchScore is not finite".to_string()))?;

    if clamped {
        warn!(
            returned = raw.refined_match_score,
            clamped_to = score.value(),
            "completion returned an out-of-range score"
        );
    }

    let reasoning = raw
        .reasoning
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(RefinedScore {
        refined_match_score: score,
        reasoning,
        clamped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validate_accepts_in_range_output() {
        let refined = validate_output(json!({
            "refinedMatchScore": 82.5,
            "reasoning": " Strong Rust background. "
        }))
        .expect("valid output");
        assert_eq!(refined.refined_match_score.value(), 82.5);
        assert_eq!(refined.reasoning.as_deref(), Some("Strong Rust background."));
        assert!(!refined.clamped);
    }

    #[test]
    fn validate_clamps_and_flags_out_of_range_output() {
        let refined = validate_output(json!({ "refinedMatchScore": 130 })).expect("clamped");
        assert_eq!(refined.refined_match_score.value(), 100.0);
        assert!(refined.clamped);

        let refined = validate_output(json!({ "refinedMatchScore": -4 })).expect("clamped");
        assert_eq!(refined.refined_match_score.value(), 0.0);
        assert!(refined.clamped);
    }

    #[test]
    fn validate_rejects_non_numeric_scores() {
        let result = validate_output(json!({ "refinedMatchScore": "ninety" }));
        assert!(matches!(result, Err(RefineError::Malformed(_))));

        let result = validate_output(json!({ "reasoning": "no score" }));
        assert!(matches!(result, Err(RefineError::Malformed(_))));
    }

    #[test]
    fn blank_reasoning_is_dropped() {
        let refined =
            validate_output(json!({ "refinedMatchScore": 60, "reasoning": "   " })).expect("ok");
        assert!(refined.reasoning.is_none());
    }
}
