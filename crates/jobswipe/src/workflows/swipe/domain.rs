use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for job seekers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for stored applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecruiterId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleType {
    #[serde(rename = "internship")]
    Internship,
    #[serde(rename = "full-time")]
    FullTime,
    #[serde(rename = "part-time")]
    PartTime,
}

impl RoleType {
    pub const fn label(self) -> &'static str {
        match self {
            RoleType::Internship => "internship",
            RoleType::FullTime => "full-time",
            RoleType::PartTime => "part-time",
        }
    }
}

/// Experience band requested by a posting, expressed in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[serde(rename = "fresher")]
    Fresher,
    #[serde(rename = "0-1")]
    UpToOneYear,
    #[serde(rename = "1-3")]
    OneToThreeYears,
    #[serde(rename = "3+")]
    ThreePlusYears,
}

impl ExperienceLevel {
    pub const fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Fresher => "fresher",
            ExperienceLevel::UpToOneYear => "0-1",
            ExperienceLevel::OneToThreeYears => "1-3",
            ExperienceLevel::ThreePlusYears => "3+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLocation {
    pub city: String,
    pub remote_allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SalaryRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A recruiter's job posting as stored in the `jobs` collection.
///
/// Swiping consumers treat postings as read-only snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub company_id: CompanyId,
    pub company_name: String,
    pub posted_by: RecruiterId,
    pub title: String,
    pub role_type: RoleType,
    pub experience_level: ExperienceLevel,
    pub domain: String,
    pub required_skills: Vec<String>,
    pub location: JobLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_range: Option<SalaryRange>,
    pub description: String,
    pub openings: u32,
    pub screening_questions: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Checks the fields every downstream consumer relies on.
    pub fn validate(&self) -> Result<(), JobValidationError> {
        if self.id.0.trim().is_empty() {
            return Err(JobValidationError::MissingId);
        }
        if self.title.trim().is_empty() {
            return Err(JobValidationError::MissingTitle);
        }
        if self.openings == 0 {
            return Err(JobValidationError::NoOpenings);
        }
        if let Some(SalaryRange {
            min: Some(min),
            max: Some(max),
            ..
        }) = &self.salary_range
        {
            if min > max {
                return Err(JobValidationError::InvertedSalaryRange {
                    min: *min,
                    max: *max,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobValidationError {
    #[error("job id is missing")]
    MissingId,
    #[error("job title is missing")]
    MissingTitle,
    #[error("job must advertise at least one opening")]
    NoOpenings,
    #[error("salary minimum {min} exceeds maximum {max}")]
    InvertedSalaryRange { min: u32, max: u32 },
}

/// Compatibility estimate between a candidate and a job, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MatchScore(f64);

impl MatchScore {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;
    pub const NEUTRAL: MatchScore = MatchScore(50.0);

    pub fn new(value: f64) -> Result<Self, MatchScoreError> {
        if !value.is_finite() {
            return Err(MatchScoreError::NotFinite);
        }
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(MatchScoreError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Forces `value` into range, reporting whether it had to be moved.
    ///
    /// Non-finite input yields `None`; there is no meaningful clamp target for it.
    pub fn clamped(value: f64) -> Option<(Self, bool)> {
        if !value.is_finite() {
            return None;
        }
        let bounded = value.clamp(Self::MIN, Self::MAX);
        Some((Self(bounded), bounded != value))
    }

    pub const fn value(self) -> f64 {
        self.0
    }

    pub fn tier(self) -> MatchTier {
        MatchTier::from_score(self)
    }
}

impl TryFrom<f64> for MatchScore {
    type Error = MatchScoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MatchScore> for f64 {
    fn from(value: MatchScore) -> Self {
        value.0
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MatchScoreError {
    #[error("match score must be a finite number")]
    NotFinite,
    #[error("match score {0} is outside 0..=100")]
    OutOfRange(f64),
}

/// Display band for a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Strong,
    Moderate,
}

impl MatchTier {
    pub const STRONG_ABOVE: f64 = 85.0;

    pub fn from_score(score: MatchScore) -> Self {
        if score.value() > Self::STRONG_ABOVE {
            MatchTier::Strong
        } else {
            MatchTier::Moderate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningAnswer {
    pub question: String,
    pub answer: String,
}

/// Application payload before the store has assigned an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub recruiter_id: RecruiterId,
    pub company_id: CompanyId,
    pub answers: Vec<ScreeningAnswer>,
    pub resume_url: String,
    pub match_score: MatchScore,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate's application to one job, as stored in the `applications` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: ApplicationId,
    pub candidate_id: CandidateId,
    pub job_id: JobId,
    pub recruiter_id: RecruiterId,
    pub company_id: CompanyId,
    pub answers: Vec<ScreeningAnswer>,
    pub resume_url: String,
    pub match_score: MatchScore,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn from_new(id: ApplicationId, draft: NewApplication) -> Self {
        let NewApplication {
            candidate_id,
            job_id,
            recruiter_id,
            company_id,
            answers,
            resume_url,
            match_score,
            status,
            created_at,
            updated_at,
        } = draft;

        Self {
            id,
            candidate_id,
            job_id,
            recruiter_id,
            company_id,
            answers,
            resume_url,
            match_score,
            status,
            created_at,
            updated_at,
        }
    }
}

/// Partial update accepted by the application store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationPatch {
    pub match_score: Option<MatchScore>,
    pub status: Option<ApplicationStatus>,
}

impl ApplicationPatch {
    pub fn match_score(score: MatchScore) -> Self {
        Self {
            match_score: Some(score),
            status: None,
        }
    }

    pub fn status(status: ApplicationStatus) -> Self {
        Self {
            match_score: None,
            status: Some(status),
        }
    }

    pub fn apply(&self, application: &mut Application, now: DateTime<Utc>) {
        if let Some(score) = self.match_score {
            application.match_score = score;
        }
        if let Some(status) = self.status {
            application.status = status;
        }
        application.updated_at = now;
    }
}

/// Job seeker context passed explicitly into the swipe pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub candidate_id: CandidateId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub preferred_roles: Vec<String>,
    #[serde(default)]
    pub experience_years: u8,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

impl CandidateProfile {
    /// Profile carrying only an identifier, for callers without profile data.
    pub fn anonymous(candidate_id: CandidateId) -> Self {
        Self {
            candidate_id,
            full_name: String::new(),
            headline: String::new(),
            skills: Vec::new(),
            domain: String::new(),
            preferred_roles: Vec::new(),
            experience_years: 0,
            preferred_locations: Vec::new(),
            resume_url: None,
        }
    }

    /// Free-text rendering used when asking the completion backend for a refined score.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        if !self.full_name.is_empty() {
            lines.push(format!("Name: {}", self.full_name));
        }
        if !self.headline.is_empty() {
            lines.push(format!("Headline: {}", self.headline));
        }
        if !self.domain.is_empty() {
            lines.push(format!("Domain: {}", self.domain));
        }
        lines.push(format!("Experience: {} years", self.experience_years));
        if !self.skills.is_empty() {
            lines.push(format!("Skills: {}", self.skills.join(", ")));
        }
        if !self.preferred_roles.is_empty() {
            lines.push(format!("Preferred roles: {}", self.preferred_roles.join(", ")));
        }
        if !self.preferred_locations.is_empty() {
            lines.push(format!(
                "Preferred locations: {}",
                self.preferred_locations.join(", ")
            ));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    pub const fn label(self) -> &'static str {
        match self {
            SwipeDirection::Left => "left",
            SwipeDirection::Right => "right",
        }
    }

    /// Direction implied by the sign of a horizontal quantity; zero has none.
    pub fn from_sign(value: f32) -> Option<Self> {
        if value > 0.0 {
            Some(SwipeDirection::Right)
        } else if value < 0.0 {
            Some(SwipeDirection::Left)
        } else {
            None
        }
    }
}
