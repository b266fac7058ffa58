use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{
    CompanyId, ExperienceLevel, Job, JobId, JobLocation, JobValidationError, RecruiterId,
    RoleType, SalaryRange,
};

#[derive(Debug)]
pub enum JobImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Invalid { line: u64, reason: String },
}

impl std::fmt::Display for JobImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobImportError::Io(err) => write!(f, "failed to read job export: {}", err),
            JobImportError::Csv(err) => write!(f, "invalid job CSV data: {}", err),
            JobImportError::Invalid { line, reason } => {
                write!(f, "job on line {} rejected: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for JobImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobImportError::Io(err) => Some(err),
            JobImportError::Csv(err) => Some(err),
            JobImportError::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for JobImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for JobImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads job postings from a recruiter CSV export.
///
/// List columns (`required_skills`, `screening_questions`) separate entries with `;`.
pub struct JobCsvImporter;

impl JobCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Job>, JobImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Job>, JobImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut jobs = Vec::new();

        for (index, record) in csv_reader.deserialize::<JobRow>().enumerate() {
            let line = index as u64 + 2;
            let row = record?;
            let job = row
                .into_job()
                .map_err(|reason| JobImportError::Invalid { line, reason })?;
            jobs.push(job);
        }

        Ok(jobs)
    }
}

#[derive(Debug, Deserialize)]
struct JobRow {
    id: String,
    company_id: String,
    company_name: String,
    posted_by: String,
    title: String,
    role_type: String,
    experience_level: String,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    required_skills: String,
    #[serde(default)]
    city: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    remote_allowed: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    salary_min: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    salary_max: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    currency: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    openings: Option<String>,
    #[serde(default)]
    screening_questions: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    is_active: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    created_at: Option<String>,
}

impl JobRow {
    fn into_job(self) -> Result<Job, String> {
        let role_type = parse_role_type(&self.role_type)?;
        let experience_level = parse_experience_level(&self.experience_level)?;
        let remote_allowed = parse_flag(self.remote_allowed.as_deref(), false, "remote_allowed")?;
        let is_active = parse_flag(self.is_active.as_deref(), true, "is_active")?;
        let openings = match self.openings.as_deref() {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| format!("openings `{raw}` is not a whole number"))?,
            None => 1,
        };
        let salary_min = parse_amount(self.salary_min.as_deref(), "salary_min")?;
        let salary_max = parse_amount(self.salary_max.as_deref(), "salary_max")?;
        let salary_range = if salary_min.is_none() && salary_max.is_none() {
            None
        } else {
            Some(SalaryRange {
                min: salary_min,
                max: salary_max,
                currency: self.currency,
            })
        };
        let created_at = match self.created_at.as_deref() {
            Some(raw) => {
                parse_datetime(raw).ok_or_else(|| format!("created_at `{raw}` is not a date"))?
            }
            None => Utc::now(),
        };

        let job = Job {
            id: JobId(self.id),
            company_id: CompanyId(self.company_id),
            company_name: self.company_name,
            posted_by: RecruiterId(self.posted_by),
            title: self.title,
            role_type,
            experience_level,
            domain: self.domain,
            required_skills: split_list(&self.required_skills),
            location: JobLocation {
                city: self.city,
                remote_allowed,
            },
            salary_range,
            description: self.description,
            openings,
            screening_questions: split_list(&self.screening_questions),
            is_active,
            created_at,
            updated_at: created_at,
        };

        job.validate()
            .map_err(|err: JobValidationError| err.to_string())?;
        Ok(job)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_role_type(raw: &str) -> Result<RoleType, String> {
    match raw.to_ascii_lowercase().as_str() {
        "internship" => Ok(RoleType::Internship),
        "full-time" | "full time" | "fulltime" => Ok(RoleType::FullTime),
        "part-time" | "part time" | "parttime" => Ok(RoleType::PartTime),
        other => Err(format!("unknown role type `{other}`")),
    }
}

fn parse_experience_level(raw: &str) -> Result<ExperienceLevel, String> {
    match raw.to_ascii_lowercase().as_str() {
        "fresher" => Ok(ExperienceLevel::Fresher),
        "0-1" => Ok(ExperienceLevel::UpToOneYear),
        "1-3" => Ok(ExperienceLevel::OneToThreeYears),
        "3+" => Ok(ExperienceLevel::ThreePlusYears),
        other => Err(format!("unknown experience level `{other}`")),
    }
}

fn parse_flag(raw: Option<&str>, default: bool, column: &str) -> Result<bool, String> {
    match raw.map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("true" | "yes" | "1") => Ok(true),
        Some("false" | "no" | "0") => Ok(false),
        Some(other) => Err(format!("{column} `{other}` is not a boolean")),
    }
}

fn parse_amount(raw: Option<&str>, column: &str) -> Result<Option<u32>, String> {
    raw.map(|value| {
        value
            .replace(',', "")
            .parse::<u32>()
            .map_err(|_| format!("{column} `{value}` is not a whole number"))
    })
    .transpose()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
