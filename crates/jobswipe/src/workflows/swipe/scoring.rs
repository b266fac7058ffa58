use std::collections::HashSet;

use rand::Rng;

use super::domain::{CandidateProfile, Job, MatchScore};

/// Strategy producing the initial match score stored with a new application.
pub trait MatchScorer: Send + Sync {
    fn score(&self, candidate: &CandidateProfile, job: &Job) -> MatchScore;
}

/// Placeholder heuristic: a uniformly drawn whole number in `[70, 100)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomBandScorer;

impl RandomBandScorer {
    pub const LOW: u8 = 70;
    pub const HIGH: u8 = 100;
}

impl MatchScorer for RandomBandScorer {
    fn score(&self, _candidate: &CandidateProfile, _job: &Job) -> MatchScore {
        let value = rand::thread_rng().gen_range(Self::LOW..Self::HIGH);
        MatchScore::clamped(f64::from(value))
            .map(|(score, _)| score)
            .unwrap_or(MatchScore::NEUTRAL)
    }
}

/// Deterministic scorer based on how many required skills the candidate lists.
///
/// Skill coverage contributes up to 90 points and a matching domain the last 10.
/// Postings without required skills count as half covered.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkillOverlapScorer;

impl SkillOverlapScorer {
    const SKILL_WEIGHT: f64 = 90.0;
    const DOMAIN_BONUS: f64 = 10.0;
}

impl MatchScorer for SkillOverlapScorer {
    fn score(&self, candidate: &CandidateProfile, job: &Job) -> MatchScore {
        let known: HashSet<String> = candidate
            .skills
            .iter()
            .map(|skill| normalize_skill(skill))
            .filter(|skill| !skill.is_empty())
            .collect();

        let required: Vec<String> = job
            .required_skills
            .iter()
            .map(|skill| normalize_skill(skill))
            .filter(|skill| !skill.is_empty())
            .collect();

        let coverage = if required.is_empty() {
            0.5
        } else {
            let matched = required.iter().filter(|skill| known.contains(*skill)).count();
            matched as f64 / required.len() as f64
        };

        let domain_bonus = if !candidate.domain.trim().is_empty()
            && candidate.domain.trim().eq_ignore_ascii_case(job.domain.trim())
        {
            Self::DOMAIN_BONUS
        } else {
            0.0
        };

        MatchScore::clamped(coverage * Self::SKILL_WEIGHT + domain_bonus)
            .map(|(score, _)| score)
            .unwrap_or(MatchScore::NEUTRAL)
    }
}

fn normalize_skill(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
