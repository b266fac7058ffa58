use chrono::{DateTime, TimeZone, Utc};

use super::domain::{
    CompanyId, ExperienceLevel, Job, JobId, JobLocation, RecruiterId, RoleType, SalaryRange,
};

struct SeedPosting {
    id: &'static str,
    company: &'static str,
    title: &'static str,
    role_type: RoleType,
    experience_level: ExperienceLevel,
    domain: &'static str,
    skills: &'static [&'static str],
    city: &'static str,
    remote_allowed: bool,
    salary: Option<(u32, u32)>,
    description: &'static str,
    openings: u32,
    questions: &'static [&'static str],
}

const SEED_POSTINGS: &[SeedPosting] = &[
    SeedPosting {
        id: "demo-frontend-dev",
        company: "Innovate Inc.",
        title: "Frontend Developer",
        role_type: RoleType::FullTime,
        experience_level: ExperienceLevel::OneToThreeYears,
        domain: "Web Development",
        skills: &["React", "TypeScript", "CSS", "Accessibility"],
        city: "Bengaluru",
        remote_allowed: true,
        salary: Some((900_000, 1_400_000)),
        description: "Build and polish customer-facing dashboards with a small product team. \
                      You will own components end to end, from design review to release.",
        openings: 2,
        questions: &["Share a UI you are proud of."],
    },
    SeedPosting {
        id: "demo-ux-intern",
        company: "Creative Solutions",
        title: "UX/UI Designer Intern",
        role_type: RoleType::Internship,
        experience_level: ExperienceLevel::Fresher,
        domain: "Design",
        skills: &["Figma", "User Research", "Prototyping"],
        city: "Pune",
        remote_allowed: false,
        salary: Some((20_000, 30_000)),
        description: "Six-month internship pairing with senior designers on mobile onboarding \
                      flows, usability studies and design system upkeep.",
        openings: 3,
        questions: &["Link your portfolio.", "Which research method do you prefer and why?"],
    },
    SeedPosting {
        id: "demo-data-scientist",
        company: "DataDriven Co.",
        title: "Data Scientist",
        role_type: RoleType::FullTime,
        experience_level: ExperienceLevel::ThreePlusYears,
        domain: "Data Science",
        skills: &["Python", "SQL", "Statistics", "Machine Learning"],
        city: "Hyderabad",
        remote_allowed: true,
        salary: Some((1_800_000, 2_600_000)),
        description: "Own experimentation and forecasting for the pricing team. Ship models \
                      to production together with the platform engineers.",
        openings: 1,
        questions: &[],
    },
    SeedPosting {
        id: "demo-backend-engineer",
        company: "Stackline Labs",
        title: "Backend Engineer",
        role_type: RoleType::FullTime,
        experience_level: ExperienceLevel::UpToOneYear,
        domain: "Software Engineering",
        skills: &["Rust", "PostgreSQL", "REST APIs", "Docker"],
        city: "Chennai",
        remote_allowed: true,
        salary: None,
        description: "Join the payments platform team building reliable HTTP services and \
                      background workers. Mentorship provided for early-career engineers.",
        openings: 2,
        questions: &["Describe a production incident you helped resolve."],
    },
    SeedPosting {
        id: "demo-content-writer",
        company: "Brightword Media",
        title: "Content Writer",
        role_type: RoleType::PartTime,
        experience_level: ExperienceLevel::Fresher,
        domain: "Marketing",
        skills: &["Copywriting", "SEO", "Editing"],
        city: "Mumbai",
        remote_allowed: true,
        salary: Some((15_000, 25_000)),
        description: "Write long-form explainers and product pages for technology clients, \
                      around twenty hours per week.",
        openings: 4,
        questions: &[],
    },
];

fn seed_timestamp(offset_days: i64) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2025, 1, 6, 9, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    base - chrono::Duration::days(offset_days)
}

/// Fixed demo postings served when no live postings are available.
///
/// Order is stable across calls so a fallback feed is reproducible.
pub fn demo_jobs() -> Vec<Job> {
    SEED_POSTINGS
        .iter()
        .enumerate()
        .map(|(index, posting)| {
            let stamp = seed_timestamp(index as i64);
            Job {
                id: JobId(posting.id.to_string()),
                company_id: CompanyId(format!("demo-company-{}", index + 1)),
                company_name: posting.company.to_string(),
                posted_by: RecruiterId("demo-recruiter".to_string()),
                title: posting.title.to_string(),
                role_type: posting.role_type,
                experience_level: posting.experience_level,
                domain: posting.domain.to_string(),
                required_skills: posting.skills.iter().map(|s| s.to_string()).collect(),
                location: JobLocation {
                    city: posting.city.to_string(),
                    remote_allowed: posting.remote_allowed,
                },
                salary_range: posting.salary.map(|(min, max)| SalaryRange {
                    min: Some(min),
                    max: Some(max),
                    currency: Some("INR".to_string()),
                }),
                description: posting.description.to_string(),
                openings: posting.openings,
                screening_questions: posting.questions.iter().map(|q| q.to_string()).collect(),
                is_active: true,
                created_at: stamp,
                updated_at: stamp,
            }
        })
        .collect()
}
