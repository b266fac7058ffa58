use crate::infra::{
    build_service, seed_jobs, ApiService, InMemoryApplicationRepository, InMemoryJobRepository,
};
use clap::{Args, ValueEnum};
use jobswipe::config::AppConfig;
use jobswipe::error::AppError;
use jobswipe::workflows::swipe::{
    CandidateId, CandidateProfile, Job, JobCsvImporter, RecruiterId, SessionEvent,
    SessionObserver, SwipeDirection,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Job posting CSV export; without one the built-in demo postings are used.
    #[arg(long)]
    pub(crate) jobs_csv: Option<PathBuf>,
    /// Candidate identifier for the session.
    #[arg(long, default_value = "demo-candidate")]
    pub(crate) candidate_id: String,
    /// Skills listed on the candidate profile.
    #[arg(long, value_delimiter = ',', default_value = "Rust,SQL")]
    pub(crate) skills: Vec<String>,
    /// Gestures to replay, in order.
    #[arg(long, value_enum, value_delimiter = ',', default_value = "right,left,undo,right")]
    pub(crate) steps: Vec<DemoStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DemoStep {
    Right,
    Left,
    Undo,
}

#[derive(Args, Debug)]
pub(crate) struct JobImportArgs {
    /// Path to the CSV export
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Print the parsed postings as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct ImportSummary<'a> {
    total: usize,
    active: usize,
    jobs: &'a [Job],
}

/// Prints each session transition as it happens.
struct PrintingObserver;

impl SessionObserver for PrintingObserver {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Initialized { size } => println!("  session ready with {size} cards"),
            SessionEvent::Dragged { .. } => {}
            SessionEvent::SnappedBack { job_id } => println!("  {job_id} snapped back"),
            SessionEvent::Committed {
                job_id,
                direction,
                remaining,
            } => println!("  swiped {} on {job_id} ({remaining} left)", direction.label()),
            SessionEvent::Settled { direction } => {
                println!("  {} animation settled", direction.label())
            }
            SessionEvent::Undone {
                job_id,
                application_retained,
                ..
            } => {
                let note = if *application_retained {
                    "application kept"
                } else {
                    "nothing recorded"
                };
                println!("  undo restored {job_id} ({note})");
            }
        }
    }
}

pub(crate) fn run_job_import(args: JobImportArgs) -> Result<(), AppError> {
    let jobs = JobCsvImporter::from_path(&args.csv)?;
    let active = jobs.iter().filter(|job| job.is_active).count();

    if args.json {
        let summary = ImportSummary {
            total: jobs.len(),
            active,
            jobs: &jobs,
        };
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
        return Ok(());
    }

    println!(
        "Imported {} postings from {} ({active} active)",
        jobs.len(),
        args.csv.display()
    );
    for job in &jobs {
        println!(
            "- {:<12} {:<32} {:<10} {:<8} {}",
            job.id,
            job.title,
            job.role_type.label(),
            job.experience_level.label(),
            if job.is_active { "active" } else { "closed" }
        );
    }
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        jobs_csv,
        candidate_id,
        skills,
        steps,
    } = args;

    let config = AppConfig::load()?;
    let jobs = InMemoryJobRepository::default();
    if let Some(path) = jobs_csv {
        let loaded = seed_jobs(&jobs, JobCsvImporter::from_path(&path)?);
        println!("Loaded {loaded} postings from {}", path.display());
    }

    let service = build_service(&config, jobs, InMemoryApplicationRepository::default())
        .with_observer(Arc::new(PrintingObserver));

    let mut candidate = CandidateProfile::anonymous(CandidateId(candidate_id));
    candidate.skills = skills;

    println!("Job swipe demo for {}", candidate.candidate_id);
    let opened = service.open_session(candidate)?;
    let session_id = opened.session_id;
    println!("  feed source: {:?}", opened.source);

    let mut recruiters: Vec<RecruiterId> = Vec::new();
    for step in steps {
        let direction = match step {
            DemoStep::Undo => {
                if let Err(err) = service.undo(&session_id) {
                    println!("  undo skipped: {err}");
                }
                continue;
            }
            DemoStep::Right => SwipeDirection::Right,
            DemoStep::Left => SwipeDirection::Left,
        };

        if let Some(top) = service.snapshot(&session_id)?.top {
            if !recruiters.contains(&top.posted_by) {
                recruiters.push(top.posted_by.clone());
            }
            println!("  card: {} at {}", top.title, top.company_name);
        }

        let receipt = match service.swipe(&session_id, direction) {
            Ok(receipt) => receipt,
            Err(err) => {
                println!("  swipe skipped: {err}");
                continue;
            }
        };

        if let Some(pipeline) = receipt.pipeline {
            match pipeline.outcome().await {
                Ok(outcome) => println!(
                    "  application {} recorded with match score {}",
                    outcome.application.id, outcome.application.match_score
                ),
                Err(err) => println!("  application not recorded: {err}"),
            }
        }
        service.settle(&session_id)?;
    }

    let snapshot = service.snapshot(&session_id)?;
    println!(
        "Session {} finished: {} swiped, {} remaining",
        snapshot.session_id, snapshot.swiped, snapshot.remaining
    );

    print_applicants(&service, &recruiters)?;
    service.close(&session_id)?;
    Ok(())
}

fn print_applicants(
    service: &ApiService,
    recruiters: &[RecruiterId],
) -> Result<(), AppError> {
    for recruiter in recruiters {
        let applicants = service.applicants(recruiter, None)?;
        if applicants.is_empty() {
            continue;
        }
        println!("Applicants for recruiter {}", recruiter.0);
        for applicant in applicants {
            println!(
                "- {} on {} scored {:.0} ({:?}, {})",
                applicant.candidate_id,
                applicant.job_id,
                applicant.match_score,
                applicant.tier,
                applicant.status.label()
            );
        }
    }
    Ok(())
}
