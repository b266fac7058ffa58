use crate::demo::{run_demo, run_job_import, DemoArgs, JobImportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use jobswipe::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "JobSwipe",
    about = "Run the swipe-based job matching service or explore it from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with job posting exports
    Jobs {
        #[command(subcommand)]
        command: JobsCommand,
    },
    /// Run a scripted swipe session and print every transition
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum JobsCommand {
    /// Validate a job posting CSV export and print what would be loaded
    Import(JobImportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Job posting CSV export to preload into the in-memory store
    #[arg(long)]
    pub(crate) jobs_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Jobs {
            command: JobsCommand::Import(args),
        } => run_job_import(args),
        Command::Demo(args) => run_demo(args).await,
    }
}
