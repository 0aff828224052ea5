//! # Command line interface
//!
//! ```sh
//! neont evaluate --ontology orgont --individual Pump1 pump1.json
//! neont submit --config config/development.yaml --ontology orgont --individual Pump1 pump1.json
//! ```
//!
//! Both commands print their JSON response on stdout.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::{
    config::Config,
    logger,
    ontology::{CandidateIndividual, EvaluationReport, OntologyService, SubmissionContext},
    Result,
};

#[derive(Parser)]
#[command(name = "neont")]
#[command(version, about = "Validate and instantiate ontology individuals", long_about = None)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a candidate individual without writing it
    Evaluate(SubmissionArgs),
    /// Evaluate a candidate individual and commit it when it has no errors
    Submit(SubmissionArgs),
}

#[derive(Args)]
struct SubmissionArgs {
    /// Ontology prefix the individual is submitted to, e.g. `orgont`
    #[arg(long)]
    ontology: String,

    /// Local name of the individual, e.g. `Pump1`
    #[arg(long)]
    individual: String,

    /// Candidate individual document (JSON)
    candidate: PathBuf,
}

impl SubmissionArgs {
    fn context(&self) -> SubmissionContext {
        SubmissionContext::new(&self.ontology, &self.individual)
    }

    fn candidate(&self) -> Result<CandidateIndividual> {
        let content = fs::read_to_string(&self.candidate)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Evaluation results as shown by `neont evaluate`.
#[derive(Serialize)]
struct EvaluationView<'a> {
    clean: bool,
    #[serde(flatten)]
    report: &'a EvaluationReport,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parses the command line and runs the selected command.
///
/// # Errors
///
/// Fails when the configuration, the seeds or the candidate cannot be
/// loaded, or when a commit write fails.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    logger::init(&config.logger)?;

    let service = OntologyService::from_config(&config)?;
    match cli.command {
        Commands::Evaluate(args) => {
            let report = service.evaluate(&args.candidate()?, &args.context()).await;
            print_json(&EvaluationView {
                clean: report.is_clean(),
                report: &report,
            })
        }
        Commands::Submit(args) => {
            let submission = service
                .validate_and_commit(&args.candidate()?, &args.context())
                .await?;
            print_json(&submission)
        }
    }
}
