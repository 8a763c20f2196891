use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use bioproject_search::app::{App, ConsoleProgress, RunSummary};
use bioproject_search::config::{ConfigLoader, RunOverrides};
use bioproject_search::error::SearchError;
use bioproject_search::eutils::EutilsHttpClient;
use bioproject_search::output::{JsonOutput, OutputMode};

#[derive(Parser)]
#[command(name = "bioproject-search")]
#[command(about = "Search NCBI BioProject by keyword and registration date, export accessions as CSV")]
#[command(version, author)]
struct Cli {
    /// Contact email sent to NCBI with every request
    #[arg(short, long)]
    email: Option<String>,

    /// Registration date lower bound (YYYY/MM/DD)
    #[arg(short, long)]
    from_date: String,

    /// Registration date upper bound (YYYY/MM/DD)
    #[arg(short, long)]
    to_date: String,

    /// Keyword phrase to search; repeat to replace the built-in vocabulary
    #[arg(short = 'k', long = "keyword")]
    keywords: Vec<String>,

    #[arg(short, long)]
    max_results: Option<u64>,

    /// Results CSV [default: output-<from>-<to>.csv]
    #[arg(short, long)]
    output: Option<String>,

    /// Failed-ids CSV, written only when something failed [default: failed-<from>-<to>.csv]
    #[arg(long)]
    failed: Option<String>,

    /// JSON file with contact, keywords, max_results, timeout_secs, retry_delay_ms
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    timeout_secs: Option<u64>,

    #[arg(long)]
    retry_delay_ms: Option<u64>,

    #[arg(long)]
    non_interactive: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SearchError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SearchError) -> u8 {
    match error {
        SearchError::MissingContact
        | SearchError::EmptyVocabulary
        | SearchError::InvalidKeyword(_)
        | SearchError::ConfigRead(_)
        | SearchError::ConfigParse(_) => 2,
        other if other.is_remote() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let file_config = ConfigLoader::load(cli.config.as_deref())?;
    let overrides = RunOverrides {
        contact: cli.email,
        from_date: cli.from_date,
        to_date: cli.to_date,
        keywords: cli.keywords,
        max_results: cli.max_results,
        output: cli.output,
        failed: cli.failed,
        timeout_secs: cli.timeout_secs,
        retry_delay_ms: cli.retry_delay_ms,
    };
    let resolved = ConfigLoader::resolve(overrides, file_config)?;
    let client = EutilsHttpClient::new(resolved.eutils())?;
    let app = App::new(client);

    match output_mode {
        OutputMode::NonInteractive => {
            let summary = app.run(&resolved, &JsonOutput)?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let summary = app.run(&resolved, &ConsoleProgress)?;
            print_run_summary(&summary);
        }
    }
    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!(
        "{cyan}BioProject search {} .. {}{reset}",
        summary.from_date, summary.to_date
    );
    println!("{cyan}Unique BioProjects: {}{reset}", summary.unique_ids);
    println!("{green}Successfully converted {} studies{reset}", summary.resolved);
    println!("{yellow}Failed to convert {} IDs{reset}", summary.failed);
    for collision in &summary.collisions {
        println!(
            "{yellow}Duplicate accession {}: {} replaced by {}{reset}",
            collision.accession, collision.replaced, collision.kept
        );
    }
    println!("{green}Results: {}{reset}", summary.output_path);
    if let Some(path) = &summary.failed_path {
        println!("{yellow}Failures: {path}{reset}");
    }
}
