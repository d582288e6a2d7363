use std::fs;
use std::process::ExitCode;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use kira_evidence_rank::app::{App, FetchOptions, ProgressSink};
use kira_evidence_rank::config::{ConfigLoader, ConfigOverrides, ResolvedConfig};
use kira_evidence_rank::error::ScoreError;
use kira_evidence_rank::output::{JsonOutput, OutputMode, TracingSink, log_file_path};
use kira_evidence_rank::release::{ReleaseClient, ReleaseHttpClient, RemoteEntry};

#[derive(Parser)]
#[command(name = "kira-er")]
#[command(about = "Rank disease-target pairs by the median of their evidence scores")]
#[command(version, author)]
struct Cli {
    /// Print the run summary as JSON on stdout.
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    /// Root of the `in/` and `out/` data folders.
    #[arg(long, global = true)]
    data_root: Option<Utf8PathBuf>,

    /// Also write the log to `<DIR>/<timestamp>_score.log`.
    #[arg(long, global = true)]
    log_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Aggregate local shards into the ranked summary")]
    Score(ScoreArgs),
    #[command(about = "Download release shards into the data root")]
    Fetch(FetchArgs),
    #[command(about = "Fetch, then score")]
    Run(RunArgs),
}

#[derive(Args, Clone, Default)]
struct ScoreArgs {
    #[arg(long)]
    diseases: Option<Utf8PathBuf>,

    #[arg(long)]
    targets: Option<Utf8PathBuf>,

    #[arg(long)]
    evidence: Option<Utf8PathBuf>,

    #[arg(long)]
    output: Option<Utf8PathBuf>,
}

#[derive(Args, Clone, Default)]
struct FetchArgs {
    #[arg(long)]
    release: Option<String>,

    /// Evidence datasource, e.g. `eva`.
    #[arg(long)]
    source: Option<String>,

    /// Download every evidence datasource.
    #[arg(long)]
    all_sources: bool,
}

#[derive(Args, Clone)]
struct RunArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    #[command(flatten)]
    score: ScoreArgs,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<ScoreError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ScoreError) -> u8 {
    match error {
        ScoreError::DataSource { .. } | ScoreError::NoShards(_) => 2,
        ScoreError::ReleaseHttp(_) | ScoreError::ReleaseStatus { .. } => 3,
        ScoreError::Output { .. } => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref())?;

    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &TracingSink,
        OutputMode::NonInteractive => &JsonOutput,
    };

    match cli.command {
        Commands::Score(args) => {
            let resolved = resolve(&cli.config, &cli.data_root, &args, &FetchArgs::default())?;
            let app = App::new(resolved.layout.clone(), NopRelease);
            let result = app.score(&resolved.paths, sink)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_score(&result).into_diagnostic()?,
                OutputMode::Interactive => println!(
                    "{} pairs from {} evidence records written to {}",
                    result.rows_written, result.evidence_records, result.output
                ),
            }
        }
        Commands::Fetch(args) => {
            let resolved = resolve(&cli.config, &cli.data_root, &ScoreArgs::default(), &args)?;
            let client = ReleaseHttpClient::new(&resolved.fetch.base_url)?;
            let app = App::new(resolved.layout.clone(), client);
            let options = FetchOptions {
                all_sources: args.all_sources,
            };
            let result = app.fetch(&resolved.fetch, &options, sink)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_fetch(&result).into_diagnostic()?,
                OutputMode::Interactive => println!(
                    "release {}: {} files saved under {}",
                    result.release,
                    result.files.len(),
                    app.layout().input_root()
                ),
            }
        }
        Commands::Run(args) => {
            let resolved = resolve(&cli.config, &cli.data_root, &args.score, &args.fetch)?;
            let client = ReleaseHttpClient::new(&resolved.fetch.base_url)?;
            let app = App::new(resolved.layout.clone(), client);
            let options = FetchOptions {
                all_sources: args.fetch.all_sources,
            };
            let result = app.run(&resolved.fetch, &options, &resolved.paths, sink)?;
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_run(&result).into_diagnostic()?,
                OutputMode::Interactive => println!(
                    "release {}: {} pairs written to {}",
                    result.fetch.release, result.score.rows_written, result.score.output
                ),
            }
        }
    }
    Ok(())
}

fn resolve(
    config: &Option<String>,
    data_root: &Option<Utf8PathBuf>,
    score: &ScoreArgs,
    fetch: &FetchArgs,
) -> Result<ResolvedConfig, ScoreError> {
    ConfigLoader::resolve(
        config.as_deref(),
        ConfigOverrides {
            data_root: data_root.clone(),
            diseases: score.diseases.clone(),
            targets: score.targets.clone(),
            evidence: score.evidence.clone(),
            output: score.output.clone(),
            release: fetch.release.clone(),
            evidence_source: fetch.source.clone(),
        },
    )
}

fn init_logging(log_dir: Option<&Utf8Path>) -> miette::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let file = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir.as_std_path()).into_diagnostic()?;
            let path = log_file_path(dir, chrono::Local::now().naive_local());
            let file = fs::File::create(path.as_std_path()).into_diagnostic()?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .init();
    Ok(())
}

#[derive(Clone, Copy)]
struct NopRelease;

impl ReleaseClient for NopRelease {
    fn list(&self, _remote_dir: &str) -> Result<Vec<RemoteEntry>, ScoreError> {
        Err(ScoreError::ReleaseHttp("release access disabled".to_string()))
    }

    fn download(&self, _remote_path: &str, _destination: &Utf8Path) -> Result<u64, ScoreError> {
        Err(ScoreError::ReleaseHttp("release access disabled".to_string()))
    }
}
