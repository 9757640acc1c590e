use std::{path::PathBuf, str::FromStr, time::Duration};

use apalis::{
    layers::{retry::RetryPolicy, sentry::SentryLayer},
    prelude::*,
};
use apalis_cron::{CronStream, Tick};
use clap::{Args, Parser, Subcommand};
use cron::Schedule;
use digest_pulse::{
    openai::OpenAIClient,
    tracing::init_tracing_subscriber,
    yt::{search::YouTubeDataApi, transcript::YtTranscriptClient},
    BatchProcessorBuilder, Consolidator, JobState, RecencyWindow,
};
use digest_store::{BatchStore, FsBatchStore};

#[derive(Parser)]
#[command(name = "tube-digest", about = "Batch summaries of recent YouTube videos")]
struct Cli {
    /// Directory holding one sub-directory per batch
    #[arg(long, env = "SUMMARIES_DIR", default_value = "./resumos")]
    summaries_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct ServiceArgs {
    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY")]
    youtube_key: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_key: String,

    /// Alternative OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL")]
    openai_base_url: Option<String>,

    /// Page size of each per-token search
    #[arg(long, env = "SEARCH_MAX_RESULTS", default_value = "10")]
    max_results: u32,

    /// Transcript languages, most preferred first
    #[arg(
        long,
        env = "TRANSCRIPT_LANGUAGES",
        value_delimiter = ',',
        default_value = "pt,en"
    )]
    languages: Vec<String>,
}

#[derive(Args, Clone)]
struct SearchArgs {
    /// Comma-separated channel URLs and keywords; empty searches everything
    #[arg(long, default_value = "")]
    query: String,

    /// `hours` or `weeks`
    #[arg(long, default_value = "weeks")]
    unit: String,

    #[arg(long, default_value = "1")]
    amount: String,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize one batch of videos and exit
    Run {
        #[command(flatten)]
        services: ServiceArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 6 * * *")]
        schedule: String,
        #[command(flatten)]
        services: ServiceArgs,
        #[command(flatten)]
        search: SearchArgs,
    },
    /// List stored batches, newest first
    List,
    /// Print a batch's index, or one of its summaries
    Show {
        batch_id: String,
        filename: Option<String>,
    },
    /// Meta-analysis across all summaries of a batch
    Consolidate {
        batch_id: String,
        #[command(flatten)]
        services: ServiceArgs,
        /// Also write the analysis into the batch directory
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone)]
struct Config {
    summaries_dir: PathBuf,
    services: ServiceArgs,
    query: String,
    window: RecencyWindow,
}

fn openai_client(services: &ServiceArgs) -> anyhow::Result<OpenAIClient> {
    let client = OpenAIClient::new(&services.openai_key)?;
    Ok(match &services.openai_base_url {
        Some(url) => client.with_base_url(url),
        None => client,
    })
}

/// Keeps a missing batch apart from internal faults in the exit message
fn not_found_or<E>(not_found: bool, e: E, batch_id: &str) -> anyhow::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    if not_found {
        anyhow::anyhow!("Not found in batch {batch_id}: {e}")
    } else {
        anyhow::Error::new(e).context(format!("Batch {batch_id}"))
    }
}

async fn run_pipeline(config: &Config) -> anyhow::Result<JobState> {
    let processor = BatchProcessorBuilder::new()
        .store(FsBatchStore::new(&config.summaries_dir))
        .search_service(YouTubeDataApi::new(&config.services.youtube_key)?)
        .transcripts(YtTranscriptClient::new()?)
        .summarizer(openai_client(&config.services)?)
        .max_results(config.services.max_results)
        .languages(config.services.languages.clone())
        .build();

    let handle = processor.start(config.query.clone(), config.window);

    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut last = JobState::Pending;
    loop {
        ticker.tick().await;
        let state = handle.state();
        if state != last {
            if let JobState::Running(progress) = &state {
                eprintln!("{}", progress.status);
            }
            last = state;
        }
        if last.is_terminal() {
            return Ok(last);
        }
    }
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(query = %config.query, window = %config.window, "Running scheduled batch...");
    match run_pipeline(&config).await? {
        JobState::Failed(failure) => anyhow::bail!("Scheduled batch failed: {failure}"),
        _ => Ok(()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let store = FsBatchStore::new(&cli.summaries_dir);

    match cli.command {
        Command::Run { services, search } => {
            let config = Config {
                window: RecencyWindow::parse(&search.unit, &search.amount)?,
                summaries_dir: cli.summaries_dir,
                services,
                query: search.query,
            };

            match run_pipeline(&config).await? {
                JobState::Succeeded(outcome) => {
                    println!("{}", serde_json::to_string_pretty(&outcome)?)
                }
                JobState::Failed(failure) => anyhow::bail!("Batch failed: {failure}"),
                state => anyhow::bail!("Batch ended in unexpected state {state:?}"),
            }
        }
        Command::Cron {
            schedule,
            services,
            search,
        } => {
            let config = Config {
                window: RecencyWindow::parse(&search.unit, &search.amount)?,
                summaries_dir: cli.summaries_dir,
                services,
                query: search.query,
            };

            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("tube-digest-cron")
                .backend(CronStream::new(schedule))
                .retry(RetryPolicy::retries(3))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
        Command::List => {
            for batch in store.list_batches().await? {
                let created_at = batch
                    .created_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".into());
                let marker = if batch.complete { "" } else { " (incomplete)" };
                println!(
                    "{}\t{}\t{} summaries{marker}",
                    batch.batch_id, created_at, batch.summary_count
                );
            }
        }
        Command::Show { batch_id, filename } => match filename {
            Some(filename) => {
                let text = store
                    .read_summary_text(&batch_id, &filename)
                    .await
                    .map_err(|e| not_found_or(e.is_not_found(), e, &batch_id))?;
                println!("{text}");
            }
            None => {
                let index = store
                    .read_metadata(&batch_id)
                    .await
                    .map_err(|e| not_found_or(e.is_not_found(), e, &batch_id))?;
                println!("{}", serde_json::to_string_pretty(&index)?);
            }
        },
        Command::Consolidate {
            batch_id,
            services,
            save,
        } => {
            let consolidator = Consolidator::new(&store, openai_client(&services)?);
            let analysis = if save {
                consolidator.consolidate_and_save(&batch_id).await
            } else {
                consolidator.consolidate(&batch_id).await
            }
            .map_err(|e| not_found_or(e.is_not_found(), e, &batch_id))?;
            println!("{analysis}");
        }
    }

    Ok(())
}
