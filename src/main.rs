use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use qc_insight::capability::local_store::LocalObjectStore;
use qc_insight::capability::openai::{CompletionConfig, DEFAULT_BASE_URL, OpenAiCompletion};
use qc_insight::capability::tfidf::TfIdfIndexer;
use qc_insight::config::SelectorMode;
use qc_insight::logging::init_tracing;
use qc_insight::report::OutputFormat;
use qc_insight::report::json::{render_json, render_sse_line};
use qc_insight::report::text::{render_answer_text, render_summary_text};
use qc_insight::{ChatRequest, EngineConfig, HistoryEntry, InsightEngine, StreamEvent};

#[derive(Debug, Parser)]
#[command(name = "qc-insight", version, about = "Ask questions about a MultiQC run report")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration file (JSON).
    #[arg(long, global = true, env = "QC_INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Answer one question about a run.
    Ask(AskArgs),
    /// Parse a run's report and print what was found.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct StoreArgs {
    /// Root directory of the local object store (one sub-directory per bucket).
    #[arg(long, env = "QC_INSIGHT_STORE")]
    store: PathBuf,

    /// Run identifier.
    #[arg(long)]
    run: String,
}

#[derive(Debug, Args)]
struct AskArgs {
    #[command(flatten)]
    target: StoreArgs,

    #[arg(long, short)]
    question: String,

    /// Prior conversation as a JSON array of {"role", "content"} objects.
    #[arg(long)]
    history: Option<String>,

    /// Metric key to analyse instead of inferring one from the question.
    #[arg(long)]
    metric: Option<String>,

    /// Print progress events as they happen.
    #[arg(long)]
    stream: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[arg(long, value_enum)]
    selector: Option<SelectorMode>,

    #[arg(long, env = "QC_INSIGHT_ENDPOINT", default_value = DEFAULT_BASE_URL)]
    endpoint: String,

    #[arg(long, env = "QC_INSIGHT_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    #[arg(long, env = "QC_INSIGHT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, default_value_t = 2)]
    max_retries: u32,
}

#[derive(Debug, Args)]
struct InspectArgs {
    #[command(flatten)]
    target: StoreArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Command::Ask(args) => {
            if let Some(selector) = args.selector {
                config.artifact_selection = selector;
            }
            let engine = build_engine(config, &args)?;
            let request = build_request(&args)?;
            if args.stream {
                stream_answer(&engine, request).await
            } else {
                let result = engine.run(request).await.map_err(|e| e.to_string())?;
                match args.format {
                    OutputFormat::Text => print!("{}", render_answer_text(&result)),
                    OutputFormat::Json => {
                        println!("{}", render_json(&result).map_err(|e| e.to_string())?)
                    }
                }
                Ok(())
            }
        }
        Command::Inspect(args) => {
            let store = Arc::new(LocalObjectStore::new(&args.target.store));
            let completion = OpenAiCompletion::new(CompletionConfig::default())
                .map_err(|e| e.to_string())?;
            let engine =
                InsightEngine::new(config, store, Arc::new(TfIdfIndexer), Arc::new(completion));
            let summary = engine
                .inspect(&args.target.run)
                .await
                .map_err(|e| e.to_string())?;
            match args.format {
                OutputFormat::Text => print!("{}", render_summary_text(&summary)),
                OutputFormat::Json => {
                    println!("{}", render_json(&summary).map_err(|e| e.to_string())?)
                }
            }
            Ok(())
        }
    }
}

fn build_engine(config: EngineConfig, args: &AskArgs) -> Result<InsightEngine, String> {
    let completion = OpenAiCompletion::new(CompletionConfig {
        base_url: args.endpoint.clone(),
        model: args.model.clone(),
        api_key: args.api_key.clone(),
        timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        max_retries: args.max_retries,
        ..CompletionConfig::default()
    })
    .map_err(|e| e.to_string())?;
    let store = LocalObjectStore::new(&args.target.store);
    Ok(InsightEngine::new(
        config,
        Arc::new(store),
        Arc::new(TfIdfIndexer),
        Arc::new(completion),
    ))
}

fn build_request(args: &AskArgs) -> Result<ChatRequest, String> {
    let mut request = ChatRequest::new(&args.target.run, &args.question);
    if let Some(raw) = &args.history {
        let history: Vec<HistoryEntry> =
            serde_json::from_str(raw).map_err(|e| format!("invalid --history: {e}"))?;
        request.history = history;
    }
    request.metric_key = args.metric.clone();
    Ok(request)
}

async fn stream_answer(engine: &InsightEngine, request: ChatRequest) -> Result<(), String> {
    let mut events = engine.stream(request);
    let mut failure = None;
    while let Some(event) = events.recv().await {
        if let StreamEvent::Error { message, .. } = &event {
            failure = Some(message.clone());
        }
        println!("{}", render_sse_line(&event).map_err(|e| e.to_string())?);
        if matches!(event, StreamEvent::Done) {
            break;
        }
    }
    match failure {
        Some(message) => Err(message),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
