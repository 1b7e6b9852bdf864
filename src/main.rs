//! `bloodsmear-server`: HTTP service and one-shot classifier.
//!
//! # Usage
//!
//! ```bash
//! bloodsmear-server serve --model-dir backend/models --port 5000
//! bloodsmear-server classify smear1.jpg smear2.png
//! ```
//!
//! Every option falls back to its environment variable (`HOST`, `PORT`,
//! `MODEL_PATH`, `MODEL_URL`, `DATABASE_PATH`), and a `.env` file in the
//! working directory is read first.

use bloodsmear::core::{ServiceConfig, init_tracing};
use bloodsmear::models::ClassifierEngine;
use bloodsmear::pipeline::{AppContext, DiagnosticPipeline};
use bloodsmear::server;
use bloodsmear::store::{AnalysisStore, MemoryStore, SqliteStore};
use bloodsmear::utils::{ensure_bundle, load_image};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "bloodsmear-server")]
#[command(about = "Blood smear classification service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve(ServeArgs),
    /// Classify image files and print the ranked predictions
    Classify(ClassifyArgs),
}

#[derive(Args, Clone, Default)]
struct ModelArgs {
    /// Directory holding model.onnx and bundle.json
    #[arg(long, global = true, env = "MODEL_PATH")]
    model_dir: Option<PathBuf>,

    /// Base URL to fetch the bundle from when it is missing locally
    #[arg(long, global = true, env = "MODEL_URL")]
    model_url: Option<String>,
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Interface to listen on
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file for analysis records
    #[arg(long, env = "DATABASE_PATH")]
    database: Option<PathBuf>,

    /// Keep analysis records in memory only
    #[arg(long, conflicts_with = "database")]
    memory_store: bool,
}

#[derive(Args)]
struct ClassifyArgs {
    /// Images to classify
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Print results as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e.report(), "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.model.model_dir {
        config.model_dir = dir;
    }
    if let Some(url) = cli.model.model_url {
        config.model_url = Some(url);
    }

    let outcome = match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(config, args),
        Command::Classify(args) => classify(config, args),
    };
    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!(kind = e.kind(), error = %e.report(), "exiting");
            ExitCode::FAILURE
        }
    }
}

type CliResult = bloodsmear::core::AnalysisResult<ExitCode>;

fn runtime() -> bloodsmear::core::AnalysisResult<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn load_pipeline(runtime: &tokio::runtime::Runtime, config: &ServiceConfig) -> bloodsmear::core::AnalysisResult<DiagnosticPipeline> {
    runtime.block_on(ensure_bundle(&config.model_dir, config.model_url.as_deref()))?;
    let engine = ClassifierEngine::load(&config.model_dir, &config.session)?;
    Ok(DiagnosticPipeline::new(engine))
}

fn serve(mut config: ServiceConfig, args: ServeArgs) -> CliResult {
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    let addr = config.bind_addr()?;

    let runtime = runtime()?;
    let pipeline = load_pipeline(&runtime, &config)?;
    info!(device = pipeline.device(), classes = pipeline.labels().len(), "using device");

    let store: Arc<dyn AnalysisStore> = if args.memory_store {
        warn!("analysis records are kept in memory and lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::open(&config.database_path)?)
    };
    let ctx = AppContext::new(pipeline, store).with_history_limit(config.history_limit);

    runtime.block_on(server::serve(ctx, addr))?;
    Ok(ExitCode::SUCCESS)
}

fn classify(config: ServiceConfig, args: ClassifyArgs) -> CliResult {
    let runtime = runtime()?;
    let pipeline = load_pipeline(&runtime, &config)?;
    drop(runtime);

    let mut failures = 0usize;
    for path in &args.images {
        let outcome = load_image(path).and_then(|image| pipeline.predict_image(&image));
        match outcome {
            Ok(result) if args.json => {
                let line = serde_json::json!({ "image": path, "result": result });
                println!("{line}");
            }
            Ok(result) => {
                println!("{}", path.display());
                for entry in &result.ranked {
                    println!("  {:<24} {:>7.3}%", entry.label, entry.confidence);
                }
            }
            Err(e) => {
                failures += 1;
                error!(image = %path.display(), error = %e.report(), "classification failed");
            }
        }
    }

    info!(metrics = %pipeline.metrics(), "done");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
