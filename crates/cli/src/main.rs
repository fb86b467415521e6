use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use docqa_protocol::{serialize_json, serialize_json_pretty, ErrorCode, ErrorResponse};
use docqa_vector_store::EmbeddingMode;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod app;
mod config;
mod errors;

use app::App;
use config::{CliOverrides, DocqaConfig};
use errors::classify_error;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Deduplicating document store with semantic retrieval", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding index.bin, metadata.json and store.lock
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML config file (overrides DOCQA_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Override embedding model id
    #[arg(long, global = true)]
    embed_model: Option<String>,

    /// Model cache directory (overrides DOCQA_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store .txt files or inline text
    Ingest(IngestArgs),

    /// Find the stored documents closest to a query
    Retrieve(RetrieveArgs),

    /// Show what the store holds
    Stats,

    /// Print JSON Schemas of every response body
    Schema,
}

#[derive(Args)]
struct IngestArgs {
    /// Files to ingest, in order
    #[arg(required_unless_present = "text", conflicts_with = "text")]
    files: Vec<PathBuf>,

    /// Ingest this text instead of files
    #[arg(long)]
    text: Option<String>,
}

#[derive(Args)]
struct RetrieveArgs {
    query: String,

    /// Number of results (default from config, normally 3)
    #[arg(short, long)]
    k: Option<usize>,
}

#[derive(Copy, Clone, ValueEnum)]
enum EmbedMode {
    Fast,
    Stub,
}

impl EmbedMode {
    const fn as_domain(self) -> EmbeddingMode {
        match self {
            EmbedMode::Fast => EmbeddingMode::Fast,
            EmbedMode::Stub => EmbeddingMode::Stub,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // ONNX runtime logging is extremely noisy
    if !cli.verbose {
        builder.filter_module("ort", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    let pretty = cli.pretty;
    match run(cli).await {
        Ok(body) => emit(&body, pretty),
        Err(err) => {
            log::debug!("Command failed: {err:?}");
            let envelope = classify_error(&err);
            if envelope.code == ErrorCode::Internal {
                log::error!("{}", envelope.message);
            }
            let _ = emit(&ErrorResponse { error: envelope }, pretty);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<serde_json::Value> {
    let overrides = CliOverrides {
        data_dir: cli.data_dir,
        embed_mode: cli.embed_mode.map(EmbedMode::as_domain),
        embed_model: cli.embed_model,
        model_dir: cli.model_dir,
    };
    let config_path = cli.config.as_deref();

    let body = match cli.command {
        Commands::Ingest(args) => {
            let app = open_app(config_path, &overrides).await?;
            match args.text {
                Some(text) => serde_json::to_value(app.ingest_text(&text).await?)?,
                None => serde_json::to_value(app.ingest_files(&args.files).await?)?,
            }
        }
        Commands::Retrieve(args) => {
            let app = open_app(config_path, &overrides).await?;
            serde_json::to_value(app.retrieve(&args.query, args.k).await?)?
        }
        Commands::Stats => {
            let app = open_app(config_path, &overrides).await?;
            serde_json::to_value(app.stats().await)?
        }
        Commands::Schema => serde_json::to_value(docqa_protocol::response_schemas()?)?,
    };
    Ok(body)
}

async fn open_app(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<App> {
    let config = DocqaConfig::load(config_path, |key| std::env::var(key).ok(), overrides)?;
    App::open(&config).await
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> ExitCode {
    let rendered = if pretty {
        serialize_json_pretty(value)
    } else {
        serialize_json(value)
    };
    match rendered {
        Ok(raw) => {
            println!("{raw}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: failed to serialize output: {err}");
            ExitCode::FAILURE
        }
    }
}
