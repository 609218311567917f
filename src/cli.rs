use crate::{config::Config, pipeline::Pipeline, util::ensure_dir};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "wiseflow-remark")]
#[command(about = "Tabulate and re-mark multiple-choice answers from Wiseflow HTML exports")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./wiseflow-remark.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write one CSV per student and a summary CSV.
    Remark {
        summary: PathBuf,
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Print what would be extracted from one file, as JSON.
    Inspect { input: PathBuf },
    /// Print the effective configuration.
    Config {},
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref()) {
        Some(p) => Config::load(&p)?,
        None => Config::default(),
    };
    let _guard = init_logging(&args, &cfg)?;

    match &args.cmd {
        Command::Remark { summary, inputs } => remark(&cfg, summary, inputs),
        Command::Inspect { input } => inspect(&cfg, input),
        Command::Config {} => {
            print!("{}", toml::to_string(&cfg)?);
            Ok(())
        }
    }
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("wiseflow-remark.toml");
    default.exists().then_some(default)
}

fn init_logging(args: &Args, cfg: &Config) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the JSON result of `inspect`/`config`, so logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if cfg.logging.write_to_file {
        let path = if cfg.logging.file_path.is_empty() {
            PathBuf::from("wiseflow-remark.log")
        } else {
            PathBuf::from(&cfg.logging.file_path)
        };
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
        let file = std::fs::File::create(&path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn remark(cfg: &Config, summary: &Path, inputs: &[PathBuf]) -> Result<()> {
    let mut pipeline = Pipeline::from_config(cfg)?;
    info!(
        "re-marking {} input(s) with scheme={}",
        inputs.len(),
        pipeline.scheme_name()
    );

    let outcome = pipeline.run(summary, inputs)?;

    if cfg.global.print_summary {
        let failed: Vec<&PathBuf> = outcome.failures.iter().map(|f| &f.path).collect();
        let status = if failed.is_empty() { "ok" } else { "partial" };
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "summary": summary,
                "students": outcome.rows.len(),
                "failed": failed,
                "status": status,
            }))?
        );
    }

    if !outcome.failures.is_empty() {
        bail!(
            "{} of {} input(s) failed",
            outcome.failures.len(),
            inputs.len()
        );
    }
    Ok(())
}

fn inspect(cfg: &Config, input: &Path) -> Result<()> {
    let pipeline = Pipeline::from_config(cfg)?;
    let marked = pipeline.load(input)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": input,
            "sha256": marked.sha256,
            "scheme": pipeline.scheme_name(),
            "student": marked.student,
            "marks": marked.marks,
        }))?
    );
    Ok(())
}
