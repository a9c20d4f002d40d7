//! CLI binary for docconv.
//!
//! A thin shim over the library crate: flags become a `ConverterConfig`,
//! `convert` runs one local file through the orchestrator and `serve` starts
//! the HTTP boundary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docconv::server::{self, DEFAULT_BIND};
use docconv::{ConvertError, Converter, ConverterConfig, TargetKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Spreadsheet to CSV (written next to the input as report.csv)
  docconv convert report.xlsx --to xlsx-to-csv

  # Slides to PDF with an explicit output path and a shorter engine bound
  docconv --engine-timeout 60 convert deck.pptx --to pptx-to-pdf -o /tmp/deck.pdf

  # PDF to DOCX with a specific pdfium build
  docconv --pdfium-lib /opt/pdfium/lib convert paper.pdf --to pdf-to-docx

  # HTTP service
  docconv serve --bind 127.0.0.1:8080
  curl -F file=@report.xlsx http://127.0.0.1:8080/convert/xlsx-to-csv -o report.csv

TARGETS:
  pdf-to-docx    .pdf  → .docx   pdfium (native library)
  pptx-to-pdf    .pptx → .pdf    conversion engine
  xlsx-to-pdf    .xlsx → .pdf    conversion engine
  docx-to-pdf    .docx → .pdf    conversion engine
  xlsx-to-csv    .xlsx → .csv    built in

ENVIRONMENT VARIABLES:
  DOCCONV_WORKSPACE_ROOT    Base directory for per-request workspaces
  DOCCONV_ENGINE            Conversion engine executable (default: soffice)
  DOCCONV_ENGINE_ARGS       Extra leading engine arguments, comma separated
  DOCCONV_ENGINE_TIMEOUT    Engine time bound in seconds (default: 120)
  DOCCONV_SHARED_PROFILE    Use the engine's shared user profile (default: false)
  DOCCONV_MAX_UPLOAD_BYTES  Upload size limit, 0 disables (default: 52428800)
  DOCCONV_BIND              Listen address for `serve` (default: 0.0.0.0:8080)
  PDFIUM_LIB_PATH           pdfium library file or directory
  RUST_LOG                  Overrides --verbose / --quiet log filtering

EXIT CODES:
  0  success
  1  conversion, environment or internal failure
  2  the input was rejected (missing, empty, disallowed type, too large)
"#;

/// Convert office documents: PDF→DOCX, PPTX/XLSX/DOCX→PDF, XLSX→CSV.
#[derive(Parser, Debug)]
#[command(
    name = "docconv",
    version,
    about = "Convert office documents: PDF→DOCX, PPTX/XLSX/DOCX→PDF, XLSX→CSV",
    long_about = "Convert office documents one request at a time. Every conversion runs in \
its own temporary workspace which is removed afterwards, whatever the outcome. Office→PDF \
conversions need a headless LibreOffice (or compatible) engine; PDF→DOCX needs pdfium.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base directory for per-request workspaces.
    #[arg(long, global = true, env = "DOCCONV_WORKSPACE_ROOT")]
    workspace_root: Option<PathBuf>,

    /// Conversion engine executable.
    #[arg(long, global = true, env = "DOCCONV_ENGINE")]
    engine: Option<String>,

    /// Argument placed before the conversion arguments (repeatable).
    #[arg(
        long = "engine-arg",
        global = true,
        env = "DOCCONV_ENGINE_ARGS",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    engine_args: Vec<String>,

    /// Engine time bound in seconds.
    #[arg(long, global = true, env = "DOCCONV_ENGINE_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    engine_timeout: Option<u64>,

    /// Let the engine use its shared user profile instead of a private one
    /// per request (for engines that reject `-env:UserInstallation`).
    #[arg(long, global = true, env = "DOCCONV_SHARED_PROFILE")]
    shared_profile: bool,

    /// pdfium library file, or the directory holding it.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Largest accepted upload in bytes; 0 disables the limit.
    #[arg(long, global = true, env = "DOCCONV_MAX_UPLOAD_BYTES")]
    max_upload_bytes: Option<u64>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DOCCONV_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one local file.
    Convert {
        /// Input document.
        input: PathBuf,

        /// Conversion to perform (see TARGETS in --help).
        #[arg(short, long, value_parser = parse_target)]
        to: TargetKind,

        /// Output file. Default: the converted name next to the input.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Serve the HTTP conversion API.
    Serve {
        /// Listen address.
        #[arg(long, env = "DOCCONV_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
}

fn parse_target(s: &str) -> Result<TargetKind, String> {
    TargetKind::from_slug(s).ok_or_else(|| {
        let known: Vec<&str> = TargetKind::ALL.iter().map(|t| t.slug()).collect();
        format!("unknown target '{s}' (expected one of: {})", known.join(", "))
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // A one-shot conversion shows a spinner; library INFO lines would only
    // interleave with it.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        match cli.command {
            Command::Serve { .. } => "info",
            Command::Convert { .. } => "warn",
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", red("✘"));
            exit_code(&e)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;
    tracing::debug!(
        "effective configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );
    let converter = Converter::new(config);

    match cli.command {
        Command::Convert { input, to, output } => {
            convert_one(&converter, &input, to, output, cli.quiet).await
        }
        Command::Serve { bind } => server::serve(converter, bind)
            .await
            .with_context(|| format!("HTTP server on {bind} failed")),
    }
}

fn build_config(cli: &Cli) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder();
    if let Some(ref root) = cli.workspace_root {
        builder = builder.workspace_root(root);
    }
    if let Some(ref engine) = cli.engine {
        builder = builder.engine_program(engine);
    }
    if !cli.engine_args.is_empty() {
        builder = builder.engine_args(cli.engine_args.iter().cloned());
    }
    if let Some(secs) = cli.engine_timeout {
        builder = builder.engine_timeout_secs(secs);
    }
    if cli.shared_profile {
        builder = builder.isolate_engine_profile(false);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(n) = cli.max_upload_bytes {
        builder = builder.max_upload_bytes(n);
    }
    builder.build().context("Invalid configuration")
}

async fn convert_one(
    converter: &Converter,
    input: &Path,
    target: TargetKind,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let spinner = (!quiet).then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Converting");
        bar.set_message(format!("{} ({target})", input.display()));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let started = Instant::now();
    let result = converter.convert_file(input, target).await;
    if let Some(ref bar) = spinner {
        bar.finish_and_clear();
    }
    let file = result.with_context(|| format!("Conversion of {} failed", input.display()))?;

    let dest = output.unwrap_or_else(|| {
        input
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(&file.file_name)
    });
    tokio::fs::write(&dest, &file.bytes)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    if !quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            dim(&format!("{} bytes", file.bytes.len())),
            dim(&format!("{}ms", started.elapsed().as_millis())),
            bold(&dest.display().to_string()),
        );
    }
    Ok(())
}

/// 2 for rejected input, 1 for everything else.
fn exit_code(e: &anyhow::Error) -> ExitCode {
    match e.downcast_ref::<ConvertError>() {
        Some(ConvertError::Validation(_)) => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
