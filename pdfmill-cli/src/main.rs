//! pdfmill - Merge PDFs, split them into pages, and turn images into a PDF.

mod cli;
mod shell;

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::cli::{BatchArgs, Cli, Command};
use pdfmill::config::{Config, Mode, OverwriteMode};
use pdfmill::error::{PdfMillError, Result};
use pdfmill::intake::SelectedFile;
use pdfmill::io::{DirectorySink, MemorySink};
use pdfmill::output::{OutputFormatter, display_collection, display_report};
use pdfmill::Session;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.command.verbose());

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Diagnostics go to stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pdfmill=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => run_batch(Mode::Merge, args).await,
        Command::Split(args) => run_batch(Mode::Split, args).await,
        Command::Images(args) => run_batch(Mode::ImagesToPdf, args).await,
        Command::Shell(args) => shell::run(args).await,
    }
}

/// One non-interactive run: select every input, process, report.
async fn run_batch(mode: Mode, args: BatchArgs) -> Result<()> {
    args.validate()?;

    let mut config = args.to_config(mode)?;
    if let Some(list) = &args.input_list {
        config.inputs.extend(read_input_list(list).await?);
    }
    config.validate()?;

    let formatter = OutputFormatter::from_config(&config);
    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pdfmill::NAME, pdfmill::VERSION));
        formatter.info(mode.title());
        formatter.blank_line();
    }

    let mut batch = Vec::with_capacity(config.inputs.len());
    for path in &config.inputs {
        batch.push(SelectedFile::from_path(path).await?);
    }

    let offered = batch.len();
    let mut session = Session::new(mode).with_options(config.options)?;
    let added = session.select(batch)?;
    if added < offered {
        formatter.warning(&format!(
            "{} archivo(s) ignorados: no son {}",
            offered - added,
            mode.accepted_kind().plural_label()
        ));
    }

    if formatter.is_verbose() {
        display_collection(&formatter, mode, session.items());
        formatter.blank_line();
    }

    let report = if config.dry_run {
        session.process(&mut MemorySink::discarding()).await?
    } else {
        tokio::fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|e| PdfMillError::FailedToCreateOutput {
                path: config.output_dir.clone(),
                source: e,
            })?;

        let mut sink = directory_sink(&config, &formatter);
        session.process(&mut sink).await?
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| PdfMillError::other(format!("Failed to encode report: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    if formatter.should_print() {
        display_report(&formatter, &report);
        if config.dry_run {
            formatter.blank_line();
            formatter.success("Simulación completada, no se escribió ningún archivo");
            formatter.info(&format!(
                "  Los archivos irían a: {}",
                config.output_dir.display()
            ));
        }
    }

    Ok(())
}

/// Sink for the output directory. Prompting needs a terminal, so quiet
/// runs refuse to overwrite instead.
pub(crate) fn directory_sink(config: &Config, formatter: &OutputFormatter) -> DirectorySink {
    let sink = DirectorySink::new(&config.output_dir, config.overwrite_mode);
    if config.overwrite_mode == OverwriteMode::Prompt && !formatter.is_quiet() {
        let formatter = formatter.clone();
        sink.with_confirm(move |path| confirm_overwrite(&formatter, path))
    } else {
        sink
    }
}

/// Ask on stdin whether `path` may be replaced.
fn confirm_overwrite(formatter: &OutputFormatter, path: &Path) -> bool {
    use std::io::{self, Write};

    formatter.warning(&format!("El archivo ya existe: {}", path.display()));
    print!("¿Sobrescribir? [s/N]: ");
    io::stdout().flush().ok();

    let mut response = String::new();
    if io::stdin().read_line(&mut response).is_err() {
        return false;
    }

    is_affirmative(&response)
}

fn is_affirmative(response: &str) -> bool {
    matches!(
        response.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    )
}

/// Read input paths from a file, or from stdin when `path` is "-".
///
/// One path per line. Lines starting with '#' are comments and empty lines
/// are skipped.
async fn read_input_list(path: &Path) -> Result<Vec<PathBuf>> {
    let map_err = |e: std::io::Error| PdfMillError::FileNotAccessible {
        path: path.to_path_buf(),
        source: e,
    };

    if path.as_os_str() == "-" {
        return parse_input_list(BufReader::new(tokio::io::stdin()))
            .await
            .map_err(map_err);
    }

    let file = tokio::fs::File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PdfMillError::file_not_found(path.to_path_buf())
        } else {
            map_err(e)
        }
    })?;

    parse_input_list(BufReader::new(file)).await.map_err(map_err)
}

async fn parse_input_list<R>(reader: R) -> std::io::Result<Vec<PathBuf>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut paths = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        paths.push(PathBuf::from(line));
    }

    Ok(paths)
}
