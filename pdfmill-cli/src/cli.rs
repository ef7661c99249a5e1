//! CLI argument parsing for pdfmill.
//!
//! This module defines the command-line interface structure using `clap`.
//! It is also compiled by the build script to render the man page, so it
//! only depends on `clap` and the `pdfmill` library.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use pdfmill::config::{Config, Mode, OverwriteMode, PageLayout, PageSize, ProcessOptions};
use pdfmill::error::{PdfMillError, Result};
use pdfmill::utils::collect_paths_for_patterns;

/// Merge PDFs, split them into single pages, and turn images into a PDF.
///
/// Each subcommand takes its inputs in processing order and writes the
/// results into an output directory: `documento-unido.pdf` for merge,
/// `<name>_pagina_<n>.pdf` per page for split, and
/// `imagenes-convertidas.pdf` for images.
#[derive(Parser, Debug)]
#[command(name = "pdfmill")]
#[command(version)]
#[command(about = "Merge PDFs, split them into single pages, and turn images into a PDF", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge two or more PDF files into one document
    ///
    /// Pages are appended file by file, in the order given.
    ///
    /// Examples:
    ///   pdfmill merge portada.pdf capitulo*.pdf -o out/
    Merge(BatchArgs),

    /// Split PDF files into one file per page
    ///
    /// Examples:
    ///   pdfmill split informe.pdf -o paginas/
    Split(BatchArgs),

    /// Convert JPEG and PNG images into a PDF, one image per page
    ///
    /// Examples:
    ///   pdfmill images scans/*.jpg --page-size letter
    #[command(alias = "images-to-pdf")]
    Images(BatchArgs),

    /// Start an interactive session to pick, arrange and process files
    Shell(ShellArgs),
}

impl Command {
    /// Whether verbose diagnostics were requested.
    pub fn verbose(&self) -> bool {
        match self {
            Self::Merge(args) | Self::Split(args) | Self::Images(args) => args.verbose,
            Self::Shell(args) => args.verbose,
        }
    }
}

/// Output and layout options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Directory the results are written into
    ///
    /// Created if it does not exist.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Overwrite existing output files without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output files
    ///
    /// If an output file already exists, exit with an error
    /// instead of prompting or overwriting.
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Write uncompressed content streams
    #[arg(long)]
    pub no_compress: bool,

    /// Page size for converted images
    #[arg(long, value_name = "SIZE", default_value = "a4")]
    #[arg(value_parser = ["a4", "letter"])]
    pub page_size: String,

    /// Total margin in points subtracted from each page dimension
    /// before fitting an image (half on each side)
    #[arg(long, value_name = "PT", default_value_t = pdfmill::config::DEFAULT_MARGIN)]
    pub margin: f32,
}

impl OutputArgs {
    /// Resolve the overwrite flags.
    pub fn overwrite_mode(&self) -> OverwriteMode {
        if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        }
    }

    /// Pipeline settings from the flags.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown page size or an unusable margin.
    pub fn process_options(&self) -> Result<ProcessOptions> {
        let size = PageSize::from_str(&self.page_size)?;
        let layout = PageLayout::new(size).with_margin(self.margin);
        layout.validate()?;

        Ok(ProcessOptions {
            compress: !self.no_compress,
            layout,
        })
    }
}

/// Arguments of the batch subcommands.
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Input files or glob patterns, in processing order
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Read more input paths from a file (one per line, '#' comments)
    ///
    /// Paths from the list are appended after the direct inputs.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Run the pipeline without writing any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show details and debug diagnostics
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl BatchArgs {
    /// Early checks that need no file I/O.
    ///
    /// # Errors
    ///
    /// Returns an error if no input source is given.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() && self.input_list.is_none() {
            return Err(PdfMillError::invalid_config("No input files specified"));
        }
        Ok(())
    }

    /// Build the run configuration for `mode`, expanding glob patterns.
    ///
    /// The result is not validated yet: inputs from `--input-list` still
    /// have to be appended.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed glob patterns or invalid options.
    pub fn to_config(&self, mode: Mode) -> Result<Config> {
        let inputs = collect_paths_for_patterns(&self.inputs)?;

        let mut config = Config::new(mode, inputs);
        config.output_dir = self.output.output_dir.clone();
        config.overwrite_mode = self.output.overwrite_mode();
        config.dry_run = self.dry_run;
        // JSON owns stdout.
        config.verbose = self.verbose && !self.json;
        config.quiet = self.quiet || self.json;
        config.options = self.output.process_options()?;

        Ok(config)
    }
}

/// Arguments of the interactive shell.
#[derive(Args, Debug, Clone)]
pub struct ShellArgs {
    /// Mode to start in (merge, split, images-to-pdf)
    #[arg(short, long, value_name = "MODE", default_value = "merge")]
    pub mode: String,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Show details and debug diagnostics
    #[arg(short, long)]
    pub verbose: bool,
}

impl ShellArgs {
    /// The starting mode.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown mode name.
    pub fn mode(&self) -> Result<Mode> {
        Mode::from_str(&self.mode)
    }
}
