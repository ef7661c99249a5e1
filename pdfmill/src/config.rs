//! Configuration module for pdfmill.
//!
//! This module holds the processing mode selector and the settings that
//! drive a run: where artifacts go, how existing files are treated, and the
//! page geometry used when converting images.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::collection::ItemKind;
use crate::error::{PdfMillError, Result};

/// File name of the merge output.
pub const MERGED_FILE_NAME: &str = "documento-unido.pdf";

/// File name of the images-to-pdf output.
pub const IMAGES_FILE_NAME: &str = "imagenes-convertidas.pdf";

/// Total margin, in points, removed from each page dimension before fitting
/// an image.
pub const DEFAULT_MARGIN: f32 = 40.0;

/// Processing mode. Selects the intake filter and the pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Concatenate every document into one.
    #[default]
    Merge,
    /// Turn every page of every document into its own file.
    Split,
    /// Place every image on its own page of one document.
    ImagesToPdf,
}

/// One entry of the "how it works" guide for a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// 1-based step number.
    pub num: u8,
    /// Short title.
    pub title: &'static str,
    /// Explanation.
    pub text: &'static str,
}

impl Mode {
    /// All modes, in selector order.
    pub const ALL: [Mode; 3] = [Mode::Merge, Mode::Split, Mode::ImagesToPdf];

    /// Kind of item this mode accepts at intake.
    pub fn accepted_kind(&self) -> ItemKind {
        match self {
            Self::Merge | Self::Split => ItemKind::Document,
            Self::ImagesToPdf => ItemKind::Image,
        }
    }

    /// File picker accept pattern for this mode.
    pub fn accept_pattern(&self) -> &'static str {
        match self {
            Self::Merge | Self::Split => ".pdf",
            Self::ImagesToPdf => "image/*",
        }
    }

    /// Minimum number of items the pipeline needs.
    pub fn min_items(&self) -> usize {
        match self {
            Self::Merge => 2,
            Self::Split | Self::ImagesToPdf => 1,
        }
    }

    /// Whether the collection order can be changed in this mode.
    ///
    /// Split output does not depend on input order.
    pub fn allows_reorder(&self) -> bool {
        !matches!(self, Self::Split)
    }

    /// Fixed output file name, for modes producing a single artifact.
    pub fn output_name(&self) -> Option<&'static str> {
        match self {
            Self::Merge => Some(MERGED_FILE_NAME),
            Self::Split => None,
            Self::ImagesToPdf => Some(IMAGES_FILE_NAME),
        }
    }

    /// Verb used in precondition messages.
    pub(crate) fn verb(&self) -> &'static str {
        match self {
            Self::Merge => "unir",
            Self::Split => "separar",
            Self::ImagesToPdf => "convertir",
        }
    }

    /// Generic message reported when the pipeline fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Self::Merge | Self::Split => "Error al procesar los archivos PDF.",
            Self::ImagesToPdf => "Error al procesar las imágenes.",
        }
    }

    /// Heading shown for the mode.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Merge => "Unir PDFs",
            Self::Split => "Separar PDFs",
            Self::ImagesToPdf => "Imágenes a PDF",
        }
    }

    /// One-line description of the mode.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Merge => "Combina múltiples archivos PDF en un solo documento",
            Self::Split => "Divide archivos PDF en páginas individuales",
            Self::ImagesToPdf => "Convierte múltiples imágenes en un solo archivo PDF",
        }
    }

    /// The three-step guide for the mode.
    pub fn steps(&self) -> [Step; 3] {
        match self {
            Self::Merge => [
                Step {
                    num: 1,
                    title: "Selecciona archivos",
                    text: "Elige múltiples archivos PDF desde tu dispositivo",
                },
                Step {
                    num: 2,
                    title: "Organiza el orden",
                    text: "Arrastra los archivos para cambiar su orden antes de unirlos",
                },
                Step {
                    num: 3,
                    title: "Descarga el resultado",
                    text: "Obtén tu PDF unificado listo para usar",
                },
            ],
            Self::Split => [
                Step {
                    num: 1,
                    title: "Selecciona archivos",
                    text: "Elige el archivo PDF que quieres separar",
                },
                Step {
                    num: 2,
                    title: "Procesa automáticamente",
                    text: "Cada página se convierte en un PDF individual",
                },
                Step {
                    num: 3,
                    title: "Descarga los resultados",
                    text: "Obtén cada página como un archivo PDF separado",
                },
            ],
            Self::ImagesToPdf => [
                Step {
                    num: 1,
                    title: "Selecciona imágenes",
                    text: "Elige las imágenes JPG o PNG desde tu dispositivo",
                },
                Step {
                    num: 2,
                    title: "Organiza el orden",
                    text: "Arrastra las imágenes para decidir el orden de las páginas",
                },
                Step {
                    num: 3,
                    title: "Descarga el resultado",
                    text: "Obtén un PDF con una imagen centrada por página",
                },
            ],
        }
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merge => "merge",
            Self::Split => "split",
            Self::ImagesToPdf => "images-to-pdf",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = PdfMillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "split" => Ok(Self::Split),
            "images-to-pdf" | "images" => Ok(Self::ImagesToPdf),
            _ => Err(PdfMillError::invalid_config(format!(
                "Invalid mode: {s}. Must be one of: merge, split, images-to-pdf"
            ))),
        }
    }
}

/// Page size preset for generated pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageSize {
    /// ISO A4, 595.28 x 841.89 points.
    #[default]
    A4,
    /// US Letter, 612 x 792 points.
    Letter,
}

impl PageSize {
    /// Width and height in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.28, 841.89),
            Self::Letter => (612.0, 792.0),
        }
    }
}

impl FromStr for PageSize {
    type Err = PdfMillError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "letter" => Ok(Self::Letter),
            _ => Err(PdfMillError::invalid_config(format!(
                "Invalid page size: {s}. Must be one of: a4, letter"
            ))),
        }
    }
}

/// Geometry of pages created by the images-to-pdf pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    /// Page width in points.
    pub width: f32,
    /// Page height in points.
    pub height: f32,
    /// Total margin subtracted from each dimension.
    pub margin: f32,
}

impl PageLayout {
    /// Layout for a preset page size with the default margin.
    pub fn new(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            width,
            height,
            margin: DEFAULT_MARGIN,
        }
    }

    /// Replace the margin.
    pub fn with_margin(mut self, margin: f32) -> Self {
        self.margin = margin;
        self
    }

    /// Check that some drawable area is left after the margin.
    pub fn validate(&self) -> Result<()> {
        if self.margin.is_nan() || self.margin < 0.0 {
            return Err(PdfMillError::invalid_config(format!(
                "Margin must be zero or positive, got {}",
                self.margin
            )));
        }

        if self.margin >= self.width || self.margin >= self.height {
            return Err(PdfMillError::invalid_config(format!(
                "Margin {} leaves no room on a {}x{} page",
                self.margin, self.width, self.height
            )));
        }

        Ok(())
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Ask before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without asking.
    Force,
    /// Never overwrite, error if a file exists.
    NoClobber,
}

/// Settings every pipeline run reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessOptions {
    /// Compress output streams before serializing.
    pub compress: bool,
    /// Page geometry for images-to-pdf.
    pub layout: PageLayout,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            compress: true,
            layout: PageLayout::default(),
        }
    }
}

/// Complete configuration for one batch run.
///
/// Built from CLI arguments and validated before any file is touched.
#[derive(Debug, Clone)]
pub struct Config {
    /// Active mode.
    pub mode: Mode,

    /// Input file paths, in collection order.
    pub inputs: Vec<PathBuf>,

    /// Directory receiving the artifacts.
    pub output_dir: PathBuf,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Run the pipeline without persisting anything.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Pipeline settings.
    pub options: ProcessOptions,
}

impl Config {
    /// Create a configuration with defaults for everything but mode and inputs.
    pub fn new(mode: Mode, inputs: Vec<PathBuf>) -> Self {
        Self {
            mode,
            inputs,
            output_dir: PathBuf::from("."),
            overwrite_mode: OverwriteMode::default(),
            dry_run: false,
            verbose: false,
            quiet: false,
            options: ProcessOptions::default(),
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - The page layout leaves no drawable area
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(PdfMillError::invalid_config("No input files specified"));
        }

        if self.verbose && self.quiet {
            return Err(PdfMillError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        self.options.layout.validate()?;

        Ok(())
    }

    /// Check if output should be displayed.
    ///
    /// Returns false if in quiet mode and not doing a dry run.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}
