use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use pdfqa::config::{ExtractionMode, PipelineConfig};
use pdfqa::pdf_extraction::TesseractOcr;
use pdfqa::pipeline;
use pdfqa::qa::OnnxQuestionAnswerer;
use pdfqa::report::{self, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "pdfqa", author, version, about = "Ask questions about a PDF document")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the document text and answer a question about it
    Ask {
        /// PDF file to read
        pdf: Option<PathBuf>,
        /// Question to ask
        #[arg(short, long)]
        question: Option<String>,
        /// Local model directory or Hugging Face repo id
        #[arg(short, long)]
        model: Option<String>,
        /// Minimum stripped length of the text layer before OCR is used
        #[arg(short, long)]
        threshold: Option<usize>,
        #[arg(long, value_enum)]
        mode: Option<ExtractionMode>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the cleaned document text
    Extract {
        /// PDF file to read
        pdf: Option<PathBuf>,
        #[arg(short, long)]
        threshold: Option<usize>,
        #[arg(long, value_enum)]
        mode: Option<ExtractionMode>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pdfqa=debug" } else { "pdfqa=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_extraction_overrides(
    config: &mut PipelineConfig,
    pdf: Option<PathBuf>,
    threshold: Option<usize>,
    mode: Option<ExtractionMode>,
) {
    if let Some(pdf) = pdf {
        config.document_path = pdf;
    }
    if let Some(threshold) = threshold {
        config.extraction.fallback_threshold = threshold;
    }
    if let Some(mode) = mode {
        config.extraction.mode = mode;
    }
}

fn log_effective_config(config: &PipelineConfig) -> Result<()> {
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!("Effective configuration:\n{}", config.to_toml()?);
    }
    Ok(())
}

fn open_ocr(config: &PipelineConfig) -> TesseractOcr {
    let ocr = TesseractOcr::new(&config.ocr);
    if config.extraction.mode != ExtractionMode::Native && !ocr.is_available() {
        tracing::warn!(
            "OCR command '{}' not found; scanned documents cannot be read",
            config.ocr.tesseract_cmd
        );
    }
    ocr
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = PipelineConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Ask { pdf, question, model, threshold, mode, format } => {
            apply_extraction_overrides(&mut config, pdf, threshold, mode);
            if let Some(question) = question {
                config.question = question;
            }
            if let Some(model) = model {
                config.model.identifier = model;
            }

            log_effective_config(&config)?;

            let mut qa = OnnxQuestionAnswerer::load(&config.model)
                .with_context(|| format!("Failed to load QA model {}", config.model.identifier))?;
            let mut ocr = open_ocr(&config);

            let output = pipeline::run(&config, &mut ocr, &mut qa)
                .with_context(|| format!("Failed to answer from {}", config.document_path.display()))?;
            print!("{}", report::render(&output, format)?);
            if format == OutputFormat::Json {
                println!();
            }
        }
        Commands::Extract { pdf, threshold, mode } => {
            apply_extraction_overrides(&mut config, pdf, threshold, mode);
            log_effective_config(&config)?;
            let mut ocr = open_ocr(&config);

            let context = pipeline::prepare_context(&config, &mut ocr)
                .with_context(|| format!("Failed to extract {}", config.document_path.display()))?;
            tracing::info!(
                "{} pages, {} text, {} raw chars",
                context.page_count,
                context.source,
                context.raw_chars
            );
            println!("{}", context.text);
        }
    }

    Ok(())
}
