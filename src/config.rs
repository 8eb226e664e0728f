// Pipeline configuration: built-in defaults, optional TOML file, CLI overrides
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{PdfQaError, Result, DEFAULT_FALLBACK_THRESHOLD, DEFAULT_PAGE_SEGMENTATION_MODE};

pub const DEFAULT_DOCUMENT_PATH: &str = "data/cancerQA.pdf";
pub const DEFAULT_QUESTION: &str = "What large model is used in this paper?";
pub const DEFAULT_MODEL: &str = "deepset/bert-base-cased-squad2";

const CONFIG_DIR_NAME: &str = "pdfqa";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,
    #[serde(default = "default_question")]
    pub question: String,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

/// How the raw text of a document is chosen.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// Text layer first, OCR when it is shorter than the threshold
    #[default]
    Auto,
    /// Text layer only
    Native,
    /// OCR only
    Ocr,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_threshold")]
    pub fallback_threshold: usize,
    #[serde(default)]
    pub mode: ExtractionMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OcrConfig {
    #[serde(default = "default_tesseract_cmd")]
    pub tesseract_cmd: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_psm")]
    pub page_segmentation_mode: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub identifier: String,
    #[serde(default = "default_onnx_file")]
    pub onnx_file: String,
    #[serde(default = "default_tokenizer_file")]
    pub tokenizer_file: String,
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: usize,
    #[serde(default = "default_doc_stride")]
    pub doc_stride: usize,
    #[serde(default = "default_max_answer_len")]
    pub max_answer_len: usize,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
}

fn default_document_path() -> PathBuf { PathBuf::from(DEFAULT_DOCUMENT_PATH) }
fn default_question() -> String { DEFAULT_QUESTION.to_string() }
fn default_threshold() -> usize { DEFAULT_FALLBACK_THRESHOLD }
fn default_tesseract_cmd() -> String { "tesseract".to_string() }
fn default_language() -> String { "eng".to_string() }
fn default_psm() -> u32 { DEFAULT_PAGE_SEGMENTATION_MODE }
fn default_model() -> String { DEFAULT_MODEL.to_string() }
fn default_onnx_file() -> String { "onnx/model.onnx".to_string() }
fn default_tokenizer_file() -> String { "tokenizer.json".to_string() }
fn default_max_seq_len() -> usize { 384 }
fn default_doc_stride() -> usize { 128 }
fn default_max_answer_len() -> usize { 15 }
fn default_intra_threads() -> usize { 4 }

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            document_path: default_document_path(),
            question: default_question(),
            extraction: ExtractionConfig::default(),
            ocr: OcrConfig::default(),
            model: ModelConfig::default(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            fallback_threshold: default_threshold(),
            mode: ExtractionMode::default(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_cmd: default_tesseract_cmd(),
            language: default_language(),
            page_segmentation_mode: default_psm(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            identifier: default_model(),
            onnx_file: default_onnx_file(),
            tokenizer_file: default_tokenizer_file(),
            max_seq_len: default_max_seq_len(),
            doc_stride: default_doc_stride(),
            max_answer_len: default_max_answer_len(),
            intra_threads: default_intra_threads(),
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PdfQaError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
            .map_err(|e| PdfQaError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the explicit file if given, else the user config file if it exists,
    /// else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match user_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Using config file {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| PdfQaError::Config(e.to_string()))
    }
}

/// `$XDG_CONFIG_HOME/pdfqa/config.toml` or the platform equivalent.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
