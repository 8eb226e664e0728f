// Locating model weights and tokenizer: a local directory or the Hugging Face hub
use hf_hub::api::sync::ApiBuilder;
use std::path::{Path, PathBuf};

use crate::config::ModelConfig;
use crate::types::{PdfQaError, Result};

const FALLBACK_ONNX_FILE: &str = "model.onnx";

#[derive(Debug, Clone, PartialEq)]
pub struct ModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

/// A directory identifier is read in place; anything else is a hub repo id.
pub fn resolve_model_files(config: &ModelConfig) -> Result<ModelFiles> {
    let local = Path::new(&config.identifier);
    if local.is_dir() {
        local_files(local, config)
    } else {
        download(config)
    }
}

fn onnx_candidates(config: &ModelConfig) -> Vec<&str> {
    let mut candidates = vec![config.onnx_file.as_str()];
    if config.onnx_file != FALLBACK_ONNX_FILE {
        candidates.push(FALLBACK_ONNX_FILE);
    }
    candidates
}

fn local_files(dir: &Path, config: &ModelConfig) -> Result<ModelFiles> {
    let model = onnx_candidates(config)
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            PdfQaError::Model(format!("no ONNX model ({}) in {}", onnx_candidates(config).join(" or "), dir.display()))
        })?;

    let tokenizer = dir.join(&config.tokenizer_file);
    if !tokenizer.is_file() {
        return Err(PdfQaError::Model(format!("tokenizer not found at {}", tokenizer.display())));
    }

    tracing::info!("Using local model {}", model.display());
    Ok(ModelFiles { model, tokenizer })
}

fn download(config: &ModelConfig) -> Result<ModelFiles> {
    let api = ApiBuilder::new()
        .with_progress(true)
        .build()
        .map_err(|e| PdfQaError::Model(format!("failed to create Hugging Face API: {}", e)))?;
    let repo = api.model(config.identifier.clone());

    tracing::info!("Fetching model files from {}", config.identifier);
    let tokenizer = repo.get(&config.tokenizer_file).map_err(|e| {
        PdfQaError::Model(format!("failed to get {} from {}: {}", config.tokenizer_file, config.identifier, e))
    })?;

    let mut last_error = None;
    for name in onnx_candidates(config) {
        match repo.get(name) {
            Ok(model) => return Ok(ModelFiles { model, tokenizer }),
            Err(e) => {
                tracing::debug!("{} not available in {}: {}", name, config.identifier, e);
                last_error = Some(e.to_string());
            }
        }
    }
    Err(PdfQaError::Model(format!(
        "no ONNX export of {} found: {}",
        config.identifier,
        last_error.unwrap_or_default()
    )))
}
