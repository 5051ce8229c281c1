use std::fs;
use std::path::{Path, PathBuf};

use super::types::TrainedModel;
use crate::logic::error::{PipelineError, PipelineResult};

/// Get default model path
pub fn get_default_model_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("claim-anomaly")
        .join("model_v1.json")
}

/// Save trained model to disk
pub fn save_model(model: &TrainedModel, path: &Path) -> PipelineResult<()> {
    // Ensure directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec(model)?;
    fs::write(path, json)?;
    log::info!("Saved model {} to {}", model.model_id, path.display());
    Ok(())
}

/// Load model from disk and check it against the incoming columns
pub fn load_model(path: &Path, columns: &[String]) -> PipelineResult<TrainedModel> {
    if !path.exists() {
        return Err(PipelineError::Configuration(format!(
            "model file not found: {}",
            path.display()
        )));
    }

    let data = fs::read(path)?;
    let model: TrainedModel = serde_json::from_slice(&data)?;

    // Validate version/layout
    model.layout.validate(columns)?;

    log::info!(
        "Loaded model {} ({}, trained {})",
        model.model_id,
        model.hyperparams,
        model.trained_at.format("%Y-%m-%d %H:%M")
    );
    Ok(model)
}
