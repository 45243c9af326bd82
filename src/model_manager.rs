use candle_core::{Device, Tensor};
use pylate_rs::ColBERT;

use crate::error::{Error, Result};

pub const DEFAULT_MODEL_ID: &str = "lightonai/GTE-ModernColBERT-v1";
pub const MODEL_ENV_VAR: &str = "DELVE_MODEL";

/// Select the best available compute device.
///
/// Uses CUDA when compiled with the `cuda` feature, Metal when compiled with
/// the `metal` feature, and falls back to CPU otherwise.
fn default_device() -> Device {
    #[cfg(feature = "cuda")]
    {
        if let Ok(device) = Device::new_cuda(0) {
            return device;
        }
    }

    #[cfg(feature = "metal")]
    {
        if let Ok(device) = Device::new_metal(0) {
            return device;
        }
    }

    Device::Cpu
}

fn model_error(e: impl std::fmt::Display) -> Error {
    Error::Model(e.to_string())
}

/// Owns the ColBERT model for one run. Loading is explicit via
/// [`ModelManager::load`] or happens on first encode.
pub struct ModelManager {
    model: Option<ColBERT>,
    model_id: String,
}

impl ModelManager {
    /// `model_id` is a HuggingFace model ID or a local model directory.
    pub fn with_model_id(model_id: impl Into<String>) -> Self {
        Self {
            model: None,
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Load the model now, downloading it from HuggingFace Hub if needed.
    ///
    /// A model that cannot be found or loaded is reported as
    /// [`Error::UnknownModel`].
    pub fn load(&mut self) -> Result<()> {
        if self.model.is_none() {
            tracing::info!(model = %self.model_id, "loading embedding model");
            let builder =
                ColBERT::from(&self.model_id).with_device(default_device());
            let colbert = TryInto::<ColBERT>::try_into(builder).map_err(
                |e| Error::UnknownModel {
                    model: self.model_id.clone(),
                    reason: e.to_string(),
                },
            )?;
            self.model = Some(colbert);
        }
        Ok(())
    }

    fn loaded(&mut self) -> Result<&mut ColBERT> {
        self.load()?;
        self.model
            .as_mut()
            .ok_or_else(|| model_error("model not loaded"))
    }

    /// Encode document texts into token-level embeddings of shape
    /// `[batch, tokens, dim]`.
    pub fn encode_documents(&mut self, texts: &[String]) -> Result<Tensor> {
        self.loaded()?.encode(texts, false).map_err(model_error)
    }

    /// Encode a query into a `[tokens, dim]` tensor.
    pub fn encode_query(&mut self, query: &str) -> Result<Tensor> {
        let embeddings = self
            .loaded()?
            .encode(&[query.to_string()], true)
            .map_err(model_error)?;
        Ok(embeddings.squeeze(0)?)
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("model_id", &self.model_id)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
