//! Configuration for embedding providers

use serde::{Deserialize, Serialize};

/// Configuration for a local embedding provider.
///
/// The model name selects one of the bundled fastembed models; batch size
/// bounds how many texts are embedded per model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Name of the embedding model to use (e.g. "all-minilm-l6-v2").
    pub model_name: String,
    /// Maximum batch size for embedding generation.
    pub batch_size: usize,
    /// Whether to L2-normalize embeddings before returning them.
    pub normalize: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: "all-minilm-l6-v2".to_string(),
            batch_size: 32,
            normalize: true,
        }
    }
}

impl EmbedConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EmbedConfig::default();
        assert_eq!(config.model_name, "all-minilm-l6-v2");
        assert_eq!(config.batch_size, 32);
        assert!(config.normalize);
    }

    #[test]
    fn test_builder_methods() {
        let config = EmbedConfig::new("bge-small-en-v1.5")
            .with_batch_size(0)
            .with_normalize(false);
        assert_eq!(config.model_name, "bge-small-en-v1.5");
        assert_eq!(config.batch_size, 1); // clamped
        assert!(!config.normalize);
    }
}
