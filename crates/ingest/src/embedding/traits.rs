use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedder returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

/// Trait for embedding backends (OpenAI, Ollama, ...)
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per input text (in order).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// The dimensionality of the output vectors.
    fn dimensions(&self) -> usize;
}

/// Check a backend response against the request size and declared dimensionality.
pub(crate) fn validate_batch(
    embeddings: &[Vec<f32>],
    inputs: usize,
    dimensions: usize,
) -> Result<(), EmbeddingError> {
    if embeddings.len() != inputs {
        return Err(EmbeddingError::CountMismatch {
            expected: inputs,
            actual: embeddings.len(),
        });
    }
    if let Some(bad) = embeddings.iter().find(|v| v.len() != dimensions) {
        return Err(EmbeddingError::DimensionMismatch {
            expected: dimensions,
            actual: bad.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_batches_and_wrong_dimensions() {
        let ok = vec![vec![0.0; 3], vec![1.0; 3]];
        assert!(validate_batch(&ok, 2, 3).is_ok());

        assert!(matches!(
            validate_batch(&ok, 3, 3),
            Err(EmbeddingError::CountMismatch { expected: 3, actual: 2 })
        ));

        let ragged = vec![vec![0.0; 3], vec![1.0; 4]];
        assert!(matches!(
            validate_batch(&ragged, 2, 3),
            Err(EmbeddingError::DimensionMismatch { expected: 3, actual: 4 })
        ));
    }
}
