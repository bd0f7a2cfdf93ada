use serde::Deserialize;

/// Embeddings response from the LLM provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Embeddings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub usage: Option<EmbeddingUsage>,
}

impl Embeddings {
    /// Vector for the first (and for single-string input, only) input.
    pub fn first_vector(&self) -> Option<&[f32]> {
        self.data
            .iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding.as_slice())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    #[serde(default)]
    pub index: u32,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_vector_uses_lowest_index() {
        let embeddings: Embeddings = serde_json::from_value(json!({
            "object": "list",
            "model": "text-embedding-3-small",
            "data": [
                { "object": "embedding", "index": 1, "embedding": [0.5, 0.5] },
                { "object": "embedding", "index": 0, "embedding": [0.1, -0.2] }
            ],
            "usage": { "prompt_tokens": 4, "total_tokens": 4 }
        }))
        .unwrap();

        assert_eq!(embeddings.first_vector(), Some(&[0.1_f32, -0.2][..]));
        assert_eq!(embeddings.usage.unwrap().prompt_tokens, 4);
    }

    #[test]
    fn test_empty_data_has_no_vector() {
        let embeddings: Embeddings = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(embeddings.first_vector().is_none());
    }
}
