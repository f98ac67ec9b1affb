use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::adapter::HttpBackend;
use crate::retry::RetryConfig;
use sableye_core::{Embedder, Error, Result};

/// OpenAI `/embeddings` client
pub struct OpenAiEmbedder {
    http: HttpBackend,
    base_url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, model: String, base_url: String, timeout: Duration) -> Result<Self> {
        let api_key = if api_key.is_empty() { None } else { Some(api_key) };
        Ok(Self { http: HttpBackend::new(api_key, timeout, RetryConfig::default())?, base_url, model })
    }
}

#[derive(Debug, Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let body = OpenAiEmbeddingRequest { model: &self.model, input: texts };
        let response: OpenAiEmbeddingResponse = self
            .http
            .post_json(&url, &body)
            .await?
            .json()
            .await
            .map_err(|e| Error::provider(format!("invalid embeddings response: {}", e)))?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        check_count(texts.len(), data.len())?;
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

/// Ollama `/api/embed` client
pub struct OllamaEmbedder {
    http: HttpBackend,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(model: String, base_url: String, timeout: Duration) -> Result<Self> {
        Ok(Self { http: HttpBackend::new(None, timeout, RetryConfig::default())?, base_url, model })
    }
}

#[derive(Debug, Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait::async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url.trim_end_matches('/'));
        let body = OllamaEmbedRequest { model: &self.model, input: texts };
        let response: OllamaEmbedResponse = self
            .http
            .post_json(&url, &body)
            .await?
            .json()
            .await
            .map_err(|e| Error::provider(format!("invalid embeddings response: {}", e)))?;

        check_count(texts.len(), response.embeddings.len())?;
        Ok(response.embeddings)
    }
}

fn check_count(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::provider(format!("expected {} embeddings, got {}", expected, got)));
    }
    Ok(())
}

/// Offline bag-of-words embedder used with the `mock` model type.
///
/// Lowercased alphanumeric tokens are hashed into a fixed number of buckets
/// and the vector is L2-normalised, so texts sharing words score higher
/// under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimensions: 256 }
    }
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions: dimensions.max(1) }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait::async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::default();
        assert_eq!(embedder.embed("Morning run"), embedder.embed("morning RUN"));
        assert_eq!(embedder.embed("x").len(), 256);
    }

    #[test]
    fn test_hashing_embedder_normalises() {
        let embedder = HashingEmbedder::new(32);
        let v = embedder.embed("one two three three");
        let norm = dot(&v, &v).sqrt();
        assert!((norm - 1.0).abs() < 1e-5);

        assert!(embedder.embed("").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_hashing_embedder_prefers_shared_words() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("running goals");
        let close = embedder.embed("My goals for running this spring");
        let far = embedder.embed("Dinner with friends downtown");
        assert!(dot(&query, &close) > dot(&query, &far));
    }

    #[tokio::test]
    async fn test_embed_documents_and_query() {
        let embedder = HashingEmbedder::default();
        let docs = embedder.embed_documents(&["a b".to_string(), "c".to_string()]).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(embedder.embed_query("a b").await.unwrap(), docs[0]);
    }

    #[test]
    fn test_check_count() {
        assert!(check_count(2, 2).is_ok());
        assert!(check_count(2, 1).unwrap_err().to_string().contains("expected 2 embeddings, got 1"));
    }

    #[test]
    fn test_embedding_response_parsing() {
        let response: OpenAiEmbeddingResponse =
            serde_json::from_str(r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.1]}]}"#)
                .unwrap();
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        assert_eq!(data[0].embedding, vec![0.1]);

        let response: OllamaEmbedResponse = serde_json::from_str(r#"{"embeddings":[[1.0,2.0]]}"#).unwrap();
        assert_eq!(response.embeddings[0], vec![1.0, 2.0]);
    }
}
