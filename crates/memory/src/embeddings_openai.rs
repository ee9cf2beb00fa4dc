/// OpenAI embeddings provider using the `/v1/embeddings` endpoint.
use async_trait::async_trait;
use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
    tracing::debug,
};

use crate::embeddings::EmbeddingProvider;

pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_key: Secret<String>,
    base_url: String,
    model: String,
    dims: usize,
    provider_key: String,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: String) -> Self {
        let mut provider = Self {
            client: reqwest::Client::new(),
            api_key: Secret::new(api_key),
            base_url: "https://api.openai.com".into(),
            model: "text-embedding-ada-002".into(),
            dims: 1536,
            provider_key: String::new(),
        };
        provider.rekey();
        provider
    }

    pub fn with_model(mut self, model: String, dims: usize) -> Self {
        self.model = model;
        self.dims = dims;
        self.rekey();
        self
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self.rekey();
        self
    }

    // Vectors are only comparable within one endpoint/model pairing, so the
    // key covers both.
    fn rekey(&mut self) {
        let digest = Sha256::digest(format!("openai:{}:{}", self.base_url, self.model));
        self.provider_key = format!("{digest:x}")[..16].to_string();
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        debug!(model = %self.model, chars = text.len(), "requesting embedding");

        let resp = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        resp.data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| anyhow::anyhow!("empty embedding response"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn provider_key(&self) -> &str {
        &self.provider_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_key_discriminates_models() {
        let ada = OpenAiEmbeddingProvider::new("sk-test".into());
        let small = OpenAiEmbeddingProvider::new("sk-test".into())
            .with_model("text-embedding-3-small".into(), 1536);
        assert_ne!(ada.provider_key(), small.provider_key());
    }

    #[tokio::test]
    async fn embed_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"embedding": [0.1, 0.2, 0.3]}]}"#)
            .create_async()
            .await;

        let provider =
            OpenAiEmbeddingProvider::new("sk-test".into()).with_base_url(server.url());
        let vector = provider.embed("hello").await.unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn embed_propagates_http_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/embeddings")
            .with_status(500)
            .create_async()
            .await;

        let provider =
            OpenAiEmbeddingProvider::new("sk-test".into()).with_base_url(server.url());
        assert!(provider.embed("hello").await.is_err());
    }
}
