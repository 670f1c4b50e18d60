use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::domain::{
    ports::ReviewIndex, DomainError, Embedding, ReviewMatch, ReviewMetadata, Stars,
};
use crate::infrastructure::config::VectorIndexConfig;

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";

/// Pinecone index scoped to one namespace. Holds a pooled HTTP client.
pub struct PineconeIndex {
    client: reqwest::Client,
    api_key: SecretString,
    api_version: String,
    host: String,
    namespace: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    namespace: &'a str,
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    id: String,
    score: Option<f32>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
}

impl PineconeIndex {
    /// Connects to the configured index, resolving its host from the control plane if needed.
    pub async fn connect(
        config: &VectorIndexConfig,
        api_key: SecretString,
    ) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DomainError::retrieval(e.to_string()))?;

        let host = match &config.host {
            Some(host) => normalize_host(host),
            None => {
                describe_index(
                    &client,
                    &config.controller_url,
                    &config.index,
                    &api_key,
                    &config.api_version,
                )
                .await?
            }
        };

        tracing::info!(index = %config.index, namespace = %config.namespace, host = %host, "vector index ready");

        Ok(Self {
            client,
            api_key,
            api_version: config.api_version.clone(),
            host,
            namespace: config.namespace.clone(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

async fn describe_index(
    client: &reqwest::Client,
    controller_url: &str,
    index: &str,
    api_key: &SecretString,
    api_version: &str,
) -> Result<String, DomainError> {
    let url = format!("{}/indexes/{}", controller_url.trim_end_matches('/'), index);

    let response = client
        .get(&url)
        .header(API_KEY_HEADER, api_key.expose_secret())
        .header(API_VERSION_HEADER, api_version)
        .send()
        .await
        .map_err(|e| DomainError::retrieval(format!("describe index: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DomainError::retrieval(format!(
            "describe index {index} returned {status}: {body}"
        )));
    }

    let description: IndexDescription = response
        .json()
        .await
        .map_err(|e| DomainError::retrieval(format!("describe index: {e}")))?;

    Ok(normalize_host(&description.host))
}

fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

fn metadata_from(map: Option<Map<String, Value>>) -> ReviewMetadata {
    let Some(map) = map else {
        return ReviewMetadata::default();
    };

    let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
    let stars = map.get("stars").and_then(|v| match v {
        Value::Number(n) => n.as_f64().map(Stars::Number),
        Value::String(s) => Some(Stars::Text(s.clone())),
        _ => None,
    });

    ReviewMetadata {
        review: text("review"),
        subject: text("subject"),
        stars,
    }
}

#[async_trait]
impl ReviewIndex for PineconeIndex {
    #[instrument(skip(self, vector), fields(namespace = %self.namespace, dimension = vector.dimension()))]
    async fn query(
        &self,
        vector: &Embedding,
        top_k: usize,
    ) -> Result<Vec<ReviewMatch>, DomainError> {
        let body = QueryRequest {
            namespace: &self.namespace,
            vector: vector.as_slice(),
            top_k,
            include_metadata: true,
            include_values: false,
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .header(API_VERSION_HEADER, &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::retrieval(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::retrieval(format!("query returned {status}: {body}")));
        }

        let result: QueryResponse = response
            .json()
            .await
            .map_err(|e| DomainError::retrieval(format!("invalid query response: {e}")))?;

        let matches: Vec<ReviewMatch> = result
            .matches
            .into_iter()
            .take(top_k)
            .map(|m| ReviewMatch {
                professor: m.id,
                score: m.score,
                metadata: metadata_from(m.metadata),
            })
            .collect();

        tracing::debug!(count = matches.len(), "retrieved reviews");
        Ok(matches)
    }
}
