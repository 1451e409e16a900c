//! # Sanity Client
//!
//! [`DocumentStore`] over the Sanity HTTP API.
//!
//! Reads go through the GROQ query endpoint with every filter value passed
//! as a query parameter, never spliced into the query text. Writes go
//! through the mutate endpoint with `returnDocuments=true`.

use crate::config::SanityConfig;
use crate::image::image_url;
use async_trait::async_trait;
use rental_core::{DocumentStore, Query, Reference, RentalError, RentalResult};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, instrument};

pub struct SanityClient {
    config: SanityConfig,
    client: Client,
}

impl SanityClient {
    pub fn new(config: SanityConfig) -> RentalResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RentalError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn from_env() -> RentalResult<Self> {
        Self::new(SanityConfig::from_env()?)
    }

    pub fn config(&self) -> &SanityConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn mutate(&self, mutation: Value) -> RentalResult<Option<MutationResponse>> {
        let request = self
            .client
            .post(self.config.mutate_url())
            .query(&[("returnDocuments", "true"), ("visibility", "sync")])
            .json(&json!({ "mutations": [mutation] }));

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            error!(%status, body = %body, "Sanity mutation failed");
            return Err(RentalError::Store(upstream_message(status, &body)));
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| RentalError::Serialization(format!("Failed to parse Sanity response: {}", e)))
    }
}

/// GROQ text and parameters for `query`
pub fn build_groq(query: &Query) -> RentalResult<(String, Vec<(String, String)>)> {
    let mut clauses = vec!["_type == $type".to_string()];
    let mut params = vec![("$type".to_string(), Value::String(query.doc_type.clone()).to_string())];

    for (i, filter) in query.filters.iter().enumerate() {
        let valid_path = !filter.path.is_empty()
            && filter
                .path
                .split('.')
                .all(|seg| !seg.is_empty() && seg.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        if !valid_path {
            return Err(RentalError::InvalidRequest(format!(
                "invalid filter path: {}",
                filter.path
            )));
        }
        clauses.push(format!("{} == $p{}", filter.path, i));
        params.push((format!("$p{}", i), filter.value.to_string()));
    }

    Ok((format!("*[{}]", clauses.join(" && ")), params))
}

fn upstream_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<SanityErrorResponse>(body)
        .ok()
        .and_then(|r| r.error.description.or(r.message))
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(default)]
    results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    #[serde(default)]
    document: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SanityErrorResponse {
    #[serde(default)]
    error: SanityError,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SanityError {
    #[serde(default)]
    description: Option<String>,
}

#[async_trait]
impl DocumentStore for SanityClient {
    #[instrument(skip(self, query), fields(doc_type = %query.doc_type))]
    async fn query(&self, query: &Query) -> RentalResult<Vec<Value>> {
        let (groq, params) = build_groq(query)?;
        debug!(groq = %groq, "Querying Sanity");

        let request = self
            .client
            .get(self.config.query_url())
            .query(&[("query", groq.as_str())])
            .query(&params);

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RentalError::Network(e.to_string()))?;

        if !status.is_success() {
            error!(%status, body = %body, "Sanity query failed");
            return Err(RentalError::Store(upstream_message(status, &body)));
        }

        let parsed: QueryResponse = serde_json::from_str(&body).map_err(|e| {
            RentalError::Serialization(format!("Failed to parse Sanity response: {}", e))
        })?;
        Ok(parsed.result)
    }

    #[instrument(skip(self, doc))]
    async fn create(&self, doc_type: &str, mut doc: Value) -> RentalResult<Value> {
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| RentalError::InvalidRequest("document must be a JSON object".into()))?;
        obj.insert("_type".into(), Value::String(doc_type.to_string()));

        let response = self
            .mutate(json!({ "create": doc }))
            .await?
            .ok_or_else(|| RentalError::Store("create returned no result".to_string()))?;

        response
            .results
            .into_iter()
            .find_map(|r| r.document)
            .ok_or_else(|| RentalError::Store("create returned no document".to_string()))
    }

    #[instrument(skip(self, set))]
    async fn patch(&self, id: &str, set: Map<String, Value>) -> RentalResult<Option<Value>> {
        let Some(response) = self
            .mutate(json!({ "patch": { "id": id, "set": set } }))
            .await?
        else {
            return Ok(None);
        };
        Ok(response.results.into_iter().find_map(|r| r.document))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> RentalResult<bool> {
        let Some(response) = self.mutate(json!({ "delete": { "id": id } })).await? else {
            return Ok(false);
        };
        Ok(!response.results.is_empty())
    }

    fn image_url(&self, asset: &Reference) -> Option<String> {
        image_url(&self.config.project_id, &self.config.dataset, &asset.id)
    }

    fn backend_name(&self) -> &'static str {
        "sanity"
    }
}
