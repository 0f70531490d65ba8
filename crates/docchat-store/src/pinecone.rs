//! Pinecone REST data-plane client.
//!
//! Records are keyed `{documentId}_chunk_{n}` with metadata
//! `{text, documentId, createdAt}`. Deletion lists ids by prefix and then
//! deletes them by id. Listing is serverless-only; when an index rejects it
//! (pod-based indexes) deletion falls back to a `documentId` metadata filter.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::store::VectorStore;
use crate::types::{IndexStats, RecordMetadata, VectorRecord};
use docchat_core::types::chunk_id_prefix;
use docchat_core::{Error, Result, SearchResult};

pub const PINECONE_CONTROL_URL: &str = "https://api.pinecone.io";

/// Pinecone caps a delete-by-ids request at 1000 ids.
const DELETE_BATCH: usize = 1000;
const LIST_PAGE: usize = 100;

pub struct PineconeStore {
    client: Client,
    api_key: Option<String>,
    index_name: Option<String>,
    control_url: String,
    host: OnceCell<String>,
}

impl PineconeStore {
    /// Missing credentials are reported by the first operation, not here.
    pub fn new(
        client: Client,
        api_key: Option<String>,
        index_name: Option<String>,
        host: Option<String>,
    ) -> Self {
        let cell = OnceCell::new();
        if let Some(h) = host {
            // set() only fails on an initialised cell
            let _ = cell.set(normalize_host(&h));
        }
        Self {
            client,
            api_key,
            index_name,
            control_url: PINECONE_CONTROL_URL.to_string(),
            host: cell,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Config("PINECONE_API_KEY is not set".into()))
    }

    /// Data-plane base URL, resolved through `describe_index` on first use.
    async fn host(&self) -> Result<&str> {
        self.host
            .get_or_try_init(|| async {
                let api_key = self.api_key()?;
                let index = self
                    .index_name
                    .as_deref()
                    .ok_or_else(|| Error::Config("PINECONE_INDEX_NAME is not set".into()))?;

                let url = format!("{}/indexes/{}", self.control_url, index);
                let response = self
                    .client
                    .get(&url)
                    .header("Api-Key", api_key)
                    .send()
                    .await
                    .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

                let response = check_status(response, Error::Config).await?;
                let described: DescribeIndex = response
                    .json()
                    .await
                    .map_err(|e| Error::StoreUnavailable(format!("bad describe_index body: {}", e)))?;

                info!(index, host = %described.host, "resolved Pinecone index host");
                Ok(normalize_host(&described.host))
            })
            .await
            .map(String::as_str)
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        on_reject: fn(String) -> Error,
    ) -> Result<Response> {
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.host().await?, path);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
        check_status(response, on_reject).await
    }

    /// All ids starting with `prefix`, or `None` if the index cannot list.
    async fn list_ids(&self, prefix: &str) -> Result<Option<Vec<String>>> {
        let api_key = self.api_key()?;
        let host = self.host().await?;
        let mut ids = Vec::new();
        let mut token: Option<String> = None;
        let limit = LIST_PAGE.to_string();

        loop {
            let mut request = self
                .client
                .get(format!("{}/vectors/list", host))
                .header("Api-Key", api_key)
                .query(&[("prefix", prefix), ("limit", limit.as_str())]);
            if let Some(t) = &token {
                request = request.query(&[("paginationToken", t.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::StoreUnavailable(e.to_string()))?;
            if listing_unsupported(response.status()) {
                debug!(status = %response.status(), "index does not support listing");
                return Ok(None);
            }
            let page: ListResponse = check_status(response, Error::Delete)
                .await?
                .json()
                .await
                .map_err(|e| Error::Delete(format!("bad list body: {}", e)))?;

            ids.extend(page.vectors.into_iter().map(|v| v.id));
            token = page.pagination.and_then(|p| p.next);
            if token.is_none() {
                break;
            }
        }
        Ok(Some(ids))
    }

    async fn delete_by_ids(&self, ids: &[String]) -> Result<usize> {
        for batch in ids.chunks(DELETE_BATCH) {
            self.post("/vectors/delete", &json!({ "ids": batch }), Error::Delete)
                .await?;
        }
        Ok(ids.len())
    }

    /// Pod-based path: count matching records, then delete by filter.
    async fn delete_by_filter(&self, document_id: &str) -> Result<usize> {
        let filter = document_filter(document_id);
        let counted: StatsResponse = self
            .post("/describe_index_stats", &json!({ "filter": filter }), Error::Delete)
            .await?
            .json()
            .await
            .map_err(|e| Error::Delete(format!("bad stats body: {}", e)))?;

        if counted.total_vector_count > 0 {
            self.post("/vectors/delete", &json!({ "filter": filter }), Error::Delete)
                .await?;
        }
        Ok(counted.total_vector_count as usize)
    }
}

/// Statuses Pinecone answers `/vectors/list` with on indexes that lack it.
fn listing_unsupported(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_REQUEST
            | StatusCode::NOT_FOUND
            | StatusCode::METHOD_NOT_ALLOWED
            | StatusCode::NOT_IMPLEMENTED
    )
}

fn document_filter(document_id: &str) -> serde_json::Value {
    json!({ "documentId": { "$eq": document_id } })
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn is_unavailable(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    )
}

async fn check_status(response: Response, on_reject: fn(String) -> Error) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    error!(%status, "Pinecone request failed");
    let message = format!("Pinecone returned {}: {}", status, body);
    if is_unavailable(status) {
        Err(Error::StoreUnavailable(message))
    } else {
        Err(on_reject(message))
    }
}

#[derive(Deserialize)]
struct DescribeIndex {
    host: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<UpsertVector<'a>>,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: RecordMetadata,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<RecordMetadata>,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    vectors: Vec<ListedId>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct ListedId {
    id: String,
}

#[derive(Deserialize)]
struct Pagination {
    next: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    dimension: Option<usize>,
    #[serde(default)]
    total_vector_count: u64,
}

fn query_body<'a>(vector: &'a [f32], document_id: Option<&str>, top_k: usize) -> QueryRequest<'a> {
    QueryRequest {
        vector,
        top_k,
        include_metadata: true,
        filter: document_id.map(document_filter),
    }
}

impl From<QueryMatch> for SearchResult {
    fn from(m: QueryMatch) -> Self {
        let metadata = m.metadata.unwrap_or_default();
        SearchResult {
            id: m.id,
            score: m.score,
            text: metadata.text,
            document_id: metadata.document_id,
        }
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        let body = UpsertRequest {
            vectors: vec![UpsertVector {
                id: &record.id,
                values: &record.values,
                metadata: record.metadata(),
            }],
        };
        self.post("/vectors/upsert", &body, Error::Upsert).await?;
        debug!(id = %record.id, "upserted vector");
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        document_id: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let body = query_body(vector, document_id, top_k);
        let parsed: QueryResponse = self
            .post("/query", &body, Error::Query)
            .await?
            .json()
            .await
            .map_err(|e| Error::Query(format!("bad query body: {}", e)))?;

        debug!(matches = parsed.matches.len(), "Pinecone query complete");
        Ok(parsed.matches.into_iter().map(SearchResult::from).collect())
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let removed = match self.list_ids(&chunk_id_prefix(document_id)).await? {
            Some(ids) => self.delete_by_ids(&ids).await?,
            None => self.delete_by_filter(document_id).await?,
        };
        info!(document_id, removed, "deleted document vectors");
        Ok(removed)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let parsed: StatsResponse = self
            .post("/describe_index_stats", &json!({}), Error::Query)
            .await?
            .json()
            .await
            .map_err(|e| Error::Query(format!("bad stats body: {}", e)))?;
        Ok(IndexStats {
            total_records: parsed.total_vector_count,
            dimension: parsed.dimension,
        })
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
