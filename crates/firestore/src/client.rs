//! Blocking Firestore REST client.
//!
//! Talks to `https://firestore.googleapis.com/v1` documents endpoints: GET
//! for single reads, `:runQuery` for filtered listing and PATCH with an
//! update mask for merge writes, which keeps every write idempotent.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

use roadreport_core::documents::{Document, DocumentStore};
use roadreport_core::errors::{DocumentStoreError, Result};
use roadreport_core::Error;

use crate::value::{decode_fields, encode_fields, encode_value};

const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database_id: String,
    pub base_url: String,
    /// OAuth bearer token; `None` targets an emulator or open rules.
    pub bearer_token: Option<String>,
    pub timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: "(default)".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            bearer_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
}

impl FirestoreClient {
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DocumentStoreError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn documents_root(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents",
            self.config.base_url, self.config.project_id, self.config.database_id
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .map_err(|e| DocumentStoreError::Transport(e.to_string()))?;
        Ok(response)
    }

    /// Consume a response, mapping non-2xx statuses to an API error carrying
    /// the server's `error.message` when present.
    fn read_json(&self, response: Response) -> Result<Value> {
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| DocumentStoreError::Transport(e.to_string()))?;
        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|parsed| {
                    parsed
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(body);
            return Err(DocumentStoreError::api(status.as_u16(), message).into());
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::from(DocumentStoreError::shape(e.to_string())))
    }
}

fn decode_document(value: &Value) -> Result<Document> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| DocumentStoreError::shape("document without a name"))?;
    let id = name.rsplit('/').next().unwrap_or(name);
    let fields = value
        .get("fields")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Ok(Document::new(id, decode_fields(&fields)?))
}

impl DocumentStore for FirestoreClient {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let url = format!("{}/{collection}/{id}", self.documents_root());
        let response = self.send(self.authorize(self.http.get(&url)))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = self.read_json(response)?;
        Ok(Some(decode_document(&body)?))
    }

    fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Document>> {
        let url = format!("{}:runQuery", self.documents_root());
        let query = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection }],
                "where": { "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": encode_value(value),
                }},
            }
        });
        let response = self.send(self.authorize(self.http.post(&url)).json(&query))?;
        let body = self.read_json(response)?;

        // runQuery streams one entry per result; entries without a `document`
        // key only carry a read time.
        let mut documents = Vec::new();
        for row in body.as_array().map(Vec::as_slice).unwrap_or_default() {
            if let Some(document) = row.get("document") {
                documents.push(decode_document(document)?);
            }
        }
        log::debug!(
            "query {collection} where {field} == {value} returned {} document(s)",
            documents.len()
        );
        Ok(documents)
    }

    fn merge(&self, collection: &str, id: &str, fields: &Map<String, Value>) -> Result<()> {
        let url = format!("{}/{collection}/{id}", self.documents_root());
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|name| ("updateMask.fieldPaths", name.as_str()))
            .collect();
        let body = json!({ "fields": encode_fields(fields) });
        let response = self.send(
            self.authorize(self.http.patch(&url))
                .query(&mask)
                .json(&body),
        )?;
        self.read_json(response).map(|_| ())
    }
}
