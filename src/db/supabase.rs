//! Supabase backend: PostgREST for checklist records, Storage for uploads.

use crate::config::Config;
use crate::db::{blob_path, BlobKind, BlobStore, ChecklistStore, StoreError};
use crate::domain::models::{ChecklistId, ChecklistSummary};
use crate::domain::record::Record;
use async_trait::async_trait;
use reqwest::{header, RequestBuilder, Response};
use serde_json::Value;

const SUMMARY_COLUMNS: &str = "id,ragione_sociale,created_at,status";

#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
    bucket: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_key.clone(),
            table: config.table.clone(),
            bucket: config.bucket.clone(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", self.api_key.as_str())
            .bearer_auth(&self.api_key)
    }

    async fn rows(resp: Response) -> Result<Vec<Record>, StoreError> {
        let resp = check_status(resp).await?;
        let rows: Vec<Record> = resp
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        Ok(rows)
    }
}

async fn check_status(resp: Response) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StoreError::Unavailable(format!("{status}: {body}")))
}

#[async_trait]
impl ChecklistStore for SupabaseClient {
    async fn insert(&self, record: Record) -> Result<ChecklistId, StoreError> {
        let resp = self
            .authorized(self.http.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        let rows = Self::rows(resp).await?;
        let id = rows
            .first()
            .and_then(|row| row.get("id"))
            .cloned()
            .ok_or_else(|| StoreError::Malformed("insert returned no id".to_string()))?;
        serde_json::from_value(id).map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn update(&self, id: ChecklistId, record: Record) -> Result<(), StoreError> {
        let resp = self
            .authorized(self.http.patch(self.table_url()))
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await?;
        if Self::rows(resp).await?.is_empty() {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn select(&self, id: ChecklistId) -> Result<Record, StoreError> {
        let resp = self
            .authorized(self.http.get(self.table_url()))
            .query(&[("id", format!("eq.{id}")), ("select", "*".to_string())])
            .send()
            .await?;
        Self::rows(resp)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound(id))
    }

    async fn select_summaries(&self, limit: usize) -> Result<Vec<ChecklistSummary>, StoreError> {
        let resp = self
            .authorized(self.http.get(self.table_url()))
            .query(&[
                ("select", SUMMARY_COLUMNS.to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let rows: Vec<Value> = resp
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| StoreError::Malformed(e.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl BlobStore for SupabaseClient {
    async fn upload(
        &self,
        kind: BlobKind,
        bytes: Vec<u8>,
        original_name: &str,
    ) -> Result<String, StoreError> {
        let path = blob_path(kind, original_name, chrono::Local::now());
        let mime = mime_guess::from_path(original_name).first_or_octet_stream();
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);

        let resp = self
            .authorized(self.http.post(url))
            .header(header::CONTENT_TYPE, mime.essence_str())
            .body(bytes)
            .send()
            .await?;
        check_status(resp).await?;

        tracing::info!("Uploaded {} to {}", original_name, path);
        Ok(self.public_url(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            supabase_url: "https://demo.supabase.co/".to_string(),
            supabase_key: "anon".to_string(),
            openai_api_key: "sk-test".to_string(),
            table: "checklists".to_string(),
            bucket: "checklist-files".to_string(),
            transcription_language: "it".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }

    #[test]
    fn test_urls() {
        let client = SupabaseClient::new(&config());
        assert_eq!(client.table_url(), "https://demo.supabase.co/rest/v1/checklists");
        assert_eq!(
            client.public_url("luoghi_lavoro/20240502_091530_a.jpg"),
            "https://demo.supabase.co/storage/v1/object/public/checklist-files/luoghi_lavoro/20240502_091530_a.jpg"
        );
    }
}
