// API client for intake-server

use anyhow::{Context as AnyhowContext, Result};
use intake_core::Envelope;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored record as returned by the server
pub type Record = Map<String, Value>;

pub struct ApiClient {
    client: Client,
    server_url: String,
}

impl ApiClient {
    pub fn new(server_url: String) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the server's PEM public key
    pub async fn public_key(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/public-key", self.server_url))
            .send()
            .await
            .context("Failed to fetch public key")?;

        let body: PublicKeyResponse = handle_response(response).await?;
        Ok(body.public_key)
    }

    /// Submit a sealed envelope
    pub async fn register(&self, envelope: &Envelope) -> Result<RegisterResponse> {
        let response = self
            .client
            .post(format!("{}/register", self.server_url))
            .json(envelope)
            .send()
            .await
            .context("Failed to send register request")?;

        handle_response(response).await
    }

    pub async fn list_records(&self) -> Result<Vec<Record>> {
        let response = self
            .client
            .get(format!("{}/api/records", self.server_url))
            .send()
            .await
            .context("Failed to send list request")?;

        handle_response(response).await
    }

    pub async fn get_record(&self, id: u64) -> Result<Record> {
        let response = self
            .client
            .get(format!("{}/api/records/{}", self.server_url, id))
            .send()
            .await
            .context("Failed to send get record request")?;

        handle_response(response).await
    }

    /// Merge `fields` into record `id`
    pub async fn update_record(&self, id: u64, fields: &Record) -> Result<MessageResponse> {
        let response = self
            .client
            .put(format!("{}/api/records/{}", self.server_url, id))
            .json(fields)
            .send()
            .await
            .context("Failed to send update request")?;

        handle_response(response).await
    }

    pub async fn delete_record(&self, id: u64) -> Result<MessageResponse> {
        let response = self
            .client
            .delete(format!("{}/api/records/{}", self.server_url, id))
            .send()
            .await
            .context("Failed to send delete request")?;

        handle_response(response).await
    }

    pub async fn predict_all(&self) -> Result<PredictAllResponse> {
        let response = self
            .client
            .post(format!("{}/api/predict_all", self.server_url))
            .send()
            .await
            .context("Failed to send predict request")?;

        handle_response(response).await
    }
}

// Response types

#[derive(Deserialize)]
struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    public_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub msg: String,
    pub id: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictAllResponse {
    pub msg: String,
    pub records: Vec<Record>,
}

/// Handle API response, surfacing the server's `msg` on failure
async fn handle_response<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Request failed ({status}): {}", error_message(&body));
    }

    response
        .json()
        .await
        .context("Failed to parse JSON response")
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<MessageResponse>(body)
        .map(|m| m.msg)
        .unwrap_or_else(|_| body.to_string())
}
