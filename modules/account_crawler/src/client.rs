use crate::configuration::CrawlerConfig;
use crate::gate::RequestGate;
use async_trait::async_trait;
use harbour_common::AccountRecord;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const API_KEY_HEADER: &str = "X-API-Key";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to initialize HTTP client: {0}")]
    ClientInit(#[from] reqwest::Error),

    #[error("Request to {0} failed: {1}")]
    RequestFailed(String, reqwest::Error),

    #[error("Request to {0} failed: HTTP status {1}")]
    InvalidStatusCode(String, reqwest::StatusCode),

    #[error("Request to {url} rejected by the API with code {code}: {message}")]
    Api {
        url: String,
        code: i64,
        message: String,
    },

    #[error("Response from {0} has no data")]
    MissingData(String),

    #[error("Cannot decode response from {0}: {1}")]
    Decode(String, reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
}

/// Request body for one page of the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    /// Rows per page
    pub row: u32,
    pub order: SortOrder,
    /// Zero based page index
    pub page: u64,
}

impl PageRequest {
    pub fn ascending(page: u64, row: u32) -> Self {
        Self {
            row,
            order: SortOrder::Asc,
            page,
        }
    }
}

/// The `data` section of a page response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountPage {
    /// Size of the whole collection at the time of the request
    pub count: u64,

    /// The API sends `null` for pages past the end
    #[serde(default, deserialize_with = "null_as_empty")]
    pub list: Vec<AccountRecord>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<AccountRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<AccountRecord>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
    data: Option<AccountPage>,
}

/// Anything that can serve pages of the account collection
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest) -> Result<AccountPage, TransportError>;
}

/// Subscan style paginated API, called through a request gate
pub struct SubscanClient {
    client: Client,
    gate: RequestGate,
    url: String,
    api_key: String,
}

impl SubscanClient {
    pub fn new(config: &CrawlerConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            gate: RequestGate::new(config.request_interval()),
            url: config.url(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageSource for SubscanClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<AccountPage, TransportError> {
        let http_request = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .build()
            .map_err(|e| TransportError::RequestFailed(self.url.clone(), e))?;

        let envelope = self
            .gate
            .send(|| async {
                debug!("Requesting page {} from {}", request.page, self.url);
                let response = self
                    .client
                    .execute(http_request)
                    .await
                    .map_err(|e| TransportError::RequestFailed(self.url.clone(), e))?;

                if !response.status().is_success() {
                    return Err(TransportError::InvalidStatusCode(
                        self.url.clone(),
                        response.status(),
                    ));
                }

                response
                    .json::<Envelope>()
                    .await
                    .map_err(|e| TransportError::Decode(self.url.clone(), e))
            })
            .await?;

        if envelope.code != 0 {
            return Err(TransportError::Api {
                url: self.url.clone(),
                code: envelope.code,
                message: envelope.message,
            });
        }

        envelope.data.ok_or_else(|| TransportError::MissingData(self.url.clone()))
    }
}
