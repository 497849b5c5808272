//! # nb-api-reqwest Implementation
//!
//! This module implements the `NoticeApi` port over the notice backend's
//! JSON endpoints:
//!
//! | Port method      | Request                        |
//! |------------------|--------------------------------|
//! | `insert_notice`  | `POST {base}/noticeInsert`     |
//! | `list_notices`   | `GET  {base}/noticeList`       |
//! | `get_notice`     | `GET  {base}/noticeContent/{no}` |

use async_trait::async_trait;
use nb_core::error::{NoticeError, Result};
use nb_core::models::{NoticeItem, NoticeNo, NoticePayload};
use nb_core::traits::NoticeApi;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct HttpNoticeApi {
    client: Client,
    /// Backend root, e.g. "http://localhost:8000"
    base_url: String,
}

impl HttpNoticeApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NoticeError::Transport(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn transport(e: reqwest::Error) -> NoticeError {
    NoticeError::Transport(e.to_string())
}

/// Rejects non-2xx statuses, then parses the body as JSON.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(NoticeError::Status(status.as_u16()));
    }
    let body = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&body).map_err(|e| NoticeError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl NoticeApi for HttpNoticeApi {
    async fn insert_notice(&self, payload: &NoticePayload) -> Result<NoticeNo> {
        let url = self.url("noticeInsert");
        tracing::debug!(%url, "inserting notice");

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(transport)?;

        let body: serde_json::Value = read_json(response).await?;
        body.get("notice_no")
            .and_then(NoticeNo::from_json)
            .ok_or(NoticeError::MissingNoticeNo)
    }

    async fn list_notices(&self) -> Result<Vec<NoticeItem>> {
        let response = self
            .client
            .get(self.url("noticeList"))
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    /// A 404 maps to `NotFound`. The stock backend wraps its own 404 in a
    /// catch-all handler, so a missing notice usually arrives as `Status(500)`.
    async fn get_notice(&self, no: &NoticeNo) -> Result<NoticeItem> {
        let response = self
            .client
            .get(self.url(&format!("noticeContent/{}", no)))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(NoticeError::NotFound(no.to_string()));
        }
        read_json(response).await
    }
}
