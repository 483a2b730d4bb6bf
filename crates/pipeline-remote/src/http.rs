//! reqwest-backed client for the clinic REST API.

use async_trait::async_trait;
use pipeline_core::{ApiConfig, PipelineError, PipelineResult};
use pipeline_domain::{
    Label, LabelFilter, NewLabel, NewOpportunity, Note, Opportunity, OpportunityId,
    OpportunityPatch, Stage, StageId,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::PipelineApi;

/// Error payload returned by the API: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct StageBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_position: Option<i32>,
}

#[derive(Serialize)]
struct NoteBody<'a> {
    opportunity_id: OpportunityId,
    content: &'a str,
}

pub struct HttpPipelineApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPipelineApi {
    pub fn new(config: &ApiConfig) -> PipelineResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| PipelineError::Config(format!("invalid API token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        reqwest::Url::parse(&config.base_url)
            .map_err(|e| PipelineError::Config(format!("invalid API url: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    async fn send(&self, request: RequestBuilder) -> PipelineResult<reqwest::Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> PipelineResult<T> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

fn transport_error(err: reqwest::Error) -> PipelineError {
    if err.is_timeout() {
        PipelineError::Transport("request timed out".to_string())
    } else if err.is_connect() {
        PipelineError::Transport(format!("could not reach the API: {err}"))
    } else {
        PipelineError::Transport(err.to_string())
    }
}

/// Map a non-success response to an error. 404 means the entity is gone;
/// everything else is a transport failure carrying the server's message.
fn status_error(status: StatusCode, body: &str) -> PipelineError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .ok()
        .filter(|m| !m.trim().is_empty())
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    if status == StatusCode::NOT_FOUND {
        PipelineError::NotFound(message)
    } else {
        PipelineError::Transport(format!("{} ({})", message, status.as_u16()))
    }
}

/// Decode labels one by one, skipping those with a color outside the palette.
fn decode_labels(values: Vec<serde_json::Value>, filter: LabelFilter) -> Vec<Label> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Label>(value) {
            Ok(label) => Some(label),
            Err(e) => {
                tracing::warn!("Skipping label the board cannot display: {}", e);
                None
            }
        })
        .filter(|label| filter.matches(label))
        .collect()
}

#[async_trait]
impl PipelineApi for HttpPipelineApi {
    async fn fetch_stages(&self) -> PipelineResult<Vec<Stage>> {
        self.send_json(self.request(Method::GET, "sales/stages"))
            .await
    }

    async fn fetch_opportunities(&self) -> PipelineResult<Vec<Opportunity>> {
        self.send_json(self.request(Method::GET, "sales/opportunities"))
            .await
    }

    async fn fetch_opportunity(&self, id: OpportunityId) -> PipelineResult<Opportunity> {
        self.send_json(self.request(Method::GET, &format!("sales/opportunities/{id}")))
            .await
    }

    async fn fetch_notes(&self, opportunity_id: OpportunityId) -> PipelineResult<Vec<Note>> {
        let path = format!("sales/opportunities/{opportunity_id}/notes");
        self.send_json(self.request(Method::GET, &path)).await
    }

    async fn create_stage(&self, name: String, order_position: i32) -> PipelineResult<Stage> {
        let body = StageBody {
            name: &name,
            order_position: Some(order_position),
        };
        self.send_json(self.request(Method::POST, "sales/stages").json(&body))
            .await
    }

    async fn rename_stage(&self, id: StageId, name: String) -> PipelineResult<Stage> {
        let body = StageBody {
            name: &name,
            order_position: None,
        };
        let path = format!("sales/stages/{id}");
        self.send_json(self.request(Method::PUT, &path).json(&body))
            .await
    }

    async fn delete_stage(&self, id: StageId) -> PipelineResult<()> {
        self.send(self.request(Method::DELETE, &format!("sales/stages/{id}")))
            .await?;
        Ok(())
    }

    async fn create_opportunity(&self, fields: NewOpportunity) -> PipelineResult<Opportunity> {
        self.send_json(self.request(Method::POST, "sales/opportunities").json(&fields))
            .await
    }

    async fn update_opportunity(
        &self,
        id: OpportunityId,
        patch: OpportunityPatch,
    ) -> PipelineResult<Opportunity> {
        let path = format!("sales/opportunities/{id}");
        self.send_json(self.request(Method::PUT, &path).json(&patch))
            .await
    }

    async fn delete_opportunity(&self, id: OpportunityId) -> PipelineResult<()> {
        let path = format!("sales/opportunities/{id}");
        self.send(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    async fn create_note(
        &self,
        opportunity_id: OpportunityId,
        body: String,
    ) -> PipelineResult<Note> {
        let body = NoteBody {
            opportunity_id,
            content: &body,
        };
        self.send_json(self.request(Method::POST, "sales/notes").json(&body))
            .await
    }

    async fn fetch_labels(&self, filter: LabelFilter) -> PipelineResult<Vec<Label>> {
        let request = self
            .request(Method::GET, "labels")
            .query(&[("is_active", "true")]);
        let values: Vec<serde_json::Value> = self.send_json(request).await?;
        Ok(decode_labels(values, filter))
    }

    async fn create_label(&self, label: NewLabel) -> PipelineResult<Label> {
        self.send_json(self.request(Method::POST, "labels").json(&label))
            .await
    }
}
