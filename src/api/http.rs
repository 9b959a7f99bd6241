//! reqwest implementation of the job and link APIs.

use super::sse::SseStream;
use super::types::{
    error_message, ConvertRequest, ConvertResponse, JobResults, JobStarted, LinkRequest,
    LinkResponse, PollOutcome, SubtreeRequest, SubtreeResponse,
};
use super::{JobApi, LinkApi};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::job_monitor::JobId;
use futures::StreamExt;
use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

pub const SESSION_COOKIE_NAME: &str = "hardlink_session";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Hardlink UI server client
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
    session_cookie: Option<String>,
}

impl HttpApi {
    pub fn new(server_url: &str) -> Result<Self> {
        // Url::join drops the last segment unless the base ends with '/'
        let mut base = server_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url,
            session_cookie: None,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = Self::new(&config.server_url)?;
        Ok(match &config.session_cookie {
            Some(cookie) if !cookie.is_empty() => api.with_session_cookie(cookie.clone()),
            _ => api,
        })
    }

    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.session_cookie {
            Some(cookie) => builder.header(COOKIE, format!("{}={}", SESSION_COOKIE_NAME, cookie)),
            None => builder,
        }
    }

    fn job_request(&self, path: &str, job_id: &JobId) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        Ok(self
            .request(Method::GET, url)
            .query(&[("job_id", job_id.as_str())]))
    }
}

impl JobApi for HttpApi {
    type Subscription = SseStream;

    async fn start_job(&self) -> Result<JobId> {
        let url = self.endpoint("api/duplicates/scan")?;
        let response = ensure_success(self.request(Method::GET, url).send().await?).await?;
        let started: JobStarted = decode_body(response).await?;

        if started.job_id.is_empty() {
            return Err(ClientError::Other("No job ID returned".to_string()));
        }
        debug!(component = "http-api", job_id = %started.job_id, "Scan job started");
        Ok(JobId::new(started.job_id))
    }

    async fn subscribe(&self, job_id: &JobId) -> Result<SseStream> {
        let response = self
            .job_request("api/duplicates/progress", job_id)?
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = ensure_success(response).await?;
        debug!(component = "http-api", job_id = %job_id, "Progress stream connected");

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ClientError::from));
        Ok(SseStream::new(chunks))
    }

    async fn poll_result(&self, job_id: &JobId) -> Result<PollOutcome> {
        let response = self
            .job_request("api/duplicates/results", job_id)?
            .send()
            .await?;
        let status = response.status();
        trace!(component = "http-api", job_id = %job_id, status = status.as_u16(), "Poll response");

        if status.is_success() {
            let results: JobResults = decode_body(response).await?;
            return Ok(PollOutcome::Completed(results.items));
        }

        let message = error_message(&response.text().await?);
        if status == StatusCode::BAD_REQUEST {
            // The server answers 400 for any job that is not completed, failed ones included
            if message.contains("status: failed") {
                return Ok(PollOutcome::Failed(message));
            }
            return Ok(PollOutcome::NotReady(message));
        }

        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl LinkApi for HttpApi {
    async fn link(&self, source: &str, dest: &str) -> Result<LinkResponse> {
        let url = self.endpoint("api/create-hardlink")?;
        let response = self
            .request(Method::POST, url)
            .json(&LinkRequest { source, dest })
            .send()
            .await?;
        decode_body(response).await
    }

    async fn link_subtree(&self, source_root: &str, dest_root: &str) -> Result<SubtreeResponse> {
        let url = self.endpoint("api/create-hardlinks-folder")?;
        let response = self
            .request(Method::POST, url)
            .json(&SubtreeRequest {
                source: source_root,
                dest_root,
            })
            .send()
            .await?;
        decode_body(response).await
    }

    async fn convert(&self, request: &ConvertRequest) -> Result<ConvertResponse> {
        let url = self.endpoint("api/duplicates/convert")?;
        let response = self.request(Method::POST, url).json(request).send().await?;
        decode_body(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Decode a JSON body. Error statuses still carry `{ok, error}` bodies on the
/// link endpoints, so the body is tried first and the status reported only
/// when it does not parse.
async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    match serde_json::from_str::<T>(&body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Err(ClientError::Status {
            status: status.as_u16(),
            message: error_message(&body),
        }),
        Err(e) => Err(e.into()),
    }
}
