//! Client for the Copernicus retrieve API (CDS / ADS).
//!
//! A retrieval is a three step exchange:
//! - submit the request inputs as a processing job
//! - poll the job with exponential backoff until it settles
//! - look up the result asset and stream it to disk
//!
//! The asset is written to a hidden `.partial` file next to the target and
//! only renamed into place once the body has been fully received, so the
//! cache never sees a half-written entry under its final name.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use aq_common::Credentials;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use crate::error::{CacheError, Result};
use crate::fetcher::RemoteFetcher;
use crate::request::ForecastRequest;

const TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Configuration for [`CdsClient`].
#[derive(Debug, Clone)]
pub struct CdsClientConfig {
    /// Timeout of each individual HTTP request
    pub request_timeout: Duration,
    /// First delay between job polls (doubles each poll)
    pub initial_poll_delay: Duration,
    /// Upper bound on the delay between polls
    pub max_poll_delay: Duration,
    /// Give up on a job that has not settled after this long
    pub max_wait: Duration,
    /// Format requested from the archive
    pub data_format: String,
}

impl Default for CdsClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(600),
            initial_poll_delay: Duration::from_secs(1),
            max_poll_delay: Duration::from_secs(60),
            max_wait: Duration::from_secs(3 * 3600),
            data_format: "netcdf".to_string(),
        }
    }
}

/// State of a retrieve job as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Accepted,
    Running,
    Successful,
    Failed,
    Rejected,
    Dismissed,
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// The job will not change state any more.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            JobState::Successful | JobState::Failed | JobState::Rejected | JobState::Dismissed
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    #[serde(rename = "jobID")]
    pub job_id: String,
    pub status: JobState,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobResults {
    asset: Asset,
}

#[derive(Debug, Deserialize)]
struct Asset {
    value: AssetValue,
}

#[derive(Debug, Deserialize)]
struct AssetValue {
    href: String,
    #[serde(rename = "file:size", default)]
    size: Option<u64>,
}

/// Retrieve API client implementing [`RemoteFetcher`].
pub struct CdsClient {
    client: Client,
    credentials: Credentials,
    config: CdsClientConfig,
}

impl CdsClient {
    pub fn new(credentials: Credentials, config: CdsClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            credentials,
            config,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/retrieve/v1/{}",
            self.credentials.url.trim_end_matches('/'),
            path
        )
    }

    /// Submit a processing job for `request`.
    pub async fn submit(&self, request: &ForecastRequest) -> Result<JobStatus> {
        let url = self.api_url(&format!("processes/{}/execution", request.dataset));
        let body = json!({ "inputs": request.to_inputs(&self.config.data_format) });

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.credentials.key)
            .json(&body)
            .send()
            .await?;
        let job: JobStatus = parse_json(response).await?;

        info!(job_id = %job.job_id, dataset = %request.dataset, "Submitted retrieve job");
        Ok(job)
    }

    /// Current status of a job.
    pub async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let response = self
            .client
            .get(self.api_url(&format!("jobs/{}", job_id)))
            .header(TOKEN_HEADER, &self.credentials.key)
            .send()
            .await?;
        parse_json(response).await
    }

    /// Poll until the job settles, failing on anything but success.
    pub async fn wait(&self, mut job: JobStatus) -> Result<JobStatus> {
        let started = Instant::now();
        let mut delay = self.config.initial_poll_delay;

        while !job.status.is_settled() {
            if started.elapsed() > self.config.max_wait {
                return Err(CacheError::Timeout(job.job_id));
            }
            debug!(
                job_id = %job.job_id,
                status = ?job.status,
                delay_secs = delay.as_secs(),
                "Job pending"
            );
            tokio::time::sleep(delay).await;
            delay = std::cmp::min(delay * 2, self.config.max_poll_delay);
            job = self.status(&job.job_id).await?;
        }

        if job.status != JobState::Successful {
            return Err(CacheError::Job {
                job_id: job.job_id,
                status: format!("{:?}", job.status).to_lowercase(),
                message: job.message.unwrap_or_default(),
            });
        }
        Ok(job)
    }

    /// Download the result asset of a successful job to `target`.
    pub async fn download(&self, job_id: &str, target: &Path) -> Result<u64> {
        let response = self
            .client
            .get(self.api_url(&format!("jobs/{}/results", job_id)))
            .header(TOKEN_HEADER, &self.credentials.key)
            .send()
            .await?;
        let results: JobResults = parse_json(response).await?;
        let asset = results.asset.value;

        let response = self
            .client
            .get(&asset.href)
            .send()
            .await?
            .error_for_status()?;

        let partial = partial_path(target);
        if let Some(parent) = partial.parent() {
            fs::create_dir_all(parent).await?;
        }
        let written = receive_partial(response.bytes_stream(), &partial).await?;

        if let Some(expected) = asset.size {
            if expected != written {
                fs::remove_file(&partial).await.ok();
                return Err(CacheError::Fetch(format!(
                    "Download size mismatch: expected {} bytes, got {}",
                    expected, written
                )));
            }
        }

        if fs::rename(&partial, target).await.is_err() {
            let copied = fs::copy(&partial, target).await;
            fs::remove_file(&partial).await.ok();
            copied?;
        }
        Ok(written)
    }
}

#[async_trait]
impl RemoteFetcher for CdsClient {
    #[instrument(skip(self, request), fields(dataset = %request.dataset, dates = %request.date_range))]
    async fn fetch(&self, request: &ForecastRequest, target: &Path) -> Result<()> {
        let job = self.submit(request).await?;
        let job = self.wait(job).await?;
        let bytes = self.download(&job.job_id, target).await?;

        info!(
            job_id = %job.job_id,
            path = %target.display(),
            bytes = bytes,
            "Forecast downloaded"
        );
        Ok(())
    }
}

/// Hidden sibling of `target` used while the body is being received.
pub fn partial_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.partial", name))
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        warn!(status = %status, body = %body, "Retrieve API returned an error");
        return Err(CacheError::Fetch(format!("HTTP {}: {}", status, body)));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Write `stream` to the partial file, removing it again if the body is cut
/// short.
async fn receive_partial<S, B, E>(stream: S, partial: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    CacheError: From<E>,
{
    match stream_to_file(stream, partial).await {
        Ok(written) => Ok(written),
        Err(e) => {
            warn!(path = %partial.display(), error = %e, "Download interrupted");
            fs::remove_file(partial).await.ok();
            Err(e)
        }
    }
}

async fn stream_to_file<S, B, E>(stream: S, path: &Path) -> Result<u64>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    CacheError: From<E>,
{
    let mut file = fs::File::create(path).await?;
    futures::pin_mut!(stream);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk = chunk.as_ref();
        file.write_all(chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}
