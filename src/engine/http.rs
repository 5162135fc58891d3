//! HTTP transport to the analysis server
//!
//! Implements [`EngineTransport`] over reqwest against the server's JSON API:
//!
//! | Endpoint            | Purpose                              |
//! |---------------------|--------------------------------------|
//! | `GET /health`       | Liveness probe, `{status: "ok"}`     |
//! | `POST /analyze`     | `{fen, depth}` → analysis payload     |
//! | `GET /engine-info`  | Engine descriptor                    |
//!
//! # Deadlines and aborts
//!
//! Every call is raced against a `tokio::time` deadline, and analysis calls
//! additionally against a [`CancellationToken`]. Whichever wins drops the
//! request future, which aborts the in-flight HTTP call.
//!
//! # Degraded mode
//!
//! The transport keeps a single `connected` flag. An analysis on a transport
//! that is not connected runs one health probe first; a connection failure
//! mid-request clears the flag again so the next call re-probes.

use super::transport::EngineTransport;
use super::wire::{self, AnalyzeRequestBody, HealthResponse, RawAnalysis, RawErrorBody};
use crate::analysis::{AnalysisRequest, AnalysisResult, EngineStatus, RemoteEngineInfo};
use crate::core::{AnalysisError, AnalyzerResult, ConfigResult, EngineConfig};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

const ENGINE_NAME: &str = "Python Chess Engine";
const ENGINE_VERSION: &str = "1.0";
const ENGINE_AUTHOR: &str = "Custom Engine";

/// reqwest-backed engine transport
#[derive(Debug)]
pub struct HttpEngineTransport {
    client: reqwest::Client,
    base_url: Url,
    health_check_timeout: Duration,
    connected: AtomicBool,
}

impl HttpEngineTransport {
    /// Build a transport from the engine section of the config
    pub fn new(config: &EngineConfig) -> ConfigResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("xfchess-analysis/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = config.base_url()?;
        info!("[ENGINE] Using analysis server at {}", base_url);
        Ok(Self::with_client(
            client,
            base_url,
            config.health_check_timeout(),
        ))
    }

    /// Build a transport around an existing client
    ///
    /// The base path is treated as a directory, so `http://host/engine`
    /// serves `http://host/engine/analyze`.
    pub fn with_client(
        client: reqwest::Client,
        mut base_url: Url,
        health_check_timeout: Duration,
    ) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            health_check_timeout,
            connected: AtomicBool::new(false),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AnalyzerResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AnalysisError::transport(format!("Invalid endpoint '{path}': {e}")))
    }

    /// One probe when not connected; marks the transport connected on success
    async fn ensure_connected(&self) -> AnalyzerResult<()> {
        if self.is_connected() {
            return Ok(());
        }

        warn!("[ENGINE] Not connected, probing engine before analysis");
        if !self.health_check().await {
            return Err(AnalysisError::engine_unavailable(
                "Engine not initialized and health check failed",
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        info!("[ENGINE] Engine reconnected after health check");
        Ok(())
    }

    async fn probe(&self) -> Result<bool, String> {
        let url = self.endpoint("health").map_err(|e| e.to_string())?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }

        let body = response
            .json::<HealthResponse>()
            .await
            .map_err(|e| e.to_string())?;
        Ok(body.is_ok())
    }

    async fn post_analysis(&self, url: Url, fen: &str, depth: u32) -> AnalyzerResult<AnalysisResult> {
        let response = self
            .client
            .post(url)
            .json(&AnalyzeRequestBody { fen, depth })
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.request_failed(e))?;

        if !status.is_success() {
            let engine_message = serde_json::from_str::<RawErrorBody>(&text)
                .ok()
                .and_then(|body| body.engine_message());
            return Err(match engine_message {
                Some(message) => AnalysisError::engine(message),
                None => AnalysisError::transport(format!(
                    "Server responded with status {status}: {text}"
                )),
            });
        }

        let raw: RawAnalysis = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::transport(format!("Malformed engine response: {e}")))?;
        wire::normalize(raw, Utc::now())
    }

    fn request_failed(&self, err: reqwest::Error) -> AnalysisError {
        if err.is_connect() {
            warn!("[ENGINE] Connection to engine lost: {}", err);
            self.connected.store(false, Ordering::SeqCst);
        }
        AnalysisError::from(err)
    }
}

#[async_trait]
impl EngineTransport for HttpEngineTransport {
    async fn health_check(&self) -> bool {
        match tokio::time::timeout(self.health_check_timeout, self.probe()).await {
            Ok(Ok(healthy)) => {
                if !healthy {
                    warn!("[ENGINE] Health check answered but engine is not ok");
                }
                healthy
            }
            Ok(Err(reason)) => {
                warn!("[ENGINE] Health check request failed: {}", reason);
                false
            }
            Err(_) => {
                warn!(
                    "[ENGINE] Health check timed out after {:?}",
                    self.health_check_timeout
                );
                false
            }
        }
    }

    async fn connect(&self) -> AnalyzerResult<()> {
        if self.health_check().await {
            self.connected.store(true, Ordering::SeqCst);
            info!("[ENGINE] Connected to analysis engine at {}", self.base_url);
            Ok(())
        } else {
            self.connected.store(false, Ordering::SeqCst);
            Err(AnalysisError::engine_unavailable(format!(
                "Could not connect to the analysis engine at {}",
                self.base_url
            )))
        }
    }

    async fn analyze_position(
        &self,
        fen: &str,
        request: AnalysisRequest,
        cancel: CancellationToken,
    ) -> AnalyzerResult<AnalysisResult> {
        self.ensure_connected().await?;
        let url = self.endpoint("analyze")?;
        let started = Instant::now();

        debug!(
            "[ENGINE] POST {} depth={} timeout={:?}",
            url, request.depth, request.timeout
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("[ENGINE] Analysis aborted after {:?}", started.elapsed());
                Err(AnalysisError::Aborted)
            }
            outcome = tokio::time::timeout(request.timeout, self.post_analysis(url, fen, request.depth)) => {
                match outcome {
                    Ok(result) => {
                        debug!("[ENGINE] Analysis finished in {:?}", started.elapsed());
                        result
                    }
                    Err(_) => {
                        warn!("[ENGINE] Analysis timed out after {:?}", request.timeout);
                        Err(AnalysisError::AnalysisTimeout { timeout: request.timeout })
                    }
                }
            }
        }
    }

    async fn remote_engine_info(&self) -> AnalyzerResult<RemoteEngineInfo> {
        let url = self.endpoint("engine-info")?;
        let fetch = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| self.request_failed(e))?;
            if !response.status().is_success() {
                return Err(AnalysisError::transport(format!(
                    "Server responded with status {}",
                    response.status()
                )));
            }
            Ok(response.json::<RemoteEngineInfo>().await?)
        };

        tokio::time::timeout(self.health_check_timeout, fetch)
            .await
            .map_err(|_| AnalysisError::AnalysisTimeout {
                timeout: self.health_check_timeout,
            })?
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        debug!("[ENGINE] Transport disconnected");
    }

    fn engine_info(&self) -> EngineStatus {
        EngineStatus {
            name: ENGINE_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            author: ENGINE_AUTHOR.to_string(),
            is_ready: self.is_connected(),
            server_url: self.base_url.to_string(),
        }
    }
}
