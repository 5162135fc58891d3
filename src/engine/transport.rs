//! Engine transport abstraction
//!
//! The orchestrator talks to the engine only through [`EngineTransport`], so
//! the HTTP implementation can be swapped for a scripted one in tests.
//!
//! # Contract
//!
//! - [`EngineTransport::health_check`] never fails, it answers `false` instead
//! - [`EngineTransport::analyze_position`] probes connectivity once when the
//!   transport is not marked connected, then runs the request until it
//!   completes, its deadline elapses, or `cancel` fires
//! - Results come back already normalized to [`AnalysisResult`]

use crate::analysis::{AnalysisRequest, AnalysisResult, EngineStatus, RemoteEngineInfo};
use crate::core::AnalyzerResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Bridge to a remote analysis engine
#[async_trait]
pub trait EngineTransport: Send + Sync {
    /// Lightweight liveness probe
    async fn health_check(&self) -> bool;

    /// Probe the engine and mark the transport connected
    ///
    /// Fails with `EngineUnavailable` when the probe does not pass.
    async fn connect(&self) -> AnalyzerResult<()>;

    /// Analyse `fen` at the requested depth within the request's deadline
    async fn analyze_position(
        &self,
        fen: &str,
        request: AnalysisRequest,
        cancel: CancellationToken,
    ) -> AnalyzerResult<AnalysisResult>;

    /// Descriptor the server reports about itself
    async fn remote_engine_info(&self) -> AnalyzerResult<RemoteEngineInfo>;

    fn is_connected(&self) -> bool;

    /// Forget connectivity; the next analysis re-probes
    fn disconnect(&self);

    /// Local descriptor of this transport
    fn engine_info(&self) -> EngineStatus;
}
