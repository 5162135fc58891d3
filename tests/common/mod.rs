//! Scripted engine transport shared by the integration tests
//!
//! Replies are queued per call. A call with nothing queued succeeds at once
//! with a result whose evaluation equals the requested depth, which makes it
//! easy to tell results apart.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use xfchess_analysis::analysis::{
    AnalysisRequest, AnalysisResult, EngineStatus, Evaluation, MoveInfo, RemoteEngineInfo,
};
use xfchess_analysis::core::{AnalysisError, AnalyzerResult};
use xfchess_analysis::engine::EngineTransport;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

/// How the transport answers one `analyze_position` call
pub enum Reply {
    Result(AnalysisResult),
    Error(AnalysisError),
    /// Wait for the sender; the cancellation token aborts the wait
    Gated(oneshot::Receiver<AnalyzerResult<AnalysisResult>>),
    /// Wait for the sender and ignore the cancellation token
    GatedIgnoringCancel(oneshot::Receiver<AnalyzerResult<AnalysisResult>>),
}

/// Recorded `analyze_position` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub fen: String,
    pub depth: u32,
    pub timeout: Duration,
}

pub struct ScriptedTransport {
    healthy: AtomicBool,
    connected: AtomicBool,
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
    tokens: Mutex<Vec<CancellationToken>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            connected: AtomicBool::new(false),
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn unhealthy() -> Self {
        let transport = Self::new();
        transport.healthy.store(false, Ordering::SeqCst);
        transport
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().push_back(reply);
    }

    /// Queue a gated reply and return the sender that releases it
    pub fn push_gated(&self) -> oneshot::Sender<AnalyzerResult<AnalysisResult>> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Gated(rx));
        tx
    }

    pub fn push_gated_ignoring_cancel(&self) -> oneshot::Sender<AnalyzerResult<AnalysisResult>> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::GatedIgnoringCancel(rx));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Cancellation token handed to the `index`th call
    pub fn token(&self, index: usize) -> CancellationToken {
        self.tokens.lock()[index].clone()
    }

    /// Yield until `count` calls have reached the transport
    pub async fn wait_for_calls(&self, count: usize) {
        for _ in 0..1000 {
            if self.call_count() >= count {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("transport saw {} calls, expected {}", self.call_count(), count);
    }
}

/// Result with evaluation `value` and a single best move
pub fn sample_result(value: f64) -> AnalysisResult {
    let mut result = AnalysisResult::empty(Utc::now());
    result.evaluation = Evaluation::new(value);
    result.best_moves = vec![MoveInfo {
        mv: "e2e4".to_string(),
        san: Some("e4".to_string()),
        evaluation: Some(format!("+{value:.2}")),
        evaluation_raw: Some(value),
        principal_variation: vec!["e2e4".to_string(), "e7e5".to_string()],
        depth: value as u32,
        nodes: 1000,
    }];
    result.search_info.depth = value as u32;
    result
}

async fn await_gate(
    rx: oneshot::Receiver<AnalyzerResult<AnalysisResult>>,
) -> AnalyzerResult<AnalysisResult> {
    rx.await
        .unwrap_or_else(|_| Err(AnalysisError::transport("gate dropped")))
}

#[async_trait]
impl EngineTransport for ScriptedTransport {
    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> AnalyzerResult<()> {
        if self.health_check().await {
            self.connected.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            Err(AnalysisError::engine_unavailable("scripted engine is down"))
        }
    }

    async fn analyze_position(
        &self,
        fen: &str,
        request: AnalysisRequest,
        cancel: CancellationToken,
    ) -> AnalyzerResult<AnalysisResult> {
        self.calls.lock().push(Call {
            fen: fen.to_string(),
            depth: request.depth,
            timeout: request.timeout,
        });
        self.tokens.lock().push(cancel.clone());

        let reply = self.replies.lock().pop_front();
        match reply {
            None => Ok(sample_result(request.depth as f64)),
            Some(Reply::Result(result)) => Ok(result),
            Some(Reply::Error(err)) => Err(err),
            Some(Reply::Gated(rx)) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(AnalysisError::Aborted),
                    outcome = await_gate(rx) => outcome,
                }
            }
            Some(Reply::GatedIgnoringCancel(rx)) => await_gate(rx).await,
        }
    }

    async fn remote_engine_info(&self) -> AnalyzerResult<RemoteEngineInfo> {
        Ok(RemoteEngineInfo {
            name: "Scripted Engine".to_string(),
            version: "0.1".to_string(),
            max_depth: Some(20),
            ..Default::default()
        })
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn engine_info(&self) -> EngineStatus {
        EngineStatus {
            name: "Scripted Engine".to_string(),
            version: "0.1".to_string(),
            author: "tests".to_string(),
            is_ready: self.is_connected(),
            server_url: "memory://".to_string(),
        }
    }
}
