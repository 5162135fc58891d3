//! Analysis orchestrator
//!
//! Top-level façade the UI calls into. It validates input, consults the
//! result cache, sends requests through an injected [`EngineTransport`],
//! and makes sure only the latest tracked request gets to commit its result.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──initialize()──▶ Initializing ──ok──▶ Ready
//!       ▲                              │
//!       └────────────── failure ───────┘
//! ```
//!
//! # Single latest request wins
//!
//! Each tracked call mints a generation from a monotonically increasing
//! counter and records it, with a [`CancellationToken`], as the current
//! analysis. Issuing another tracked call or calling
//! [`AnalysisOrchestrator::cancel_current_analysis`] replaces or clears that
//! slot and fires the old token. When the older call resolves it finds its
//! generation is no longer current and reports [`AnalysisOutcome::Cancelled`]
//! without touching the cache or history.
//!
//! Untracked calls ([`AnalysisOrchestrator::background_analysis`] and the
//! rungs of [`AnalysisOrchestrator::multi_depth_analysis`]) never touch the
//! slot, so they neither supersede nor get superseded. Nothing coalesces
//! identical untracked requests; the cache keeps whichever lands last.
//!
//! # Locking
//!
//! All mutable state sits behind one `parking_lot::Mutex` that is only held
//! between awaits, never across one.

use super::cache::{cache_key, CacheEntry, ResultCache};
use super::fen::validate_fen;
use super::history::HistoryLog;
use super::types::{
    AnalysisOptions, AnalysisOutcome, AnalysisRequest, AnalysisResult, CacheStats, DepthResult,
    EngineStatus, HistoryEntry, RemoteEngineInfo,
};
use crate::core::{AnalysisError, AnalyzerResult, CacheConfig};
use crate::engine::EngineTransport;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// First rung of the multi-depth ladder
const LADDER_START_DEPTH: u32 = 4;
const LADDER_STEP: u32 = 2;
const LADDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of entries returned by [`AnalysisOrchestrator::history`]
pub const DEFAULT_HISTORY_VIEW: usize = 10;

/// Orchestrator readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Whether a request takes part in supersession
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracking {
    Tracked,
    Untracked,
}

/// The request currently allowed to commit its result
#[derive(Debug)]
struct TrackedAnalysis {
    generation: u64,
    cancel: CancellationToken,
}

#[derive(Debug)]
struct Inner {
    state: OrchestratorState,
    cache: ResultCache,
    history: HistoryLog,
    next_generation: u64,
    current: Option<TrackedAnalysis>,
}

/// Façade over validation, caching, history and the engine transport
pub struct AnalysisOrchestrator {
    transport: Arc<dyn EngineTransport>,
    cache_ttl: chrono::Duration,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for AnalysisOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisOrchestrator")
            .field("cache_ttl", &self.cache_ttl)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl AnalysisOrchestrator {
    /// Create an orchestrator with default cache bounds
    pub fn new(transport: Arc<dyn EngineTransport>) -> Self {
        Self::with_config(transport, &CacheConfig::default())
    }

    pub fn with_config(transport: Arc<dyn EngineTransport>, config: &CacheConfig) -> Self {
        Self {
            transport,
            cache_ttl: config.ttl(),
            inner: Mutex::new(Inner {
                state: OrchestratorState::Uninitialized,
                cache: ResultCache::new(config.max_size),
                history: HistoryLog::new(config.history_limit),
                next_generation: 0,
                current: None,
            }),
        }
    }

    pub fn state(&self) -> OrchestratorState {
        self.inner.lock().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == OrchestratorState::Ready
    }

    /// Connect the transport; a no-op once ready
    ///
    /// On failure the orchestrator goes back to `Uninitialized` and the error
    /// is `EngineUnavailable`.
    pub async fn initialize(&self) -> AnalyzerResult<()> {
        {
            let mut inner = self.inner.lock();
            if inner.state == OrchestratorState::Ready {
                debug!("[ANALYZER] Already initialized");
                return Ok(());
            }
            inner.state = OrchestratorState::Initializing;
        }

        match self.transport.connect().await {
            Ok(()) => {
                self.inner.lock().state = OrchestratorState::Ready;
                info!("[ANALYZER] Analyzer initialized");
                Ok(())
            }
            Err(e) => {
                self.inner.lock().state = OrchestratorState::Uninitialized;
                error!("[ANALYZER] Initialization failed: {}", e);
                Err(match e {
                    unavailable @ AnalysisError::EngineUnavailable { .. } => unavailable,
                    other => AnalysisError::engine_unavailable(other.to_string()),
                })
            }
        }
    }

    /// Analyse `position` as the tracked request, superseding any previous one
    pub async fn get_top_moves(
        &self,
        position: &str,
        options: AnalysisOptions,
    ) -> AnalyzerResult<AnalysisOutcome> {
        self.run(position, options, Tracking::Tracked).await
    }

    /// Analyse `position` without taking part in supersession
    pub async fn background_analysis(
        &self,
        position: &str,
        options: AnalysisOptions,
    ) -> AnalyzerResult<AnalysisResult> {
        match self.run(position, options, Tracking::Untracked).await? {
            AnalysisOutcome::Completed(result) => Ok(result),
            // Untracked generations are never compared
            AnalysisOutcome::Cancelled => Err(AnalysisError::Aborted),
        }
    }

    pub async fn quick_evaluation(&self, position: &str) -> AnalyzerResult<AnalysisOutcome> {
        self.get_top_moves(position, AnalysisOptions::quick()).await
    }

    pub async fn deep_analysis(&self, position: &str) -> AnalyzerResult<AnalysisOutcome> {
        self.get_top_moves(position, AnalysisOptions::deep()).await
    }

    pub async fn tactical_analysis(&self, position: &str) -> AnalyzerResult<AnalysisOutcome> {
        self.get_top_moves(position, AnalysisOptions::tactical()).await
    }

    /// Analyse at depths 4, 6, 8, ... up to `max_depth`, one after another
    ///
    /// Stops at the first failure and returns what was collected so far; the
    /// failure itself is only logged.
    pub async fn multi_depth_analysis(&self, position: &str, max_depth: u32) -> Vec<DepthResult> {
        let mut results = Vec::new();
        let mut rung = (LADDER_START_DEPTH <= max_depth).then_some(LADDER_START_DEPTH);

        while let Some(depth) = rung {
            let options = AnalysisOptions::new(depth, false, LADDER_TIMEOUT);
            match self.background_analysis(position, options).await {
                Ok(result) => results.push(DepthResult { depth, result }),
                Err(e) => {
                    warn!("[ANALYZER] Analysis failed at depth {}: {}", depth, e);
                    break;
                }
            }
            rung = next_rung(depth, max_depth);
        }

        results
    }

    /// Invalidate the tracked request so its resolution becomes `Cancelled`
    pub fn cancel_current_analysis(&self) {
        if let Some(current) = self.inner.lock().current.take() {
            info!(
                "[ANALYZER] Cancelling current analysis (generation {})",
                current.generation
            );
            current.cancel.cancel();
        }
    }

    /// Generation of the tracked request, if one is in flight
    pub fn current_generation(&self) -> Option<u64> {
        self.inner.lock().current.as_ref().map(|c| c.generation)
    }

    pub fn clear_cache(&self) {
        self.inner.lock().cache.clear();
        info!("[ANALYZER] Analysis cache cleared");
    }

    pub fn clear_history(&self) {
        self.inner.lock().history.clear();
        info!("[ANALYZER] Analysis history cleared");
    }

    /// Drop expired cache entries, returning how many were removed
    pub fn clean_expired_cache(&self) -> usize {
        let cleaned = self.inner.lock().cache.clean_expired(Utc::now());
        if cleaned > 0 {
            info!("[CACHE] Cleaned {} expired cache entries", cleaned);
        }
        cleaned
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.lock().cache.stats(Utc::now())
    }

    /// Up to `limit` past analyses, newest first
    pub fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        self.inner.lock().history.recent(limit)
    }

    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }

    /// Transport descriptor, ready only when both sides agree
    pub fn engine_status(&self) -> EngineStatus {
        let mut status = self.transport.engine_info();
        status.is_ready = status.is_ready && self.is_ready();
        status
    }

    pub async fn remote_engine_info(&self) -> AnalyzerResult<RemoteEngineInfo> {
        self.transport.remote_engine_info().await
    }

    /// Cancel work, drop cache and history, and disconnect the transport
    pub fn shutdown(&self) {
        self.cancel_current_analysis();
        {
            let mut inner = self.inner.lock();
            inner.cache.clear();
            inner.history.clear();
            inner.state = OrchestratorState::Uninitialized;
        }
        self.transport.disconnect();
        info!("[ANALYZER] Analyzer shut down");
    }

    async fn run(
        &self,
        position: &str,
        options: AnalysisOptions,
        tracking: Tracking,
    ) -> AnalyzerResult<AnalysisOutcome> {
        if !self.is_ready() {
            warn!("[ANALYZER] Not initialized, attempting to re-initialize");
            self.initialize().await.map_err(|_| {
                AnalysisError::engine_unavailable("Analysis failed: engine is not available")
            })?;
        }

        validate_options(&options)?;
        if let Err(reason) = validate_fen(position) {
            debug!("[ANALYZER] Rejected position '{}': {}", position, reason);
            return Err(AnalysisError::InvalidPosition {
                position: position.to_string(),
            });
        }

        let key = cache_key(position, options.depth);
        if options.use_cache {
            if let Some(cached) = self.live_cache_hit(&key) {
                debug!("[CACHE] Using cached analysis for {}", key);
                return Ok(AnalysisOutcome::Completed(cached));
            }
        }

        let (generation, cancel) = self.begin(tracking);
        info!(
            "[ANALYZER] Starting analysis (generation {}, depth {})",
            generation, options.depth
        );

        let mut slot = SlotRelease {
            inner: &self.inner,
            generation: (tracking == Tracking::Tracked).then_some(generation),
        };
        let resolution = self
            .transport
            .analyze_position(position, AnalysisRequest::from(&options), cancel)
            .await;

        let mut inner = self.inner.lock();
        slot.generation = None;
        let superseded = tracking == Tracking::Tracked
            && inner.current.as_ref().map(|c| c.generation) != Some(generation);
        if tracking == Tracking::Tracked && !superseded {
            inner.current = None;
        }

        if superseded {
            warn!("[ANALYZER] Analysis (generation {}) is stale", generation);
            return Ok(AnalysisOutcome::Cancelled);
        }

        match resolution {
            Ok(result) => {
                let now = Utc::now();
                if options.use_cache {
                    inner
                        .cache
                        .put(key, CacheEntry::new(result.clone(), now, self.cache_ttl));
                }
                inner.history.append(HistoryEntry {
                    position: position.to_string(),
                    result: result.clone(),
                    options,
                    timestamp: now,
                });
                info!(
                    "[ANALYZER] Analysis (generation {}) completed",
                    generation
                );
                Ok(AnalysisOutcome::Completed(result))
            }
            Err(e) => {
                error!("[ANALYZER] Analysis (generation {}) error: {}", generation, e);
                Err(e)
            }
        }
    }

    /// Live cached result with a refreshed timestamp
    fn live_cache_hit(&self, key: &str) -> Option<AnalysisResult> {
        let now = Utc::now();
        let inner = self.inner.lock();
        let entry = inner.cache.get(key)?;
        if entry.is_expired(now) {
            debug!("[CACHE] Entry {} expired, refetching", key);
            return None;
        }
        let mut result = entry.to_result();
        result.timestamp = now;
        Some(result)
    }

    /// Mint a generation; tracked requests replace and abort the current one
    fn begin(&self, tracking: Tracking) -> (u64, CancellationToken) {
        let mut inner = self.inner.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;
        let cancel = CancellationToken::new();

        if tracking == Tracking::Tracked {
            let previous = inner.current.replace(TrackedAnalysis {
                generation,
                cancel: cancel.clone(),
            });
            if let Some(previous) = previous {
                debug!(
                    "[ANALYZER] Generation {} supersedes {}",
                    generation, previous.generation
                );
                previous.cancel.cancel();
            }
        }

        (generation, cancel)
    }
}

/// Clears the tracked slot if the owning future is dropped mid-request
struct SlotRelease<'a> {
    inner: &'a Mutex<Inner>,
    generation: Option<u64>,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        if let Some(generation) = self.generation {
            let mut inner = self.inner.lock();
            if inner.current.as_ref().map(|c| c.generation) == Some(generation) {
                if let Some(current) = inner.current.take() {
                    current.cancel.cancel();
                }
            }
        }
    }
}

/// Depth after `depth` on the ladder, if it does not pass `max_depth`
fn next_rung(depth: u32, max_depth: u32) -> Option<u32> {
    depth
        .checked_add(LADDER_STEP)
        .filter(|next| *next <= max_depth)
}

fn validate_options(options: &AnalysisOptions) -> AnalyzerResult<()> {
    if options.depth == 0 {
        return Err(AnalysisError::InvalidOptions {
            message: "depth must be greater than zero".to_string(),
        });
    }
    if options.timeout.is_zero() {
        return Err(AnalysisError::InvalidOptions {
            message: "timeout must be greater than zero".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_options() {
        assert!(validate_options(&AnalysisOptions::default()).is_ok());
        assert!(matches!(
            validate_options(&AnalysisOptions::default().with_depth(0)),
            Err(AnalysisError::InvalidOptions { .. })
        ));
        assert!(matches!(
            validate_options(&AnalysisOptions::default().with_timeout(Duration::ZERO)),
            Err(AnalysisError::InvalidOptions { .. })
        ));
    }

    #[test]
    fn test_next_rung_stops_at_max_depth() {
        assert_eq!(next_rung(4, 10), Some(6));
        assert_eq!(next_rung(8, 10), Some(10));
        assert_eq!(next_rung(10, 11), None);
    }

    #[test]
    fn test_next_rung_does_not_overflow() {
        assert_eq!(next_rung(u32::MAX - 1, u32::MAX), None);
        assert_eq!(next_rung(u32::MAX, u32::MAX), None);
        assert_eq!(next_rung(u32::MAX - 3, u32::MAX), Some(u32::MAX - 1));
    }

    #[test]
    fn test_default_state() {
        assert_eq!(OrchestratorState::default(), OrchestratorState::Uninitialized);
    }
}
