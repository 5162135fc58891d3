//! Canonical analysis data shapes
//!
//! These are the plain-data types the UI layer reads back from the
//! orchestrator. Every field the UI displays is always populated: the wire
//! normalizer substitutes defaults rather than leaving fields out. Types
//! serialize in camelCase (`bestMoves`, `searchInfo`, `totalTime`, ...) so
//! they can be handed to a web front end unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Source tag used when the engine does not report one
pub const DEFAULT_SOURCE: &str = "python_engine";

/// Options for a single analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisOptions {
    /// Search depth requested from the engine, must be non-zero
    pub depth: u32,
    /// Serve from and store into the result cache
    pub use_cache: bool,
    /// Deadline for the engine round trip, must be non-zero
    #[serde(with = "duration_millis", rename = "timeoutMs")]
    pub timeout: Duration,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            depth: 8,
            use_cache: true,
            timeout: Duration::from_secs(60),
        }
    }
}

impl AnalysisOptions {
    pub fn new(depth: u32, use_cache: bool, timeout: Duration) -> Self {
        Self {
            depth,
            use_cache,
            timeout,
        }
    }

    /// Depth 6, cached, 60 s
    pub fn quick() -> Self {
        Self::new(6, true, Duration::from_secs(60))
    }

    /// Depth 12, uncached, 180 s
    pub fn deep() -> Self {
        Self::new(12, false, Duration::from_secs(180))
    }

    /// Depth 10, uncached, 90 s
    pub fn tactical() -> Self {
        Self::new(10, false, Duration::from_secs(90))
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Parameters handed to the transport for one `POST /analyze`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub depth: u32,
    pub timeout: Duration,
}

impl From<&AnalysisOptions> for AnalysisRequest {
    fn from(options: &AnalysisOptions) -> Self {
        Self {
            depth: options.depth,
            timeout: options.timeout,
        }
    }
}

/// Position evaluation in pawn units, from the side to move's engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Evaluation {
    #[serde(default)]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Score kind reported by the engine, e.g. `cp`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Evaluation {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }
}

/// One candidate move with its line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MoveInfo {
    /// Move in coordinate notation, e.g. `e2e4`
    #[serde(rename = "move")]
    pub mv: String,
    pub san: Option<String>,
    /// Display string such as `+0.35`
    pub evaluation: Option<String>,
    pub evaluation_raw: Option<f64>,
    pub principal_variation: Vec<String>,
    pub depth: u32,
    pub nodes: u64,
}

/// Search statistics for a completed analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInfo {
    pub depth: u32,
    /// Wall time spent by the engine in milliseconds
    pub total_time: u64,
    pub total_nodes: u64,
    pub nodes_per_second: u64,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tt_hits: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta_cutoffs: Option<u64>,
}

impl Default for SearchInfo {
    fn default() -> Self {
        Self {
            depth: 0,
            total_time: 0,
            total_nodes: 0,
            nodes_per_second: 0,
            source: DEFAULT_SOURCE.to_string(),
            tt_hits: None,
            beta_cutoffs: None,
        }
    }
}

/// When a result entered the cache and when it stops being served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStamp {
    pub cache_time: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Canonical result of one analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    pub evaluation: Evaluation,
    pub best_moves: Vec<MoveInfo>,
    pub search_info: SearchInfo,
    pub timestamp: DateTime<Utc>,
    /// Present when the result was served from the cache
    #[serde(flatten)]
    pub cache: Option<CacheStamp>,
}

impl AnalysisResult {
    /// Successful result with every field at its default
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            evaluation: Evaluation::default(),
            best_moves: Vec::new(),
            search_info: SearchInfo::default(),
            timestamp,
            cache: None,
        }
    }

    pub fn best_move(&self) -> Option<&MoveInfo> {
        self.best_moves.first()
    }

    /// Compare everything except the timestamp and cache stamp
    pub fn same_analysis(&self, other: &AnalysisResult) -> bool {
        self.success == other.success
            && self.evaluation == other.evaluation
            && self.best_moves == other.best_moves
            && self.search_info == other.search_info
    }
}

/// How a tracked analysis ended
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Completed(AnalysisResult),
    /// A newer request superseded this one, or it was cancelled
    Cancelled,
}

impl AnalysisOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AnalysisOutcome::Cancelled)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            AnalysisOutcome::Completed(result) => Some(result),
            AnalysisOutcome::Cancelled => None,
        }
    }

    pub fn into_result(self) -> Option<AnalysisResult> {
        match self {
            AnalysisOutcome::Completed(result) => Some(result),
            AnalysisOutcome::Cancelled => None,
        }
    }
}

/// One rung of a multi-depth ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthResult {
    pub depth: u32,
    pub result: AnalysisResult,
}

/// Past analysis kept in the history log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub position: String,
    pub result: AnalysisResult,
    pub options: AnalysisOptions,
    pub timestamp: DateTime<Utc>,
}

/// Snapshot of the result cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub expired_count: usize,
}

/// Descriptor of the engine as seen by this client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub name: String,
    pub version: String,
    pub author: String,
    pub is_ready: bool,
    pub server_url: String,
}

/// Descriptor reported by the server at `GET /engine-info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RemoteEngineInfo {
    pub name: String,
    pub version: String,
    pub author: String,
    pub features: Vec<String>,
    pub max_depth: Option<u32>,
    pub supported_formats: Vec<String>,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
