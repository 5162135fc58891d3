//! Analysis module - Position validation, caching and request orchestration
//!
//! # Architecture Overview
//!
//! ```text
//! UI ──▶ AnalysisOrchestrator ──▶ validate_fen
//!               │           ├───▶ ResultCache (FIFO, TTL stamped)
//!               │           └───▶ HistoryLog (newest first)
//!               ▼
//!        dyn EngineTransport ──▶ analysis server
//! ```
//!
//! The orchestrator owns the cache and the history log; the transport is
//! injected so tests can script engine behaviour.
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use xfchess_analysis::analysis::{AnalysisOptions, AnalysisOrchestrator};
//! use xfchess_analysis::engine::HttpEngineTransport;
//!
//! let transport = Arc::new(HttpEngineTransport::new(&config.engine)?);
//! let analyzer = AnalysisOrchestrator::with_config(transport, &config.cache);
//! analyzer.initialize().await?;
//! let outcome = analyzer.get_top_moves(fen, AnalysisOptions::default()).await?;
//! ```

pub mod cache;
pub mod fen;
pub mod format;
pub mod history;
pub mod orchestrator;
pub mod types;

pub use cache::{cache_key, CacheEntry, ResultCache};
pub use fen::{is_valid_fen, validate_fen, FenError};
pub use format::format_evaluation;
pub use history::HistoryLog;
pub use orchestrator::{AnalysisOrchestrator, OrchestratorState, DEFAULT_HISTORY_VIEW};
pub use types::*;
