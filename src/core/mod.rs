//! Core module - Errors and configuration shared by the analysis client
//!
//! # Architecture Overview
//!
//! - [`AnalysisError`] - Everything an analysis request can fail with
//! - [`ConfigError`] - Failures while loading, validating or saving config
//! - [`AnalyzerConfig`] - Engine endpoint, timeouts and cache bounds
//!
//! # Configuration Layers
//!
//! Later layers win:
//!
//! 1. Built-in defaults
//! 2. JSON file (`--config` or the platform config directory)
//! 3. `XFCHESS_*` environment variables (a `.env` file is honoured by the CLI)

pub mod config;
pub mod error;

pub use config::{default_config_path, AnalyzerConfig, CacheConfig, EngineConfig};
pub use error::{AnalysisError, AnalyzerResult, ConfigError, ConfigResult};
