//! Engine module - Transport to the remote analysis server
//!
//! - [`EngineTransport`] - Trait the orchestrator depends on
//! - [`HttpEngineTransport`] - reqwest implementation against the JSON API
//! - [`wire`] - Raw response shapes and their normalization

pub mod http;
pub mod transport;
pub mod wire;

pub use http::HttpEngineTransport;
pub use transport::EngineTransport;
