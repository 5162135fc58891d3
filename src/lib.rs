pub mod analysis;
pub mod core;
pub mod engine;

pub use analysis::{AnalysisOptions, AnalysisOrchestrator, AnalysisOutcome, AnalysisResult};
pub use self::core::{AnalysisError, AnalyzerConfig};
pub use engine::{EngineTransport, HttpEngineTransport};
