//! Engine wire format and response normalization
//!
//! The analysis server is not consistent about its payloads: the search path
//! answers in camelCase (`bestMoves`, `searchInfo`, `totalTime`), the opening
//! book path in snake_case (`best_moves`, `search_info`, `time_ms`), some
//! moves carry both spellings at once, and `evaluation` is either an object
//! or a bare number. Every spelling is read into its own optional field here
//! and [`normalize`] folds them into the canonical [`AnalysisResult`].
//!
//! Missing fields are never an error. Only a non-success `status` is.

use crate::analysis::{
    format_evaluation, AnalysisResult, Evaluation, MoveInfo, SearchInfo, DEFAULT_SOURCE,
};
use crate::core::{AnalysisError, AnalyzerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /analyze`
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequestBody<'a> {
    pub fen: &'a str,
    pub depth: u32,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HealthResponse {
    pub status: Option<String>,
}

impl HealthResponse {
    pub fn is_ok(&self) -> bool {
        self.status.as_deref() == Some("ok")
    }
}

/// Raw `POST /analyze` payload, every spelling kept apart
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAnalysis {
    pub status: Option<String>,
    pub error: Option<String>,
    pub evaluation: Option<RawEvaluation>,
    pub depth: Option<u32>,
    #[serde(rename = "bestMoves")]
    pub best_moves: Option<Vec<RawMove>>,
    #[serde(rename = "best_moves")]
    pub best_moves_snake: Option<Vec<RawMove>>,
    #[serde(rename = "searchInfo")]
    pub search_info: Option<RawSearchInfo>,
    #[serde(rename = "search_info")]
    pub search_info_snake: Option<RawSearchInfo>,
}

/// `evaluation` is an object on the search path and a bare number elsewhere
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawEvaluation {
    Score(f64),
    Detailed(Evaluation),
}

impl From<RawEvaluation> for Evaluation {
    fn from(raw: RawEvaluation) -> Self {
        match raw {
            RawEvaluation::Score(value) => Evaluation::new(value),
            RawEvaluation::Detailed(evaluation) => evaluation,
        }
    }
}

/// A move's evaluation is a display string on the search path, a number on the book path
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMoveEvaluation {
    Display(String),
    Score(f64),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMove {
    #[serde(rename = "move")]
    pub mv: Option<String>,
    pub san: Option<String>,
    pub evaluation: Option<RawMoveEvaluation>,
    #[serde(rename = "evaluationRaw")]
    pub evaluation_raw: Option<f64>,
    pub eval_score: Option<f64>,
    #[serde(rename = "principalVariation")]
    pub principal_variation: Option<Vec<String>>,
    #[serde(rename = "principal_variation")]
    pub principal_variation_snake: Option<Vec<String>>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchInfo {
    pub depth: Option<u32>,
    #[serde(rename = "totalTime")]
    pub total_time: Option<u64>,
    pub time_ms: Option<u64>,
    #[serde(rename = "totalNodes")]
    pub total_nodes: Option<u64>,
    pub nodes: Option<u64>,
    #[serde(rename = "nodesPerSecond")]
    pub nodes_per_second: Option<u64>,
    pub nps: Option<u64>,
    pub source: Option<String>,
    #[serde(rename = "ttHits")]
    pub tt_hits: Option<u64>,
    #[serde(rename = "betaCutoffs")]
    pub beta_cutoffs: Option<u64>,
}

/// Body of an error response, whatever the HTTP status
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawErrorBody {
    pub status: Option<String>,
    pub error: Option<String>,
}

impl RawErrorBody {
    /// Remote message when the body explicitly reports `status: "error"`
    pub fn engine_message(&self) -> Option<String> {
        if self.status.as_deref() == Some("error") {
            Some(
                self.error
                    .clone()
                    .unwrap_or_else(|| "Unknown engine error from server".to_string()),
            )
        } else {
            None
        }
    }
}

/// Fold a raw payload into the canonical result shape
///
/// A missing `status` is read as success; any other value than `"success"`
/// fails with `EngineError` carrying the remote message.
pub fn normalize(raw: RawAnalysis, now: DateTime<Utc>) -> AnalyzerResult<AnalysisResult> {
    if let Some(status) = raw.status.as_deref() {
        if status != "success" {
            return Err(AnalysisError::engine(
                raw.error
                    .unwrap_or_else(|| "Unknown engine error from server".to_string()),
            ));
        }
    }

    let evaluation = raw.evaluation.map(Evaluation::from).unwrap_or_default();
    let best_moves = raw
        .best_moves
        .or(raw.best_moves_snake)
        .unwrap_or_default()
        .into_iter()
        .map(normalize_move)
        .collect();

    let mut search_info = raw
        .search_info
        .or(raw.search_info_snake)
        .map(normalize_search_info)
        .unwrap_or_default();
    if search_info.depth == 0 {
        search_info.depth = raw.depth.unwrap_or_default();
    }

    Ok(AnalysisResult {
        success: true,
        evaluation,
        best_moves,
        search_info,
        timestamp: now,
        cache: None,
    })
}

fn normalize_move(raw: RawMove) -> MoveInfo {
    let (display, score) = match raw.evaluation {
        Some(RawMoveEvaluation::Display(display)) => (Some(display), None),
        Some(RawMoveEvaluation::Score(score)) => (Some(format_evaluation(score)), Some(score)),
        None => (None, None),
    };
    let evaluation_raw = raw.evaluation_raw.or(raw.eval_score).or(score);

    MoveInfo {
        mv: raw.mv.unwrap_or_default(),
        san: raw.san,
        evaluation: display.or_else(|| evaluation_raw.map(format_evaluation)),
        evaluation_raw,
        principal_variation: raw
            .principal_variation
            .or(raw.principal_variation_snake)
            .unwrap_or_default(),
        depth: raw.depth.unwrap_or_default(),
        nodes: raw.nodes.unwrap_or_default(),
    }
}

fn normalize_search_info(raw: RawSearchInfo) -> SearchInfo {
    SearchInfo {
        depth: raw.depth.unwrap_or_default(),
        total_time: raw.total_time.or(raw.time_ms).unwrap_or_default(),
        total_nodes: raw.total_nodes.or(raw.nodes).unwrap_or_default(),
        nodes_per_second: raw.nodes_per_second.or(raw.nps).unwrap_or_default(),
        source: raw.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        tt_hits: raw.tt_hits,
        beta_cutoffs: raw.beta_cutoffs,
    }
}
