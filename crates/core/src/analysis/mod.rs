//! Lineup submission to the remote analysis service.

/// HTTP client for the analysis endpoint.
pub mod client;
/// Request and response shapes.
pub mod models;

pub use client::AnalysisClient;
pub use models::{
    AnalysisReport, AnalysisRequest, ChipSuggestion, Fixture, LineupEntry, TransferSuggestion,
};
