//! Request and response bodies for the gateway REST API.

use crate::condition::ExplanationItem;
use serde::{Deserialize, Serialize};

/// Body of `POST /translate/{pipeline}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateRequest {
    /// Raw `(condition, weight)` pairs in transformed feature space.
    pub lime_explanation: Vec<ExplanationItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub pipeline_name: String,
    pub lime_explanation: Vec<ExplanationItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelinesResponse {
    pub pipelines: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesResponse {
    pub pipeline_name: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
