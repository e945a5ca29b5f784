//! # REST Gateway
//!
//! Serves condition translation over HTTP for the fitted pipelines loaded at
//! startup. Prediction and explanation generation happen upstream; the
//! gateway only translates explanations it is handed.

pub mod models;
mod server;

pub use models::{
    ErrorResponse, FeaturesResponse, PipelinesResponse, TranslateRequest, TranslateResponse,
};
pub use server::{ApiError, GatewayState, SharedGateway, router as gateway_router, run as run_gateway};
