//! Material estimation client for the Batu Pasir Jaya storefront.
//!
//! Pure HTTP client for the Gemini `generateContent` API: one
//! structured-output request per call, strict parse, no retries.

mod error;
mod gemini;
mod types;

pub use error::{EstimateError, Result};
pub use gemini::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, EstimatorClient, EstimatorConfig,
};
pub use types::EstimatedMaterial;
