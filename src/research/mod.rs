//! The research search step.
//!
//! [`QuerySynthesizer`] asks a language model for one web search query
//! tailored to the current step of a research plan, runs the query, and
//! reports the interaction as a telemetry record.

pub mod prompt;
pub mod synthesizer;

pub use synthesizer::{QuerySynthesizer, SEARCH_RECORD_NAME};

use crate::completion::{ModelCompletionError, ValidationError};
use crate::search::SearchError;

/// Failure of one research step.
///
/// Only [`ResearchError::ModelCompletion`] is recorded in telemetry before it
/// is returned; the other variants pass their source through untouched.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    /// The model call failed.
    #[error(transparent)]
    ModelCompletion(#[from] ModelCompletionError),
    /// The model answered with a malformed completion.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The search provider failed.
    #[error(transparent)]
    Search(#[from] SearchError),
}
