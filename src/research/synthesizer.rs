//! Query synthesizer: one research step from context to candidate URLs.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::completion::{
    clean_query, message_content_from_completion, serializable_completion_args,
    validate_completion, ModelCompletionError,
};
use crate::config::ResearchConfig;
use crate::providers::{CompletionRequest, LlmProvider};
use crate::search::SearchProvider;
use crate::telemetry::{TelemetryRecord, TelemetrySink};

use super::prompt::build_conversation;
use super::ResearchError;

/// Name under which every step's telemetry record is emitted.
pub const SEARCH_RECORD_NAME: &str = "search";

/// Turns topic, plan, facts and observations into a search query via an
/// LLM, runs it, and returns the result URLs.
///
/// Holds no mutable state; share one instance across tasks.
#[derive(Clone)]
pub struct QuerySynthesizer {
    config: ResearchConfig,
    model: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for QuerySynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySynthesizer")
            .field("config", &self.config)
            .field("model", &self.model.name())
            .finish_non_exhaustive()
    }
}

impl QuerySynthesizer {
    /// Wire a synthesizer from its config and collaborators.
    pub fn new(
        config: ResearchConfig,
        model: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            config,
            model,
            search,
            telemetry,
        }
    }

    /// The request that [`Self::synthesize_and_search`] would submit.
    pub fn build_request(
        &self,
        topic: &str,
        plan: &str,
        facts: &str,
        observations: &[String],
    ) -> CompletionRequest {
        build_conversation(&self.config.model, topic, plan, facts, observations)
    }

    /// Run one research step.
    ///
    /// A `"search"` telemetry record is emitted after a successful search, or
    /// before returning a model failure. Validation and search failures
    /// return without emitting.
    ///
    /// # Errors
    ///
    /// - [`ResearchError::ModelCompletion`] when the model call fails.
    /// - [`ResearchError::Validation`] when the completion is malformed.
    /// - [`ResearchError::Search`] when the search provider fails.
    pub async fn synthesize_and_search(
        &self,
        topic: &str,
        plan: &str,
        facts: &str,
        observations: &[String],
    ) -> Result<Vec<String>, ResearchError> {
        let request = self.build_request(topic, plan, facts, observations);

        let completion_args = serializable_completion_args(&request);
        debug!(
            provider = self.model.name(),
            completion_args = %completion_args,
            "completion call"
        );
        let mut record = TelemetryRecord::new();
        record.insert("completion_args", completion_args);

        let completion = match self.model.complete(&request).await {
            Ok(completion) => completion,
            Err(err) => {
                let err = ModelCompletionError::from(err);
                record.insert("completion_error", Value::String(err.message.clone()));
                error!(completion_error = %err.body, "{}", err.message);
                self.telemetry.log(SEARCH_RECORD_NAME, &record);
                return Err(err.into());
            }
        };

        validate_completion(&completion)?;
        debug!(completion = ?completion, "completion response");
        record.insert_serialized("completion", &completion);

        let query = clean_query(message_content_from_completion(&completion));
        record.insert("content", Value::String(query.clone()));

        let urls = self.search.search(&query).await?;
        record.insert_serialized("urls", &urls);

        self.telemetry.log(SEARCH_RECORD_NAME, &record);
        info!(query = %query, urls = urls.len(), "search step complete");
        Ok(urls)
    }
}
