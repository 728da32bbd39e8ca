//! Narrative insights over prepared dashboard figures.
//!
//! The service never talks to the store. Callers assemble the numbers they
//! want narrated into an [`InsightRequest`]; the model turns them into prose.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Figures to narrate, plus an optional operator question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRequest {
    /// Free-form metrics payload (alert counts, make-list rows, variance
    /// summaries). The model sees it verbatim.
    pub context: JsonValue,
    pub question: Option<String>,
}

impl InsightRequest {
    pub fn new(context: JsonValue) -> Self {
        Self {
            context,
            question: None,
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.question = Some(question.into());
        self
    }
}

/// Outcome of an insight request. `Unavailable` is an answer, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum InsightResponse {
    Ready { narrative: String, model: String },
    Unavailable { reason: String },
}

/// A language model that can turn figures into prose.
pub trait NarrativeModel: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn narrate(&self, request: &InsightRequest) -> Result<String, AiError>;
}

/// Insight front door. Constructed lazily: a deployment without a model
/// configured still serves every other feature.
pub struct InsightService<M> {
    model: Option<M>,
}

impl<M: NarrativeModel> InsightService<M> {
    pub fn new(model: Option<M>) -> Self {
        Self { model }
    }

    pub fn disabled() -> Self {
        Self { model: None }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn generate(&self, request: &InsightRequest) -> InsightResponse {
        let Some(model) = &self.model else {
            return InsightResponse::Unavailable {
                reason: "no narrative model configured".to_string(),
            };
        };
        match model.narrate(request) {
            Ok(narrative) => InsightResponse::Ready {
                narrative,
                model: model.name().to_string(),
            },
            Err(err) => {
                tracing::warn!(error = %err, "narrative model failed");
                InsightResponse::Unavailable {
                    reason: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedModel(Result<&'static str, &'static str>);

    impl NarrativeModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn narrate(&self, _request: &InsightRequest) -> Result<String, AiError> {
            self.0
                .map(str::to_string)
                .map_err(|e| AiError::InferenceFailed(e.to_string()))
        }
    }

    #[test]
    fn missing_model_reports_unavailable() {
        let service: InsightService<FixedModel> = InsightService::disabled();
        assert!(!service.is_available());
        let response = service.generate(&InsightRequest::new(json!({})));
        assert_eq!(
            response,
            InsightResponse::Unavailable {
                reason: "no narrative model configured".to_string()
            }
        );
    }

    #[test]
    fn model_failure_degrades_to_unavailable() {
        let service = InsightService::new(Some(FixedModel(Err("timeout"))));
        let response = service.generate(&InsightRequest::new(json!({})));
        match response {
            InsightResponse::Unavailable { reason } => {
                assert!(reason.contains("timeout"));
            }
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn successful_narration_names_the_model() {
        let service = InsightService::new(Some(FixedModel(Ok("make more vanilla"))));
        let request = InsightRequest::new(json!({"alerts": 3})).with_question("what first?");
        assert_eq!(
            service.generate(&request),
            InsightResponse::Ready {
                narrative: "make more vanilla".to_string(),
                model: "fixed".to_string(),
            }
        );
    }
}
