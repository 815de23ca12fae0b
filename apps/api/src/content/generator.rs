//! Content generator — asks the model for a session description or a quiz.
//!
//! Output is shown as-is, so there is no parsing step. A missing credential is
//! an expected state here and yields placeholder text; any other gateway
//! failure is surfaced to the caller.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::{build_prompt, PromptTask};
use crate::llm_client::{GatewayError, GenerationRequest, TextGenerator};

pub const DESCRIPTION_PLACEHOLDER: &str =
    "No description is available: the AI service is not configured.";
pub const QUIZ_PLACEHOLDER: &str = "No quiz is available: the AI service is not configured.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Description,
    Quiz,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Model,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedContent {
    pub kind: ContentKind,
    pub topic: String,
    pub text: String,
    pub source: ContentSource,
}

impl ContentKind {
    fn task(self, topic: &str) -> PromptTask {
        let topic = topic.to_string();
        match self {
            ContentKind::Description => PromptTask::Description { topic },
            ContentKind::Quiz => PromptTask::Quiz { topic },
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            ContentKind::Description => DESCRIPTION_PLACEHOLDER,
            ContentKind::Quiz => QUIZ_PLACEHOLDER,
        }
    }
}

pub async fn generate_content(
    llm: &dyn TextGenerator,
    kind: ContentKind,
    topic: &str,
) -> Result<GeneratedContent, AppError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(AppError::Validation("topic cannot be empty".to_string()));
    }

    let request = GenerationRequest::text(build_prompt(&kind.task(topic)));

    let (text, source) = match llm.generate(&request).await {
        Ok(text) => {
            info!("Generated {:?} for topic '{}' ({} chars)", kind, topic, text.len());
            (text.trim().to_string(), ContentSource::Model)
        }
        Err(GatewayError::ServiceUnavailable) => {
            warn!("AI service unavailable; returning placeholder {:?}", kind);
            (kind.placeholder().to_string(), ContentSource::Placeholder)
        }
        Err(e) => return Err(e.into()),
    };

    Ok(GeneratedContent {
        kind,
        topic: topic.to_string(),
        text,
        source,
    })
}
