//! Scripted `TextGenerator` for service and router tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm_client::{GatewayError, GenerationRequest, TextGenerator};

/// Replays queued outcomes in order and records every request it receives.
/// Once the script runs out it answers `ServiceUnavailable`.
#[derive(Default)]
pub struct ScriptedGenerator {
    outcomes: Mutex<VecDeque<Result<String, GatewayError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().then_reply(text)
    }

    pub fn failing(error: GatewayError) -> Self {
        Self::new().then_fail(error)
    }

    pub fn then_reply(self, text: impl Into<String>) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn then_fail(self, error: GatewayError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GatewayError::ServiceUnavailable))
    }
}
