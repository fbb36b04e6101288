//! Mock extraction oracle for deterministic testing.
//!
//! Responses can be fixed, mapped by prompt substring, or scripted per call.
//! Every call is logged for assertion.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use podshelf_core::{Error, ExtractionOracle, Result};

/// A logged oracle call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Default)]
struct MockState {
    calls: Vec<MockCall>,
    /// Responses consumed in order; when exhausted, the default applies.
    scripted: Vec<ScriptedResponse>,
    next_scripted: usize,
}

#[derive(Debug, Clone)]
enum ScriptedResponse {
    Ok(String),
    Fail(String),
}

/// Mock extraction oracle.
#[derive(Clone)]
pub struct MockOracle {
    default_response: String,
    model: String,
    state: Arc<Mutex<MockState>>,
}

impl MockOracle {
    /// Create a mock that returns an empty recommendations document.
    pub fn new() -> Self {
        Self {
            default_response: r#"{"recommendations":[]}"#.to_string(),
            model: "mock-oracle".to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Set the response returned when no scripted response remains.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Queue a successful response for the next unconsumed call.
    pub fn push_response(&self, response: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .push(ScriptedResponse::Ok(response.into()));
    }

    /// Queue a failure for the next unconsumed call.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .push(ScriptedResponse::Fail(message.into()));
    }

    /// All logged calls.
    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExtractionOracle for MockOracle {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(MockCall {
            system: system.to_string(),
            prompt: prompt.to_string(),
        });

        if state.next_scripted < state.scripted.len() {
            let scripted = state.scripted[state.next_scripted].clone();
            state.next_scripted += 1;
            return match scripted {
                ScriptedResponse::Ok(r) => Ok(r),
                ScriptedResponse::Fail(m) => Err(Error::Extraction(m)),
            };
        }

        Ok(self.default_response.clone())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_response() {
        let oracle = MockOracle::new();
        let out = oracle.complete("sys", "prompt").await.unwrap();
        assert_eq!(out, r#"{"recommendations":[]}"#);
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_responses_in_order() {
        let oracle = MockOracle::new();
        oracle.push_response("first");
        oracle.push_failure("boom");

        assert_eq!(oracle.complete("s", "p1").await.unwrap(), "first");
        assert!(oracle.complete("s", "p2").await.is_err());
        // Exhausted: default applies.
        assert_eq!(
            oracle.complete("s", "p3").await.unwrap(),
            r#"{"recommendations":[]}"#
        );
        assert_eq!(oracle.call_count(), 3);
    }

    #[tokio::test]
    async fn test_call_log_captures_prompts() {
        let oracle = MockOracle::new();
        oracle.complete("system text", "user text").await.unwrap();
        let calls = oracle.calls();
        assert_eq!(calls[0].system, "system text");
        assert_eq!(calls[0].prompt, "user text");
    }
}
