//! Deterministic oracle for tests: fixed response per (request kind, subject).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{LlmError, Oracle, OracleRequest, RequestKind};

#[derive(Clone, Default)]
pub struct StubOracle {
    responses: HashMap<(RequestKind, String), String>,
    defaults: HashMap<RequestKind, String>,
    failures: HashSet<(RequestKind, String)>,
    calls: Arc<Mutex<Vec<(RequestKind, String)>>>,
    prompts: Arc<Mutex<HashMap<(RequestKind, String), String>>>,
}

impl StubOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond with `response` for requests of `kind` about `subject`.
    pub fn respond(
        mut self,
        kind: RequestKind,
        subject: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.responses
            .insert((kind, subject.into()), response.into());
        self
    }

    /// Fallback response for `kind` when no subject-specific one is set.
    pub fn default_response(mut self, kind: RequestKind, response: impl Into<String>) -> Self {
        self.defaults.insert(kind, response.into());
        self
    }

    /// Fail requests of `kind` about `subject` with an API error.
    pub fn fail(mut self, kind: RequestKind, subject: impl Into<String>) -> Self {
        self.failures.insert((kind, subject.into()));
        self
    }

    pub fn call_count(&self, kind: RequestKind) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn calls(&self) -> Vec<(RequestKind, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// The most recent prompt sent for `kind` about `subject`.
    pub fn prompt_for(&self, kind: RequestKind, subject: &str) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .get(&(kind, subject.to_string()))
            .cloned()
    }
}

#[async_trait]
impl Oracle for StubOracle {
    async fn complete(&self, request: &OracleRequest) -> Result<String, LlmError> {
        let key = (request.kind, request.subject.clone());
        self.calls.lock().unwrap().push(key.clone());
        self.prompts
            .lock()
            .unwrap()
            .insert(key.clone(), request.prompt.clone());

        if self.failures.contains(&key) {
            return Err(LlmError::Api {
                status: 500,
                message: format!("stubbed failure for {}", request.subject),
            });
        }

        let text = self
            .responses
            .get(&key)
            .or_else(|| self.defaults.get(&request.kind))
            .ok_or_else(|| LlmError::Api {
                status: 404,
                message: format!("no stubbed response for {}", request.subject),
            })?
            .trim();

        // same contract as the live client
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }
}
