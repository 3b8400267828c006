use crate::domain::ports::PaymentProvider;
use crate::domain::provider::{PaymentOrderRequest, PaymentOrderResponse, ProviderError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// One scripted provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedOutcome {
    Succeed,
    RateLimited(Option<Duration>),
    Transient(u16),
    Permanent(u16),
    Unexpected(String),
    Panic(String),
}

#[derive(Default)]
struct Script {
    queues: HashMap<String, VecDeque<ScriptedOutcome>>,
    requests: Vec<PaymentOrderRequest>,
    issued: u64,
}

/// Deterministic provider for tests.
///
/// Outcomes are queued per recipient (the `investor_id` metadata of the
/// request) and consumed one per call; an empty queue succeeds. Every
/// request is recorded, including failed ones.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<Script>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `outcomes` for `recipient_id`, after anything already queued.
    pub fn script(self, recipient_id: &str, outcomes: impl IntoIterator<Item = ScriptedOutcome>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script
                .queues
                .entry(recipient_id.to_string())
                .or_default()
                .extend(outcomes);
        }
        self
    }

    pub fn requests(&self) -> Vec<PaymentOrderRequest> {
        self.script
            .lock()
            .map(|s| s.requests.clone())
            .unwrap_or_default()
    }

    pub fn calls_for(&self, recipient_id: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.metadata_value("investor_id") == Some(recipient_id))
            .count()
    }

    pub fn call_count(&self) -> usize {
        self.requests().len()
    }

    fn next(&self, request: &PaymentOrderRequest) -> Result<(ScriptedOutcome, u64), ProviderError> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| ProviderError::Unexpected("provider script poisoned".into()))?;
        script.requests.push(request.clone());
        let outcome = request
            .metadata_value("investor_id")
            .and_then(|id| script.queues.get_mut(id))
            .and_then(VecDeque::pop_front)
            .unwrap_or(ScriptedOutcome::Succeed);
        if outcome == ScriptedOutcome::Succeed {
            script.issued += 1;
        }
        Ok((outcome, script.issued))
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_provider"
    }

    async fn submit_order(
        &self,
        request: &PaymentOrderRequest,
    ) -> Result<PaymentOrderResponse, ProviderError> {
        let (outcome, issued) = self.next(request)?;
        match outcome {
            ScriptedOutcome::Succeed => Ok(PaymentOrderResponse {
                order_id: format!("po_{}_{issued:016x}", request.rail_type.as_str()),
                status: "pending".to_string(),
                provider: self.name().to_string(),
                message: "scripted success".to_string(),
            }),
            ScriptedOutcome::RateLimited(retry_after) => {
                Err(ProviderError::rate_limited("scripted rate limit", retry_after))
            }
            ScriptedOutcome::Transient(code) => {
                Err(ProviderError::transient("scripted transient error", code))
            }
            ScriptedOutcome::Permanent(code) => {
                Err(ProviderError::permanent("scripted permanent error", code))
            }
            ScriptedOutcome::Unexpected(message) => Err(ProviderError::Unexpected(message.into())),
            ScriptedOutcome::Panic(message) => panic!("{message}"),
        }
    }
}
