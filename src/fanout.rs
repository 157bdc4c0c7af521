// Concurrent provider fan-out with per-provider timeouts and failure isolation

use crate::listing::Listing;
use crate::provider::{PayloadNormalizer, ProviderError, ProviderOutcome, ProviderQuery, RegisteredProvider};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct FanOutOrchestrator {
    max_concurrent: usize,
}

impl Default for FanOutOrchestrator {
    fn default() -> Self {
        Self::new(8)
    }
}

impl FanOutOrchestrator {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
        }
    }

    // Outcomes come back in provider order; declining providers get no outcome
    pub async fn run<L: Listing>(
        &self,
        providers: &[RegisteredProvider],
        query: &ProviderQuery,
        normalizer: Arc<dyn PayloadNormalizer<L>>,
    ) -> Vec<ProviderOutcome<L>> {
        let query = Arc::new(query.clone());

        let calls: Vec<_> = providers
            .iter()
            .enumerate()
            .filter(|(_, registered)| {
                let accepted = registered.provider.accepts(&query);
                if !accepted {
                    debug!(provider = %registered.id(), "Provider declined query, skipped");
                }
                accepted
            })
            .map(|(position, registered)| {
                let registered = registered.clone();
                let query = Arc::clone(&query);
                let normalizer = Arc::clone(&normalizer);
                async move {
                    let provider_id = registered.id().to_string();
                    let started = Instant::now();
                    let result = match tokio::spawn(call_provider(registered, query, normalizer)).await {
                        Ok(result) => result,
                        Err(e) => Err(ProviderError::Panicked(join_error_message(e))),
                    };
                    let outcome = ProviderOutcome::from_result(provider_id, result, started.elapsed());
                    log_outcome(&outcome);
                    (position, outcome)
                }
            })
            .collect();

        let mut outcomes: Vec<(usize, ProviderOutcome<L>)> = stream::iter(calls)
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        outcomes.sort_by_key(|(position, _)| *position);
        outcomes.into_iter().map(|(_, outcome)| outcome).collect()
    }
}

async fn call_provider<L: Listing>(
    registered: RegisteredProvider,
    query: Arc<ProviderQuery>,
    normalizer: Arc<dyn PayloadNormalizer<L>>,
) -> Result<Vec<L>, ProviderError> {
    let payload = match timeout(registered.timeout, registered.provider.search(&query)).await {
        Ok(result) => result?,
        Err(_) => return Err(ProviderError::Timeout(registered.timeout.as_millis() as u64)),
    };
    normalizer.normalize(registered.id(), payload, &query)
}

fn join_error_message(error: JoinError) -> String {
    if !error.is_panic() {
        return error.to_string();
    }
    let payload = error.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

fn log_outcome<L>(outcome: &ProviderOutcome<L>) {
    match &outcome.error {
        None => debug!(
            provider = %outcome.provider_id,
            count = outcome.count(),
            elapsed_ms = outcome.elapsed_ms,
            "Provider responded"
        ),
        Some(error) => warn!(
            provider = %outcome.provider_id,
            kind = %error.kind,
            error = %error.message,
            elapsed_ms = outcome.elapsed_ms,
            "Provider failed, continuing without it"
        ),
    }
}
