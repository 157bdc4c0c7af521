// Primary/fallback controller for transfer searches

use crate::fanout::FanOutOrchestrator;
use crate::listing::Listing;
use crate::provider::{PayloadNormalizer, ProviderOutcome, ProviderQuery, RegisteredProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackState {
    Primary,
    Fallback,
}

impl FallbackState {
    // Any zero-count primary outcome, error or genuinely empty, moves to Fallback
    pub fn next(self, primary_count: usize) -> FallbackState {
        match (self, primary_count) {
            (FallbackState::Primary, 0) => FallbackState::Fallback,
            (state, _) => state,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackRun<L> {
    pub outcomes: Vec<ProviderOutcome<L>>,
    pub state: FallbackState,
}

impl<L> FallbackRun<L> {
    pub fn fallback_used(&self) -> bool {
        self.state == FallbackState::Fallback
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackController {
    orchestrator: FanOutOrchestrator,
}

impl FallbackController {
    pub fn new(orchestrator: FanOutOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn run<L: Listing>(
        &self,
        primary: Option<&RegisteredProvider>,
        fallback: Option<&RegisteredProvider>,
        query: &ProviderQuery,
        normalizer: Arc<dyn PayloadNormalizer<L>>,
    ) -> FallbackRun<L> {
        let mut outcomes = match primary {
            Some(primary) => {
                self.orchestrator
                    .run(std::slice::from_ref(primary), query, Arc::clone(&normalizer))
                    .await
            }
            None => Vec::new(),
        };

        let primary_count: usize = outcomes.iter().map(ProviderOutcome::count).sum();
        let state = FallbackState::Primary.next(primary_count);
        if state == FallbackState::Primary {
            debug!(count = primary_count, "Primary transfer inventory used");
            return FallbackRun { outcomes, state };
        }

        match fallback {
            Some(fallback) => {
                info!(provider = %fallback.id(), "Primary returned no transfers, switching to fallback");
                let fallback_outcomes = self
                    .orchestrator
                    .run(std::slice::from_ref(fallback), query, normalizer)
                    .await;
                outcomes.extend(fallback_outcomes);
            }
            None => debug!("Primary returned no transfers and no fallback is registered"),
        }

        FallbackRun { outcomes, state }
    }
}
