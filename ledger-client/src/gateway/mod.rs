//! Idempotent mutation gateway
//!
//! Every state change goes through [`MutationGateway::submit`]:
//!
//! 1. validate locally (nothing is sent, no request id is held)
//! 2. take the action's request id from its [`ActionSlot`] (reused on retry)
//! 3. post with a bounded wait
//! 4. on success release the id; on failure keep it
//! 5. in both cases invalidate and re-fetch the factory's rows
//!
//! The gateway never retries on its own.

mod slot;

pub use slot::ActionSlot;

use crate::cache::RowCache;
use crate::ledger::Ledger;
use crate::{ClientError, ClientResult, GatewayError, GatewayResult};
use shared::ErrorCode;
use shared::action::{Mutation, MutationAck, MutationEnvelope};
use shared::models::{OrderRow, StorageAggRow};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// A mutation the ledger accepted
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub request_id: String,
    pub ack: MutationAck,
}

impl Submitted {
    /// Lot id the ledger recorded, falling back to the one submitted
    pub fn lot_id<'a>(&'a self, submitted: &'a str) -> &'a str {
        self.ack.lot_id.as_deref().unwrap_or(submitted)
    }
}

/// Fresh row snapshot of one factory
#[derive(Debug, Clone)]
pub struct FactoryRows {
    pub orders: Arc<Vec<OrderRow>>,
    pub storage: Arc<Vec<StorageAggRow>>,
}

/// Submits mutations and keeps the row cache consistent with them
#[derive(Clone)]
pub struct MutationGateway {
    ledger: Arc<dyn Ledger>,
    cache: Arc<RowCache>,
    timeout: Duration,
}

impl std::fmt::Debug for MutationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationGateway")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MutationGateway {
    pub fn new(ledger: Arc<dyn Ledger>, cache: Arc<RowCache>, timeout: Duration) -> Self {
        Self {
            ledger,
            cache,
            timeout,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn cache(&self) -> &Arc<RowCache> {
        &self.cache
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one ledger call with the bounded wait
    pub async fn bounded<T, F>(&self, call: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        }
    }

    /// Submit one mutation on behalf of `slot`
    pub async fn submit(&self, slot: &ActionSlot, mutation: Mutation) -> GatewayResult<Submitted> {
        mutation.validate()?;

        let in_flight = slot
            .begin()
            .map_err(|request_id| GatewayError::InFlight { request_id })?;
        let request_id = in_flight.request_id.clone();
        let factory_code = mutation.factory_code().to_string();
        let envelope = MutationEnvelope::new(mutation, request_id.clone());

        tracing::debug!(
            request_id = %request_id,
            factory = %factory_code,
            lot_id = %envelope.mutation.lot_id(),
            kind = envelope.mutation.kind(),
            "submitting mutation"
        );

        let outcome = self
            .bounded(self.ledger.submit(&envelope))
            .await
            .and_then(|ack| {
                if ack.ok {
                    Ok(ack)
                } else {
                    Err(ClientError::rejected(
                        ErrorCode::LedgerRejected,
                        ack.message.unwrap_or_else(|| "rejected by ledger".to_string()),
                    ))
                }
            });

        match outcome {
            Ok(ack) => {
                in_flight.succeed();
                if ack.duplicate {
                    tracing::warn!(
                        request_id = %request_id,
                        lot_id = ?ack.lot_id,
                        "ledger already applied this request"
                    );
                } else {
                    tracing::info!(
                        request_id = %request_id,
                        factory = %factory_code,
                        lot_id = ?ack.lot_id,
                        kind = envelope.mutation.kind(),
                        "mutation applied"
                    );
                }
                self.refresh_after_submit(&factory_code).await;
                Ok(Submitted { request_id, ack })
            }
            Err(source) => {
                drop(in_flight);
                tracing::warn!(
                    request_id = %request_id,
                    factory = %factory_code,
                    unknown_outcome = source.is_unknown_outcome(),
                    error = %source,
                    "mutation failed"
                );
                self.refresh_after_submit(&factory_code).await;
                Err(GatewayError::Failed { request_id, source })
            }
        }
    }

    /// Force re-fetch of both row sets of a factory
    pub async fn refresh(&self, factory_code: &str) -> ClientResult<FactoryRows> {
        self.cache.invalidate(factory_code);
        let (orders, storage) = tokio::try_join!(
            self.bounded(self.ledger.orders(factory_code, None)),
            self.bounded(self.ledger.storage_agg(factory_code)),
        )?;
        Ok(FactoryRows {
            orders: self.cache.put_orders(factory_code, orders),
            storage: self.cache.put_storage(factory_code, storage),
        })
    }

    /// Cached rows, fetched when missing
    pub async fn rows(&self, factory_code: &str) -> ClientResult<FactoryRows> {
        match (self.cache.orders(factory_code), self.cache.storage(factory_code)) {
            (Some(orders), Some(storage)) => Ok(FactoryRows { orders, storage }),
            _ => self.refresh(factory_code).await,
        }
    }

    async fn refresh_after_submit(&self, factory_code: &str) {
        if let Err(e) = self.refresh(factory_code).await {
            tracing::error!(factory = %factory_code, error = %e, "refresh after mutation failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Fault, InMemoryLedger};
    use shared::action::{ActionBody, ActionTarget, UsePayload};

    fn gateway(ledger: Arc<InMemoryLedger>) -> MutationGateway {
        MutationGateway::new(ledger, Arc::new(RowCache::new()), Duration::from_secs(5))
    }

    fn use_grams(grams: f64) -> Mutation {
        Mutation::Action(ActionBody::Use(ActionTarget::new(
            "GT",
            "GT-20240501-001",
            "F1",
            UsePayload {
                grams,
                location: None,
                by: None,
            },
        )))
    }

    #[tokio::test]
    async fn test_validation_failure_holds_no_id() {
        let ledger = Arc::new(InMemoryLedger::default());
        let gateway = gateway(ledger.clone());
        let slot = ActionSlot::new();

        let err = gateway.submit(&slot, use_grams(0.0)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert_eq!(slot.held_request_id(), None);
        assert_eq!(ledger.effects(), 0);
    }

    #[tokio::test]
    async fn test_rejection_keeps_id_and_refreshes() {
        let ledger = Arc::new(InMemoryLedger::default());
        let gateway = gateway(ledger.clone());
        let slot = ActionSlot::new();

        // unknown lot
        let err = gateway.submit(&slot, use_grams(10.0)).await.unwrap_err();
        let request_id = err.request_id().map(str::to_string);
        assert!(request_id.is_some());
        assert_eq!(slot.held_request_id(), request_id);
        assert!(!slot.is_busy());
        assert_eq!(err.code(), ErrorCode::LotNotFound);
        assert!(gateway.cache().orders("GT").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_wait_expires() {
        let ledger = Arc::new(InMemoryLedger::default());
        ledger.inject(Fault::Delay(Duration::from_secs(60)));
        let gateway = gateway(ledger.clone());
        let slot = ActionSlot::new();

        let err = gateway.submit(&slot, use_grams(10.0)).await.unwrap_err();
        assert!(err.is_unknown_outcome());
        assert!(slot.held_request_id().is_some());
    }
}
