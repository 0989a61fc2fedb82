//! Broker trait definition.

use crate::error::BrokerError;
use crate::traits::Quote;
use crate::types::{DealConfirmation, DealReference, OrderRequest};
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Order-placement capability.
///
/// Submission returns a deal reference; whether the deal actually opened is
/// learned by polling [`Broker::confirm_deal`].
#[async_trait]
pub trait Broker: Send + Sync {
    /// Submit a market order with optional attached levels.
    async fn submit_order(&self, request: OrderRequest) -> Result<DealReference, BrokerError>;

    /// Poll the status of a previously submitted order.
    async fn confirm_deal(&self, reference: &DealReference) -> Result<DealConfirmation, BrokerError>;

    /// Current account balance.
    async fn account_balance(&self) -> Result<Decimal, BrokerError>;

    /// Observe a market quote. Simulated brokers price fills from it.
    async fn on_quote(&self, _quote: &Quote) -> Result<(), BrokerError> {
        Ok(())
    }

    /// Get the broker name.
    fn name(&self) -> &str;
}
