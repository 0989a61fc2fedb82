//! Paper broker for replay and simulation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use trading_core::error::BrokerError;
use trading_core::traits::{Broker, Quote};
use trading_core::types::{DealConfirmation, DealReference, DealStatus, Direction, OrderRequest};
use uuid::Uuid;

#[derive(Debug)]
struct PaperDeal {
    confirmation: DealConfirmation,
    /// Polls still answered with `Pending`
    pending_polls: u32,
}

#[derive(Debug)]
struct PaperState {
    balance: Decimal,
    /// Last (bid, ask)
    market: Option<(Decimal, Decimal)>,
    reject_reason: Option<String>,
    deals: HashMap<DealReference, PaperDeal>,
}

/// In-process broker that fills at the last observed quote: longs at the
/// ask, shorts at the bid.
///
/// Deals open immediately and confirm on the first poll unless a confirmation
/// delay or a rejection is configured.
#[derive(Clone)]
pub struct PaperBroker {
    state: Arc<Mutex<PaperState>>,
    slippage_pct: Decimal,
    confirm_after_polls: u32,
}

impl PaperBroker {
    /// Create a new paper broker with an account balance.
    pub fn new(balance: Decimal) -> Self {
        Self {
            state: Arc::new(Mutex::new(PaperState {
                balance,
                market: None,
                reject_reason: None,
                deals: HashMap::new(),
            })),
            slippage_pct: Decimal::ZERO,
            confirm_after_polls: 0,
        }
    }

    /// Set slippage percentage applied against the order direction.
    pub fn with_slippage(mut self, slippage_pct: Decimal) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Answer the first `polls` confirmation requests with `Pending`.
    pub fn with_confirm_delay(mut self, polls: u32) -> Self {
        self.confirm_after_polls = polls;
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, PaperState>, BrokerError> {
        self.state
            .lock()
            .map_err(|_| BrokerError::ApiError("paper broker state poisoned".into()))
    }

    /// Set bid and ask to `price`.
    pub fn set_mark_price(&self, price: Decimal) -> Result<(), BrokerError> {
        self.state()?.market = Some((price, price));
        Ok(())
    }

    /// Reject every subsequent deal with `reason`, or accept again with `None`.
    pub fn set_rejection(&self, reason: Option<String>) -> Result<(), BrokerError> {
        self.state()?.reject_reason = reason;
        Ok(())
    }

    fn fill_price(&self, (bid, ask): (Decimal, Decimal), direction: Direction) -> Decimal {
        let slip = self.slippage_pct / dec!(100);
        match direction {
            Direction::Long => ask * (dec!(1) + slip),
            Direction::Short => bid * (dec!(1) - slip),
        }
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn submit_order(&self, request: OrderRequest) -> Result<DealReference, BrokerError> {
        request.validate().map_err(BrokerError::OrderRejected)?;

        let mut state = self.state()?;
        let market = state
            .market
            .ok_or_else(|| BrokerError::OrderRejected(format!("no market price for {}", request.symbol)))?;

        let reference = DealReference(format!("PAPER-{}", Uuid::new_v4().simple()));
        let confirmation = match &state.reject_reason {
            Some(reason) => DealConfirmation {
                reference: reference.clone(),
                status: DealStatus::Rejected,
                deal_id: None,
                level: None,
                reason: Some(reason.clone()),
            },
            None => DealConfirmation {
                reference: reference.clone(),
                status: DealStatus::Open,
                deal_id: Some(format!("DEAL-{}", Uuid::new_v4().simple())),
                level: Some(self.fill_price(market, request.direction)),
                reason: None,
            },
        };

        info!(
            reference = %reference,
            symbol = %request.symbol,
            direction = %request.direction,
            size = %request.size,
            status = ?confirmation.status,
            "Paper order submitted"
        );

        state.deals.insert(
            reference.clone(),
            PaperDeal {
                confirmation,
                pending_polls: self.confirm_after_polls,
            },
        );
        Ok(reference)
    }

    async fn confirm_deal(&self, reference: &DealReference) -> Result<DealConfirmation, BrokerError> {
        let mut state = self.state()?;
        let deal = state
            .deals
            .get_mut(reference)
            .ok_or_else(|| BrokerError::DealNotFound(reference.to_string()))?;

        if deal.pending_polls > 0 {
            deal.pending_polls -= 1;
            debug!(reference = %reference, remaining = deal.pending_polls, "Paper deal pending");
            return Ok(DealConfirmation {
                reference: reference.clone(),
                status: DealStatus::Pending,
                deal_id: None,
                level: None,
                reason: None,
            });
        }
        Ok(deal.confirmation.clone())
    }

    async fn account_balance(&self) -> Result<Decimal, BrokerError> {
        Ok(self.state()?.balance)
    }

    async fn on_quote(&self, quote: &Quote) -> Result<(), BrokerError> {
        let to_decimal = |v: f64| {
            Decimal::from_f64_retain(v)
                .filter(|d| *d > Decimal::ZERO)
                .map(|d| d.round_dp(8).normalize())
        };
        match (to_decimal(quote.bid), to_decimal(quote.ask)) {
            (Some(bid), Some(ask)) => {
                self.state()?.market = Some((bid, ask.max(bid)));
                Ok(())
            }
            _ => Err(BrokerError::ApiError(format!(
                "invalid quote bid {} ask {}",
                quote.bid, quote.ask
            ))),
        }
    }

    fn name(&self) -> &str {
        "Paper Broker"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> OrderRequest {
        OrderRequest::market("EURUSD", Direction::Long, dec!(0.2))
            .with_stop(dec!(97))
            .with_profit(dec!(103))
    }

    #[tokio::test]
    async fn test_fill_at_mark() {
        let broker = PaperBroker::new(dec!(1000));
        broker.set_mark_price(dec!(100)).unwrap();

        let reference = broker.submit_order(order()).await.unwrap();
        let confirmation = broker.confirm_deal(&reference).await.unwrap();

        assert_eq!(confirmation.status, DealStatus::Open);
        assert_eq!(confirmation.level, Some(dec!(100)));
        assert!(confirmation.deal_id.unwrap().starts_with("DEAL-"));
        assert_eq!(broker.account_balance().await.unwrap(), dec!(1000));
    }

    #[tokio::test]
    async fn test_slippage_against_direction() {
        let broker = PaperBroker::new(dec!(1000)).with_slippage(dec!(0.5));
        broker.set_mark_price(dec!(100)).unwrap();

        let long = broker.submit_order(order()).await.unwrap();
        assert_eq!(broker.confirm_deal(&long).await.unwrap().level, Some(dec!(100.5)));

        let short = broker
            .submit_order(OrderRequest::market("EURUSD", Direction::Short, dec!(1)))
            .await
            .unwrap();
        assert_eq!(broker.confirm_deal(&short).await.unwrap().level, Some(dec!(99.5)));
    }

    #[tokio::test]
    async fn test_rejection_and_missing_price() {
        let broker = PaperBroker::new(dec!(1000));
        assert!(matches!(broker.submit_order(order()).await, Err(BrokerError::OrderRejected(_))));

        broker.set_mark_price(dec!(100)).unwrap();
        broker.set_rejection(Some("market closed".into())).unwrap();
        let reference = broker.submit_order(order()).await.unwrap();
        let confirmation = broker.confirm_deal(&reference).await.unwrap();
        assert_eq!(confirmation.status, DealStatus::Rejected);
        assert_eq!(confirmation.reason.as_deref(), Some("market closed"));

        let bad = OrderRequest::market("EURUSD", Direction::Long, dec!(0));
        assert!(broker.submit_order(bad).await.is_err());
    }

    #[tokio::test]
    async fn test_confirm_delay_and_unknown_deal() {
        let broker = PaperBroker::new(dec!(1000)).with_confirm_delay(1);
        broker.set_mark_price(dec!(100)).unwrap();

        let reference = broker.submit_order(order()).await.unwrap();
        assert_eq!(broker.confirm_deal(&reference).await.unwrap().status, DealStatus::Pending);
        assert_eq!(broker.confirm_deal(&reference).await.unwrap().status, DealStatus::Open);

        let unknown = DealReference("PAPER-missing".into());
        assert!(matches!(broker.confirm_deal(&unknown).await, Err(BrokerError::DealNotFound(_))));
    }

    #[tokio::test]
    async fn test_quote_sides() {
        let broker = PaperBroker::new(dec!(1000));
        broker.on_quote(&Quote::new("EURUSD", 1.1, 1.1002, 0)).await.unwrap();

        let long = broker.submit_order(OrderRequest::market("EURUSD", Direction::Long, dec!(1))).await.unwrap();
        assert_eq!(broker.confirm_deal(&long).await.unwrap().level, Some(dec!(1.1002)));
        let short = broker.submit_order(OrderRequest::market("EURUSD", Direction::Short, dec!(1))).await.unwrap();
        assert_eq!(broker.confirm_deal(&short).await.unwrap().level, Some(dec!(1.1)));

        assert!(broker.on_quote(&Quote::new("EURUSD", f64::NAN, 1.0, 0)).await.is_err());
    }
}
