//! Trading-gateway abstraction: places and cancels limit orders against the
//! venue, or simulates doing so in dry-run mode.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::ids::{OrderId, TokenId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub token_id: TokenId,
    pub side: Side,
    pub price: Decimal,
    pub shares: Decimal,
    pub dry_run: bool,
}

/// A venue capable of placing and cancelling limit orders.
///
/// Implementations are expected to validate `0 < price < 1` themselves and
/// return [`Error::Execution`] for a rejected order; they must never panic
/// on a malformed but syntactically valid request.
#[async_trait]
pub trait TradingGateway: Send + Sync {
    async fn place_limit_order(
        &self,
        token_id: &TokenId,
        side: Side,
        price: Decimal,
        size_quote: Decimal,
    ) -> Result<OrderResult>;

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()>;
}

/// Simulated gateway: validates and logs as if an order were placed, but
/// never calls out to the venue. Used when the bot runs with dry-run mode
/// enabled.
pub struct DryRunGateway;

#[async_trait]
impl TradingGateway for DryRunGateway {
    async fn place_limit_order(
        &self,
        token_id: &TokenId,
        side: Side,
        price: Decimal,
        size_quote: Decimal,
    ) -> Result<OrderResult> {
        validate_price(price)?;
        let shares = size_quote / price;
        let order_id = OrderId::new(Uuid::new_v4().to_string());
        info!(
            token = %token_id,
            side = side.as_str(),
            %price,
            %shares,
            "dry-run: would place order"
        );
        Ok(OrderResult {
            order_id,
            token_id: token_id.clone(),
            side,
            price,
            shares,
            dry_run: true,
        })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        info!(order = %order_id, "dry-run: would cancel order");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct PlaceOrderRequest {
    token_id: String,
    side: String,
    price: String,
    size: String,
}

#[derive(Debug, serde::Deserialize)]
struct PlaceOrderResponse {
    #[serde(rename = "orderID")]
    order_id: String,
}

/// Live gateway that submits orders to the venue over HTTP.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TradingGateway for HttpGateway {
    async fn place_limit_order(
        &self,
        token_id: &TokenId,
        side: Side,
        price: Decimal,
        size_quote: Decimal,
    ) -> Result<OrderResult> {
        validate_price(price)?;
        let shares = size_quote / price;

        let response = self
            .client
            .post(format!("{}/order", self.base_url))
            .json(&PlaceOrderRequest {
                token_id: token_id.to_string(),
                side: side.as_str().to_string(),
                price: price.to_string(),
                size: shares.to_string(),
            })
            .send()
            .await?
            .error_for_status()?;

        let body: PlaceOrderResponse = response.json().await?;
        if body.order_id.is_empty() {
            warn!(token = %token_id, "gateway accepted order but returned no order id");
            return Err(Error::Gateway("empty order id in response".to_string()));
        }

        Ok(OrderResult {
            order_id: OrderId::new(body.order_id),
            token_id: token_id.clone(),
            side,
            price,
            shares,
            dry_run: false,
        })
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        self.client
            .post(format!("{}/order/{}/cancel", self.base_url, order_id))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn validate_price(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO || price >= Decimal::ONE {
        return Err(Error::Execution(format!("invalid price {price}, must be in (0, 1)")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn dry_run_gateway_synthesizes_a_fill() {
        let gateway = DryRunGateway;
        let result = gateway
            .place_limit_order(&TokenId::from("tok-1"), Side::Buy, dec!(0.40), dec!(40))
            .await
            .unwrap();
        assert!(result.dry_run);
        assert_eq!(result.shares, dec!(100));
    }

    #[tokio::test]
    async fn dry_run_gateway_rejects_out_of_range_price() {
        let gateway = DryRunGateway;
        let err = gateway
            .place_limit_order(&TokenId::from("tok-1"), Side::Buy, dec!(1.50), dec!(40))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
    }

    #[tokio::test]
    async fn dry_run_gateway_cancel_is_always_ok() {
        let gateway = DryRunGateway;
        assert!(gateway.cancel_order(&OrderId::new("anything")).await.is_ok());
    }
}
