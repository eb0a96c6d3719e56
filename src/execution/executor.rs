use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;
use crate::models::OrderSide;

/// Market order handed to the execution collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: f64,
    /// Bar close that triggered the order
    pub reference_price: f64,
}

/// Confirmed execution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub avg_price: f64,
    pub quantity: f64,
}

impl Fill {
    /// Check a reported fill against the order before it is committed
    pub fn check(&self, order: &OrderRequest) -> Result<(), ExecutionError> {
        if !(self.avg_price.is_finite() && self.avg_price > 0.0) {
            return Err(ExecutionError::Rejected(format!(
                "invalid fill price {}",
                self.avg_price
            )));
        }
        if !self.quantity.is_finite() || (self.quantity - order.quantity).abs() > 1e-9 {
            return Err(ExecutionError::Rejected(format!(
                "filled {} of {}",
                self.quantity, order.quantity
            )));
        }
        Ok(())
    }
}

/// Turns decisions into real (or simulated) orders
///
/// Implementations may block on a network round trip. The engine awaits the
/// result before admitting the next bar.
#[async_trait]
pub trait OrderExecutor: Send {
    async fn execute(&mut self, order: &OrderRequest) -> Result<Fill, ExecutionError>;

    /// Executor name for logs
    fn name(&self) -> &str;
}

/// Simulated executor that fills every order immediately at the reference
/// price, adjusted by a fixed slippage against the order side.
#[derive(Debug, Clone, Default)]
pub struct PaperExecutor {
    slippage_bps: f64,
    orders: Vec<OrderRequest>,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buys fill `bps` above the reference, sells `bps` below
    pub fn with_slippage_bps(mut self, bps: f64) -> Self {
        self.slippage_bps = bps;
        self
    }

    /// Orders seen so far
    pub fn orders(&self) -> &[OrderRequest] {
        &self.orders
    }

    fn fill_price(&self, order: &OrderRequest) -> f64 {
        let adj = order.reference_price * self.slippage_bps / 10_000.0;
        match order.side {
            OrderSide::Buy => order.reference_price + adj,
            OrderSide::Sell => order.reference_price - adj,
        }
    }
}

#[async_trait]
impl OrderExecutor for PaperExecutor {
    async fn execute(&mut self, order: &OrderRequest) -> Result<Fill, ExecutionError> {
        if order.quantity <= 0.0 {
            return Err(ExecutionError::Rejected(format!(
                "quantity must be positive, got {}",
                order.quantity
            )));
        }

        let avg_price = self.fill_price(order);
        self.orders.push(order.clone());

        tracing::debug!(
            symbol = %order.symbol,
            side = ?order.side,
            quantity = order.quantity,
            avg_price,
            "Paper fill"
        );

        Ok(Fill {
            avg_price,
            quantity: order.quantity,
        })
    }

    fn name(&self) -> &str {
        "paper"
    }
}
