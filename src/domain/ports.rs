use chrono::{DateTime, Utc};

use super::errors::DomainError;
use super::order::{Customer, NewOrderLines, OrderLine, Service};

/// Storage for order lines. One row per purchased service; `order_id` is the
/// grouping key, not a row key.
pub trait OrderLineStore: Send + Sync + 'static {
    /// Insert one line per service id, in the given order, atomically.
    fn create_lines(&self, order: NewOrderLines) -> Result<Vec<OrderLine>, DomainError>;

    /// All lines of one order, oldest line first.
    fn find_by_order_id(&self, order_id: i64) -> Result<Vec<OrderLine>, DomainError>;

    /// Every line of the first `order_count` distinct order ids, newest order
    /// first and lines oldest first within an order.
    fn list_for_latest_orders(&self, order_count: i64) -> Result<Vec<OrderLine>, DomainError>;

    /// Every line, newest line first.
    fn list_all(&self) -> Result<Vec<OrderLine>, DomainError>;

    /// Returns the lowest-id updated line, or `None` when the order has no lines.
    fn update_status(&self, order_id: i64, status: &str)
        -> Result<Option<OrderLine>, DomainError>;

    fn update_delivery(
        &self,
        order_id: i64,
        delivered: bool,
        delivered_at: DateTime<Utc>,
    ) -> Result<Option<OrderLine>, DomainError>;

    /// Returns the number of lines removed.
    fn delete_order(&self, order_id: i64) -> Result<usize, DomainError>;
}

pub trait ServiceCatalog: Send + Sync + 'static {
    fn find_service(&self, id: i32) -> Result<Option<Service>, DomainError>;
}

pub trait CustomerDirectory: Send + Sync + 'static {
    fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError>;
    fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError>;
}
