use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

/// One persisted row: a single purchased service within a logical order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    pub line_id: i64,
    pub order_id: i64,
    pub customer_id: i32,
    pub service_id: i32,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Everything needed to write the lines of one order in a single transaction.
#[derive(Debug, Clone)]
pub struct NewOrderLines {
    pub order_id: i64,
    pub customer_id: i32,
    pub status: String,
    pub service_ids: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: i32,
    pub service_ids: Vec<i32>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderedService {
    pub service_id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub image_url: String,
}

impl From<&Service> for OrderedService {
    fn from(s: &Service) -> Self {
        Self {
            service_id: s.id,
            name: s.name.clone(),
            price: s.price.clone(),
            image_url: s.image_url.clone(),
        }
    }
}

/// A customer-facing order: the header of its first line plus one entry per
/// line. Never stored, always rebuilt from the lines.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalOrder {
    pub order_id: i64,
    pub customer_id: i32,
    pub customer_name: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub services: Vec<OrderedService>,
}

/// 1-based page coordinates for the aggregated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_id: i64,
    pub page_size: i64,
}

impl PageRequest {
    pub const MIN_PAGE_SIZE: i64 = 5;
    pub const MAX_PAGE_SIZE: i64 = 10;

    pub fn new(page_id: i64, page_size: i64) -> Result<Self, super::errors::DomainError> {
        if page_id < 1 {
            return Err(super::errors::DomainError::InvalidInput(format!(
                "page_id must be at least 1, got {page_id}"
            )));
        }
        if !(Self::MIN_PAGE_SIZE..=Self::MAX_PAGE_SIZE).contains(&page_size) {
            return Err(super::errors::DomainError::InvalidInput(format!(
                "page_size must be between {} and {}, got {page_size}",
                Self::MIN_PAGE_SIZE,
                Self::MAX_PAGE_SIZE
            )));
        }
        let window = (page_id - 1)
            .checked_mul(page_size)
            .and_then(|offset| offset.checked_add(page_size));
        if window.is_none() {
            return Err(super::errors::DomainError::InvalidInput(format!(
                "page_id {page_id} is out of range"
            )));
        }
        Ok(Self { page_id, page_size })
    }

    pub fn offset(&self) -> i64 {
        (self.page_id - 1) * self.page_size
    }

    /// Number of distinct logical orders the listing must load to cover this page.
    pub fn order_window(&self) -> i64 {
        self.offset() + self.page_size
    }
}
