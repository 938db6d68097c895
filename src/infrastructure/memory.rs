//! In-memory adapters for the domain ports, used by tests and local runs
//! without Postgres.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::domain::errors::DomainError;
use crate::domain::order::{Customer, NewOrderLines, OrderLine, Service};
use crate::domain::ports::{CustomerDirectory, OrderLineStore, ServiceCatalog};

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>, DomainError> {
    lock.read()
        .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>, DomainError> {
    lock.write()
        .map_err(|_| DomainError::Internal("in-memory store lock poisoned".to_string()))
}

#[derive(Default)]
struct Lines {
    next_id: i64,
    rows: Vec<OrderLine>,
}

/// Order lines kept in insertion order, ids assigned like a `BIGSERIAL`.
#[derive(Default)]
pub struct InMemoryOrderLineStore {
    lines: RwLock<Lines>,
}

impl InMemoryOrderLineStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn updated<F>(&self, order_id: i64, mut apply: F) -> Result<Option<OrderLine>, DomainError>
    where
        F: FnMut(&mut OrderLine),
    {
        let mut lines = write(&self.lines)?;
        let mut first: Option<OrderLine> = None;
        for row in lines.rows.iter_mut().filter(|l| l.order_id == order_id) {
            apply(row);
            if first.as_ref().map_or(true, |f| row.line_id < f.line_id) {
                first = Some(row.clone());
            }
        }
        Ok(first)
    }
}

impl OrderLineStore for InMemoryOrderLineStore {
    fn create_lines(&self, order: NewOrderLines) -> Result<Vec<OrderLine>, DomainError> {
        let mut lines = write(&self.lines)?;
        let started_at = Utc::now();

        let created: Vec<OrderLine> = order
            .service_ids
            .iter()
            .map(|&service_id| {
                lines.next_id += 1;
                OrderLine {
                    line_id: lines.next_id,
                    order_id: order.order_id,
                    customer_id: order.customer_id,
                    service_id,
                    status: order.status.clone(),
                    started_at,
                    delivered: false,
                    delivered_at: None,
                }
            })
            .collect();

        lines.rows.extend(created.iter().cloned());
        Ok(created)
    }

    fn find_by_order_id(&self, order_id: i64) -> Result<Vec<OrderLine>, DomainError> {
        Ok(read(&self.lines)?
            .rows
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    fn list_for_latest_orders(&self, order_count: i64) -> Result<Vec<OrderLine>, DomainError> {
        let lines = read(&self.lines)?;

        let mut order_ids: Vec<i64> = lines.rows.iter().map(|l| l.order_id).collect();
        order_ids.sort_unstable_by(|a, b| b.cmp(a));
        order_ids.dedup();
        order_ids.truncate(usize::try_from(order_count).unwrap_or(0));

        let mut selected: Vec<OrderLine> = lines
            .rows
            .iter()
            .filter(|l| order_ids.contains(&l.order_id))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.order_id.cmp(&a.order_id).then(a.line_id.cmp(&b.line_id)));
        Ok(selected)
    }

    fn list_all(&self) -> Result<Vec<OrderLine>, DomainError> {
        let mut all = read(&self.lines)?.rows.clone();
        all.sort_by(|a, b| b.line_id.cmp(&a.line_id));
        Ok(all)
    }

    fn update_status(
        &self,
        order_id: i64,
        status: &str,
    ) -> Result<Option<OrderLine>, DomainError> {
        self.updated(order_id, |l| l.status = status.to_string())
    }

    fn update_delivery(
        &self,
        order_id: i64,
        delivered: bool,
        delivered_at: DateTime<Utc>,
    ) -> Result<Option<OrderLine>, DomainError> {
        self.updated(order_id, |l| {
            l.delivered = delivered;
            l.delivered_at = Some(delivered_at);
        })
    }

    fn delete_order(&self, order_id: i64) -> Result<usize, DomainError> {
        let mut lines = write(&self.lines)?;
        let before = lines.rows.len();
        lines.rows.retain(|l| l.order_id != order_id);
        Ok(before - lines.rows.len())
    }
}

#[derive(Default)]
pub struct InMemoryCatalog {
    services: RwLock<HashMap<i32, Service>>,
}

impl InMemoryCatalog {
    pub fn insert(&self, service: Service) {
        if let Ok(mut services) = self.services.write() {
            services.insert(service.id, service);
        }
    }

    pub fn remove(&self, id: i32) {
        if let Ok(mut services) = self.services.write() {
            services.remove(&id);
        }
    }
}

impl ServiceCatalog for InMemoryCatalog {
    fn find_service(&self, id: i32) -> Result<Option<Service>, DomainError> {
        Ok(read(&self.services)?.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCustomers {
    customers: RwLock<HashMap<i32, Customer>>,
}

impl InMemoryCustomers {
    pub fn insert(&self, customer: Customer) {
        if let Ok(mut customers) = self.customers.write() {
            customers.insert(customer.id, customer);
        }
    }
}

impl CustomerDirectory for InMemoryCustomers {
    fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError> {
        Ok(read(&self.customers)?.get(&id).cloned())
    }

    fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        Ok(read(&self.customers)?
            .values()
            .find(|c| c.email == email)
            .cloned())
    }
}
