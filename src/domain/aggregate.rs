//! Rebuilds logical orders from flat order lines.
//!
//! Grouping always happens before pagination: a logical order with three
//! services occupies three rows, so slicing rows first would split orders
//! across page boundaries.

use std::collections::HashMap;

use super::errors::DomainError;
use super::order::{Customer, LogicalOrder, OrderLine, OrderedService, Service};
use super::ports::{CustomerDirectory, ServiceCatalog};

pub struct OrderAggregator<'a> {
    catalog: &'a dyn ServiceCatalog,
    customers: &'a dyn CustomerDirectory,
    service_cache: HashMap<i32, Service>,
    customer_cache: HashMap<i32, Customer>,
}

impl<'a> OrderAggregator<'a> {
    pub fn new(catalog: &'a dyn ServiceCatalog, customers: &'a dyn CustomerDirectory) -> Self {
        Self {
            catalog,
            customers,
            service_cache: HashMap::new(),
            customer_cache: HashMap::new(),
        }
    }

    /// Group lines by `order_id`. Orders appear in the order their first line
    /// appears, and services keep the order of their lines.
    ///
    /// A line whose service or customer cannot be resolved fails the whole
    /// call; no partial orders are returned.
    pub fn group(&mut self, lines: Vec<OrderLine>) -> Result<Vec<LogicalOrder>, DomainError> {
        let mut orders: Vec<LogicalOrder> = Vec::new();
        let mut index: HashMap<i64, usize> = HashMap::new();

        for line in lines {
            let service = OrderedService::from(self.service(line.service_id, line.order_id)?);

            match index.get(&line.order_id) {
                Some(&pos) => orders[pos].services.push(service),
                None => {
                    let customer_name = self.customer(line.customer_id, line.order_id)?.name.clone();
                    index.insert(line.order_id, orders.len());
                    orders.push(LogicalOrder {
                        order_id: line.order_id,
                        customer_id: line.customer_id,
                        customer_name,
                        status: line.status,
                        started_at: line.started_at,
                        delivered: line.delivered,
                        delivered_at: line.delivered_at,
                        services: vec![service],
                    });
                }
            }
        }

        Ok(orders)
    }

    /// Fold the lines of a single order; `NotFound` when there are none.
    pub fn one(&mut self, lines: Vec<OrderLine>) -> Result<LogicalOrder, DomainError> {
        self.group(lines)?
            .into_iter()
            .next()
            .ok_or(DomainError::NotFound)
    }

    fn service(&mut self, id: i32, order_id: i64) -> Result<&Service, DomainError> {
        if !self.service_cache.contains_key(&id) {
            let service = self.catalog.find_service(id)?.ok_or_else(|| {
                DomainError::DataIntegrity(format!(
                    "order {order_id} references missing service {id}"
                ))
            })?;
            self.service_cache.insert(id, service);
        }
        Ok(&self.service_cache[&id])
    }

    fn customer(&mut self, id: i32, order_id: i64) -> Result<&Customer, DomainError> {
        if !self.customer_cache.contains_key(&id) {
            let customer = self.customers.find_customer(id)?.ok_or_else(|| {
                DomainError::DataIntegrity(format!(
                    "order {order_id} references missing customer {id}"
                ))
            })?;
            self.customer_cache.insert(id, customer);
        }
        Ok(&self.customer_cache[&id])
    }
}

/// Slice `[offset, offset + size)` out of already grouped orders. Out of range
/// offsets give an empty page, a short tail gives a short page.
pub fn paginate(orders: Vec<LogicalOrder>, offset: usize, size: usize) -> Vec<LogicalOrder> {
    if offset >= orders.len() {
        return Vec::new();
    }
    let end = offset.saturating_add(size).min(orders.len());
    orders.into_iter().skip(offset).take(end - offset).collect()
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::infrastructure::memory::{InMemoryCatalog, InMemoryCustomers};

    fn line(line_id: i64, order_id: i64, service_id: i32) -> OrderLine {
        OrderLine {
            line_id,
            order_id,
            customer_id: 1,
            service_id,
            status: "pending".to_string(),
            started_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            delivered: false,
            delivered_at: None,
        }
    }

    fn fixtures() -> (InMemoryCatalog, InMemoryCustomers) {
        let catalog = InMemoryCatalog::default();
        for id in [10, 20, 30] {
            catalog.insert(Service {
                id,
                name: format!("service-{id}"),
                price: BigDecimal::from(id),
                image_url: format!("https://img.example/{id}.png"),
            });
        }
        let customers = InMemoryCustomers::default();
        customers.insert(Customer {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        });
        (catalog, customers)
    }

    fn service_ids(order: &LogicalOrder) -> Vec<i32> {
        order.services.iter().map(|s| s.service_id).collect()
    }

    #[test]
    fn groups_lines_in_first_seen_order() {
        let (catalog, customers) = fixtures();
        let mut agg = OrderAggregator::new(&catalog, &customers);

        let orders = agg
            .group(vec![
                line(1, 300, 10),
                line(2, 300, 20),
                line(3, 100, 30),
                line(4, 200, 10),
                line(5, 100, 10),
            ])
            .expect("group failed");

        let ids: Vec<i64> = orders.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![300, 100, 200]);
        assert_eq!(service_ids(&orders[0]), vec![10, 20]);
        assert_eq!(service_ids(&orders[1]), vec![30, 10]);
        assert_eq!(orders[0].customer_name, "Ada");
        assert_eq!(orders[0].services[1].name, "service-20");
    }

    #[test]
    fn header_comes_from_first_line() {
        let (catalog, customers) = fixtures();
        let mut first = line(1, 7, 10);
        first.status = "shipped".to_string();
        let mut second = line(2, 7, 20);
        second.status = "pending".to_string();

        let order = OrderAggregator::new(&catalog, &customers)
            .one(vec![first, second])
            .expect("one failed");

        assert_eq!(order.status, "shipped");
        assert_eq!(order.services.len(), 2);
    }

    #[test]
    fn one_without_lines_is_not_found() {
        let (catalog, customers) = fixtures();
        let result = OrderAggregator::new(&catalog, &customers).one(vec![]);
        assert!(matches!(result, Err(DomainError::NotFound)));
    }

    #[test]
    fn missing_service_aborts_aggregation() {
        let (catalog, customers) = fixtures();
        let result = OrderAggregator::new(&catalog, &customers)
            .group(vec![line(1, 1, 10), line(2, 2, 99)]);
        assert!(matches!(result, Err(DomainError::DataIntegrity(_))));
    }

    #[test]
    fn missing_customer_aborts_aggregation() {
        let (catalog, customers) = fixtures();
        let mut orphan = line(1, 1, 10);
        orphan.customer_id = 42;
        let result = OrderAggregator::new(&catalog, &customers).group(vec![orphan]);
        assert!(matches!(result, Err(DomainError::DataIntegrity(_))));
    }

    fn orders(n: i64) -> Vec<LogicalOrder> {
        let (catalog, customers) = fixtures();
        let lines = (0..n).map(|i| line(i, 1000 - i, 10)).collect();
        OrderAggregator::new(&catalog, &customers)
            .group(lines)
            .expect("group failed")
    }

    #[test]
    fn paginate_returns_requested_slice() {
        let page = paginate(orders(10), 5, 5);
        let ids: Vec<i64> = page.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![995, 994, 993, 992, 991]);
    }

    #[test]
    fn paginate_truncates_short_tail() {
        assert_eq!(paginate(orders(7), 5, 5).len(), 2);
    }

    #[test]
    fn paginate_past_end_is_empty() {
        assert!(paginate(orders(5), 5, 5).is_empty());
        assert!(paginate(orders(3), 10, 5).is_empty());
    }
}
