use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::aggregate::{paginate, OrderAggregator};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    CreateOrder, Customer, LogicalOrder, NewOrderLines, OrderLine, OrderedService, PageRequest,
};
use crate::domain::order_id::OrderIdGenerator;
use crate::domain::ports::{CustomerDirectory, OrderLineStore, ServiceCatalog};

/// Order workflows on top of the line store. All methods block on storage and
/// are meant to run inside `web::block`.
#[derive(Clone)]
pub struct OrderService {
    lines: Arc<dyn OrderLineStore>,
    catalog: Arc<dyn ServiceCatalog>,
    customers: Arc<dyn CustomerDirectory>,
    ids: Arc<OrderIdGenerator>,
}

impl OrderService {
    pub fn new(
        lines: Arc<dyn OrderLineStore>,
        catalog: Arc<dyn ServiceCatalog>,
        customers: Arc<dyn CustomerDirectory>,
        ids: Arc<OrderIdGenerator>,
    ) -> Self {
        Self {
            lines,
            catalog,
            customers,
            ids,
        }
    }

    fn aggregator(&self) -> OrderAggregator<'_> {
        OrderAggregator::new(self.catalog.as_ref(), self.customers.as_ref())
    }

    fn caller(&self, email: &str) -> Result<Customer, DomainError> {
        self.customers
            .find_customer_by_email(email)?
            .ok_or_else(|| DomainError::Unauthorized(format!("no customer registered for {email}")))
    }

    /// Create one line per requested service under a fresh order id.
    ///
    /// Everything is validated before anything is written, and the lines are
    /// written in a single transaction.
    pub fn create_order(
        &self,
        caller_email: &str,
        request: CreateOrder,
    ) -> Result<LogicalOrder, DomainError> {
        let customer = self.caller(caller_email)?;
        if customer.id != request.customer_id {
            return Err(DomainError::Unauthorized(
                "user id does not belong to current customer".to_string(),
            ));
        }
        if request.service_ids.is_empty() {
            return Err(DomainError::InvalidInput(
                "service_ids array cannot be empty".to_string(),
            ));
        }
        if request.status.is_empty() {
            return Err(DomainError::InvalidInput("order_status is required".to_string()));
        }

        let services = request
            .service_ids
            .iter()
            .map(|&id| {
                self.catalog
                    .find_service(id)?
                    .map(|s| OrderedService::from(&s))
                    .ok_or_else(|| DomainError::InvalidInput(format!("unknown service id {id}")))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        let order_id = self.ids.next_order_id();
        if order_id == 0 {
            return Err(DomainError::Internal("failed to generate order id".to_string()));
        }

        let created = self.lines.create_lines(NewOrderLines {
            order_id,
            customer_id: customer.id,
            status: request.status,
            service_ids: request.service_ids,
        })?;
        let first = created
            .first()
            .ok_or_else(|| DomainError::Internal(format!("order {order_id} has no lines")))?;

        log::info!(
            "Created order {} for customer {} with {} service(s)",
            order_id,
            customer.id,
            created.len()
        );

        Ok(LogicalOrder {
            order_id,
            customer_id: customer.id,
            customer_name: customer.name,
            status: first.status.clone(),
            started_at: first.started_at,
            delivered: first.delivered,
            delivered_at: first.delivered_at,
            services,
        })
    }

    pub fn get_order(&self, order_id: i64) -> Result<LogicalOrder, DomainError> {
        let lines = self.lines.find_by_order_id(order_id)?;
        self.aggregator().one(lines)
    }

    /// Like [`get_order`](Self::get_order), but only for the customer who owns it.
    pub fn get_customer_order(
        &self,
        caller_email: &str,
        order_id: i64,
    ) -> Result<LogicalOrder, DomainError> {
        let customer = self.caller(caller_email)?;
        let order = self.get_order(order_id)?;
        if order.customer_id != customer.id {
            return Err(DomainError::Unauthorized(
                "order does not belong to current customer".to_string(),
            ));
        }
        Ok(order)
    }

    /// Raw lines of one order, oldest first.
    pub fn order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, DomainError> {
        let lines = self.lines.find_by_order_id(order_id)?;
        if lines.is_empty() {
            return Err(DomainError::NotFound);
        }
        Ok(lines)
    }

    /// One page of logical orders, newest order id first. Rows are grouped
    /// before the page is cut, so an order is never split across pages.
    pub fn list_orders(&self, page: PageRequest) -> Result<Vec<LogicalOrder>, DomainError> {
        let lines = self.lines.list_for_latest_orders(page.order_window())?;
        let orders = self.aggregator().group(lines)?;

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(page.page_size).unwrap_or(0);
        Ok(paginate(orders, offset, size))
    }

    /// Every logical order, ordered by the newest line first.
    pub fn list_all_orders(&self) -> Result<Vec<LogicalOrder>, DomainError> {
        let lines = self.lines.list_all()?;
        self.aggregator().group(lines)
    }

    pub fn update_status(&self, order_id: i64, status: &str) -> Result<OrderLine, DomainError> {
        if status.is_empty() {
            return Err(DomainError::InvalidInput("order_status is required".to_string()));
        }
        let updated = self
            .lines
            .update_status(order_id, status)?
            .ok_or(DomainError::NotFound)?;
        log::info!("Order {} status set to '{}'", order_id, status);
        Ok(updated)
    }

    pub fn update_delivery(
        &self,
        order_id: i64,
        delivered: bool,
        delivered_at: DateTime<Utc>,
    ) -> Result<OrderLine, DomainError> {
        let updated = self
            .lines
            .update_delivery(order_id, delivered, delivered_at)?
            .ok_or(DomainError::NotFound)?;
        log::info!("Order {} delivered={} at {}", order_id, delivered, delivered_at);
        Ok(updated)
    }

    pub fn delete_order(&self, order_id: i64) -> Result<(), DomainError> {
        match self.lines.delete_order(order_id)? {
            0 => Err(DomainError::NotFound),
            n => {
                log::info!("Deleted order {} ({} line(s))", order_id, n);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use chrono::TimeZone;

    use super::*;
    use crate::domain::order::Service;
    use crate::infrastructure::memory::{InMemoryCatalog, InMemoryCustomers, InMemoryOrderLineStore};

    const ADA: &str = "ada@example.com";
    const BOB: &str = "bob@example.com";

    struct Fixture {
        service: OrderService,
        lines: Arc<InMemoryOrderLineStore>,
        catalog: Arc<InMemoryCatalog>,
    }

    fn fixture() -> Fixture {
        let lines = Arc::new(InMemoryOrderLineStore::new());
        let catalog = Arc::new(InMemoryCatalog::default());
        for id in [10, 20, 30] {
            catalog.insert(Service {
                id,
                name: format!("service-{id}"),
                price: BigDecimal::from(id),
                image_url: String::new(),
            });
        }
        let customers = Arc::new(InMemoryCustomers::default());
        customers.insert(Customer {
            id: 1,
            name: "Ada".to_string(),
            email: ADA.to_string(),
        });
        customers.insert(Customer {
            id: 2,
            name: "Bob".to_string(),
            email: BOB.to_string(),
        });

        let service = OrderService::new(
            lines.clone(),
            catalog.clone(),
            customers,
            Arc::new(OrderIdGenerator::new()),
        );
        Fixture {
            service,
            lines,
            catalog,
        }
    }

    fn create(customer_id: i32, service_ids: Vec<i32>) -> CreateOrder {
        CreateOrder {
            customer_id,
            service_ids,
            status: "pending".to_string(),
        }
    }

    #[test]
    fn create_writes_one_uniform_line_per_service() {
        let f = fixture();
        let order = f
            .service
            .create_order(ADA, create(1, vec![10, 20, 30]))
            .expect("create failed");

        let lines = f.lines.find_by_order_id(order.order_id).unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.order_id == order.order_id
            && l.customer_id == 1
            && l.status == "pending"
            && l.started_at == lines[0].started_at));
        let ids: Vec<i32> = order.services.iter().map(|s| s.service_id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
        assert_eq!(order.customer_name, "Ada");
    }

    #[test]
    fn create_then_get_round_trips_services_in_creation_order() {
        let f = fixture();
        let created = f.service.create_order(ADA, create(1, vec![30, 10])).unwrap();
        let fetched = f.service.get_order(created.order_id).unwrap();
        assert_eq!(fetched, created);
    }

    #[test]
    fn create_rejects_other_customers_id() {
        let f = fixture();
        let result = f.service.create_order(ADA, create(2, vec![10]));
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
        assert!(f.lines.list_all().unwrap().is_empty());
    }

    #[test]
    fn create_rejects_unknown_caller() {
        let f = fixture();
        let result = f.service.create_order("eve@example.com", create(1, vec![10]));
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[test]
    fn create_rejects_empty_service_list_before_writing() {
        let f = fixture();
        let result = f.service.create_order(ADA, create(1, vec![]));
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert!(f.lines.list_all().unwrap().is_empty());
    }

    #[test]
    fn create_keeps_status_label_as_given() {
        let f = fixture();
        let mut request = create(1, vec![10]);
        request.status = " queued ".to_string();
        let order = f.service.create_order(ADA, request).unwrap();
        assert_eq!(order.status, " queued ");

        let mut empty = create(1, vec![10]);
        empty.status = String::new();
        assert!(matches!(
            f.service.create_order(ADA, empty),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn create_with_unknown_service_writes_nothing() {
        let f = fixture();
        let result = f.service.create_order(ADA, create(1, vec![10, 99, 20]));
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert!(f.lines.list_all().unwrap().is_empty());
    }

    #[test]
    fn create_fails_when_id_generation_fails() {
        let f = fixture();
        let customers = Arc::new(InMemoryCustomers::default());
        customers.insert(Customer {
            id: 1,
            name: "Ada".to_string(),
            email: ADA.to_string(),
        });
        // A counter this large no longer fits in an i64 once formatted.
        let ids = OrderIdGenerator::new().starting_at(1_000_000_000_000);
        let broken = OrderService::new(f.lines.clone(), f.catalog.clone(), customers, Arc::new(ids));

        let result = broken.create_order(ADA, create(1, vec![10]));
        assert!(matches!(result, Err(DomainError::Internal(_))));
        assert!(f.lines.list_all().unwrap().is_empty());
    }

    #[test]
    fn get_unknown_order_is_not_found() {
        let f = fixture();
        assert!(matches!(f.service.get_order(1), Err(DomainError::NotFound)));
        assert!(matches!(f.service.order_lines(1), Err(DomainError::NotFound)));
    }

    #[test]
    fn customer_can_only_read_own_orders() {
        let f = fixture();
        let order = f.service.create_order(ADA, create(1, vec![10])).unwrap();
        assert!(f.service.get_customer_order(ADA, order.order_id).is_ok());
        assert!(matches!(
            f.service.get_customer_order(BOB, order.order_id),
            Err(DomainError::Unauthorized(_))
        ));
    }

    #[test]
    fn deleted_service_surfaces_as_data_integrity() {
        let f = fixture();
        let order = f.service.create_order(ADA, create(1, vec![10, 20])).unwrap();
        f.catalog.remove(20);
        assert!(matches!(
            f.service.get_order(order.order_id),
            Err(DomainError::DataIntegrity(_))
        ));
        assert!(matches!(
            f.service.list_all_orders(),
            Err(DomainError::DataIntegrity(_))
        ));
    }

    /// Ten orders with one to three lines each, created in ascending id order.
    fn ten_orders(f: &Fixture) -> Vec<i64> {
        let shapes = [
            vec![10],
            vec![10, 20],
            vec![10, 20, 30],
            vec![20],
            vec![30, 10],
            vec![10, 20, 30],
            vec![20, 30],
            vec![10],
            vec![30],
            vec![10, 30, 20],
        ];
        shapes
            .into_iter()
            .map(|ids| f.service.create_order(ADA, create(1, ids)).unwrap().order_id)
            .collect()
    }

    #[test]
    fn second_page_holds_orders_six_to_ten() {
        let f = fixture();
        let mut ids = ten_orders(&f);
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let page = f
            .service
            .list_orders(PageRequest::new(2, 5).unwrap())
            .expect("list failed");
        let page_ids: Vec<i64> = page.iter().map(|o| o.order_id).collect();
        assert_eq!(page_ids, ids[5..10].to_vec());

        for order in &page {
            let stored = f.lines.find_by_order_id(order.order_id).unwrap();
            assert_eq!(order.services.len(), stored.len());
        }
    }

    #[test]
    fn first_page_is_newest_orders() {
        let f = fixture();
        let mut ids = ten_orders(&f);
        ids.sort_unstable_by(|a, b| b.cmp(a));

        let page = f.service.list_orders(PageRequest::new(1, 5).unwrap()).unwrap();
        let page_ids: Vec<i64> = page.iter().map(|o| o.order_id).collect();
        assert_eq!(page_ids, ids[0..5].to_vec());
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let f = fixture();
        ten_orders(&f);
        let page = f.service.list_orders(PageRequest::new(3, 5).unwrap()).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn short_last_page_is_truncated() {
        let f = fixture();
        ten_orders(&f);
        let page = f.service.list_orders(PageRequest::new(2, 6).unwrap()).unwrap();
        assert_eq!(page.len(), 4);
    }

    #[test]
    fn list_all_groups_every_order() {
        let f = fixture();
        let ids = ten_orders(&f);
        let all = f.service.list_all_orders().unwrap();
        assert_eq!(all.len(), 10);
        // Newest line first means the last created order leads.
        assert_eq!(all[0].order_id, *ids.last().unwrap());
        assert_eq!(all.iter().map(|o| o.services.len()).sum::<usize>(), 19);
    }

    #[test]
    fn status_update_applies_to_all_lines() {
        let f = fixture();
        let order = f.service.create_order(ADA, create(1, vec![10, 20, 30])).unwrap();

        let updated = f.service.update_status(order.order_id, "shipped").unwrap();
        assert_eq!(updated.status, "shipped");

        let lines = f.lines.find_by_order_id(order.order_id).unwrap();
        assert!(lines.iter().all(|l| l.status == "shipped"));
        assert_eq!(f.service.get_order(order.order_id).unwrap().status, "shipped");
    }

    #[test]
    fn status_update_stores_any_non_empty_label_verbatim() {
        let f = fixture();
        let order = f.service.create_order(ADA, create(1, vec![10, 20])).unwrap();

        let long = "awaiting pickup at the north depot, second loading bay";
        for label in ["on the moon", "  ", long] {
            let line = f.service.update_status(order.order_id, label).unwrap();
            assert_eq!(line.status, label);
            let stored = f.lines.find_by_order_id(order.order_id).unwrap();
            assert!(stored.iter().all(|l| l.status == label));
        }

        assert!(matches!(
            f.service.update_status(order.order_id, ""),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn updates_of_unknown_order_are_not_found() {
        let f = fixture();
        assert!(matches!(
            f.service.update_status(1, "shipped"),
            Err(DomainError::NotFound)
        ));
        assert!(matches!(
            f.service.update_delivery(1, true, Utc::now()),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn delivery_update_applies_to_all_lines() {
        let f = fixture();
        let order = f.service.create_order(ADA, create(1, vec![10, 20])).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();

        f.service.update_delivery(order.order_id, true, at).unwrap();

        let fetched = f.service.get_order(order.order_id).unwrap();
        assert!(fetched.delivered);
        assert_eq!(fetched.delivered_at, Some(at));
        assert!(f
            .lines
            .find_by_order_id(order.order_id)
            .unwrap()
            .iter()
            .all(|l| l.delivered && l.delivered_at == Some(at)));
    }

    #[test]
    fn delete_removes_order() {
        let f = fixture();
        let order = f.service.create_order(ADA, create(1, vec![10, 20])).unwrap();
        f.service.delete_order(order.order_id).unwrap();
        assert!(matches!(f.service.get_order(order.order_id), Err(DomainError::NotFound)));
        assert!(matches!(
            f.service.delete_order(order.order_id),
            Err(DomainError::NotFound)
        ));
    }
}
