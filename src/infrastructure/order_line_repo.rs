use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrderLines, OrderLine};
use crate::domain::ports::OrderLineStore;
use crate::schema::order_lines;

use super::models::{NewOrderLineRow, OrderLineRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Internal(e.to_string())
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct DieselOrderLineStore {
    pool: DbPool,
}

impl DieselOrderLineStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn representative(rows: Vec<OrderLineRow>) -> Option<OrderLine> {
    rows.into_iter().min_by_key(|r| r.id).map(OrderLine::from)
}

impl OrderLineStore for DieselOrderLineStore {
    fn create_lines(&self, order: NewOrderLines) -> Result<Vec<OrderLine>, DomainError> {
        let mut conn = self.pool.get()?;

        // Every line shares the transaction's now() as started_at, and a
        // failure on any line rolls back the whole order.
        conn.transaction::<_, DomainError, _>(|conn| {
            let mut created = Vec::with_capacity(order.service_ids.len());
            for &service_id in &order.service_ids {
                let row = diesel::insert_into(order_lines::table)
                    .values(&NewOrderLineRow {
                        order_id: order.order_id,
                        customer_id: order.customer_id,
                        service_id,
                        status: &order.status,
                    })
                    .returning(OrderLineRow::as_returning())
                    .get_result(conn)?;
                created.push(OrderLine::from(row));
            }
            Ok(created)
        })
    }

    fn find_by_order_id(&self, order_id: i64) -> Result<Vec<OrderLine>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = order_lines::table
            .filter(order_lines::order_id.eq(order_id))
            .order(order_lines::id.asc())
            .select(OrderLineRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    fn list_for_latest_orders(&self, order_count: i64) -> Result<Vec<OrderLine>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order_ids: Vec<i64> = order_lines::table
                .select(order_lines::order_id)
                .distinct()
                .order(order_lines::order_id.desc())
                .limit(order_count)
                .load(conn)?;

            if order_ids.is_empty() {
                return Ok(Vec::new());
            }

            let rows = order_lines::table
                .filter(order_lines::order_id.eq_any(order_ids))
                .order((order_lines::order_id.desc(), order_lines::id.asc()))
                .select(OrderLineRow::as_select())
                .load(conn)?;

            Ok(rows.into_iter().map(OrderLine::from).collect())
        })
    }

    fn list_all(&self) -> Result<Vec<OrderLine>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = order_lines::table
            .order(order_lines::id.desc())
            .select(OrderLineRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(OrderLine::from).collect())
    }

    fn update_status(
        &self,
        order_id: i64,
        status: &str,
    ) -> Result<Option<OrderLine>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = diesel::update(order_lines::table.filter(order_lines::order_id.eq(order_id)))
            .set(order_lines::status.eq(status))
            .returning(OrderLineRow::as_returning())
            .get_results(&mut conn)?;

        Ok(representative(rows))
    }

    fn update_delivery(
        &self,
        order_id: i64,
        delivered: bool,
        delivered_at: DateTime<Utc>,
    ) -> Result<Option<OrderLine>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = diesel::update(order_lines::table.filter(order_lines::order_id.eq(order_id)))
            .set((
                order_lines::delivered.eq(delivered),
                order_lines::delivered_at.eq(Some(delivered_at)),
            ))
            .returning(OrderLineRow::as_returning())
            .get_results(&mut conn)?;

        Ok(representative(rows))
    }

    fn delete_order(&self, order_id: i64) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        let deleted =
            diesel::delete(order_lines::table.filter(order_lines::order_id.eq(order_id)))
                .execute(&mut conn)?;

        Ok(deleted)
    }
}
