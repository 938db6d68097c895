use diesel::prelude::*;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::order::{Customer, Service};
use crate::domain::ports::{CustomerDirectory, ServiceCatalog};
use crate::schema::{customers, services};

use super::models::{CustomerRow, ServiceRow};

/// Read-only lookups into the service catalog, which is managed elsewhere.
pub struct DieselServiceCatalog {
    pool: DbPool,
}

impl DieselServiceCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ServiceCatalog for DieselServiceCatalog {
    fn find_service(&self, id: i32) -> Result<Option<Service>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = services::table
            .filter(services::id.eq(id))
            .select(ServiceRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Service::from))
    }
}

pub struct DieselCustomerDirectory {
    pool: DbPool,
}

impl DieselCustomerDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CustomerDirectory for DieselCustomerDirectory {
    fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = customers::table
            .filter(customers::id.eq(id))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Customer::from))
    }

    fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = customers::table
            .filter(customers::email.eq(email))
            .select(CustomerRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(Customer::from))
    }
}
