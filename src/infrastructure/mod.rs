pub mod catalog_repo;
pub mod memory;
pub mod models;
pub mod order_line_repo;

#[cfg(test)]
mod test_support;

pub use catalog_repo::{DieselCustomerDirectory, DieselServiceCatalog};
pub use order_line_repo::DieselOrderLineStore;
