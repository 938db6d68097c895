pub mod aggregate;
pub mod errors;
pub mod order;
pub mod order_id;
pub mod ports;
