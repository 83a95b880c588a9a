//! Order aggregate and its status.

mod aggregate;
mod status;

pub use aggregate::Order;
pub use status::OrderStatus;
