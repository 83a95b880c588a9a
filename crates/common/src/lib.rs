//! Identifier types shared across the orders data layer.

mod types;

pub use types::{OrderId, ProductId, UserId};
