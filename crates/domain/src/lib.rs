//! Domain layer for the orders data layer.
//!
//! This crate provides:
//! - `User`, `Order` and `Product` entities, each validated on construction
//! - `Order` as the aggregate root over its products with a running `total`
//! - `OrderStatus` with an explicit transition table
//! - Materializers that storage adapters use to rebuild stored entities,
//!   behind the `storage` feature

pub mod error;
#[cfg(any(test, feature = "storage"))]
pub mod materialize;
pub mod order;
pub mod product;
pub mod user;
pub mod value_objects;

pub use common::{OrderId, ProductId, UserId};
pub use error::DomainError;
#[cfg(any(test, feature = "storage"))]
pub use materialize::{OrderMaterializer, ProductMaterializer, UserMaterializer};
pub use order::{Order, OrderStatus};
pub use product::Product;
pub use user::User;
pub use value_objects::Money;
