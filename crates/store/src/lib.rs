//! Persistence for the orders data layer.
//!
//! The [`OrdersStore`] trait is implemented by [`PostgresOrdersStore`] and by
//! [`InMemoryOrdersStore`] for tests and database-less runs.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrdersStore;
pub use postgres::PostgresOrdersStore;
pub use store::{
    OrdersStore, OrdersStoreExt, PRODUCT_NAME_MAX_LEN, StoreCounts, USER_EMAIL_MAX_LEN,
    USER_NAME_MAX_LEN, validate_order_for_save, validate_user_for_save,
};
