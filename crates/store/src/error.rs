use common::{OrderId, ProductId};
use domain::DomainError;
use thiserror::Error;

/// Errors that can occur when interacting with the orders store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row referenced an entity that does not exist.
    #[error("Missing reference: {entity} {id} does not exist")]
    MissingReference { entity: &'static str, id: String },

    /// The same product id appears more than once in an order being saved.
    #[error("Order {order_id} holds product {product_id} more than once")]
    DuplicateProduct {
        order_id: OrderId,
        product_id: ProductId,
    },

    /// A text value is longer than its column allows.
    #[error("{entity} {field} is {len} characters long; the limit is {max}")]
    ValueTooLong {
        entity: &'static str,
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A stored row could not be turned back into an entity.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
