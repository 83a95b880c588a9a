use std::collections::HashSet;

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Order, User};

use crate::{Result, StoreError};

/// Longest user name the schema stores, in characters.
pub const USER_NAME_MAX_LEN: usize = 100;
/// Longest email the schema stores, in characters.
pub const USER_EMAIL_MAX_LEN: usize = 200;
/// Longest product name the schema stores, in characters.
pub const PRODUCT_NAME_MAX_LEN: usize = 100;

/// Row counts across the three tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub users: u64,
    pub orders: u64,
    pub products: u64,
}

impl StoreCounts {
    /// Returns true if no table holds any rows.
    pub fn is_empty(&self) -> bool {
        self.users == 0 && self.orders == 0 && self.products == 0
    }
}

/// Core trait for order store implementations.
///
/// A store persists the user → order → product graph and hands entities back
/// through the domain materializers. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait OrdersStore: Send + Sync {
    /// Saves users together with all of their orders and products.
    ///
    /// The batch is atomic: either every row is written or none is.
    async fn save_users(&self, users: &[User]) -> Result<()>;

    /// Saves users like [`save_users`](Self::save_users), but only into a
    /// store with no rows at all.
    ///
    /// The emptiness check and the write happen atomically, so of several
    /// concurrent callers at most one writes. Returns false if the store
    /// already held data.
    async fn save_users_if_empty(&self, users: &[User]) -> Result<bool>;

    /// Saves an order and replaces its stored product set.
    ///
    /// Fails with `MissingReference` if the order's user does not exist.
    async fn save_order(&self, order: &Order) -> Result<()>;

    /// Loads a user with their orders and products.
    async fn get_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Loads an order with its products in insertion order.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads every order of a user, oldest first.
    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>>;

    /// Deletes a user, cascading to their orders and products.
    ///
    /// Returns false if the user did not exist.
    async fn delete_user(&self, user_id: UserId) -> Result<bool>;

    /// Deletes an order, cascading to its products.
    ///
    /// Returns false if the order did not exist.
    async fn delete_order(&self, order_id: OrderId) -> Result<bool>;

    /// Counts the stored rows.
    async fn counts(&self) -> Result<StoreCounts>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrdersStoreExt: OrdersStore {
    /// Saves a single user with their orders.
    async fn save_user(&self, user: &User) -> Result<()> {
        self.save_users(std::slice::from_ref(user)).await
    }

    /// Returns true if nothing has been stored yet.
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.counts().await?.is_empty())
    }

    /// Checks if a user exists.
    async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.get_user(user_id).await?.is_some())
    }
}

// Blanket implementation for all OrdersStore implementations
impl<T: OrdersStore + ?Sized> OrdersStoreExt for T {}

/// Validates a user and all of their orders before saving.
pub fn validate_user_for_save(user: &User) -> Result<()> {
    check_len("User", "name", user.name(), USER_NAME_MAX_LEN)?;
    check_len("User", "email", user.email(), USER_EMAIL_MAX_LEN)?;
    for order in user.orders() {
        validate_order_for_save(order)?;
    }
    Ok(())
}

/// Validates an order before saving.
///
/// Product ids are primary keys, so an order holding the same product twice
/// cannot be stored.
pub fn validate_order_for_save(order: &Order) -> Result<()> {
    let mut seen = HashSet::with_capacity(order.product_count());
    for product in order.products() {
        check_len("Product", "name", product.name(), PRODUCT_NAME_MAX_LEN)?;
        if !seen.insert(product.id()) {
            return Err(StoreError::DuplicateProduct {
                order_id: order.id(),
                product_id: product.id(),
            });
        }
    }
    Ok(())
}

fn check_len(entity: &'static str, field: &'static str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(StoreError::ValueTooLong {
            entity,
            field,
            len,
            max,
        });
    }
    Ok(())
}
