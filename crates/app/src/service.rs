//! Order service providing a simplified API for order operations.

use domain::{Order, OrderId, OrderStatus, Product, User, UserId};
use store::{OrdersStore, OrdersStoreExt};

use crate::error::{Result, ServiceError};

/// Service for managing users and orders.
///
/// Each operation loads the aggregate, applies the domain behavior and saves
/// it back. Callers that share an order across tasks must serialize access to
/// it; the service does not lock.
pub struct OrderService<S: OrdersStore> {
    store: S,
}

impl<S: OrdersStore> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new user.
    #[tracing::instrument(skip(self))]
    pub async fn register_user(&self, name: &str, email: &str) -> Result<User> {
        let user = User::new(UserId::new(), name, email)?;
        self.store.save_user(&user).await?;
        Ok(user)
    }

    /// Places a pending order for an existing user.
    #[tracing::instrument(skip(self, products), fields(products = products.len()))]
    pub async fn place_order(&self, user_id: UserId, products: Vec<Product>) -> Result<Order> {
        if !self.store.user_exists(user_id).await? {
            return Err(ServiceError::NotFound {
                entity: "User",
                id: user_id.to_string(),
            });
        }

        let mut order = Order::place(user_id)?;
        order.add_products(products)?;
        self.store.save_order(&order).await?;

        tracing::info!(order_id = %order.id(), total = %order.total(), "order placed");
        Ok(order)
    }

    /// Adds products to an existing order.
    #[tracing::instrument(skip(self, products), fields(products = products.len()))]
    pub async fn add_products(&self, order_id: OrderId, products: Vec<Product>) -> Result<Order> {
        let mut order = self.load_order(order_id).await?;
        order.add_products(products)?;
        self.store.save_order(&order).await?;
        Ok(order)
    }

    /// Moves an order to a new status.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut order = self.load_order(order_id).await?;
        order.transition_to(status)?;
        self.store.save_order(&order).await?;
        Ok(order)
    }

    /// Gets an order by id.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.store.get_order(order_id).await?)
    }

    /// Lists a user's orders, oldest first.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        Ok(self.store.orders_for_user(user_id).await?)
    }

    async fn load_order(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound {
                entity: "Order",
                id: order_id.to_string(),
            })
    }
}
