//! User entity.

use common::UserId;
use serde::Serialize;

use crate::error::guard;
use crate::{DomainError, Order};

/// A user and the orders placed under their id.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    id: UserId,
    name: String,
    email: String,
    orders: Vec<Order>,
}

impl User {
    /// Creates a validated user with no orders.
    pub fn new(
        id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let email = email.into();

        guard::not_empty_id("id", id.is_empty())?;
        guard::not_blank("name", &name)?;
        guard::not_blank("email", &email)?;

        Ok(Self {
            id,
            name,
            email,
            orders: Vec::new(),
        })
    }

    #[cfg(any(test, feature = "storage"))]
    pub(crate) fn from_parts(id: UserId, name: String, email: String, orders: Vec<Order>) -> Self {
        Self {
            id,
            name,
            email,
            orders,
        }
    }

    pub fn id(&self) -> UserId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the user's orders in the order they were added.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Appends an order placed by this user.
    pub fn add_order(&mut self, order: Order) -> Result<(), DomainError> {
        if order.user_id() != self.id {
            return Err(DomainError::invalid(
                "order",
                format!("order {} belongs to user {}", order.id(), order.user_id()),
            ));
        }
        self.orders.push(order);
        Ok(())
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for User {}

impl std::hash::Hash for User {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
