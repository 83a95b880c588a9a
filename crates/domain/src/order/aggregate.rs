//! Order aggregate implementation.

use common::{OrderId, UserId};
use serde::Serialize;

use crate::error::guard;
use crate::{DomainError, Money, Product};

use super::OrderStatus;

/// Order aggregate root.
///
/// Exclusively owns its products. `total` starts at the amount supplied on
/// construction and grows by each price passed to [`Order::add_product`] or
/// [`Order::add_products`]; nothing else changes it.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique order identifier.
    id: OrderId,

    /// User who placed the order.
    user_id: UserId,

    /// Current status of the order.
    status: OrderStatus,

    /// Products in the order, in the order they were added.
    products: Vec<Product>,

    /// Running total of the order.
    total: Money,
}

impl Order {
    /// Creates a validated order.
    ///
    /// `products` of `None` starts the order empty; `Some` must hold at least
    /// one product. Every supplied product is attached to the new order.
    /// `total` must be non-negative and is stored as given.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        status: OrderStatus,
        products: Option<Vec<Product>>,
        total: Money,
    ) -> Result<Self, DomainError> {
        guard::not_empty_id("id", id.is_empty())?;
        guard::not_empty_id("user_id", user_id.is_empty())?;
        if matches!(&products, Some(products) if products.is_empty()) {
            return Err(DomainError::invalid("products", "cannot be empty"));
        }
        guard::not_negative("total", total)?;

        let mut products = products.unwrap_or_default();
        for product in &mut products {
            product.set_order_id(id)?;
        }

        Ok(Self {
            id,
            user_id,
            status,
            products,
            total,
        })
    }

    /// Places a new, empty, pending order for a user under a generated id.
    pub fn place(user_id: UserId) -> Result<Self, DomainError> {
        Self::new(
            OrderId::new(),
            user_id,
            OrderStatus::Pending,
            None,
            Money::zero(),
        )
    }

    /// Rebuilds an order from stored parts, deriving `total` from the products.
    #[cfg(any(test, feature = "storage"))]
    pub(crate) fn from_parts(
        id: OrderId,
        user_id: UserId,
        status: OrderStatus,
        products: Vec<Product>,
    ) -> Result<Self, DomainError> {
        let total = Money::checked_sum(products.iter().map(Product::price))
            .ok_or_else(|| DomainError::out_of_range("total", "product prices overflow"))?;
        Ok(Self {
            id,
            user_id,
            status,
            products,
            total,
        })
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the products in insertion order.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Behavior
impl Order {
    /// Attaches a product to the order and adds its price to the total.
    ///
    /// Duplicates are not detected: adding the same product twice counts its
    /// price twice. Fails with `OutOfRange` if the total would overflow, leaving
    /// the order unchanged.
    pub fn add_product(&mut self, mut product: Product) -> Result<(), DomainError> {
        let total = self.total.checked_add(product.price()).ok_or_else(|| {
            DomainError::out_of_range(
                "total",
                format!("adding {} to {} overflows", product.price(), self.total),
            )
        })?;
        product.set_order_id(self.id)?;
        self.total = total;
        self.products.push(product);
        Ok(())
    }

    /// Attaches each product in sequence.
    ///
    /// Not atomic: if an element fails, the ones before it stay attached.
    pub fn add_products(
        &mut self,
        products: impl IntoIterator<Item = Product>,
    ) -> Result<(), DomainError> {
        for product in products {
            self.add_product(product)?;
        }
        Ok(())
    }

    /// Moves the order to `target` if the status table allows it.
    pub fn transition_to(&mut self, target: OrderStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Order {}

impl std::hash::Hash for Order {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
