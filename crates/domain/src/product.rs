//! Product entity.

use common::{OrderId, ProductId};
use serde::Serialize;

use crate::error::guard;
use crate::{DomainError, Money};

/// A product line belonging to at most one order.
///
/// The `order_id` back-reference is only changed by the owning [`Order`]
/// when the product is added to it.
///
/// [`Order`]: crate::Order
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    id: ProductId,
    order_id: Option<OrderId>,
    name: String,
    price: Money,
}

impl Product {
    /// Creates a validated product.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Money,
        order_id: Option<OrderId>,
    ) -> Result<Self, DomainError> {
        let name = name.into();

        guard::not_empty_id("id", id.is_empty())?;
        guard::not_blank("name", &name)?;
        guard::not_negative("price", price)?;
        if let Some(order_id) = order_id {
            guard::not_empty_id("order_id", order_id.is_empty())?;
        }

        Ok(Self {
            id,
            order_id,
            name,
            price,
        })
    }

    #[cfg(any(test, feature = "storage"))]
    pub(crate) fn from_parts(
        id: ProductId,
        order_id: Option<OrderId>,
        name: String,
        price: Money,
    ) -> Self {
        Self {
            id,
            order_id,
            name,
            price,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    /// The owning order, if the product has been attached to one.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    /// Overwrites the back-reference unconditionally.
    pub(crate) fn set_order_id(&mut self, order_id: OrderId) -> Result<(), DomainError> {
        guard::not_empty_id("order_id", order_id.is_empty())?;
        self.order_id = Some(order_id);
        Ok(())
    }
}

impl PartialEq for Product {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Product {}

impl std::hash::Hash for Product {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
