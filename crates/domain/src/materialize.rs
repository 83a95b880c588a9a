//! Rebuilding entities from stored rows.
//!
//! These builders are for storage adapters only and are compiled in by the
//! `storage` feature. They skip the argument validation of the public
//! constructors, but every required field must be populated before
//! `try_build` hands out an entity.

use common::{OrderId, ProductId, UserId};

use crate::{DomainError, Money, Order, OrderStatus, Product, User};

impl User {
    /// Starts rebuilding a stored user.
    pub fn materialize() -> UserMaterializer {
        UserMaterializer::default()
    }
}

impl Order {
    /// Starts rebuilding a stored order.
    pub fn materialize() -> OrderMaterializer {
        OrderMaterializer::default()
    }
}

impl Product {
    /// Starts rebuilding a stored product.
    pub fn materialize() -> ProductMaterializer {
        ProductMaterializer::default()
    }
}

fn required<T>(value: Option<T>, argument: &'static str) -> Result<T, DomainError> {
    value.ok_or(DomainError::NullArgument { argument })
}

/// Builder for stored users.
#[derive(Debug, Default)]
pub struct UserMaterializer {
    id: Option<UserId>,
    name: Option<String>,
    email: Option<String>,
    orders: Vec<Order>,
}

impl UserMaterializer {
    pub fn id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the user's orders, replacing any set before.
    pub fn orders(mut self, orders: Vec<Order>) -> Self {
        self.orders = orders;
        self
    }

    /// Builds the user, failing if a required field was never set.
    pub fn try_build(self) -> Result<User, DomainError> {
        Ok(User::from_parts(
            required(self.id, "id")?,
            required(self.name, "name")?,
            required(self.email, "email")?,
            self.orders,
        ))
    }
}

/// Builder for stored orders.
///
/// The total is always recomputed from the products. A stored total that
/// disagrees is logged and discarded.
#[derive(Debug, Default)]
pub struct OrderMaterializer {
    id: Option<OrderId>,
    user_id: Option<UserId>,
    status: Option<OrderStatus>,
    products: Vec<Product>,
    stored_total: Option<Money>,
}

impl OrderMaterializer {
    pub fn id(mut self, id: OrderId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the products, replacing any set before.
    pub fn products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    /// Records the denormalized total read from storage, for drift checks.
    pub fn stored_total(mut self, total: Money) -> Self {
        self.stored_total = Some(total);
        self
    }

    /// Builds the order, failing if a required field was never set.
    pub fn try_build(self) -> Result<Order, DomainError> {
        let order = Order::from_parts(
            required(self.id, "id")?,
            required(self.user_id, "user_id")?,
            required(self.status, "status")?,
            self.products,
        )?;

        if let Some(stored) = self.stored_total
            && stored != order.total()
        {
            tracing::warn!(
                order_id = %order.id(),
                %stored,
                recomputed = %order.total(),
                "stored order total disagrees with its products; using recomputed total"
            );
        }

        Ok(order)
    }
}

/// Builder for stored products.
#[derive(Debug, Default)]
pub struct ProductMaterializer {
    id: Option<ProductId>,
    order_id: Option<OrderId>,
    name: Option<String>,
    price: Option<Money>,
}

impl ProductMaterializer {
    pub fn id(mut self, id: ProductId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn price(mut self, price: Money) -> Self {
        self.price = Some(price);
        self
    }

    /// Builds the product, failing if a required field was never set.
    ///
    /// `order_id` is optional, as it is on [`Product::new`].
    pub fn try_build(self) -> Result<Product, DomainError> {
        Ok(Product::from_parts(
            required(self.id, "id")?,
            self.order_id,
            required(self.name, "name")?,
            required(self.price, "price")?,
        ))
    }
}
