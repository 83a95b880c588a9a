use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Money, Order, OrderStatus, Product, User};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{OrdersStore, StoreCounts, validate_order_for_save, validate_user_for_save},
};

#[derive(Debug, Clone)]
struct UserRow {
    name: String,
    email: String,
}

#[derive(Debug, Clone)]
struct OrderRow {
    user_id: UserId,
    status: OrderStatus,
    total: Money,
    seq: u64,
}

#[derive(Debug, Clone)]
struct ProductRow {
    order_id: OrderId,
    name: String,
    price: Money,
    position: usize,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: HashMap<UserId, UserRow>,
    orders: HashMap<OrderId, OrderRow>,
    products: HashMap<ProductId, ProductRow>,
    next_seq: u64,
}

impl Tables {
    fn is_empty(&self) -> bool {
        self.users.is_empty() && self.orders.is_empty() && self.products.is_empty()
    }

    /// Returns a copy of the tables with `users` written, leaving `self`
    /// untouched if any row fails.
    fn staged_with(&self, users: &[User]) -> Result<Tables> {
        let mut staged = self.clone();
        for user in users {
            staged.write_user(user);
        }
        for order in users.iter().flat_map(User::orders) {
            staged.write_order(order)?;
        }
        Ok(staged)
    }

    fn write_user(&mut self, user: &User) {
        self.users.insert(
            user.id(),
            UserRow {
                name: user.name().to_string(),
                email: user.email().to_string(),
            },
        );
    }

    fn write_order(&mut self, order: &Order) -> Result<()> {
        if !self.users.contains_key(&order.user_id()) {
            return Err(StoreError::MissingReference {
                entity: "User",
                id: order.user_id().to_string(),
            });
        }

        let seq = match self.orders.get(&order.id()) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.orders.insert(
            order.id(),
            OrderRow {
                user_id: order.user_id(),
                status: order.status(),
                total: order.total(),
                seq,
            },
        );

        self.products.retain(|_, row| row.order_id != order.id());
        for (position, product) in order.products().iter().enumerate() {
            self.products.insert(
                product.id(),
                ProductRow {
                    order_id: order.id(),
                    name: product.name().to_string(),
                    price: product.price(),
                    position,
                },
            );
        }

        Ok(())
    }

    fn remove_order(&mut self, order_id: OrderId) -> bool {
        let existed = self.orders.remove(&order_id).is_some();
        self.products.retain(|_, row| row.order_id != order_id);
        existed
    }

    fn load_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let Some(row) = self.orders.get(&order_id) else {
            return Ok(None);
        };

        let mut rows: Vec<_> = self
            .products
            .iter()
            .filter(|(_, p)| p.order_id == order_id)
            .collect();
        rows.sort_by_key(|(_, p)| p.position);

        let products = rows
            .into_iter()
            .map(|(id, p)| {
                Product::materialize()
                    .id(*id)
                    .order_id(p.order_id)
                    .name(p.name.clone())
                    .price(p.price)
                    .try_build()
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let order = Order::materialize()
            .id(order_id)
            .user_id(row.user_id)
            .status(row.status)
            .products(products)
            .stored_total(row.total)
            .try_build()?;

        Ok(Some(order))
    }

    fn load_orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let mut ids: Vec<_> = self
            .orders
            .iter()
            .filter(|(_, row)| row.user_id == user_id)
            .map(|(id, row)| (row.seq, *id))
            .collect();
        ids.sort();

        let mut orders = Vec::with_capacity(ids.len());
        for (_, id) in ids {
            if let Some(order) = self.load_order(id)? {
                orders.push(order);
            }
        }
        Ok(orders)
    }
}

/// In-memory order store implementation for testing.
///
/// Keeps rows rather than entities, so loads go through the same
/// materialization path as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrdersStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryOrdersStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all tables.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
    }
}

#[async_trait]
impl OrdersStore for InMemoryOrdersStore {
    #[tracing::instrument(skip(self, users), fields(users = users.len()))]
    async fn save_users(&self, users: &[User]) -> Result<()> {
        for user in users {
            validate_user_for_save(user)?;
        }

        let mut tables = self.tables.write().await;
        *tables = tables.staged_with(users)?;

        metrics::counter!("store_users_saved_total").increment(users.len() as u64);
        Ok(())
    }

    #[tracing::instrument(skip(self, users), fields(users = users.len()))]
    async fn save_users_if_empty(&self, users: &[User]) -> Result<bool> {
        for user in users {
            validate_user_for_save(user)?;
        }

        let mut tables = self.tables.write().await;
        if !tables.is_empty() {
            return Ok(false);
        }
        *tables = tables.staged_with(users)?;

        metrics::counter!("store_users_saved_total").increment(users.len() as u64);
        Ok(true)
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn save_order(&self, order: &Order) -> Result<()> {
        validate_order_for_save(order)?;
        self.tables.write().await.write_order(order)?;
        metrics::counter!("store_orders_saved_total").increment(1);
        Ok(())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        let Some(row) = tables.users.get(&user_id) else {
            return Ok(None);
        };

        let user = User::materialize()
            .id(user_id)
            .name(row.name.clone())
            .email(row.email.clone())
            .orders(tables.load_orders_for_user(user_id)?)
            .try_build()?;
        Ok(Some(user))
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        self.tables.read().await.load_order(order_id)
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        self.tables.read().await.load_orders_for_user(user_id)
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&user_id).is_none() {
            return Ok(false);
        }

        let order_ids: Vec<_> = tables
            .orders
            .iter()
            .filter(|(_, row)| row.user_id == user_id)
            .map(|(id, _)| *id)
            .collect();
        for order_id in order_ids {
            tables.remove_order(order_id);
        }
        Ok(true)
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        Ok(self.tables.write().await.remove_order(order_id))
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let tables = self.tables.read().await;
        Ok(StoreCounts {
            users: tables.users.len() as u64,
            orders: tables.orders.len() as u64,
            products: tables.products.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OrdersStoreExt;

    fn new_user() -> User {
        User::new(UserId::new(), "Ada", "ada@example.com").unwrap()
    }

    fn order_with_prices(user_id: UserId, prices: &[i64]) -> Order {
        let mut order = Order::place(user_id).unwrap();
        for (k, cents) in prices.iter().enumerate() {
            let product = Product::new(
                ProductId::new(),
                format!("Product {}", k + 1),
                Money::from_cents(*cents),
                None,
            )
            .unwrap();
            order.add_product(product).unwrap();
        }
        order
    }

    #[tokio::test]
    async fn save_and_load_user_graph() {
        let store = InMemoryOrdersStore::new();
        let mut user = new_user();
        user.add_order(order_with_prices(user.id(), &[1000, 2000]))
            .unwrap();
        user.add_order(order_with_prices(user.id(), &[500])).unwrap();

        store.save_user(&user).await.unwrap();

        let loaded = store.get_user(user.id()).await.unwrap().unwrap();
        assert_eq!(loaded.name(), "Ada");
        assert_eq!(loaded.orders().len(), 2);
        assert_eq!(loaded.orders()[0].id(), user.orders()[0].id());
        assert_eq!(loaded.orders()[0].total().cents(), 3000);
        assert_eq!(loaded.orders()[1].total().cents(), 500);

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            StoreCounts {
                users: 1,
                orders: 2,
                products: 3
            }
        );
    }

    #[tokio::test]
    async fn products_keep_insertion_order() {
        let store = InMemoryOrdersStore::new();
        let user = new_user();
        store.save_user(&user).await.unwrap();

        let order = order_with_prices(user.id(), &[5, 4, 3, 2, 1]);
        store.save_order(&order).await.unwrap();

        let loaded = store.get_order(order.id()).await.unwrap().unwrap();
        let expected: Vec<_> = order.products().iter().map(Product::id).collect();
        let actual: Vec<_> = loaded.products().iter().map(Product::id).collect();
        assert_eq!(actual, expected);
        assert!(
            loaded
                .products()
                .iter()
                .all(|p| p.order_id() == Some(order.id()))
        );
    }

    #[tokio::test]
    async fn save_order_for_unknown_user_fails() {
        let store = InMemoryOrdersStore::new();
        let order = order_with_prices(UserId::new(), &[100]);

        let result = store.save_order(&order).await;
        assert!(matches!(
            result,
            Err(StoreError::MissingReference { entity: "User", .. })
        ));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn save_order_replaces_products() {
        let store = InMemoryOrdersStore::new();
        let user = new_user();
        store.save_user(&user).await.unwrap();

        let mut order = order_with_prices(user.id(), &[100]);
        store.save_order(&order).await.unwrap();

        let extra = Product::new(ProductId::new(), "Extra", Money::from_cents(900), None).unwrap();
        order.add_product(extra).unwrap();
        order.transition_to(OrderStatus::Paid).unwrap();
        store.save_order(&order).await.unwrap();

        let loaded = store.get_order(order.id()).await.unwrap().unwrap();
        assert_eq!(loaded.status(), OrderStatus::Paid);
        assert_eq!(loaded.product_count(), 2);
        assert_eq!(loaded.total().cents(), 1000);
        assert_eq!(store.counts().await.unwrap().orders, 1);
    }

    #[tokio::test]
    async fn failed_batch_writes_nothing() {
        let store = InMemoryOrdersStore::new();
        let mut good = new_user();
        good.add_order(order_with_prices(good.id(), &[100])).unwrap();

        let mut bad = new_user();
        let mut order = Order::place(bad.id()).unwrap();
        let product = Product::new(ProductId::new(), "Twice", Money::zero(), None).unwrap();
        order.add_product(product.clone()).unwrap();
        order.add_product(product).unwrap();
        bad.add_order(order).unwrap();

        let result = store.save_users(&[good, bad]).await;
        assert!(matches!(result, Err(StoreError::DuplicateProduct { .. })));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn overlong_name_is_rejected_before_writing() {
        let store = InMemoryOrdersStore::new();
        let long = User::new(UserId::new(), "n".repeat(101), "ada@example.com").unwrap();

        let result = store.save_users(&[new_user(), long]).await;
        assert!(matches!(
            result,
            Err(StoreError::ValueTooLong {
                entity: "User",
                field: "name",
                ..
            })
        ));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn save_users_if_empty_writes_only_once() {
        let store = InMemoryOrdersStore::new();
        let mut user = new_user();
        user.add_order(order_with_prices(user.id(), &[100, 200]))
            .unwrap();

        assert!(store.save_users_if_empty(&[user]).await.unwrap());
        assert!(!store.save_users_if_empty(&[new_user()]).await.unwrap());
        assert_eq!(
            store.counts().await.unwrap(),
            StoreCounts {
                users: 1,
                orders: 1,
                products: 2
            }
        );
    }

    #[tokio::test]
    async fn concurrent_save_users_if_empty_has_one_winner() {
        let store = InMemoryOrdersStore::new();
        let batch = |name: &str| {
            let mut user = User::new(UserId::new(), name, "x@example.com").unwrap();
            user.add_order(order_with_prices(user.id(), &[1, 2, 3]))
                .unwrap();
            vec![user]
        };
        let first = batch("First");
        let second = batch("Second");

        let (a, b) = tokio::join!(
            store.save_users_if_empty(&first),
            store.save_users_if_empty(&second)
        );

        assert!(a.unwrap() ^ b.unwrap());
        assert_eq!(store.counts().await.unwrap().users, 1);
        assert_eq!(store.counts().await.unwrap().products, 3);
    }

    #[tokio::test]
    async fn delete_user_cascades() {
        let store = InMemoryOrdersStore::new();
        let mut user = new_user();
        user.add_order(order_with_prices(user.id(), &[1, 2, 3]))
            .unwrap();
        let other = new_user();
        store.save_users(&[user.clone(), other.clone()]).await.unwrap();

        assert!(store.delete_user(user.id()).await.unwrap());
        assert!(!store.delete_user(user.id()).await.unwrap());

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            StoreCounts {
                users: 1,
                orders: 0,
                products: 0
            }
        );
        assert!(store.user_exists(other.id()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_order_cascades() {
        let store = InMemoryOrdersStore::new();
        let mut user = new_user();
        let order = order_with_prices(user.id(), &[1, 2]);
        let order_id = order.id();
        user.add_order(order).unwrap();
        store.save_user(&user).await.unwrap();

        assert!(store.delete_order(order_id).await.unwrap());
        assert!(store.get_order(order_id).await.unwrap().is_none());
        assert_eq!(store.counts().await.unwrap().products, 0);
        assert!(!store.delete_order(order_id).await.unwrap());
    }

    #[tokio::test]
    async fn missing_entities_load_as_none() {
        let store = InMemoryOrdersStore::new();
        assert!(store.get_user(UserId::new()).await.unwrap().is_none());
        assert!(store.get_order(OrderId::new()).await.unwrap().is_none());
        assert!(
            store
                .orders_for_user(UserId::new())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn clear_empties_store() {
        let store = InMemoryOrdersStore::new();
        store.save_user(&new_user()).await.unwrap();
        assert!(!store.is_empty().await.unwrap());

        store.clear().await;
        assert!(store.is_empty().await.unwrap());
    }
}
