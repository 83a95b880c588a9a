use std::collections::HashMap;

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};
use domain::{Money, Order, OrderStatus, Product, User};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{OrdersStore, StoreCounts, validate_order_for_save, validate_user_for_save},
};

const ORDER_COLUMNS: &str = "id, user_id, status, (total * 100)::BIGINT AS total_cents";
const PRODUCT_COLUMNS: &str = "id, order_id, name, (price * 100)::BIGINT AS price_cents";

/// Advisory lock key held by [`PostgresOrdersStore::save_users_if_empty`].
const EMPTY_STORE_LOCK_KEY: i64 = 0x6f72_6465_7273;

/// PostgreSQL-backed order store implementation.
///
/// Money is stored as `NUMERIC(18,2)` and converted to and from integer cents
/// in SQL. Status is stored by name.
#[derive(Clone)]
pub struct PostgresOrdersStore {
    pool: PgPool,
}

impl PostgresOrdersStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product::materialize()
            .id(ProductId::from_uuid(row.try_get::<Uuid, _>("id")?))
            .order_id(OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?))
            .name(row.try_get::<String, _>("name")?)
            .price(Money::from_cents(row.try_get("price_cents")?))
            .try_build()?)
    }

    fn row_to_order(row: &PgRow, products: Vec<Product>) -> Result<Order> {
        let status: OrderStatus = row.try_get::<String, _>("status")?.parse()?;

        Ok(Order::materialize()
            .id(OrderId::from_uuid(row.try_get::<Uuid, _>("id")?))
            .user_id(UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?))
            .status(status)
            .products(products)
            .stored_total(Money::from_cents(row.try_get("total_cents")?))
            .try_build()?)
    }

    /// Loads the orders whose rows `order_rows` already holds, attaching their
    /// products with a single query.
    async fn attach_products(&self, order_rows: Vec<PgRow>) -> Result<Vec<Order>> {
        if order_rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids = order_rows
            .iter()
            .map(|row| row.try_get::<Uuid, _>("id"))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let product_rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE order_id = ANY($1) ORDER BY order_id, position ASC"
        ))
        .bind(&order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut products_by_order: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for row in &product_rows {
            let product = Self::row_to_product(row)?;
            products_by_order
                .entry(row.try_get::<Uuid, _>("order_id")?)
                .or_default()
                .push(product);
        }

        order_rows
            .iter()
            .zip(order_ids)
            .map(|(row, id)| {
                let products = products_by_order.remove(&id).unwrap_or_default();
                Self::row_to_order(row, products)
            })
            .collect()
    }

    async fn write_users(tx: &mut Transaction<'_, Postgres>, users: &[User]) -> Result<()> {
        for user in users {
            Self::write_user(tx, user).await?;
        }
        for order in users.iter().flat_map(User::orders) {
            Self::write_order(tx, order).await?;
        }
        Ok(())
    }

    async fn write_user(tx: &mut Transaction<'_, Postgres>, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email
            "#,
        )
        .bind(user.id().as_uuid())
        .bind(user.name())
        .bind(user.email())
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn write_order(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, status, total)
            VALUES ($1, $2, $3, ($4::BIGINT)::NUMERIC / 100)
            ON CONFLICT (id) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                status = EXCLUDED.status,
                total = EXCLUDED.total
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.user_id().as_uuid())
        .bind(order.status().as_str())
        .bind(order.total().cents())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            // Foreign key violation on orders.user_id
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return StoreError::MissingReference {
                    entity: "User",
                    id: order.user_id().to_string(),
                };
            }
            StoreError::Database(e)
        })?;

        sqlx::query("DELETE FROM products WHERE order_id = $1")
            .bind(order.id().as_uuid())
            .execute(&mut **tx)
            .await?;

        for (position, product) in order.products().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO products (id, order_id, name, price, position)
                VALUES ($1, $2, $3, ($4::BIGINT)::NUMERIC / 100, $5)
                ON CONFLICT (id) DO UPDATE SET
                    order_id = EXCLUDED.order_id,
                    name = EXCLUDED.name,
                    price = EXCLUDED.price,
                    position = EXCLUDED.position
                "#,
            )
            .bind(product.id().as_uuid())
            .bind(order.id().as_uuid())
            .bind(product.name())
            .bind(product.price().cents())
            .bind(position as i32)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl OrdersStore for PostgresOrdersStore {
    #[tracing::instrument(skip(self, users), fields(users = users.len()))]
    async fn save_users(&self, users: &[User]) -> Result<()> {
        for user in users {
            validate_user_for_save(user)?;
        }

        let mut tx = self.pool.begin().await?;
        Self::write_users(&mut tx, users).await?;
        tx.commit().await?;

        metrics::counter!("store_users_saved_total").increment(users.len() as u64);
        Ok(())
    }

    #[tracing::instrument(skip(self, users), fields(users = users.len()))]
    async fn save_users_if_empty(&self, users: &[User]) -> Result<bool> {
        for user in users {
            validate_user_for_save(user)?;
        }

        let mut tx = self.pool.begin().await?;

        // Held until commit or rollback; later callers see the committed rows.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(EMPTY_STORE_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let occupied: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM users)
                OR EXISTS (SELECT 1 FROM orders)
                OR EXISTS (SELECT 1 FROM products)
            "#,
        )
        .fetch_one(&mut *tx)
        .await?;

        if occupied {
            tx.rollback().await?;
            return Ok(false);
        }

        Self::write_users(&mut tx, users).await?;
        tx.commit().await?;

        metrics::counter!("store_users_saved_total").increment(users.len() as u64);
        Ok(true)
    }

    #[tracing::instrument(skip(self, order), fields(order_id = %order.id()))]
    async fn save_order(&self, order: &Order) -> Result<()> {
        validate_order_for_save(order)?;

        let mut tx = self.pool.begin().await?;
        Self::write_order(&mut tx, order).await?;
        tx.commit().await?;

        metrics::counter!("store_orders_saved_total").increment(1);
        Ok(())
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row: Option<PgRow> = sqlx::query("SELECT id, name, email FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = User::materialize()
            .id(UserId::from_uuid(row.try_get::<Uuid, _>("id")?))
            .name(row.try_get::<String, _>("name")?)
            .email(row.try_get::<String, _>("email")?)
            .orders(self.orders_for_user(user_id).await?)
            .try_build()?;

        Ok(Some(user))
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(order_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(self.attach_products(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY seq ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        self.attach_products(rows).await
    }

    async fn delete_user(&self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM orders) AS orders,
                (SELECT COUNT(*) FROM products) AS products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StoreCounts {
            users: row.try_get::<i64, _>("users")? as u64,
            orders: row.try_get::<i64, _>("orders")? as u64,
            products: row.try_get::<i64, _>("products")? as u64,
        })
    }
}
