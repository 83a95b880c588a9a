//! Sample data for local development.

use domain::{DomainError, Money, Order, OrderId, OrderStatus, Product, ProductId, User, UserId};
use store::{OrdersStore, OrdersStoreExt, StoreCounts};

use crate::error::Result;

/// Shape of the generated data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub users: u32,
    pub orders_per_user: u32,
    pub products_per_order: u32,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            users: 10,
            orders_per_user: 2,
            products_per_order: 3,
        }
    }
}

/// What [`initialize`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The store was empty and now holds these rows.
    Seeded(StoreCounts),
    /// The store already held data; nothing was written.
    Skipped,
}

/// Seeds an empty store; leaves a populated one untouched.
///
/// Each order is Completed and holds products priced `10.00 × k` for
/// `k = 1..=products_per_order`. The graph is saved in one batch that only
/// lands if the store is still empty, so concurrent bootstraps seed once.
#[tracing::instrument(skip(store))]
pub async fn initialize<S: OrdersStore + ?Sized>(store: &S, plan: &SeedPlan) -> Result<SeedOutcome> {
    if !store.is_empty().await? {
        return Ok(skipped());
    }

    let users = build_users(plan)?;
    if !store.save_users_if_empty(&users).await? {
        return Ok(skipped());
    }

    let counts = store.counts().await?;
    tracing::info!(
        users = counts.users,
        orders = counts.orders,
        products = counts.products,
        "seeded store"
    );
    metrics::counter!("seed_runs_total", "outcome" => "seeded").increment(1);

    Ok(SeedOutcome::Seeded(counts))
}

fn skipped() -> SeedOutcome {
    tracing::info!("store already holds data, skipping seed");
    metrics::counter!("seed_runs_total", "outcome" => "skipped").increment(1);
    SeedOutcome::Skipped
}

/// Builds the seed graph without touching a store.
pub fn build_users(plan: &SeedPlan) -> Result<Vec<User>> {
    let mut users = Vec::with_capacity(plan.users as usize);

    for i in 1..=plan.users {
        let user_id = UserId::new();
        let mut user = User::new(user_id, format!("User {i}"), seed_email(user_id))?;

        for _ in 0..plan.orders_per_user {
            let mut order = Order::new(
                OrderId::new(),
                user_id,
                OrderStatus::Completed,
                None,
                Money::zero(),
            )?;

            for k in 1..=plan.products_per_order {
                let price = Money::from_dollars(10).checked_multiply(k).ok_or_else(|| {
                    DomainError::OutOfRange {
                        argument: "price",
                        reason: format!("$10.00 x {k} overflows"),
                    }
                })?;
                let product = Product::new(ProductId::new(), format!("Product {k}"), price, None)?;
                order.add_product(product)?;
            }

            user.add_order(order)?;
        }

        users.push(user);
    }

    Ok(users)
}

fn seed_email(user_id: UserId) -> String {
    format!("user_{}@example.com", user_id.as_uuid().simple())
}
