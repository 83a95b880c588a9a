//! Integration tests for the bootstrap and the order service over the in-memory store.

use app::{Config, OrderService, SeedOutcome, SeedPlan, ServiceError};
use domain::{Money, OrderStatus, Product, ProductId};
use store::{InMemoryOrdersStore, OrdersStore, StoreCounts};

fn in_memory_config() -> Config {
    Config::default()
}

#[tokio::test]
async fn seeds_an_empty_store() {
    let store = InMemoryOrdersStore::new();

    let outcome = app::seed::initialize(&store, &SeedPlan::default())
        .await
        .unwrap();

    let expected = StoreCounts {
        users: 10,
        orders: 20,
        products: 60,
    };
    assert_eq!(outcome, SeedOutcome::Seeded(expected));
    assert_eq!(store.counts().await.unwrap(), expected);
}

#[tokio::test]
async fn seeded_orders_are_completed_with_expected_totals() {
    let store = InMemoryOrdersStore::new();
    let users = app::seed::build_users(&SeedPlan::default()).unwrap();
    store.save_users(&users).await.unwrap();

    for user in &users {
        let orders = store.orders_for_user(user.id()).await.unwrap();
        assert_eq!(orders.len(), 2);

        for order in orders {
            assert_eq!(order.status(), OrderStatus::Completed);
            assert_eq!(order.total(), Money::from_dollars(60));
            let prices: Vec<i64> = order.products().iter().map(|p| p.price().cents()).collect();
            assert_eq!(prices, [1000, 2000, 3000]);
        }
    }
}

#[tokio::test]
async fn second_run_is_skipped() {
    let store = InMemoryOrdersStore::new();
    let plan = SeedPlan::default();

    app::seed::initialize(&store, &plan).await.unwrap();
    let before = store.counts().await.unwrap();

    let outcome = app::seed::initialize(&store, &plan).await.unwrap();
    assert_eq!(outcome, SeedOutcome::Skipped);
    assert_eq!(store.counts().await.unwrap(), before);
}

#[tokio::test]
async fn concurrent_bootstraps_seed_once() {
    let store = InMemoryOrdersStore::new();
    let plan = SeedPlan::default();

    let (a, b) = tokio::join!(
        app::seed::initialize(&store, &plan),
        app::seed::initialize(&store, &plan)
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, SeedOutcome::Seeded(_)))
            .count(),
        1
    );
    assert!(outcomes.contains(&SeedOutcome::Skipped));
    assert_eq!(
        store.counts().await.unwrap(),
        StoreCounts {
            users: 10,
            orders: 20,
            products: 60,
        }
    );
}

#[tokio::test]
async fn store_with_any_data_is_not_seeded() {
    let service = OrderService::new(InMemoryOrdersStore::new());
    service
        .register_user("Existing", "existing@example.com")
        .await
        .unwrap();

    let outcome = app::seed::initialize(service.store(), &SeedPlan::default())
        .await
        .unwrap();
    assert_eq!(outcome, SeedOutcome::Skipped);
    assert_eq!(service.store().counts().await.unwrap().users, 1);
}

#[tokio::test]
async fn bootstrap_respects_seed_flag() {
    let store = InMemoryOrdersStore::new();
    let config = Config {
        seed_on_startup: false,
        ..in_memory_config()
    };

    let counts = app::bootstrap(&store, &config).await.unwrap();
    assert!(counts.is_empty());
}

#[tokio::test]
async fn connect_without_database_url_uses_memory() {
    let config = in_memory_config();
    let store = app::connect(&config).await.unwrap();

    let counts = app::bootstrap(store.as_ref(), &config).await.unwrap();
    assert_eq!(counts.users, 10);
    assert_eq!(counts.orders, 20);
    assert_eq!(counts.products, 60);
}

#[tokio::test]
async fn order_lifecycle_through_service() {
    let service = OrderService::new(InMemoryOrdersStore::new());
    let user = service
        .register_user("Grace", "grace@example.com")
        .await
        .unwrap();

    let keyboard = Product::new(ProductId::new(), "Keyboard", Money::from_cents(4999), None).unwrap();
    let order = service.place_order(user.id(), vec![keyboard]).await.unwrap();
    assert_eq!(order.products()[0].order_id(), Some(order.id()));

    let mouse = Product::new(ProductId::new(), "Mouse", Money::from_cents(1501), None).unwrap();
    let order = service.add_products(order.id(), vec![mouse]).await.unwrap();
    assert_eq!(order.total(), Money::from_dollars(65));

    service
        .change_status(order.id(), OrderStatus::Paid)
        .await
        .unwrap();
    let order = service
        .change_status(order.id(), OrderStatus::Cancelled)
        .await
        .unwrap();
    assert!(order.is_terminal());

    let result = service.change_status(order.id(), OrderStatus::Paid).await;
    assert!(matches!(result, Err(ServiceError::Domain(_))));

    let stored = service.get_order(order.id()).await.unwrap().unwrap();
    assert_eq!(stored.status(), OrderStatus::Cancelled);
    assert_eq!(stored.product_count(), 2);
}
