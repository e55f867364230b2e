//! End-to-end checkout flow against the in-memory store and provider.

use checkout::{
    CheckoutError, CheckoutInitiator, CheckoutRequest, OrderHistory, OrderReconciler, Page,
    ReconcileOutcome,
};
use common::{PaymentReference, SessionId};
use domain::{
    Cart, CartSession, Customer, InMemoryCartStorage, LineItem, Money, OrderStatus,
    ValidationError,
};
use order_store::{InMemoryOrderStore, OrderStore};
use payments::{InMemoryPaymentProvider, PaymentStatus};

struct Harness {
    store: InMemoryOrderStore,
    provider: InMemoryPaymentProvider,
    initiator: CheckoutInitiator<InMemoryPaymentProvider>,
    reconciler: OrderReconciler<InMemoryOrderStore, InMemoryPaymentProvider>,
}

impl Harness {
    fn new() -> Self {
        let store = InMemoryOrderStore::new();
        let provider = InMemoryPaymentProvider::new();
        Self {
            initiator: CheckoutInitiator::new(provider.clone()),
            reconciler: OrderReconciler::new(store.clone(), provider.clone()),
            store,
            provider,
        }
    }

    async fn checkout(&self, items: Vec<LineItem>, total: Money) -> SessionId {
        self.initiator
            .start(CheckoutRequest {
                items,
                total,
                customer: customer(),
            })
            .await
            .unwrap()
            .id
    }
}

fn customer() -> Customer {
    Customer {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        address: "12 St James's Square".to_string(),
        city: "London".to_string(),
        postal_code: "SW1Y 4JH".to_string(),
        country: "UK".to_string(),
    }
}

fn tee(quantity: u32) -> LineItem {
    LineItem::new("p1", "Tee", quantity, Money::from_dollars(40))
}

#[tokio::test]
async fn paid_session_becomes_one_processing_order() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(2)], Money::from_dollars(80)).await;
    h.provider.mark_paid(&session_id, "pi_123").await;

    let first = h.reconciler.confirm(&session_id).await.unwrap();
    let second = h.reconciler.confirm(&session_id).await.unwrap();

    assert!(matches!(first, ReconcileOutcome::Created(_)));
    assert_eq!(second, ReconcileOutcome::AlreadyExists(first.order_id()));
    assert_eq!(h.store.order_count().await, 1);

    let order = h.store.get(first.order_id()).await.unwrap().unwrap();
    assert_eq!(order.total, Money::from_dollars(80));
    assert_eq!(order.payment_reference, PaymentReference::new("pi_123"));
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.items, vec![tee(2)]);
    assert_eq!(order.customer, customer());
}

#[tokio::test]
async fn repeated_confirmation_is_idempotent() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    h.provider.mark_paid(&session_id, "pi_repeat").await;

    let mut ids = Vec::new();
    for _ in 0..5 {
        ids.push(h.reconciler.confirm(&session_id).await.unwrap().order_id());
    }

    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(h.store.order_count().await, 1);
}

#[tokio::test]
async fn concurrent_confirmations_create_exactly_one_order() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(2)], Money::from_dollars(80)).await;
    h.provider.mark_paid(&session_id, "pi_concurrent").await;

    let other_instance = OrderReconciler::new(h.store.clone(), h.provider.clone());
    let (a, b) = tokio::join!(
        h.reconciler.confirm(&session_id),
        other_instance.confirm(&session_id)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.order_id(), b.order_id());
    assert_eq!(
        [a, b].iter().filter(|outcome| outcome.is_created()).count(),
        1
    );
    assert_eq!(h.store.order_count().await, 1);
}

#[tokio::test]
async fn many_concurrent_confirmations_agree() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(3)], Money::from_dollars(120)).await;
    h.provider.mark_paid(&session_id, "pi_many").await;

    let attempts = (0..10).map(|_| h.reconciler.confirm(&session_id));
    let outcomes: Vec<_> = futures_util::future::join_all(attempts)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    let created = outcomes.iter().filter(|o| o.is_created()).count();
    assert_eq!(created, 1);
    assert!(
        outcomes
            .iter()
            .all(|o| o.order_id() == outcomes[0].order_id())
    );
}

#[tokio::test]
async fn initiation_never_writes_an_order() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(2)], Money::from_dollars(80)).await;

    assert_eq!(h.store.order_count().await, 0);

    let verified = h.reconciler.verifier().verify(&session_id).await.unwrap();
    assert_eq!(verified.payment_status, PaymentStatus::Pending);
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn unpaid_sessions_are_rejected_without_writes() {
    let h = Harness::new();

    let pending = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    let failed = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    let expired = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    h.provider.mark_failed(&failed).await;
    h.provider.mark_expired(&expired).await;

    for (session_id, expected) in [
        (pending, PaymentStatus::Pending),
        (failed, PaymentStatus::Failed),
        (expired, PaymentStatus::Expired),
    ] {
        let result = h.reconciler.confirm(&session_id).await;
        assert!(
            matches!(
                result,
                Err(CheckoutError::PaymentNotCompleted { status, .. }) if status == expected
            ),
            "unexpected result for {expected}: {result:?}"
        );
    }

    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn empty_cart_never_reaches_provider() {
    let h = Harness::new();

    let result = h
        .initiator
        .start(CheckoutRequest {
            items: vec![],
            total: Money::from_dollars(80),
            customer: customer(),
        })
        .await;

    assert!(matches!(
        result,
        Err(CheckoutError::Validation(ValidationError::EmptyCart))
    ));
    assert_eq!(h.provider.create_calls().await, 0);
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn order_total_matches_snapshot_taken_at_checkout() {
    let h = Harness::new();
    let items = vec![
        LineItem::new("p1", "Tee", 2, Money::from_cents(1999)).with_variant("M"),
        LineItem::new("p2", "Mug", 3, Money::from_cents(850)),
    ];
    let session_id = h.checkout(items.clone(), Money::from_cents(6548)).await;
    h.provider.mark_paid(&session_id, "pi_total").await;

    let outcome = h.reconciler.confirm(&session_id).await.unwrap();
    let order = h.store.get(outcome.order_id()).await.unwrap().unwrap();

    let sum: Money = order.items.iter().map(LineItem::total_price).sum();
    assert_eq!(order.total, sum);
    assert_eq!(order.items, items);
}

#[tokio::test]
async fn persistence_failure_is_transient_and_retry_succeeds() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    h.provider.mark_paid(&session_id, "pi_retry").await;

    h.store.set_fail_on_insert(true).await;
    let err = h.reconciler.confirm(&session_id).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderPersistenceFailed(_)));
    assert!(err.is_transient());
    assert_eq!(h.store.order_count().await, 0);

    h.store.set_fail_on_insert(false).await;
    let outcome = h.reconciler.confirm(&session_id).await.unwrap();
    assert!(outcome.is_created());
}

#[tokio::test]
async fn insert_that_landed_before_timeout_is_found_on_retry() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    h.provider.mark_paid(&session_id, "pi_landed").await;

    h.store.set_fail_after_insert(true).await;
    assert!(h.reconciler.confirm(&session_id).await.is_err());

    h.store.set_fail_after_insert(false).await;
    let outcome = h.reconciler.confirm(&session_id).await.unwrap();

    assert!(matches!(outcome, ReconcileOutcome::AlreadyExists(_)));
    assert_eq!(h.store.order_count().await, 1);
}

#[tokio::test]
async fn provider_outage_during_confirmation_writes_nothing() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    h.provider.mark_paid(&session_id, "pi_outage").await;
    h.provider.set_unavailable(true).await;

    let err = h.reconciler.confirm(&session_id).await.unwrap_err();

    assert!(matches!(err, CheckoutError::ProviderUnavailable(_)));
    assert_eq!(h.store.order_count().await, 0);
}

#[tokio::test]
async fn another_customer_cannot_confirm_a_session() {
    let h = Harness::new();
    let session_id = h.checkout(vec![tee(1)], Money::from_dollars(40)).await;
    h.provider.mark_paid(&session_id, "pi_owned").await;

    let err = h
        .reconciler
        .confirm_for(&session_id, "mallory@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::SessionNotFound(_)));
    assert_eq!(h.store.order_count().await, 0);

    let outcome = h
        .reconciler
        .confirm_for(&session_id, "ada@example.com")
        .await
        .unwrap();
    assert!(outcome.is_created());
}

#[tokio::test]
async fn cart_to_history_round_trip() {
    let h = Harness::new();
    let mut cart = CartSession::open(InMemoryCartStorage::new()).unwrap();
    cart.add(tee(1)).unwrap();
    cart.add(tee(1)).unwrap();
    cart.add(LineItem::new("p2", "Mug", 1, Money::from_cents(850)))
        .unwrap();

    let checkout = cart.checkout(customer()).unwrap();
    let session_id = h
        .checkout(checkout.items.clone(), checkout.total)
        .await;
    h.provider.mark_paid(&session_id, "pi_cart").await;

    let outcome = h.reconciler.confirm(&session_id).await.unwrap();
    assert!(cart.complete_order(outcome.order_id()).unwrap());
    assert_eq!(cart.cart(), &Cart::new());

    // reloading the confirmation page reconciles again but leaves the new cart alone
    cart.add(tee(1)).unwrap();
    let again = h.reconciler.confirm(&session_id).await.unwrap();
    assert!(!cart.complete_order(again.order_id()).unwrap());
    assert_eq!(cart.cart().line_count(), 1);

    let history = OrderHistory::new(h.store.clone());
    let orders = history
        .orders_for("ada@example.com", Page::default())
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, outcome.order_id());
    assert_eq!(orders[0].total, Money::from_cents(8850));
}
