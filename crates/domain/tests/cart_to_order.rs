//! End-to-end tests of the domain values along the checkout path:
//! cart → checkout snapshot → provider metadata → decoded checkout → order.

use common::PaymentReference;
use domain::{
    CartSession, CheckoutMetadata, Customer, InMemoryCartStorage, LineItem, Money, NewOrder,
    OrderStatus, ProductId, ValidationError,
};

fn customer() -> Customer {
    Customer {
        name: "Grace Hopper".to_string(),
        email: "grace@example.com".to_string(),
        address: "1 Compiler Way".to_string(),
        city: "Arlington".to_string(),
        postal_code: "22201".to_string(),
        country: "US".to_string(),
    }
}

#[test]
fn order_total_is_fixed_when_the_session_is_created() {
    let mut session = CartSession::open(InMemoryCartStorage::new()).unwrap();
    session
        .add(LineItem::new("p1", "Kronos Tee", 2, Money::from_dollars(40)))
        .unwrap();

    let checkout = session.checkout(customer()).unwrap();
    let metadata = checkout.encode().unwrap();

    // the catalog price changes after the session was created
    session.clear().unwrap();
    session
        .add(LineItem::new("p1", "Kronos Tee", 2, Money::from_dollars(55)))
        .unwrap();

    let decoded = CheckoutMetadata::decode(&metadata).unwrap();
    let order = NewOrder::from_checkout(PaymentReference::new("pi_123"), decoded).into_order();

    assert_eq!(order.total, Money::from_dollars(80));
    assert_eq!(
        order.total,
        order.items.iter().map(LineItem::total_price).sum::<Money>()
    );
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.customer, customer());
}

#[test]
fn variants_survive_the_metadata_boundary() {
    let mut session = CartSession::open(InMemoryCartStorage::new()).unwrap();
    session
        .add(LineItem::new("p1", "Kronos Tee", 1, Money::from_dollars(40)).with_variant("S"))
        .unwrap();
    session
        .add(LineItem::new("p1", "Kronos Tee", 1, Money::from_dollars(40)).with_variant("XL"))
        .unwrap();
    session
        .increment(&ProductId::new("p1"), Some("XL"))
        .unwrap();

    let metadata = session.checkout(customer()).unwrap().encode().unwrap();
    let decoded = CheckoutMetadata::decode(&metadata).unwrap();

    let variants: Vec<_> = decoded
        .items
        .iter()
        .map(|item| (item.variant.as_deref(), item.quantity))
        .collect();
    assert_eq!(variants, vec![(Some("S"), 1), (Some("XL"), 2)]);
    assert_eq!(decoded.total, Money::from_dollars(120));
}

#[test]
fn incomplete_customer_never_reaches_metadata() {
    let mut session = CartSession::open(InMemoryCartStorage::new()).unwrap();
    session
        .add(LineItem::new("p1", "Kronos Tee", 1, Money::from_dollars(40)))
        .unwrap();

    let mut incomplete = customer();
    incomplete.email = String::new();

    assert_eq!(
        session.checkout(incomplete),
        Err(ValidationError::MissingCustomerField("email"))
    );
}
