mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use common::TestApp;
use rust_decimal::Decimal;
use std::str::FromStr;
use supplier_service::{
    errors::{EntityKind, ServiceError},
    models::{Item, Supplier},
};

fn acme() -> Supplier {
    Supplier::new(
        "Acme",
        "sales@acme.test",
        Some("555-0100".to_string()),
        NaiveDate::from_ymd_opt(2024, 1, 5),
    )
}

fn hat(sku: &str) -> Item {
    Item::new(sku, "Hat", 10, Decimal::from_str("12.50").unwrap())
}

#[tokio::test]
async fn create_assigns_an_id() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    supplier.id = Some(999);
    store.create(&mut supplier).await.unwrap();

    let all = store.all::<Supplier>().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].id.is_some());
    assert_eq!(all[0].id, supplier.id);
    assert_ne!(supplier.id, Some(999), "caller ids are replaced");
    assert_eq!(all[0].name, "Acme");
}

#[tokio::test]
async fn fresh_supplier_has_no_items() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    store.create(&mut supplier).await.unwrap();

    let found = store
        .find_by_id::<Supplier>(supplier.id.unwrap())
        .await
        .unwrap()
        .expect("supplier exists");
    assert!(found.items.is_empty());
    assert_eq!(found.phone_number.as_deref(), Some("555-0100"));
    assert_eq!(found.date_joined, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
}

#[tokio::test]
async fn appended_item_is_persisted_on_update() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    store.create(&mut supplier).await.unwrap();
    supplier.add_item(hat("ABC0001"));
    store.update(&mut supplier).await.unwrap();

    let item_id = supplier.items[0].id.expect("item id assigned");
    assert_eq!(supplier.items[0].supplier_id, supplier.id);

    let found = store
        .find_by_id::<Supplier>(supplier.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.items.len(), 1);
    let item = &found.items[0];
    assert_eq!(item.id, Some(item_id));
    assert_eq!(item.sku, "ABC0001");
    assert_eq!(item.name, "Hat");
    assert_eq!(item.quantity, 10);
    assert_eq!(item.price, Decimal::from_str("12.50").unwrap());
}

#[tokio::test]
async fn create_persists_nested_items_in_order() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    supplier.add_item(hat("ABC0001"));
    supplier.add_item(hat("ABC0002"));
    supplier.add_item(hat("ABC0003"));
    store.create(&mut supplier).await.unwrap();

    let owner = supplier.id;
    assert!(supplier.items.iter().all(|i| i.id.is_some() && i.supplier_id == owner));

    let found = store
        .find_by_id::<Supplier>(owner.unwrap())
        .await
        .unwrap()
        .unwrap();
    let skus: Vec<_> = found.items.iter().map(|i| i.sku.as_str()).collect();
    assert_eq!(skus, vec!["ABC0001", "ABC0002", "ABC0003"]);
}

#[tokio::test]
async fn failed_create_leaves_record_untouched() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut orphan = hat("ORPHAN");
    orphan.supplier_id = Some(4242);
    assert_matches!(
        store.create(&mut orphan).await,
        Err(ServiceError::InvalidReference(_))
    );
    assert_eq!(orphan.id, None);
    assert!(store.all::<Item>().await.unwrap().is_empty());
}

#[tokio::test]
async fn item_created_directly_needs_a_supplier() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut unattached = hat("ABC0001");
    assert_matches!(
        store.create(&mut unattached).await,
        Err(ServiceError::InvalidReference(_))
    );

    let mut supplier = acme();
    store.create(&mut supplier).await.unwrap();
    let mut item = hat("ABC0001");
    item.supplier_id = supplier.id;
    store.create(&mut item).await.unwrap();

    let items = store.items_of(supplier.id.unwrap()).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, item.id);
}

#[tokio::test]
async fn deleting_supplier_cascades_to_items() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    supplier.add_item(hat("ABC0001"));
    supplier.add_item(hat("ABC0002"));
    store.create(&mut supplier).await.unwrap();
    let item_ids: Vec<i32> = supplier.items.iter().filter_map(|i| i.id).collect();
    assert_eq!(item_ids.len(), 2);

    store.delete(&supplier).await.unwrap();

    for id in item_ids {
        assert!(store.find_by_id::<Item>(id).await.unwrap().is_none());
    }
    assert!(store
        .find_by_id::<Supplier>(supplier.id.unwrap())
        .await
        .unwrap()
        .is_none());
    assert!(store.all::<Item>().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_item_keeps_the_supplier() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    supplier.add_item(hat("ABC0001"));
    supplier.add_item(hat("ABC0002"));
    store.create(&mut supplier).await.unwrap();

    store.delete(&supplier.items[0]).await.unwrap();

    let mut found = store
        .find_by_id::<Supplier>(supplier.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].sku, "ABC0002");

    found.email = "orders@acme.test".to_string();
    store.update(&mut found).await.unwrap();
    let reloaded = store
        .find_by_id::<Supplier>(supplier.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.email, "orders@acme.test");
    assert_eq!(reloaded.items.len(), 1);
}

#[tokio::test]
async fn item_fields_change_through_the_owner() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    supplier.add_item(hat("ABC0001"));
    store.create(&mut supplier).await.unwrap();

    supplier.items[0].sku = "XYZ0009".to_string();
    supplier.items[0].price = Decimal::from_str("3.10").unwrap();
    store.update(&mut supplier).await.unwrap();

    let item = store
        .find_by_id::<Item>(supplier.items[0].id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.sku, "XYZ0009");
    assert_eq!(item.price.to_string(), "3.10");
}

#[tokio::test]
async fn appending_through_an_older_copy_keeps_sibling_edits() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    supplier.add_item(hat("OLD0001"));
    store.create(&mut supplier).await.unwrap();
    let supplier_id = supplier.id.unwrap();
    let item_id = supplier.items[0].id.unwrap();

    let mut older = store.find_by_id::<Supplier>(supplier_id).await.unwrap().unwrap();

    let mut item = store.find_by_id::<Item>(item_id).await.unwrap().unwrap();
    item.sku = "NEW0001".to_string();
    store.update(&mut item).await.unwrap();

    older.add_item(hat("ADD0001"));
    store.update(&mut older).await.unwrap();

    let item = store.find_by_id::<Item>(item_id).await.unwrap().unwrap();
    assert_eq!(item.sku, "NEW0001");
    let reloaded = store.find_by_id::<Supplier>(supplier_id).await.unwrap().unwrap();
    let skus: Vec<_> = reloaded.items.iter().map(|i| i.sku.as_str()).collect();
    assert_eq!(skus, vec!["NEW0001", "ADD0001"]);
}

#[tokio::test]
async fn second_update_without_changes_writes_nothing_stale() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    supplier.add_item(hat("ABC0001"));
    store.create(&mut supplier).await.unwrap();

    supplier.items[0].quantity = 3;
    store.update(&mut supplier).await.unwrap();

    let mut item = store
        .find_by_id::<Item>(supplier.items[0].id.unwrap())
        .await
        .unwrap()
        .unwrap();
    item.quantity = 7;
    store.update(&mut item).await.unwrap();

    supplier.name = "Acme Renamed".to_string();
    store.update(&mut supplier).await.unwrap();

    let item = store.find_by_id::<Item>(item.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(item.quantity, 7);
}

#[tokio::test]
async fn find_by_name_matches_exactly() {
    let app = TestApp::new().await;
    let store = app.store();

    assert!(store.find_by_name("NoSuchName").await.unwrap().is_empty());

    let mut first = acme();
    let mut second = acme();
    let mut other = Supplier::new("Acme Ltd", "ltd@acme.test", None, None);
    second.add_item(hat("ABC0001"));
    store.create(&mut first).await.unwrap();
    store.create(&mut second).await.unwrap();
    store.create(&mut other).await.unwrap();

    let found = store.find_by_name("Acme").await.unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|s| s.name == "Acme"));
    assert_eq!(found[1].items.len(), 1);
    assert!(store.find_by_name("acme").await.unwrap().is_empty());
}

#[tokio::test]
async fn unsaved_records_cannot_be_updated_or_deleted() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    assert_matches!(
        store.update(&mut supplier).await,
        Err(ServiceError::NotPersisted(EntityKind::Supplier))
    );
    assert_matches!(
        store.delete(&hat("ABC0001")).await,
        Err(ServiceError::NotPersisted(EntityKind::Item))
    );
}

#[tokio::test]
async fn updating_a_vanished_supplier_is_not_found() {
    let app = TestApp::new().await;
    let store = app.store();

    let mut supplier = acme();
    store.create(&mut supplier).await.unwrap();
    let stale = supplier.clone();
    store.delete(&supplier).await.unwrap();

    let mut stale = stale;
    assert_matches!(
        store.update(&mut stale).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn absent_ids_are_none() {
    let app = TestApp::new().await;
    let store = app.store();

    assert!(store.find_by_id::<Supplier>(1).await.unwrap().is_none());
    assert!(store.find_by_id::<Item>(1).await.unwrap().is_none());
    assert!(store.all::<Supplier>().await.unwrap().is_empty());
}
