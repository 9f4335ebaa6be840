#![allow(clippy::unwrap_used)]

// Domain state machine tests against a local (unauthenticated) session.

use std::sync::Arc;

use boutique_core::{
    AddCategoryRequest, AddProductRequest, CacheKey, CacheLocation, Category, ConflictReason,
    Controller, CoreError, EntityId, LocalCache, NotificationLevel, Product, ProductStatus,
    ReservationStatus, SessionState, Settings, StoreConfig, UpdateCategoryRequest,
    UpdateProductRequest, UpdateSettingsRequest,
};
use pretty_assertions::assert_eq;

fn images() -> Vec<String> {
    (1..=4).map(|n| format!("https://img.example/{n}.jpg")).collect()
}

async fn local_controller() -> Controller {
    let controller = Controller::new(StoreConfig::local(CacheLocation::Memory));
    let mode = controller.start(None).await.unwrap();
    assert_eq!(mode, SessionState::Local);
    controller
}

async fn dresses(controller: &Controller) -> Category {
    controller
        .add_category(AddCategoryRequest {
            name: "Dresses".into(),
            code: "drs".into(),
        })
        .await
        .unwrap()
}

async fn dress(controller: &Controller, category: &Category, name: &str) -> Product {
    controller
        .add_product(AddProductRequest {
            name: name.into(),
            price: 100.0,
            description: "Linen".into(),
            images: images(),
            category_id: category.id.clone(),
        })
        .await
        .unwrap()
}

/// `reserved` iff a pending reservation exists, for every product.
fn assert_status_invariant(controller: &Controller) {
    for product in controller.products_snapshot().iter() {
        let pending = controller.reservation_by_product_id(&product.id).is_some();
        assert_eq!(
            product.status == ProductStatus::Reserved,
            pending,
            "product {} is {} with pending={pending}",
            product.reference,
            product.status
        );
    }
}

fn has_reference_shape(reference: &str, code: &str) -> bool {
    let Some(rest) = reference.strip_prefix(code) else {
        return false;
    };
    let bytes = rest.as_bytes();
    bytes.len() == 7
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[2] == b'-'
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

// ── Scenario ────────────────────────────────────────────────────────

#[tokio::test]
async fn reservation_lifecycle_scenario() {
    let controller = local_controller().await;

    let category = dresses(&controller).await;
    assert_eq!(category.code, "DRS");

    let product = dress(&controller, &category, "Dress A").await;
    assert_eq!(product.status, ProductStatus::Available);
    assert!(has_reference_shape(&product.reference, "DRS"), "{}", product.reference);
    assert_eq!(*controller.product_by_id(&product.id).unwrap(), product);
    assert_eq!(
        controller.product_by_reference(&product.reference).unwrap().id,
        product.id
    );

    // Reserve
    let first = controller
        .reserve_product(product.id.clone(), "Ana", "+5055")
        .await
        .unwrap();
    assert_eq!(first.status, ReservationStatus::Pending);
    assert_eq!(
        controller.product_by_id(&product.id).unwrap().status,
        ProductStatus::Reserved
    );
    assert_status_invariant(&controller);

    // Cancel
    let cancelled = controller.cancel_reservation(first.id.clone()).await.unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert_eq!(
        controller.product_by_id(&product.id).unwrap().status,
        ProductStatus::Available
    );
    assert!(controller.reservation_by_product_id(&product.id).is_none());
    assert_status_invariant(&controller);

    // Re-reserve and complete
    let second = controller
        .reserve_product(product.id.clone(), "Ana", "+5055")
        .await
        .unwrap();
    assert_ne!(second.id, first.id);
    let completed = controller.complete_reservation(second.id.clone()).await.unwrap();
    assert_eq!(completed.status, ReservationStatus::Completed);
    assert_eq!(
        controller.product_by_id(&product.id).unwrap().status,
        ProductStatus::Sold
    );
    assert_status_invariant(&controller);

    // The category still has a product
    let err = controller
        .delete_category(category.id.clone())
        .await
        .unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::HasProducts));
    assert!(controller.category_by_id(&category.id).is_some());
}

// ── Reservation preconditions ───────────────────────────────────────

#[tokio::test]
async fn reserving_unavailable_product_changes_nothing() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;

    controller
        .reserve_product(product.id.clone(), "Ana", "+5055")
        .await
        .unwrap();
    let before_reservations = controller.reservations_snapshot().len();
    let before_product = controller.product_by_id(&product.id).unwrap();

    let err = controller
        .reserve_product(product.id.clone(), "Luis", "+5056")
        .await
        .unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::NotAvailable));
    assert_eq!(controller.reservations_snapshot().len(), before_reservations);
    assert_eq!(controller.product_by_id(&product.id).unwrap(), before_product);
}

#[tokio::test]
async fn reserving_requires_name_and_phone() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;

    let err = controller
        .reserve_product(product.id.clone(), "   ", "+5055")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");

    let err = controller
        .reserve_product(product.id.clone(), "Ana", "")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
    assert!(controller.reservations_snapshot().is_empty());
}

#[tokio::test]
async fn reserving_unknown_product_is_not_found() {
    let controller = local_controller().await;
    let err = controller
        .reserve_product(EntityId::new_v4(), "Ana", "+5055")
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::NotFound { entity: "product", .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn second_completion_fails_without_touching_product() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;
    let reservation = controller
        .reserve_product(product.id.clone(), "Ana", "+5055")
        .await
        .unwrap();
    controller
        .complete_reservation(reservation.id.clone())
        .await
        .unwrap();

    // Re-list the sold product, then try to complete again.
    controller
        .update_product(
            product.id.clone(),
            UpdateProductRequest {
                status: Some(ProductStatus::Available),
                ..UpdateProductRequest::default()
            },
        )
        .await
        .unwrap();

    let err = controller
        .complete_reservation(reservation.id.clone())
        .await
        .unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::ReservationClosed));
    assert_eq!(
        controller.product_by_id(&product.id).unwrap().status,
        ProductStatus::Available
    );
}

#[tokio::test]
async fn completing_unknown_reservation_is_not_found() {
    let controller = local_controller().await;
    let err = controller
        .complete_reservation(EntityId::new_v4())
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::NotFound { entity: "reservation", .. }),
        "{err:?}"
    );
}

// ── Deletion guards ─────────────────────────────────────────────────

#[tokio::test]
async fn delete_product_blocked_by_pending_reservation() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;
    let reservation = controller
        .reserve_product(product.id.clone(), "Ana", "+5055")
        .await
        .unwrap();

    let err = controller.delete_product(product.id.clone()).await.unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::PendingReservation));
    assert!(controller.product_by_id(&product.id).is_some());

    controller
        .cancel_reservation(reservation.id.clone())
        .await
        .unwrap();
    controller.delete_product(product.id.clone()).await.unwrap();
    assert!(controller.product_by_id(&product.id).is_none());
    // Closed history for the product goes with it.
    assert!(controller.reservation_by_id(&reservation.id).is_none());

    // With no products left the category can go.
    controller.delete_category(category.id.clone()).await.unwrap();
    assert!(controller.category_by_id(&category.id).is_none());
}

// ── Product validation ──────────────────────────────────────────────

#[tokio::test]
async fn add_product_requires_existing_category() {
    let controller = local_controller().await;
    let err = controller
        .add_product(AddProductRequest {
            name: "Dress".into(),
            price: 10.0,
            description: String::new(),
            images: images(),
            category_id: EntityId::new_v4(),
        })
        .await
        .unwrap_err();
    assert!(
        matches!(err, CoreError::Reference { entity: "category", .. }),
        "{err:?}"
    );
    assert!(controller.products_snapshot().is_empty());
}

#[tokio::test]
async fn add_product_validates_price_and_images() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;

    let err = controller
        .add_product(AddProductRequest {
            name: "Dress".into(),
            price: 0.0,
            description: String::new(),
            images: images(),
            category_id: category.id.clone(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");

    let err = controller
        .add_product(AddProductRequest {
            name: "Dress".into(),
            price: 10.0,
            description: String::new(),
            images: images()[..3].to_vec(),
            category_id: category.id.clone(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
}

#[tokio::test]
async fn update_product_applies_only_present_fields() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;

    let updated = controller
        .update_product(
            product.id.clone(),
            UpdateProductRequest {
                price: Some(150.0),
                description: Some(String::new()),
                ..UpdateProductRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Dress A");
    assert!((updated.price - 150.0).abs() < f64::EPSILON);
    assert_eq!(updated.description, "");
    assert_eq!(updated.reference, product.reference);
    assert_eq!(updated.images, product.images);
    assert_eq!(*controller.product_by_id(&product.id).unwrap(), updated);
}

#[tokio::test]
async fn update_product_unknown_id_is_not_found() {
    let controller = local_controller().await;
    let err = controller
        .update_product(
            EntityId::new_v4(),
            UpdateProductRequest {
                name: Some("x".into()),
                ..UpdateProductRequest::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err:?}");
}

#[tokio::test]
async fn status_edits_respect_reservations() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;

    let to_reserved = UpdateProductRequest {
        status: Some(ProductStatus::Reserved),
        ..UpdateProductRequest::default()
    };
    let err = controller
        .update_product(product.id.clone(), to_reserved)
        .await
        .unwrap_err();
    assert_eq!(
        err.conflict_reason(),
        Some(ConflictReason::StatusManagedByReservations)
    );

    controller
        .reserve_product(product.id.clone(), "Ana", "+5055")
        .await
        .unwrap();
    let to_available = UpdateProductRequest {
        status: Some(ProductStatus::Available),
        ..UpdateProductRequest::default()
    };
    let err = controller
        .update_product(product.id.clone(), to_available)
        .await
        .unwrap_err();
    assert_eq!(err.conflict_reason(), Some(ConflictReason::PendingReservation));
    assert_status_invariant(&controller);
}

// ── Categories ──────────────────────────────────────────────────────

#[tokio::test]
async fn category_codes_are_validated_and_unique() {
    let controller = local_controller().await;
    dresses(&controller).await;

    let err = controller
        .add_category(AddCategoryRequest {
            name: "Dressy".into(),
            code: "DRS".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");

    let err = controller
        .add_category(AddCategoryRequest {
            name: "Long".into(),
            code: "DRESS".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
}

#[tokio::test]
async fn update_category_keeps_product_references() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;

    let renamed = controller
        .update_category(
            category.id.clone(),
            UpdateCategoryRequest {
                code: Some("dre".into()),
                ..UpdateCategoryRequest::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.code, "DRE");
    assert_eq!(renamed.name, "Dresses");
    assert_eq!(
        controller.product_by_id(&product.id).unwrap().reference,
        product.reference
    );
}

// ── Settings ────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_merge_and_validate() {
    let controller = local_controller().await;
    assert_eq!(controller.settings(), Settings::default());

    let saved = controller
        .update_settings(UpdateSettingsRequest {
            slogan: Some(String::new()),
            exchange_rate: Some(37.0),
            ..UpdateSettingsRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(saved.slogan, "");
    assert!((saved.exchange_rate - 37.0).abs() < f64::EPSILON);
    assert_eq!(saved.store_name, Settings::default().store_name);

    let err = controller
        .update_settings(UpdateSettingsRequest {
            exchange_rate: Some(0.0),
            ..UpdateSettingsRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "{err:?}");
    assert_eq!(controller.settings(), saved);
}

// ── Notifications ───────────────────────────────────────────────────

#[tokio::test]
async fn every_command_publishes_exactly_one_notification() {
    let controller = local_controller().await;
    let mut notes = controller.notifications();

    let category = dresses(&controller).await;
    let _ = controller.delete_product(EntityId::new_v4()).await;
    controller.delete_category(category.id.clone()).await.unwrap();

    let first = notes.recv().await.unwrap();
    assert_eq!(first.operation, "add_category");
    assert_eq!(first.level, NotificationLevel::Success);

    let second = notes.recv().await.unwrap();
    assert_eq!(second.operation, "delete_product");
    assert_eq!(second.level, NotificationLevel::Failure);

    let third = notes.recv().await.unwrap();
    assert_eq!(third.operation, "delete_category");
    assert_eq!(third.level, NotificationLevel::Success);

    assert!(notes.try_recv().is_err());
}

#[tokio::test]
async fn commands_fail_without_a_session() {
    let controller = Controller::new(StoreConfig::local(CacheLocation::Memory));
    let mut notes = controller.notifications();

    let err = controller
        .delete_category(EntityId::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::SessionClosed), "{err:?}");
    assert_eq!(notes.recv().await.unwrap().level, NotificationLevel::Failure);

    controller.start(None).await.unwrap();
    controller.end_session().await;
    assert_eq!(*controller.session_state().borrow(), SessionState::Closed);
    let err = controller
        .delete_category(EntityId::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::SessionClosed), "{err:?}");
}

// ── Local cache ─────────────────────────────────────────────────────

#[tokio::test]
async fn mutations_survive_a_restart_through_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::local(CacheLocation::Dir(dir.path().to_path_buf()));

    let controller = Controller::new(config.clone());
    controller.start(None).await.unwrap();
    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;
    let reservation = controller
        .reserve_product(product.id.clone(), "Ana", "+5055")
        .await
        .unwrap();
    controller.shutdown().await;

    let restarted = Controller::new(config);
    restarted.start(None).await.unwrap();
    assert_eq!(*restarted.category_by_id(&category.id).unwrap(), category);
    assert_eq!(
        restarted.product_by_id(&product.id).unwrap().status,
        ProductStatus::Reserved
    );
    assert_eq!(
        restarted.reservation_by_product_id(&product.id).unwrap().id,
        reservation.id
    );
}

#[tokio::test]
async fn legacy_cache_is_discarded_on_start() {
    let dir = tempfile::tempdir().unwrap();
    let location = CacheLocation::Dir(dir.path().to_path_buf());

    let cache = LocalCache::open(&location);
    cache
        .write_raw(
            CacheKey::Categories,
            r#"[{"id":"1","name":"Dresses","code":"DRS"}]"#,
        )
        .unwrap();

    let controller = Controller::new(StoreConfig::local(location));
    controller.start(None).await.unwrap();
    assert!(controller.categories_snapshot().is_empty());
    assert_eq!(controller.settings(), Settings::default());
}

#[tokio::test]
async fn empty_local_store_can_seed_demo_categories() {
    let config = StoreConfig {
        seed_demo_catalog: true,
        ..StoreConfig::local(CacheLocation::Memory)
    };
    let controller = Controller::new(config);
    controller.start(None).await.unwrap();

    let mut codes: Vec<String> = controller
        .categories_snapshot()
        .iter()
        .map(|c| c.code.clone())
        .collect();
    codes.sort();
    assert_eq!(codes, vec!["ACC", "BTM", "DRS", "TOP"]);
    assert!(
        controller
            .categories_snapshot()
            .iter()
            .all(|c| c.id.is_canonical())
    );
}

// ── Reactive views ──────────────────────────────────────────────────

#[tokio::test]
async fn product_stream_sees_mutations() {
    let controller = local_controller().await;
    let mut stream = controller.products();
    assert!(stream.current().is_empty());

    let category = dresses(&controller).await;
    let product = dress(&controller, &category, "Dress A").await;

    let snap: Arc<Vec<Arc<Product>>> = stream.changed().await.unwrap();
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].id, product.id);
}

#[tokio::test]
async fn dashboard_reflects_lifecycle() {
    let controller = local_controller().await;
    let category = dresses(&controller).await;
    let a = dress(&controller, &category, "Dress A").await;
    dress(&controller, &category, "Dress B").await;
    controller
        .reserve_product(a.id.clone(), "Ana", "+5055")
        .await
        .unwrap();

    let dash = controller.dashboard();
    assert_eq!(dash.products, 2);
    assert_eq!(dash.available, 1);
    assert_eq!(dash.reserved, 1);
    assert_eq!(dash.categories, 1);
    assert_eq!(dash.pending_reservations, 1);
    assert!((dash.catalog_value - 100.0).abs() < f64::EPSILON);
}
