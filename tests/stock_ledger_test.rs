mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use uuid::Uuid;
use vansales_api::{
    entities::{salesperson::Role, stock_movement::MovementType},
    errors::ServiceError,
    services::stock::GrantItem,
};

#[tokio::test]
async fn grant_creates_stock_rows_and_movements() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let a = app.seed_product("SKU-A", dec!(10), dec!(18)).await;
    let b = app.seed_product("SKU-B", dec!(20), dec!(18)).await;

    let movements = app
        .state
        .services
        .stock
        .grant(
            rep.id,
            vec![
                GrantItem {
                    product_id: a.id,
                    quantity: 25,
                },
                GrantItem {
                    product_id: b.id,
                    quantity: 5,
                },
            ],
            Some("van load".to_string()),
        )
        .await
        .expect("grant should succeed");

    assert_eq!(movements.len(), 2);
    assert_eq!(movements[0].movement_type, MovementType::Grant);
    assert_eq!(movements[0].quantity_before, 0);
    assert_eq!(movements[0].quantity_after, 25);
    assert_eq!(movements[0].reason.as_deref(), Some("van load"));

    let level = app
        .state
        .services
        .stock
        .get_quantity(rep.id, a.id)
        .await
        .unwrap();
    assert_eq!(level, 25);

    let holdings = app
        .state
        .services
        .stock
        .stock_for_salesperson(rep.id)
        .await
        .unwrap();
    assert_eq!(holdings.len(), 2);
}

#[tokio::test]
async fn repeated_grants_accumulate() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let sku = app.seed_product("SKU-001", dec!(10), dec!(18)).await;

    app.grant_stock(rep.id, sku.id, 10).await;
    let movements = app
        .state
        .services
        .stock
        .grant(
            rep.id,
            vec![GrantItem {
                product_id: sku.id,
                quantity: 5,
            }],
            None,
        )
        .await
        .unwrap();

    assert_eq!(movements[0].quantity_before, 10);
    assert_eq!(movements[0].quantity_after, 15);
}

#[tokio::test]
async fn grant_reports_every_unknown_sku() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let known = app.seed_product("SKU-001", dec!(10), dec!(18)).await;
    let ghost_a = Uuid::new_v4();
    let ghost_b = Uuid::new_v4();

    let err = app
        .state
        .services
        .stock
        .grant(
            rep.id,
            vec![
                GrantItem {
                    product_id: known.id,
                    quantity: 5,
                },
                GrantItem {
                    product_id: ghost_a,
                    quantity: 5,
                },
                GrantItem {
                    product_id: ghost_b,
                    quantity: 5,
                },
            ],
            None,
        )
        .await
        .expect_err("unknown SKUs must fail the batch");

    match err {
        ServiceError::SkusNotFound(ids) => {
            assert_eq!(ids.len(), 2);
            assert!(ids.contains(&ghost_a));
            assert!(ids.contains(&ghost_b));
        }
        other => panic!("expected SkusNotFound, got {other:?}"),
    }

    // Nothing from the batch landed.
    let level = app
        .state
        .services
        .stock
        .get_quantity(rep.id, known.id)
        .await
        .unwrap();
    assert_eq!(level, 0);
}

#[tokio::test]
async fn remove_zeroes_one_sku() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let sku = app.seed_product("SKU-001", dec!(10), dec!(18)).await;
    app.grant_stock(rep.id, sku.id, 7).await;

    let movement = app
        .state
        .services
        .stock
        .remove(rep.id, sku.id, Some("end of route".to_string()))
        .await
        .unwrap();

    assert_eq!(movement.movement_type, MovementType::Removal);
    assert_eq!(movement.quantity_delta, -7);
    assert_eq!(movement.quantity_after, 0);

    // Nothing held, nothing to remove.
    let err = app
        .state
        .services
        .stock
        .remove(rep.id, sku.id, None)
        .await
        .expect_err("empty holdings cannot be removed");
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn remove_all_zeroes_every_held_sku() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let a = app.seed_product("SKU-A", dec!(10), dec!(18)).await;
    let b = app.seed_product("SKU-B", dec!(20), dec!(18)).await;
    let c = app.seed_product("SKU-C", dec!(30), dec!(18)).await;
    app.grant_stock(rep.id, a.id, 4).await;
    app.grant_stock(rep.id, b.id, 9).await;
    // c granted then already removed, so it must not produce a movement.
    app.grant_stock(rep.id, c.id, 2).await;
    app.state
        .services
        .stock
        .remove(rep.id, c.id, None)
        .await
        .unwrap();

    let movements = app
        .state
        .services
        .stock
        .remove_all(rep.id, Some("depot return".to_string()))
        .await
        .unwrap();
    assert_eq!(movements.len(), 2);
    assert!(movements.iter().all(|m| m.quantity_after == 0));

    for sku in [a.id, b.id, c.id] {
        let level = app
            .state
            .services
            .stock
            .get_quantity(rep.id, sku)
            .await
            .unwrap();
        assert_eq!(level, 0);
    }

    // Second pass is an empty batch, not an error.
    let movements = app
        .state
        .services
        .stock
        .remove_all(rep.id, None)
        .await
        .unwrap();
    assert!(movements.is_empty());
}

#[tokio::test]
async fn stock_mutations_require_an_active_salesperson() {
    let app = TestApp::new().await;
    let sku = app.seed_product("SKU-001", dec!(10), dec!(18)).await;
    let item = || {
        vec![GrantItem {
            product_id: sku.id,
            quantity: 5,
        }]
    };

    let unknown = Uuid::new_v4();
    let err = app
        .state
        .services
        .stock
        .grant(unknown, item(), None)
        .await
        .expect_err("unknown salesperson");
    assert!(matches!(err, ServiceError::SalespersonNotFound(id) if id == unknown));

    let inactive = app.seed_person("Left Company", Role::Salesperson, false).await;
    let err = app
        .state
        .services
        .stock
        .grant(inactive.id, item(), None)
        .await
        .expect_err("inactive salesperson");
    assert!(matches!(err, ServiceError::NotASalesperson(_)));

    let supervisor = app.seed_person("Boss", Role::Supervisor, true).await;
    let err = app
        .state
        .services
        .stock
        .grant(supervisor.id, item(), None)
        .await
        .expect_err("supervisors hold no van stock");
    assert!(matches!(err, ServiceError::NotASalesperson(_)));
}

#[tokio::test]
async fn grant_rejects_non_positive_quantity() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let sku = app.seed_product("SKU-001", dec!(10), dec!(18)).await;

    let err = app
        .state
        .services
        .stock
        .grant(
            rep.id,
            vec![GrantItem {
                product_id: sku.id,
                quantity: 0,
            }],
            None,
        )
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, ServiceError::InvalidQuantity { quantity: 0, .. }));
}

#[tokio::test]
async fn movement_history_sums_to_current_level() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let sku = app.seed_product("SKU-001", dec!(10), dec!(18)).await;

    app.grant_stock(rep.id, sku.id, 20).await;
    app.state
        .services
        .stock
        .remove(rep.id, sku.id, None)
        .await
        .unwrap();
    app.grant_stock(rep.id, sku.id, 3).await;

    let (movements, total) = app
        .state
        .services
        .stock
        .movement_history(rep.id, Some(sku.id), 1, 50)
        .await
        .unwrap();
    assert_eq!(total, 3);

    let sum: i32 = movements.iter().map(|m| m.quantity_delta).sum();
    let level = app
        .state
        .services
        .stock
        .get_quantity(rep.id, sku.id)
        .await
        .unwrap();
    assert_eq!(sum, level);
    assert_eq!(level, 3);
}

#[tokio::test]
async fn standalone_debit_opens_its_own_transaction() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let sku = app.seed_product("SKU-001", dec!(10), dec!(18)).await;
    app.grant_stock(rep.id, sku.id, 10).await;

    let order_id = Uuid::new_v4();
    let movements = app
        .state
        .services
        .stock
        .reserve_and_debit(
            rep.id,
            order_id,
            vec![vansales_api::services::stock::DebitLine {
                product_id: sku.id,
                sku_code: Some("SKU-001".to_string()),
                quantity: 4,
            }],
        )
        .await
        .unwrap();

    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Sale);
    assert_eq!(movements[0].order_id, Some(order_id));
    assert_eq!(
        app.state
            .services
            .stock
            .get_quantity(rep.id, sku.id)
            .await
            .unwrap(),
        6
    );
}

#[tokio::test]
async fn standalone_debit_rejects_non_positive_quantity() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let sku = app.seed_product("SKU-001", dec!(10), dec!(18)).await;
    app.grant_stock(rep.id, sku.id, 5).await;

    // A negative debit would credit stock through a sale movement.
    let err = app
        .state
        .services
        .stock
        .reserve_and_debit(
            rep.id,
            Uuid::new_v4(),
            vec![vansales_api::services::stock::DebitLine {
                product_id: sku.id,
                sku_code: Some("SKU-001".to_string()),
                quantity: -7,
            }],
        )
        .await
        .expect_err("negative quantity must not credit stock");
    assert!(matches!(err, ServiceError::InvalidQuantity { quantity: -7, .. }));

    let (movements, total) = app
        .state
        .services
        .stock
        .movement_history(rep.id, Some(sku.id), 1, 50)
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(movements[0].movement_type, MovementType::Grant);
    assert_eq!(
        app.state
            .services
            .stock
            .get_quantity(rep.id, sku.id)
            .await
            .unwrap(),
        5
    );
}
