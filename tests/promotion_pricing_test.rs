mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;
use vansales_api::{
    entities::{
        product,
        promotion::{self, PromotionStatus, PromotionType, ScopeLevel},
    },
    services::orders::{CreateOrderLineRequest, CreateOrderRequest},
};

#[tokio::test]
async fn active_mapped_promotion_is_returned() {
    let app = TestApp::new().await;
    let sku = app.seed_product("SKU-001", dec!(100), dec!(18)).await;
    let promo = app
        .seed_promotion(PromotionType::Percentage, dec!(10), None, None, &[sku.id])
        .await;

    let found = app
        .state
        .services
        .promotions
        .active_promotions_for(sku.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, promo.id);
}

#[tokio::test]
async fn expired_and_inactive_promotions_are_ignored() {
    let app = TestApp::new().await;
    let sku = app.seed_product("SKU-001", dec!(100), dec!(18)).await;

    // Window ended yesterday.
    promotion::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Expired".to_string()),
        promotion_type: Set(PromotionType::Percentage),
        discount_value: Set(dec!(50)),
        min_quantity: Set(None),
        max_discount: Set(None),
        start_date: Set(Utc::now() - Duration::days(10)),
        end_date: Set(Utc::now() - Duration::days(1)),
        status: Set(PromotionStatus::Active),
        scope_level: Set(None),
        scope_id: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    // In window but switched off.
    promotion::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Disabled".to_string()),
        promotion_type: Set(PromotionType::Percentage),
        discount_value: Set(dec!(50)),
        min_quantity: Set(None),
        max_discount: Set(None),
        start_date: Set(Utc::now() - Duration::days(1)),
        end_date: Set(Utc::now() + Duration::days(1)),
        status: Set(PromotionStatus::Inactive),
        scope_level: Set(None),
        scope_id: Set(None),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    let found = app
        .state
        .services
        .promotions
        .active_promotions_for(sku.id, Utc::now())
        .await
        .unwrap();
    assert!(found.is_empty());

    let priced = app
        .state
        .services
        .promotions
        .price_for(sku.id, dec!(100), 5, Utc::now())
        .await
        .unwrap();
    assert_eq!(priced.final_unit_price, dec!(100));
    assert_eq!(priced.applied_promotion_id, None);
}

#[tokio::test]
async fn hierarchy_scoped_promotion_applies_through_the_category() {
    let app = TestApp::new().await;
    let category_id = Uuid::new_v4();
    let sku = product::ActiveModel {
        id: Set(Uuid::new_v4()),
        code: Set("SKU-CAT".to_string()),
        name: Set("Category member".to_string()),
        unit_price: Set(dec!(100)),
        vat_rate: Set(dec!(18)),
        category_id: Set(Some(category_id)),
        brand_id: Set(None),
        pack_format_id: Set(None),
        is_active: Set(true),
        is_saleable: Set(true),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    // No explicit mapping, applies through the product's category.
    let category_promo = promotion::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Category deal".to_string()),
        promotion_type: Set(PromotionType::Percentage),
        discount_value: Set(dec!(10)),
        min_quantity: Set(None),
        max_discount: Set(None),
        start_date: Set(Utc::now() - Duration::days(1)),
        end_date: Set(Utc::now() + Duration::days(1)),
        status: Set(PromotionStatus::Active),
        scope_level: Set(Some(ScopeLevel::Category)),
        scope_id: Set(Some(category_id)),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    // Scoped to a brand the product does not carry.
    promotion::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set("Other brand deal".to_string()),
        promotion_type: Set(PromotionType::Percentage),
        discount_value: Set(dec!(50)),
        min_quantity: Set(None),
        max_discount: Set(None),
        start_date: Set(Utc::now() - Duration::days(1)),
        end_date: Set(Utc::now() + Duration::days(1)),
        status: Set(PromotionStatus::Active),
        scope_level: Set(Some(ScopeLevel::Brand)),
        scope_id: Set(Some(Uuid::new_v4())),
        created_at: Set(Utc::now()),
        updated_at: Set(None),
    }
    .insert(&*app.state.db)
    .await
    .unwrap();

    let found = app
        .state
        .services
        .promotions
        .active_promotions_for(sku.id, Utc::now())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, category_promo.id);

    let priced = app
        .state
        .services
        .promotions
        .price_for(sku.id, sku.unit_price, 1, Utc::now())
        .await
        .unwrap();
    assert_eq!(priced.final_unit_price, dec!(90));
    assert_eq!(priced.applied_promotion_id, Some(category_promo.id));
}

#[tokio::test]
async fn price_for_applies_percentage_with_cap() {
    let app = TestApp::new().await;
    let sku = app.seed_product("SKU-001", dec!(10000), dec!(18)).await;
    app.seed_promotion(
        PromotionType::Percentage,
        dec!(10),
        None,
        Some(dec!(500)),
        &[sku.id],
    )
    .await;

    let priced = app
        .state
        .services
        .promotions
        .price_for(sku.id, sku.unit_price, 1, Utc::now())
        .await
        .unwrap();
    assert_eq!(priced.discount_amount, dec!(500));
    assert_eq!(priced.final_unit_price, dec!(9500));
}

#[tokio::test]
async fn order_lines_snapshot_the_applied_promotion() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let outlet = app.seed_outlet().await;
    let sku = app.seed_product("SKU-001", dec!(200), dec!(18)).await;
    app.grant_stock(rep.id, sku.id, 20).await;
    let promo = app
        .seed_promotion(PromotionType::Percentage, dec!(10), None, None, &[sku.id])
        .await;

    let details = app
        .state
        .services
        .orders
        .create_order(CreateOrderRequest {
            outlet_id: outlet.id,
            salesperson_id: rep.id,
            visit_id: None,
            lines: vec![CreateOrderLineRequest {
                product_id: sku.id,
                quantity: 2,
                ..Default::default()
            }],
            payments: Vec::new(),
            currency: None,
            notes: None,
        })
        .await
        .unwrap();

    let line = &details.lines[0];
    assert_eq!(line.unit_price, dec!(180));
    assert_eq!(line.original_unit_price, Some(dec!(200)));
    assert_eq!(line.discount_amount, Some(dec!(20)));
    assert_eq!(line.promotion_id, Some(promo.id));
    assert_eq!(line.line_total_excl_tax, dec!(360));
    assert_eq!(line.line_total_incl_tax, dec!(424.80));

    assert_eq!(details.order.total_excl_tax, dec!(360));
    assert_eq!(details.order.discount_total, dec!(40));
}

#[tokio::test]
async fn promotion_below_min_quantity_does_not_apply_in_orders() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let outlet = app.seed_outlet().await;
    let sku = app.seed_product("SKU-001", dec!(100), dec!(18)).await;
    app.grant_stock(rep.id, sku.id, 20).await;
    app.seed_promotion(PromotionType::Percentage, dec!(25), Some(10), None, &[sku.id])
        .await;

    let details = app
        .state
        .services
        .orders
        .create_order(CreateOrderRequest {
            outlet_id: outlet.id,
            salesperson_id: rep.id,
            visit_id: None,
            lines: vec![CreateOrderLineRequest {
                product_id: sku.id,
                quantity: 3,
                ..Default::default()
            }],
            payments: Vec::new(),
            currency: None,
            notes: None,
        })
        .await
        .unwrap();

    let line = &details.lines[0];
    assert_eq!(line.unit_price, dec!(100));
    assert_eq!(line.promotion_id, None);
    assert_eq!(details.order.discount_total, dec!(0));
}

#[tokio::test]
async fn buy_x_get_y_spreads_value_across_the_line() {
    let app = TestApp::new().await;
    let rep = app.seed_salesperson().await;
    let outlet = app.seed_outlet().await;
    let sku = app.seed_product("SKU-001", dec!(50), dec!(18)).await;
    app.grant_stock(rep.id, sku.id, 30).await;
    // Buy 10 get 2 free.
    app.seed_promotion(PromotionType::BuyXGetY, dec!(2), Some(10), None, &[sku.id])
        .await;

    let details = app
        .state
        .services
        .orders
        .create_order(CreateOrderRequest {
            outlet_id: outlet.id,
            salesperson_id: rep.id,
            visit_id: None,
            lines: vec![CreateOrderLineRequest {
                product_id: sku.id,
                quantity: 20,
                ..Default::default()
            }],
            payments: Vec::new(),
            currency: None,
            notes: None,
        })
        .await
        .unwrap();

    // 4 free units worth 200 over 20 units: 10 off per unit.
    let line = &details.lines[0];
    assert_eq!(line.unit_price, dec!(40));
    assert_eq!(line.discount_amount, Some(dec!(10)));
    assert_eq!(line.line_total_excl_tax, dec!(800));
}
