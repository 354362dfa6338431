#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use uuid::Uuid;

use vansales_api::{
    config::AppConfig,
    db,
    entities::{
        outlet, product,
        promotion::{self, PromotionStatus, PromotionType},
        promotion_product,
        salesperson::{self, Role},
        visit,
    },
    events::{self, EventSender},
    services::stock::GrantItem,
    AppState,
};

/// Test harness backed by a file-based SQLite database. A fresh file per
/// harness and a single connection keep transactional tests deterministic.
pub struct TestApp {
    pub state: AppState,
    db_file: String,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_file = format!("vansales_test_{}.db", Uuid::new_v4().as_simple());
        let _ = std::fs::remove_file(&db_file);

        let mut cfg = AppConfig::new(
            format!("sqlite://{db_file}?mode=rwc"),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (tx, rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(rx));

        let state = AppState::new(
            Arc::new(pool),
            Arc::new(cfg),
            Arc::new(EventSender::new(tx)),
        );

        Self {
            state,
            db_file,
            _event_task: event_task,
        }
    }

    pub async fn seed_salesperson(&self) -> salesperson::Model {
        self.seed_person("Test Rep", Role::Salesperson, true).await
    }

    pub async fn seed_person(
        &self,
        name: &str,
        role: Role,
        is_active: bool,
    ) -> salesperson::Model {
        salesperson::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            role: Set(role),
            is_active: Set(is_active),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed salesperson")
    }

    pub async fn seed_outlet(&self) -> outlet::Model {
        outlet::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Corner Market".to_string()),
            address: Set(None),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed outlet")
    }

    pub async fn seed_visit(&self, salesperson_id: Uuid, outlet_id: Uuid) -> visit::Model {
        visit::ActiveModel {
            id: Set(Uuid::new_v4()),
            salesperson_id: Set(salesperson_id),
            outlet_id: Set(outlet_id),
            status: Set("in_progress".to_string()),
            started_at: Set(Utc::now()),
            ended_at: Set(None),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed visit")
    }

    pub async fn seed_product(
        &self,
        code: &str,
        unit_price: Decimal,
        vat_rate: Decimal,
    ) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code.to_string()),
            name: Set(format!("Product {code}")),
            unit_price: Set(unit_price),
            vat_rate: Set(vat_rate),
            category_id: Set(None),
            brand_id: Set(None),
            pack_format_id: Set(None),
            is_active: Set(true),
            is_saleable: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed product")
    }

    /// Active promotion valid from yesterday to tomorrow, mapped to the
    /// given products.
    pub async fn seed_promotion(
        &self,
        promotion_type: PromotionType,
        discount_value: Decimal,
        min_quantity: Option<i32>,
        max_discount: Option<Decimal>,
        product_ids: &[Uuid],
    ) -> promotion::Model {
        let promo = promotion::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Test promotion".to_string()),
            promotion_type: Set(promotion_type),
            discount_value: Set(discount_value),
            min_quantity: Set(min_quantity),
            max_discount: Set(max_discount),
            start_date: Set(Utc::now() - Duration::days(1)),
            end_date: Set(Utc::now() + Duration::days(1)),
            status: Set(PromotionStatus::Active),
            scope_level: Set(None),
            scope_id: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed promotion");

        for product_id in product_ids {
            promotion_product::ActiveModel {
                promotion_id: Set(promo.id),
                product_id: Set(*product_id),
            }
            .insert(&*self.state.db)
            .await
            .expect("failed to map promotion to product");
        }

        promo
    }

    /// Grants stock through the ledger service so a movement row exists.
    pub async fn grant_stock(&self, salesperson_id: Uuid, product_id: Uuid, quantity: i32) {
        self.state
            .services
            .stock
            .grant(
                salesperson_id,
                vec![GrantItem {
                    product_id,
                    quantity,
                }],
                None,
            )
            .await
            .expect("failed to grant stock");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_file);
    }
}
