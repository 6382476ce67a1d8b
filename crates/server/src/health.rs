use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use freshprice_db::{ping, DbPool};
use serde::Serialize;
use tracing::{error, info};

use crate::bootstrap::SharedDashboard;

#[derive(Clone)]
pub struct HealthState {
    pub db_pool: DbPool,
    pub dashboard: SharedDashboard,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub pricing: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn spawn(bind_address: &str, port: u16, state: HealthState) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(state)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

/// Only the database decides readiness. An idle pricing engine (no dataset
/// yet) is reported but still answers 200.
pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let pricing = pricing_check(&state.dashboard).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "freshprice-server runtime initialized".to_string(),
        },
        database,
        pricing,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match ping(pool).await {
        Ok(()) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

async fn pricing_check(dashboard: &SharedDashboard) -> HealthCheck {
    let dashboard = dashboard.lock().await;
    match dashboard.last_update() {
        Some(priced_at) => HealthCheck {
            status: "ready",
            detail: format!(
                "{} products priced at {}",
                dashboard.products().len(),
                priced_at.to_rfc3339()
            ),
        },
        None => HealthCheck { status: "idle", detail: "no dataset loaded".to_string() },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{Request, StatusCode},
        Json,
    };
    use chrono::Utc;
    use freshprice_core::domain::{dataset::DatasetRecord, product::ProductId};
    use freshprice_core::inventory::InventoryDashboard;
    use freshprice_db::connect_with_settings;
    use serde_json::Value;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    use crate::bootstrap::SharedDashboard;
    use crate::health::{health, router, HealthState};

    fn idle_dashboard() -> SharedDashboard {
        Arc::new(Mutex::new(InventoryDashboard::default()))
    }

    #[tokio::test]
    async fn health_is_ready_but_pricing_idle_without_a_dataset() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool.clone(), dashboard: idle_dashboard() })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.database.status, "ready");
        assert_eq!(payload.pricing.status, "idle");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_reports_priced_products() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        let dashboard = idle_dashboard();
        dashboard.lock().await.load_dataset(
            vec![DatasetRecord {
                id: ProductId("yogurt".to_string()),
                name: "Yogurt".to_string(),
                store: None,
                category: None,
                stock: None,
                days_to_expiry: None,
                original_price: None,
                current_price: None,
                sales_velocity: None,
            }],
            Utc::now(),
        );

        let response = router(HealthState { db_pool: pool.clone(), dashboard })
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("router should respond");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(payload["pricing"]["status"], "ready");
        assert!(payload["pricing"]["detail"].as_str().unwrap_or_default().starts_with("1 products"));

        pool.close().await;
    }

    #[tokio::test]
    async fn health_goes_idle_again_once_the_dataset_is_cleared() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        let dashboard = idle_dashboard();
        {
            let mut dashboard = dashboard.lock().await;
            dashboard.load_dataset(
                vec![DatasetRecord {
                    id: ProductId("kefir".to_string()),
                    name: "Kefir".to_string(),
                    store: None,
                    category: None,
                    stock: Some(4),
                    days_to_expiry: Some(2.0),
                    original_price: Some(5.0),
                    current_price: None,
                    sales_velocity: Some(1.0),
                }],
                Utc::now(),
            );
            dashboard.load_dataset(Vec::new(), Utc::now());
        }

        let (_, Json(payload)) =
            health(State(HealthState { db_pool: pool.clone(), dashboard })).await;

        assert_eq!(payload.pricing.status, "idle");
        assert_eq!(payload.pricing.detail, "no dataset loaded");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_database_is_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool, dashboard: idle_dashboard() })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.database.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
