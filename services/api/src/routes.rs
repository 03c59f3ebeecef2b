use crate::infra::AppState;
use axum::extract::{Path, Query};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use opportunity_insights::error::AppError;
use opportunity_insights::insights::catalog::CategoryListing;
use opportunity_insights::insights::{
    generate, CatalogError, OpportunityCatalog, OpportunityMetrics,
};
use opportunity_insights::leads::{lead_router, LeadService, LeadStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct InsightsQuery {
    pub(crate) category: String,
    pub(crate) product: String,
    /// When present, the pair must be listed in that market's catalog.
    #[serde(default)]
    pub(crate) market: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogResponse {
    pub(crate) market: String,
    pub(crate) categories: Vec<CategoryListing>,
}

pub(crate) fn with_lead_routes<S>(service: Arc<LeadService<S>>) -> axum::Router
where
    S: LeadStore + 'static,
{
    lead_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/catalog/:market",
            axum::routing::get(catalog_endpoint),
        )
        .route("/api/v1/insights", axum::routing::get(insights_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn catalog_endpoint(
    Extension(state): Extension<AppState>,
    Path(market): Path<String>,
) -> Result<Json<CatalogResponse>, AppError> {
    let catalog = OpportunityCatalog::load_market(state.catalog_dir.as_path(), &market)?;
    Ok(Json(CatalogResponse {
        market,
        categories: catalog.listings(),
    }))
}

pub(crate) async fn insights_endpoint(
    Extension(state): Extension<AppState>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<OpportunityMetrics>, AppError> {
    let InsightsQuery {
        category,
        product,
        market,
    } = query;

    if let Some(market) = market {
        let catalog = OpportunityCatalog::load_market(state.catalog_dir.as_path(), &market)?;
        if catalog.find(&category, &product).is_none() {
            tracing::debug!(
                %market,
                %category,
                %product,
                "insights requested for unlisted product"
            );
            return Err(CatalogError::UnknownProduct { category, product }.into());
        }
    }

    Ok(Json(generate(&category, &product)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use opportunity_insights::leads::{AdminToken, InMemoryLeadStore};
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tower::ServiceExt;

    fn catalog_dir() -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let unique = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!(
            "opportunity-routes-{}-{unique}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).expect("catalog dir");
        std::fs::write(
            dir.join("usa.csv"),
            "Category,Product\nHome & Kitchen,Yoga Mat\nFitness,Resistance Bands\nHome & Kitchen,Bamboo Board\n",
        )
        .expect("catalog file");
        dir
    }

    fn app(ready: bool) -> axum::Router {
        let service = Arc::new(LeadService::new(
            Arc::new(InMemoryLeadStore::default()),
            AdminToken::new("route-token"),
        ));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            catalog_dir: Arc::new(catalog_dir()),
        };
        with_lead_routes(service).layer(Extension(state))
    }

    async fn get(router: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router dispatch");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let (status, body) = get(app(false), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "initializing");

        let (status, _) = get(app(true), "/ready").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn insights_endpoint_returns_deterministic_metrics() {
        let (status, body) = get(app(true), "/api/v1/insights?category=Home&product=Widget").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "Home");
        assert_eq!(body["demandScore"], 77);
        assert_eq!(body["maxPrice"], 105);
    }

    #[tokio::test]
    async fn insights_endpoint_checks_market_listing() {
        let (status, body) = get(
            app(true),
            "/api/v1/insights?category=Home%20%26%20Kitchen&product=Yoga%20Mat&market=usa",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["product"], "Yoga Mat");

        let (status, _) = get(
            app(true),
            "/api/v1/insights?category=Fitness&product=Yoga%20Mat&market=usa",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_endpoint_groups_products_by_category() {
        let (status, body) = get(app(true), "/api/v1/catalog/usa").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["market"], "usa");
        assert_eq!(body["categories"][0]["category"], "Home & Kitchen");
        assert_eq!(
            body["categories"][0]["products"],
            json!(["Yoga Mat", "Bamboo Board"])
        );
        assert_eq!(body["categories"][1]["category"], "Fitness");
    }

    #[tokio::test]
    async fn catalog_endpoint_returns_not_found_for_unknown_market() {
        let (status, body) = get(app(true), "/api/v1/catalog/atlantis").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn lead_routes_are_mounted() {
        let (status, _) = get(app(true), "/api/leads?token=route-token").await;
        assert_eq!(status, StatusCode::OK);
    }
}
