use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::LeadSubmission;
use super::repository::LeadStore;
use super::service::{LeadError, LeadService};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

#[derive(Debug, Default, Deserialize)]
pub struct CredentialQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Router exposing lead capture and the token-gated admin reads.
pub fn lead_router<S>(service: Arc<LeadService<S>>) -> Router
where
    S: LeadStore + 'static,
{
    Router::new()
        .route("/api/leads", get(list_handler::<S>).post(submit_handler::<S>))
        .route("/api/leads/export.csv", get(export_handler::<S>))
        .with_state(service)
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<LeadService<S>>>,
    payload: Result<axum::Json<LeadSubmission>, JsonRejection>,
) -> Response
where
    S: LeadStore + 'static,
{
    let axum::Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "lead submission body rejected");
            let message = format!("invalid request body: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, axum::Json(json!({ "error": message })))
                .into_response();
        }
    };

    match run_blocking(move || service.append(submission)).await {
        Ok(lead) => (
            StatusCode::OK,
            axum::Json(json!({ "success": true, "lead": lead })),
        )
            .into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<LeadService<S>>>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Response
where
    S: LeadStore + 'static,
{
    let credential = credential(&query, &headers);
    match run_blocking(move || service.list(&credential)).await {
        Ok(leads) => (StatusCode::OK, axum::Json(json!({ "leads": leads }))).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn export_handler<S>(
    State(service): State<Arc<LeadService<S>>>,
    Query(query): Query<CredentialQuery>,
    headers: HeaderMap,
) -> Response
where
    S: LeadStore + 'static,
{
    let credential = credential(&query, &headers);
    let export = run_blocking(move || {
        let mut buffer = Vec::new();
        service.export_csv(&credential, &mut buffer)?;
        Ok(buffer)
    });

    match export.await {
        Ok(buffer) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"leads.csv\"",
                ),
            ],
            buffer,
        )
            .into_response(),
        Err(response) => response,
    }
}

/// Runs a service call on the blocking pool; the store lock and file I/O stay
/// off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, LeadError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(error_response(err)),
        Err(err) => {
            tracing::error!(error = %err, "lead task did not complete");
            Err(internal_error())
        }
    }
}

fn credential(query: &CredentialQuery, headers: &HeaderMap) -> String {
    query
        .token
        .clone()
        .or_else(|| {
            headers
                .get(ADMIN_TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn error_response(err: LeadError) -> Response {
    let status = match &err {
        LeadError::Validation(_) => StatusCode::BAD_REQUEST,
        LeadError::Unauthorized => StatusCode::UNAUTHORIZED,
        LeadError::Store(_) | LeadError::Export(_) => {
            tracing::error!(error = %err, "lead request failed");
            return internal_error();
        }
    };

    (status, axum::Json(json!({ "error": err.to_string() }))).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::repository::InMemoryLeadStore;
    use crate::leads::service::AdminToken;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    const TOKEN: &str = "dashboard-token";

    fn build_router() -> Router {
        let service = Arc::new(LeadService::new(
            Arc::new(InMemoryLeadStore::default()),
            AdminToken::new(TOKEN),
        ));
        lead_router(service)
    }

    fn post_lead(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/leads")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
            .expect("request")
    }

    async fn json_body(response: Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&body).expect("json")
    }

    #[tokio::test]
    async fn submit_returns_created_lead() {
        let response = build_router()
            .oneshot(post_lead(json!({
                "name": "Jane Doe",
                "email": "jane@co.com",
                "phone": "9876543210",
                "countryCode": "+91",
                "product": "Yoga Mat",
                "country": "usa"
            })))
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["success"], true);
        assert_eq!(payload["lead"]["phone"], "+91 9876543210");
        assert_eq!(payload["lead"]["countryOfInterest"], "usa");
    }

    #[tokio::test]
    async fn submit_without_phone_is_bad_request() {
        let response = build_router()
            .oneshot(post_lead(json!({ "name": "Jane", "email": "jane@co.com" })))
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(response).await;
        assert_eq!(payload["error"], "missing required field: phone");
    }

    #[tokio::test]
    async fn malformed_body_gets_json_error() {
        let response = build_router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/leads")
                    .header("content-type", "text/plain")
                    .body(Body::from("name=Jane"))
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].as_str().is_some());

        let response = build_router()
            .oneshot(post_lead(json!({ "name": 42, "email": "a@x.com", "phone": "1" })))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let payload = json_body(response).await;
        assert!(payload["error"]
            .as_str()
            .is_some_and(|message| message.starts_with("invalid request body")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_submissions_are_all_stored() {
        let router = build_router();
        let submissions: Vec<_> = (0..24)
            .map(|index| {
                let router = router.clone();
                tokio::spawn(async move {
                    router
                        .oneshot(post_lead(json!({
                            "name": "Jane", "email": format!("u{index}@x.com"),
                            "phone": "1234567890", "product": "P1"
                        })))
                        .await
                        .expect("router dispatch")
                        .status()
                })
            })
            .collect();
        for submission in submissions {
            assert_eq!(submission.await.expect("task joined"), StatusCode::OK);
        }

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/leads?token={TOKEN}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");
        let payload = json_body(response).await;
        assert_eq!(payload["leads"].as_array().map(Vec::len), Some(24));
    }

    #[tokio::test]
    async fn list_accepts_header_credential() {
        let router = build_router();
        router
            .clone()
            .oneshot(post_lead(json!({
                "name": "A", "email": "a@x.com", "phone": "1234567890",
                "countryCode": "+1", "product": "P1", "country": "usa"
            })))
            .await
            .expect("router dispatch");

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/leads")
                    .header(ADMIN_TOKEN_HEADER, TOKEN)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["leads"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn list_without_token_is_unauthorized() {
        let response = build_router()
            .oneshot(
                Request::builder()
                    .uri("/api/leads?token=nope")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "unauthorized");
    }

    #[tokio::test]
    async fn export_returns_csv_attachment() {
        let response = build_router()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/leads/export.csv?token={TOKEN}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/csv; charset=utf-8")
        );
        let body = to_bytes(response.into_body(), 1024).await.expect("body");
        assert!(String::from_utf8_lossy(&body).starts_with("\"Name\",\"Email\""));
    }
}
