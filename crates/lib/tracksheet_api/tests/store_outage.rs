//! A store that cannot be reached surfaces as 503, never as a denial.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tower::ServiceExt;
use tracksheet_core::models::auth::{Identity, NewIdentity, Profile, Role};
use tracksheet_core::models::problem::{Problem, ProblemFilter, ProblemPage};
use tracksheet_core::models::sheet::Sheet;
use tracksheet_core::models::template::Template;
use tracksheet_core::store::in_memory::InMemoryStore;
use tracksheet_core::store::{
    IdentityStore, ProblemStore, SheetStore, StoreError, StoreResult, TemplateStore, Upserted,
};
use uuid::Uuid;

struct DownStore;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("pool timed out".into()))
}

#[async_trait]
impl IdentityStore for DownStore {
    async fn find_identity_by_email(&self, _: &str) -> StoreResult<Option<Identity>> {
        down()
    }
    async fn find_identity_by_id(&self, _: Uuid) -> StoreResult<Option<Identity>> {
        down()
    }
    async fn insert_identity(&self, _: NewIdentity) -> StoreResult<Identity> {
        down()
    }
    async fn insert_identity_if_absent(&self, _: NewIdentity) -> StoreResult<Upserted> {
        down()
    }
    async fn record_login(&self, _: Uuid, _: DateTime<Utc>) -> StoreResult<Option<Identity>> {
        down()
    }
    async fn update_profile(&self, _: Uuid, _: Profile) -> StoreResult<Option<Identity>> {
        down()
    }
    async fn update_account(
        &self,
        _: Uuid,
        _: Option<Role>,
        _: Option<bool>,
    ) -> StoreResult<Option<Identity>> {
        down()
    }
}

#[async_trait]
impl SheetStore for DownStore {
    async fn get_sheet(&self, _: Uuid) -> StoreResult<Option<Sheet>> {
        down()
    }
    async fn list_sheets(&self, _: Option<Uuid>, _: bool) -> StoreResult<Vec<Sheet>> {
        down()
    }
    async fn insert_sheet(&self, _: &Sheet) -> StoreResult<()> {
        down()
    }
    async fn update_sheet(&self, _: &Sheet) -> StoreResult<bool> {
        down()
    }
    async fn delete_sheet(&self, _: Uuid) -> StoreResult<bool> {
        down()
    }
}

#[async_trait]
impl TemplateStore for DownStore {
    async fn get_template(&self, _: Uuid) -> StoreResult<Option<Template>> {
        down()
    }
    async fn list_official_templates(
        &self,
        _: Option<&str>,
        _: Option<&str>,
        _: Option<u32>,
    ) -> StoreResult<Vec<Template>> {
        down()
    }
    async fn list_templates_owned_by(&self, _: Uuid) -> StoreResult<Vec<Template>> {
        down()
    }
    async fn list_template_categories(&self) -> StoreResult<Vec<String>> {
        down()
    }
    async fn insert_template(&self, _: &Template) -> StoreResult<()> {
        down()
    }
    async fn update_template(&self, _: &Template) -> StoreResult<bool> {
        down()
    }
    async fn delete_template(&self, _: Uuid) -> StoreResult<bool> {
        down()
    }
}

#[async_trait]
impl ProblemStore for DownStore {
    async fn get_problem(&self, _: Uuid) -> StoreResult<Option<Problem>> {
        down()
    }
    async fn get_problem_by_slug(&self, _: &str) -> StoreResult<Option<Problem>> {
        down()
    }
    async fn get_problems(&self, _: &[Uuid]) -> StoreResult<Vec<Problem>> {
        down()
    }
    async fn list_problems(&self, _: &ProblemFilter) -> StoreResult<ProblemPage> {
        down()
    }
    async fn slug_exists(&self, _: &str) -> StoreResult<bool> {
        down()
    }
    async fn insert_problem(&self, _: &Problem) -> StoreResult<()> {
        down()
    }
    async fn update_problem(&self, _: &Problem) -> StoreResult<bool> {
        down()
    }
    async fn delete_problem(&self, _: Uuid) -> StoreResult<Option<Problem>> {
        down()
    }
}

/// Router over a dead store plus a valid session token for a signed-in user.
async fn outage_app() -> (Router, String) {
    let config = tracksheet_api::config::ApiConfig::for_tests("outage-secret");
    let state = tracksheet_api::AppState::new(Arc::new(DownStore), config);

    let scratch = InMemoryStore::new();
    let identity = scratch
        .insert_identity(NewIdentity::registration("u@x.com", "hash".into(), "U"))
        .await
        .unwrap();
    let token = state.issuer.mint(&identity, Utc::now()).unwrap().token;
    (tracksheet_api::router(state), token)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let resp = app
        .clone()
        .oneshot(req.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn outage_is_reported_as_unavailable() {
    let (app, token) = outage_app().await;
    let sheet = format!("/sheets/{}", Uuid::now_v7());

    let cases = [
        ("GET", "/sheets".to_string(), None, json!(null)),
        ("GET", sheet.clone(), Some(token.as_str()), json!(null)),
        ("PUT", sheet, Some(token.as_str()), json!({ "name": "Renamed" })),
        ("GET", "/problems".to_string(), None, json!(null)),
        (
            "POST",
            "/auth/login/credentials".to_string(),
            None,
            json!({ "email": "u@x.com", "password": "hunter22" }),
        ),
    ];
    for (method, uri, token, body) in cases {
        let (status, body) = send(&app, method, &uri, token, body).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{method} {uri}");
        assert_eq!(body["error"], "store_unavailable");
        assert_eq!(body["message"], "Service temporarily unavailable");
    }
}
