use std::sync::{Arc, Mutex};

use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    test, web, App, Error,
};
use async_trait::async_trait;
use audit_llm::{CompletionService, LLMError};
use audit_pipeline::{FetchError, StepPipeline, WebFetcher};
use audit_server::{app_config, AppState};
use audit_store::{AuditStore, SqliteAuditStore};
use serde_json::{json, Value};
use tempfile::TempDir;

const PAGE: &str = r#"<html><head><title>Acme</title><meta name="description" content="Widgets for all"></head><body><h1>Welcome</h1><h2>About</h2></body></html>"#;

/// Echoes a fixed reply and keeps every prompt it saw.
struct MockCompletions {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl MockCompletions {
    fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionService for MockCompletions {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> audit_llm::Result<String> {
        self.prompts.lock().unwrap().push(user_prompt.to_string());
        self.reply.clone().map_err(LLMError::Api)
    }
}

struct MockFetcher;

#[async_trait]
impl WebFetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        Ok(PAGE.to_string())
    }
}

struct TestContext {
    _dir: TempDir,
    store: Arc<SqliteAuditStore>,
    completions: Arc<MockCompletions>,
}

async fn setup_test_app(
    completions: MockCompletions,
    debug: bool,
) -> (
    impl Service<Request, Response = ServiceResponse, Error = Error>,
    TestContext,
) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteAuditStore::new(dir.path().join("audit.db")));
    store.init().await.unwrap();
    let completions = Arc::new(completions);

    let pipeline = StepPipeline::new(store.clone(), completions.clone(), Arc::new(MockFetcher));
    let state = web::Data::new(AppState::new(pipeline, debug));

    let app = test::init_service(App::new().app_data(state).configure(app_config)).await;
    (
        app,
        TestContext {
            _dir: dir,
            store,
            completions,
        },
    )
}

async fn create_project(
    app: &impl Service<Request, Response = ServiceResponse, Error = Error>,
) -> i64 {
    let req = test::TestRequest::post()
        .uri("/api/projects")
        .set_json(json!({ "name": "Acme", "website_url": "https://acme.test" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);

    let body: Value = test::read_body_json(resp).await;
    body["id"].as_i64().unwrap()
}

#[actix_web::test]
async fn test_health_check() {
    let (app, _ctx) = setup_test_app(MockCompletions::replying("unused"), false).await;

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    assert_eq!(test::read_body(resp).await, "OK");
}

#[actix_web::test]
async fn test_create_and_list_projects() {
    let (app, _ctx) = setup_test_app(MockCompletions::replying("unused"), false).await;
    let project_id = create_project(&app).await;

    let req = test::TestRequest::get().uri("/api/projects").to_request();
    let projects: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(projects.as_array().unwrap().len(), 1);
    assert_eq!(projects[0]["id"], project_id);
    assert_eq!(projects[0]["website_url"], "https://acme.test");
}

#[actix_web::test]
async fn test_create_project_rejects_bad_url() {
    let (app, _ctx) = setup_test_app(MockCompletions::replying("unused"), false).await;

    let req = test::TestRequest::post()
        .uri("/api/projects")
        .set_json(json!({ "name": "Acme", "website_url": "acme.test" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "invalid_input");
}

#[actix_web::test]
async fn test_run_step_one_persists_everything() {
    let (app, ctx) = setup_test_app(
        MockCompletions::replying(
            "1. Website Summary: Acme sells widgets. 2. SEO Audit: Add analytics.",
        ),
        false,
    )
    .await;
    let project_id = create_project(&app).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/projects/{}/steps/1", project_id))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["step"], 1);
    assert_eq!(body["title"], "Website Audit");
    assert_eq!(body["context"]["h1_tags"], json!(["Welcome"]));
    assert_eq!(body["context"]["meta_description"], "Widgets for all");

    let prompts = ctx.completions.prompts.lock().unwrap().clone();
    assert!(prompts[0].contains(r#"H1 Tags: ["Welcome"]"#));

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}", project_id))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["name"], "Acme");
    assert_eq!(detail["steps"].as_array().unwrap().len(), 1);
    assert_eq!(detail["website_summary"]["content"], "Acme sells widgets.");

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}/contexts/1", project_id))
        .to_request();
    let context: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(context["content"]["title"], "Acme");
}

#[actix_web::test]
async fn test_latest_step_is_returned() {
    let (app, ctx) = setup_test_app(MockCompletions::replying("Avatars v2"), false).await;
    let project_id = create_project(&app).await;
    ctx.store
        .append_step(project_id, 2, "Client Avatars", "Avatars v1")
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/projects/{}/steps/2", project_id))
        .set_json(json!({ "context": { "note": "rerun" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}/steps/2", project_id))
        .to_request();
    let step: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(step["content"], "Avatars v2");
    assert_eq!(step["step_number"], 2);
}

#[actix_web::test]
async fn test_missing_records_are_not_found() {
    let (app, _ctx) = setup_test_app(MockCompletions::replying("unused"), false).await;

    let req = test::TestRequest::get().uri("/api/projects/42").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "not_found");
    assert_eq!(body["error"], "project 42 not found");

    let project_id = create_project(&app).await;
    let req = test::TestRequest::get()
        .uri(&format!("/api/projects/{}/steps/3", project_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_unknown_step_is_rejected() {
    let (app, ctx) = setup_test_app(MockCompletions::replying("unused"), false).await;
    let project_id = create_project(&app).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/projects/{}/steps/11", project_id))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    assert!(ctx.completions.prompts.lock().unwrap().is_empty());
}

#[actix_web::test]
async fn test_completion_failure_reports_upstream_and_commits_nothing() {
    let (app, ctx) = setup_test_app(MockCompletions::failing("HTTP 500: boom"), true).await;
    let project_id = create_project(&app).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/projects/{}/steps/1", project_id))
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 502);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "upstream");
    assert!(body["detail"][0].as_str().unwrap().contains("HTTP 500: boom"));
    assert!(ctx.store.list_steps(project_id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_process_is_stateless() {
    let (app, ctx) = setup_test_app(MockCompletions::replying("Value props"), false).await;

    let req = test::TestRequest::post()
        .uri("/api/process")
        .set_json(json!({
            "step": 3,
            "context": { "step1_results": "Audit text" }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "response": "Value props" }));
    assert!(ctx.completions.prompts.lock().unwrap()[0].contains("Audit text\n"));
    assert!(ctx.store.list_projects().await.unwrap().is_empty());
}

#[actix_web::test]
async fn test_process_step_one_requires_website() {
    let (app, _ctx) = setup_test_app(MockCompletions::replying("unused"), false).await;

    let req = test::TestRequest::post()
        .uri("/api/process")
        .set_json(json!({ "step": 1 }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "missing_fields");
    assert!(body.get("detail").is_none());
}

#[actix_web::test]
async fn test_malformed_body_is_invalid_input() {
    let (app, _ctx) = setup_test_app(MockCompletions::replying("unused"), false).await;

    let req = test::TestRequest::post()
        .uri("/api/process")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "invalid_input");
}
