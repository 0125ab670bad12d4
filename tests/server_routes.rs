use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use phonebook::{MemPhonebook, PersonId, PhonebookEngine, PhonebookServer, SledPhonebook};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_else(|err| panic!("failed to build request: {err}"));

    let response = router
        .clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|err| panic!("router request failed: {err}"));
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|err| panic!("response body is not JSON: {err}; body={body}"))
}

fn mem_router() -> (MemPhonebook, Router) {
    let engine = MemPhonebook::new();
    let router = PhonebookServer::new(engine.clone()).router();
    (engine, router)
}

#[tokio::test]
async fn create_list_delete_scenario() {
    let (_, router) = mem_router();

    let (status, body) = send(
        &router,
        "POST",
        "/api/persons",
        Some(json!({"name": "Ada", "number": "040-1234567"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"id": "1", "name": "Ada", "number": "040-1234567"}));

    let (status, body) = send(&router, "GET", "/api/persons", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!([{"id": "1", "name": "Ada", "number": "040-1234567"}]));

    let (status, body) = send(&router, "DELETE", "/api/persons/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (_, body) = send(&router, "GET", "/api/persons", None).await;
    assert_eq!(json_body(&body), json!([]));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (engine, router) = mem_router();
    send(&router, "POST", "/api/persons", Some(json!({"name": "Ada", "number": "040-1234567"}))).await;

    for _ in 0..2 {
        let (status, _) = send(&router, "DELETE", "/api/persons/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(engine.get(PersonId::new(1)).unwrap(), None);
    }
}

#[tokio::test]
async fn create_then_get_returns_the_input_with_an_id() {
    let (_, router) = mem_router();
    let inputs = [("Arto Hellas", "040-123456"), ("Ana García", "09-1234556"), ("Dan", "12-43234345")];
    for (name, number) in inputs {
        let (_, body) = send(&router, "POST", "/api/persons", Some(json!({"name": name, "number": number}))).await;
        let created = json_body(&body);
        let id = created["id"].as_str().unwrap().to_string();

        let (status, body) = send(&router, "GET", &format!("/api/persons/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({"id": id, "name": name, "number": number}));
    }
}

#[tokio::test]
async fn invalid_creates_are_rejected_without_touching_the_store() {
    let (engine, router) = mem_router();
    let bodies = [
        json!({"name": "", "number": "040-1234567"}),
        json!({"name": "Ada", "number": ""}),
        json!({"number": "040-1234567"}),
        json!({"name": "Ada", "number": "1234"}),
    ];
    for body in bodies {
        let (status, response) = send(&router, "POST", "/api/persons", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error = json_body(&response)["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("person validation failed"), "{error}");
    }
    assert_eq!(engine.count().unwrap(), 0);
}

#[tokio::test]
async fn unparsable_bodies_are_validation_errors() {
    let (_, router) = mem_router();
    let request = Request::builder()
        .method("POST")
        .uri("/api/persons")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_distinguishes_missing_from_malformed_ids() {
    let (_, router) = mem_router();

    let (status, body) = send(&router, "GET", "/api/persons/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Information of 99 has already been removed from server");

    let (status, body) = send(&router, "GET", "/api/persons/5f1a9c3b", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body), json!({"error": "malformatted id"}));

    let (status, _) = send(&router, "DELETE", "/api/persons/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ids_are_only_accepted_in_canonical_form() {
    let (engine, router) = mem_router();
    send(&router, "POST", "/api/persons", Some(json!({"name": "Ada", "number": "040-1234567"}))).await;

    for uri in ["/api/persons/+1", "/api/persons/01", "/api/persons/0001"] {
        let (status, body) = send(&router, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json_body(&body), json!({"error": "malformatted id"}));
    }

    let (status, _) = send(&router, "DELETE", "/api/persons/+1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(engine.count().unwrap(), 1);
}

#[tokio::test]
async fn update_of_missing_record_is_not_found_and_changes_nothing() {
    let (engine, router) = mem_router();
    send(&router, "POST", "/api/persons", Some(json!({"name": "Ada", "number": "040-1234567"}))).await;
    let before = engine.list().unwrap();

    let (status, body) = send(
        &router,
        "PUT",
        "/api/persons/42",
        Some(json!({"name": "Bob", "number": "09-1234556"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        "Information of Bob has already been removed from server, please refresh the page"
    );
    assert_eq!(engine.list().unwrap(), before);
}

#[tokio::test]
async fn update_validates_like_create() {
    let (_, router) = mem_router();
    send(&router, "POST", "/api/persons", Some(json!({"name": "Ada", "number": "040-1234567"}))).await;

    let (status, body) = send(
        &router,
        "PUT",
        "/api/persons/1",
        Some(json!({"id": "1", "name": "Ada", "number": "09-7654321"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body), json!({"id": "1", "name": "Ada", "number": "09-7654321"}));

    let (status, _) = send(&router, "PUT", "/api/persons/1", Some(json!({"number": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&router, "GET", "/api/persons/1", None).await;
    assert_eq!(json_body(&body)["number"], "09-7654321");
}

#[tokio::test]
async fn unmatched_routes_fall_through_to_unknown_endpoint() {
    let (_, router) = mem_router();
    for (method, uri) in [("GET", "/api/people"), ("POST", "/nowhere"), ("GET", "/api/persons/1/extra")] {
        let (status, body) = send(&router, method, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(&body), json!({"error": "unknown endpoint"}));
    }
}

#[tokio::test]
async fn health_and_info() {
    let (_, router) = mem_router();
    send(&router, "POST", "/api/persons", Some(json!({"name": "Ada", "number": "040-1234567"}))).await;
    send(&router, "POST", "/api/persons", Some(json!({"name": "Bob", "number": "09-1234556"}))).await;

    let (status, body) = send(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    let (status, body) = send(&router, "GET", "/info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Phonebook has info for 2 people</br>"), "{body}");
}

#[tokio::test]
async fn static_bundle_is_served_for_unmatched_gets() {
    let dist = TempDir::new().unwrap();
    std::fs::write(dist.path().join("index.html"), "<div id=\"root\"></div>").unwrap();
    let router = PhonebookServer::new(MemPhonebook::new()).with_static_dir(dist.path()).router();

    let (status, body) = send(&router, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<div id=\"root\"></div>");

    let (status, _) = send(&router, "GET", "/assets/missing.js", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sled_engine_serves_the_same_api() {
    let dir = TempDir::new().unwrap();
    let engine = SledPhonebook::open(dir.path()).unwrap();
    let router = PhonebookServer::new(engine.clone()).router();

    let (status, body) = send(
        &router,
        "POST",
        "/api/persons",
        Some(json!({"name": "Ada", "number": "040-1234567"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_body(&body)["id"], "1");

    let (status, _) = send(&router, "PUT", "/api/persons/1", Some(json!({"number": "09-1234556"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(engine.get(PersonId::new(1)).unwrap().unwrap().number, "09-1234556");

    let (status, _) = send(&router, "DELETE", "/api/persons/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(engine.count().unwrap(), 0);
}
