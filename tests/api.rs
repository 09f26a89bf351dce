//! End-to-end scenarios against the assembled router and an in-memory database.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use bookstore_app::App;
use bookstore_kernel::settings::{DatabaseSettings, Settings};
use bookstore_telemetry::{MemoryLogger, Severity};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    app: App,
    router: Router,
    logger: Arc<MemoryLogger>,
}

impl Harness {
    async fn new() -> Self {
        let settings = Settings {
            database: DatabaseSettings::in_memory(),
            ..Settings::default()
        };
        let logger = Arc::new(MemoryLogger::new());
        let app = App::bootstrap_with_logger(settings, logger.clone())
            .await
            .unwrap();
        let router = app.router();
        Self {
            app,
            router,
            logger,
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, location, json)
    }

    async fn create_author(&self, first: &str, last: &str) -> i64 {
        let (status, _, body) = self
            .send(
                "POST",
                "/api/authors",
                Some(json!({ "firstName": first, "lastName": last })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }
}

#[tokio::test]
async fn author_lifecycle() {
    let h = Harness::new().await;

    let (status, location, created) = h
        .send(
            "POST",
            "/api/authors",
            Some(json!({ "firstName": "Jane", "lastName": "Austen" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert!(id >= 1);
    assert_eq!(location.as_deref(), Some(format!("/api/authors/{id}").as_str()));
    assert_eq!(created["firstName"], "Jane");

    let (status, _, fetched) = h.send("GET", &format!("/api/authors/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        fetched,
        json!({ "id": id, "firstName": "Jane", "lastName": "Austen", "books": [] })
    );

    let (status, _, _) = h
        .send(
            "PUT",
            &format!("/api/authors/{id}"),
            Some(json!({ "id": id, "firstName": "Janet", "lastName": "Austen" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, _, fetched) = h.send("GET", &format!("/api/authors/{id}"), None).await;
    assert_eq!(fetched["firstName"], "Janet");

    let (status, _, _) = h.send("DELETE", &format!("/api/authors/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = h.send("GET", &format!("/api/authors/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = h.send("DELETE", &format!("/api/authors/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    h.app.shutdown().await.unwrap();
}

#[tokio::test]
async fn empty_collections_are_ok() {
    let h = Harness::new().await;

    for uri in ["/api/authors", "/api/books"] {
        let (status, _, body) = h.send("GET", uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}

#[tokio::test]
async fn invalid_author_is_rejected_with_field_details() {
    let h = Harness::new().await;

    let (status, _, body) = h
        .send("POST", "/api/authors", Some(json!({ "firstName": "Jane" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"][0]["field"], "lastName");

    let (_, _, list) = h.send("GET", "/api/authors", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn update_with_mismatched_id_is_bad_request() {
    let h = Harness::new().await;
    let id = h.create_author("Jane", "Austen").await;

    let (status, _, _) = h
        .send(
            "PUT",
            &format!("/api/authors/{id}"),
            Some(json!({ "id": id + 1, "firstName": "Janet", "lastName": "Austen" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, _, fetched) = h.send("GET", &format!("/api/authors/{id}"), None).await;
    assert_eq!(fetched["firstName"], "Jane");
}

#[tokio::test]
async fn update_of_missing_record_is_not_found() {
    let h = Harness::new().await;

    let (status, _, _) = h
        .send(
            "PUT",
            "/api/books/42",
            Some(json!({ "id": 42, "title": "Emma", "year": 1815, "isbn": "978-0141439587" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_ids() {
    let h = Harness::new().await;

    let (status, _, _) = h.send("GET", "/api/books/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = h.send("DELETE", "/api/books/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn book_round_trip() {
    let h = Harness::new().await;
    let author_id = h.create_author("Mary", "Shelley").await;

    let book = json!({
        "title": "Frankenstein",
        "year": 1818,
        "isbn": "978-0486282114",
        "summary": "A scientist creates life",
        "image": null,
        "authorId": author_id
    });
    let (status, location, created) = h.send("POST", "/api/books", Some(book)).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(location.as_deref(), Some(format!("/api/books/{id}").as_str()));

    let (_, _, fetched) = h.send("GET", &format!("/api/books/{id}"), None).await;
    assert_eq!(
        fetched,
        json!({
            "id": id,
            "title": "Frankenstein",
            "year": 1818,
            "isbn": "978-0486282114",
            "summary": "A scientist creates life",
            "image": null,
            "authorId": author_id
        })
    );

    let (_, _, author) = h.send("GET", &format!("/api/authors/{author_id}"), None).await;
    assert_eq!(
        author["books"],
        json!([{ "id": id, "title": "Frankenstein", "year": 1818, "isbn": "978-0486282114" }])
    );
}

#[tokio::test]
async fn book_with_unknown_author_is_rejected() {
    let h = Harness::new().await;

    let (status, _, body) = h
        .send(
            "POST",
            "/api/books",
            Some(json!({ "title": "Emma", "year": 1815, "isbn": "978-0141439587", "authorId": 999 })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "authorId");
}

#[tokio::test]
async fn deleting_an_author_keeps_their_books() {
    let h = Harness::new().await;
    let author_id = h.create_author("Mary", "Shelley").await;
    let (_, _, created) = h
        .send(
            "POST",
            "/api/books",
            Some(json!({ "title": "Frankenstein", "year": 1818, "isbn": "978-0486282114", "authorId": author_id })),
        )
        .await;
    let book_id = created["id"].as_i64().unwrap();

    let (status, _, _) = h.send("DELETE", &format!("/api/authors/{author_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, book) = h.send("GET", &format!("/api/books/{book_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(book["authorId"].is_null());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let h = Harness::new().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/books")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn operations_are_logged_with_resource_context() {
    let h = Harness::new().await;
    h.create_author("Jane", "Austen").await;
    h.send("GET", "/api/books/7", None).await;

    let entries = h.logger.entries();
    assert!(entries
        .iter()
        .any(|e| e.resource == "authors" && e.operation == "create" && e.severity == Severity::Info));
    assert!(entries
        .iter()
        .any(|e| e.resource == "books" && e.operation == "get" && e.severity == Severity::Warning));
}

#[tokio::test]
async fn documentation_and_health_are_served() {
    let h = Harness::new().await;

    let (status, _, _) = h.send("GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, doc) = h.send("GET", "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Book Store API");
    assert_eq!(doc["info"]["version"], "v2");
    for path in ["/api/authors", "/api/authors/{id}", "/api/books", "/api/books/{id}"] {
        assert!(doc["paths"][path].is_object(), "missing {path}");
    }
    assert!(doc["components"]["schemas"]["AuthorDto"].is_object());
    assert!(doc["components"]["schemas"]["AuthorBookDto"].is_object());
    assert!(doc["components"]["schemas"]["BookCreateDto"].is_object());

    let (status, _, _) = h.send("GET", "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);

    let registry = h.app.registry();
    assert_eq!(registry.core_module_count(), 1);
    assert_eq!(registry.custom_module_count(), 2);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let h = Harness::new().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/books")
        .header(header::ORIGIN, "https://shop.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn ids_are_not_reused_after_delete() {
    let h = Harness::new().await;
    h.create_author("Jane", "Austen").await;
    let removed = h.create_author("Mary", "Shelley").await;

    let (status, _, _) = h.send("DELETE", &format!("/api/authors/{removed}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let next = h.create_author("Emily", "Brontë").await;
    assert!(next > removed, "id {next} reuses or precedes deleted id {removed}");
}

#[tokio::test]
async fn multibyte_names_are_measured_in_characters() {
    let h = Harness::new().await;

    let (status, _, created) = h
        .send(
            "POST",
            "/api/authors",
            Some(json!({ "firstName": "é".repeat(30), "lastName": "X" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["firstName"], "é".repeat(30));
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let h = Harness::new().await;

    let (status, _, body) = h
        .send(
            "POST",
            "/api/authors",
            Some(json!({ "firstName": "   ", "lastName": "Austen" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], "firstName");
}

#[tokio::test]
async fn routing_failures_use_the_error_envelope() {
    let h = Harness::new().await;

    let (status, _, body) = h.send("GET", "/api/nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _, body) = h.send("PATCH", "/api/authors/1", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "method_not_allowed");
}
