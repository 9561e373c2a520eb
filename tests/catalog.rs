//! End-to-end behaviour of the books and users API through the full router.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use shelf_authz::TokenAuthenticator;
use shelf_kernel::settings::{MatchRule, Settings};
use tower::ServiceExt;

fn app_with(settings: Settings) -> Router {
    let authenticator = Arc::new(TokenAuthenticator::new(HashMap::from([(
        "librarian-token".to_string(),
        "librarian".to_string(),
    )])));
    let registry = shelf_app::build_registry(&settings, authenticator);
    shelf_http::build_router(&registry, &settings)
}

fn app() -> Router {
    app_with(Settings::default())
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response: Response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

fn dune() -> Value {
    json!({
        "genre": "Science Fiction",
        "author": "Herbert",
        "image": "dune.png",
        "title": "Dune",
        "subtitle": "Book One",
        "publisher": "Chilton",
        "year": "1965",
        "pages": 412,
        "isbn": "X"
    })
}

fn reader() -> Value {
    json!({ "username": "pauline", "name": "Pauline Reader" })
}

#[tokio::test]
async fn dune_is_added_and_removed_from_a_collection() {
    let app = app();

    let (status, book) = call(&app, "POST", "/api/books", Some(dune())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["id"], 1);

    let (status, user) = call(&app, "POST", "/api/users", Some(reader())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["books"], json!([]));
    let user_id = user["id"].as_i64().unwrap();

    let (status, user) = call(
        &app,
        "PATCH",
        &format!("/api/users/{user_id}/add-book"),
        Some(book.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["books"][0]["title"], "Dune");

    let (_, holders) = call(&app, "GET", "/api/books/1/holders", None).await;
    assert_eq!(holders, json!([user_id]));

    let (status, user) = call(
        &app,
        "PATCH",
        &format!("/api/users/{user_id}/remove-book"),
        Some(book),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["books"], json!([]));
}

#[tokio::test]
async fn deleting_a_user_keeps_its_books() {
    let app = app();
    let (_, book) = call(&app, "POST", "/api/books", Some(dune())).await;
    let (_, user) = call(&app, "POST", "/api/users", Some(reader())).await;
    call(&app, "PATCH", "/api/users/1/add-book", Some(book.clone())).await;

    let (status, _) = call(&app, "DELETE", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(user["id"], 1);

    let (status, fetched) = call(&app, "GET", "/api/books/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, book);

    let (_, holders) = call(&app, "GET", "/api/books/1/holders", None).await;
    assert_eq!(holders, json!([]));
}

#[tokio::test]
async fn mismatched_update_never_reveals_existence() {
    let app = app();

    let mut body = dune();
    body["id"] = json!(6);
    let (status, error) = call(&app, "PUT", "/api/books/5", Some(body.clone())).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(error["error"]["code"], "precondition_failed");

    for _ in 0..5 {
        call(&app, "POST", "/api/books", Some(dune())).await;
    }
    let (status, _) = call(&app, "PUT", "/api/books/5", Some(body)).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);

    let mut user = reader();
    user["id"] = json!(3);
    let (status, _) = call(&app, "PUT", "/api/users/2", Some(user)).await;
    assert_eq!(status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn absent_ids_are_not_found_for_every_operation() {
    let app = app();

    for resource in ["books", "users"] {
        let (status, error) = call(&app, "GET", &format!("/api/{resource}/42"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["error"]["code"], "not_found");

        let body = match resource {
            "books" => dune(),
            _ => reader(),
        };
        let mut body = body;
        body["id"] = json!(42);
        let (status, _) = call(&app, "PUT", &format!("/api/{resource}/42"), Some(body)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, "DELETE", &format!("/api/{resource}/42"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn update_replaces_the_whole_book() {
    let app = app();
    call(&app, "POST", "/api/books", Some(dune())).await;

    let mut body = dune();
    body["id"] = json!(1);
    body["genre"] = Value::Null;
    body["pages"] = json!(896);
    let (status, updated) = call(&app, "PUT", "/api/books/1", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["pages"], 896);
    assert_eq!(updated["genre"], Value::Null);

    let (_, list) = call(&app, "GET", "/api/books", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_required_attribute_is_a_validation_error() {
    let app = app();
    let mut body = dune();
    body.as_object_mut().unwrap().remove("isbn");

    let (status, error) = call(&app, "POST", "/api/books", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        error["error"]["details"],
        json!([{ "field": "isbn", "error": "required" }])
    );

    let (_, list) = call(&app, "GET", "/api/books", None).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn identity_matching_keeps_twin_books_apart() {
    let mut settings = Settings::default();
    settings.catalog.match_books_by = MatchRule::Id;
    let app = app_with(settings);

    let (_, first) = call(&app, "POST", "/api/books", Some(dune())).await;
    let (_, second) = call(&app, "POST", "/api/books", Some(dune())).await;
    call(&app, "POST", "/api/users", Some(reader())).await;

    call(&app, "PATCH", "/api/users/1/add-book", Some(first)).await;
    let (_, user) = call(&app, "PATCH", "/api/users/1/add-book", Some(second)).await;
    assert_eq!(user["books"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn content_matching_conflates_twin_books() {
    let app = app();

    let (_, first) = call(&app, "POST", "/api/books", Some(dune())).await;
    let (_, second) = call(&app, "POST", "/api/books", Some(dune())).await;
    call(&app, "POST", "/api/users", Some(reader())).await;

    call(&app, "PATCH", "/api/users/1/add-book", Some(first)).await;
    let (_, user) = call(&app, "PATCH", "/api/users/1/add-book", Some(second)).await;
    assert_eq!(user["books"].as_array().unwrap().len(), 1);
    assert_eq!(user["books"][0]["id"], 1);
}

#[tokio::test]
async fn principal_lookup_uses_the_bearer_token() {
    let app = app();

    let request = Request::builder()
        .uri("/api/users/principal")
        .header("authorization", "Bearer librarian-token")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"librarian");

    let (status, _) = call(&app, "GET", "/api/users/principal", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn new_user_starts_with_an_empty_collection() {
    let app = app();
    let (_, book) = call(&app, "POST", "/api/books", Some(dune())).await;

    let mut body = reader();
    body["books"] = json!([book]);
    let (status, user) = call(&app, "POST", "/api/users", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["books"], json!([]));

    let (_, holders) = call(&app, "GET", "/api/books/1/holders", None).await;
    assert_eq!(holders, json!([]));
}

#[tokio::test]
async fn update_missing_required_attribute_keeps_the_stored_book() {
    let app = app();
    let (_, stored) = call(&app, "POST", "/api/books", Some(dune())).await;

    let mut body = dune();
    body["id"] = json!(1);
    body["title"] = json!("Dune Messiah");
    body.as_object_mut().unwrap().remove("publisher");
    let (status, error) = call(&app, "PUT", "/api/books/1", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        error["error"]["details"],
        json!([{ "field": "publisher", "error": "required" }])
    );

    let (_, fetched) = call(&app, "GET", "/api/books/1", None).await;
    assert_eq!(fetched, stored);
}

#[tokio::test]
async fn user_update_naming_an_unstored_book_keeps_holdings() {
    let app = app();
    let (_, book) = call(&app, "POST", "/api/books", Some(dune())).await;
    call(&app, "POST", "/api/users", Some(reader())).await;
    call(&app, "PATCH", "/api/users/1/add-book", Some(book.clone())).await;

    let mut ghost = dune();
    ghost["id"] = json!(99);
    let mut body = reader();
    body["id"] = json!(1);
    body["books"] = json!([ghost]);
    let (status, error) = call(&app, "PUT", "/api/users/1", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["error"]["details"][0]["field"], "books");

    let (_, user) = call(&app, "GET", "/api/users/1", None).await;
    assert_eq!(user["books"], json!([book]));
    let (_, holders) = call(&app, "GET", "/api/books/1/holders", None).await;
    assert_eq!(holders, json!([1]));
}

#[tokio::test]
async fn largest_explicit_id_is_accepted() {
    let app = app();

    let mut body = dune();
    body["id"] = json!(i64::MAX);
    let (status, book) = call(&app, "POST", "/api/books", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["id"], json!(i64::MAX));

    let (status, next) = call(&app, "POST", "/api/books", Some(dune())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(next["id"], 1);
}
