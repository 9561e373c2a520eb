pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use shelf_http::{error::AppError, json_body};
use shelf_kernel::{EntityId, InitCtx, Module, Resources, Store};
use tracing::instrument;

use models::Book;
use store::BookStore;

#[derive(Clone)]
struct BooksState {
    books: Resources<Book>,
    store: Arc<BookStore>,
}

/// Books module: CRUD over the catalog plus the holders view
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(store: Arc<BookStore>) -> Self {
        Self {
            state: BooksState {
                books: Resources::new(store.clone() as Arc<dyn Store<Book>>),
                store,
            },
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_books).post(create_book))
            .route("/health", get(health_check))
            .route(
                "/{id}",
                get(find_book).put(update_book).delete(delete_book),
            )
            .route("/{id}/holders", get(list_holders))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let book_ref = json!({ "$ref": "#/components/schemas/Book" });
        let error = json!({
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);
        let book_body = json!({
            "required": true,
            "content": { "application/json": { "schema": book_ref } }
        });
        let book_response = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": book_ref } }
            })
        };
        let described = |description: &str| {
            let mut response = error.clone();
            response["description"] = json!(description);
            response
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Return all books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Successfully retrieved all books",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": book_ref }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_body,
                        "responses": {
                            "201": book_response("Successfully created book"),
                            "422": described("Required attribute missing")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Given an id, return the book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "200": book_response("Successfully retrieved book"),
                            "404": described("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Given an id and a book, return the updated book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "requestBody": book_body,
                        "responses": {
                            "200": book_response("Successfully updated book"),
                            "404": described("Book not found"),
                            "412": described("Body id does not match the path id"),
                            "422": described("Required attribute missing")
                        }
                    },
                    "delete": {
                        "summary": "Given an id, delete the book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "204": { "description": "Book deleted" },
                            "404": described("Book not found")
                        }
                    }
                },
                "/{id}/holders": {
                    "get": {
                        "summary": "Ids of the users holding the book",
                        "tags": ["Books"],
                        "parameters": id_param,
                        "responses": {
                            "200": {
                                "description": "Holder ids",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "type": "integer", "format": "int64" }
                                        }
                                    }
                                }
                            },
                            "404": described("Book not found")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64", "description": "Store-assigned identifier" },
                            "genre": { "type": "string" },
                            "author": { "type": "string" },
                            "image": { "type": "string" },
                            "title": { "type": "string" },
                            "subtitle": { "type": "string" },
                            "publisher": { "type": "string" },
                            "year": { "type": "string" },
                            "pages": { "type": "integer", "format": "int32" },
                            "isbn": { "type": "string" }
                        },
                        "required": ["author", "image", "title", "subtitle", "publisher", "year", "pages", "isbn"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

#[instrument(skip(state))]
async fn list_books(State(state): State<BooksState>) -> Result<Json<Vec<Book>>, AppError> {
    Ok(Json(state.books.list().await?))
}

#[instrument(skip(state))]
async fn find_book(
    State(state): State<BooksState>,
    Path(id): Path<EntityId>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(state.books.get(id).await?))
}

#[instrument(skip(state, payload))]
async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let book = json_body(payload)?;
    let created = state.books.create(book).await?;
    tracing::info!(id = ?created.id, "book created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, payload))]
async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<Book>, AppError> {
    let book = json_body(payload)?;
    Ok(Json(state.books.update(id, book).await?))
}

#[instrument(skip(state))]
async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<EntityId>,
) -> Result<StatusCode, AppError> {
    state.books.delete(id).await?;
    tracing::info!(id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
async fn list_holders(
    State(state): State<BooksState>,
    Path(id): Path<EntityId>,
) -> Result<Json<Vec<EntityId>>, AppError> {
    state.books.get(id).await?;
    Ok(Json(state.store.holders(id).await))
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<BookStore>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}
