pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use serde_json::json;
use shelf_authz::Authenticator;
use shelf_http::{error::AppError, json_body};
use shelf_kernel::{settings::MatchRule, EntityId, InitCtx, Module, Resources, Store};
use tracing::instrument;

use crate::modules::books::models::Book;
use models::User;
use store::UserStore;

#[derive(Clone)]
struct UsersState {
    users: Resources<User>,
    authenticator: Arc<dyn Authenticator>,
    match_rule: MatchRule,
}

/// Users module: CRUD over accounts and their book collections
pub struct UsersModule {
    state: UsersState,
}

impl UsersModule {
    pub fn new(
        store: Arc<UserStore>,
        authenticator: Arc<dyn Authenticator>,
        match_rule: MatchRule,
    ) -> Self {
        Self {
            state: UsersState {
                users: Resources::new(store as Arc<dyn Store<User>>),
                authenticator,
                match_rule,
            },
        }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            match_books_by = ?self.state.match_rule,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(list_users).post(create_user))
            .route("/health", get(health_check))
            .route("/principal", get(current_principal))
            .route(
                "/{id}",
                get(find_user).put(update_user).delete(delete_user),
            )
            .route("/{id}/add-book", patch(add_book))
            .route("/{id}/remove-book", patch(remove_book))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let user_ref = json!({ "$ref": "#/components/schemas/User" });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        }]);
        let body = |schema: &str| {
            json!({
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": format!("#/components/schemas/{schema}") }
                    }
                }
            })
        };
        let user_response = |description: &str| {
            json!({
                "description": description,
                "content": { "application/json": { "schema": user_ref } }
            })
        };
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List users",
                        "tags": ["Users"],
                        "responses": {
                            "200": {
                                "description": "List of users",
                                "content": {
                                    "application/json": {
                                        "schema": { "type": "array", "items": user_ref }
                                    }
                                }
                            }
                        }
                    },
                    "post": {
                        "summary": "Create a user",
                        "tags": ["Users"],
                        "requestBody": body("User"),
                        "responses": {
                            "201": user_response("User created"),
                            "422": error("Required attribute missing or unknown book held")
                        }
                    }
                },
                "/principal": {
                    "get": {
                        "summary": "Display name of the authenticated caller",
                        "tags": ["Users"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": {
                                "description": "Principal name",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            },
                            "401": error("Caller could not be authenticated")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a user",
                        "tags": ["Users"],
                        "parameters": id_param,
                        "responses": {
                            "200": user_response("User"),
                            "404": error("User not found")
                        }
                    },
                    "put": {
                        "summary": "Replace a user",
                        "tags": ["Users"],
                        "parameters": id_param,
                        "requestBody": body("User"),
                        "responses": {
                            "200": user_response("User updated"),
                            "404": error("User not found"),
                            "412": error("Body id does not match the path id"),
                            "422": error("Required attribute missing or unknown book held")
                        }
                    },
                    "delete": {
                        "summary": "Delete a user; held books are kept",
                        "tags": ["Users"],
                        "parameters": id_param,
                        "responses": {
                            "204": { "description": "User deleted" },
                            "404": error("User not found")
                        }
                    }
                },
                "/{id}/add-book": {
                    "patch": {
                        "summary": "Add a book to the user's collection",
                        "tags": ["Users"],
                        "parameters": id_param,
                        "requestBody": body("Book"),
                        "responses": {
                            "200": user_response("Updated user"),
                            "404": error("User not found"),
                            "422": error("Book is not stored")
                        }
                    }
                },
                "/{id}/remove-book": {
                    "patch": {
                        "summary": "Remove a book from the user's collection",
                        "tags": ["Users"],
                        "parameters": id_param,
                        "requestBody": body("Book"),
                        "responses": {
                            "200": user_response("Updated user"),
                            "404": error("User not found")
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Users health check",
                        "tags": ["Users"],
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
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64", "description": "Store-assigned identifier" },
                            "username": { "type": "string" },
                            "name": { "type": "string" },
                            "birthdate": { "type": "string", "format": "date" },
                            "books": {
                                "type": "array",
                                "items": { "$ref": "#/components/schemas/Book" }
                            }
                        },
                        "required": ["username", "name"]
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "users module is healthy"
}

#[instrument(skip(state, headers))]
async fn current_principal(
    State(state): State<UsersState>,
    headers: HeaderMap,
) -> Result<String, AppError> {
    let principal = state
        .authenticator
        .authenticate(&headers)
        .await
        .map_err(|e| AppError::unauthorized(e.to_string()))?;
    Ok(principal.name)
}

#[instrument(skip(state))]
async fn list_users(State(state): State<UsersState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.users.list().await?))
}

#[instrument(skip(state))]
async fn find_user(
    State(state): State<UsersState>,
    Path(id): Path<EntityId>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.users.get(id).await?))
}

#[instrument(skip(state, payload))]
async fn create_user(
    State(state): State<UsersState>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let mut user = json_body(payload)?;
    // Collections only change through add-book and remove-book.
    user.books.clear();
    let created = state.users.create(user).await?;
    tracing::info!(id = ?created.id, "user created");
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<UsersState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<User>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let user = json_body(payload)?;
    Ok(Json(state.users.update(id, user).await?))
}

#[instrument(skip(state))]
async fn delete_user(
    State(state): State<UsersState>,
    Path(id): Path<EntityId>,
) -> Result<StatusCode, AppError> {
    state.users.delete(id).await?;
    tracing::info!(id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
async fn add_book(
    State(state): State<UsersState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let book = json_body(payload)?;
    let rule = state.match_rule;
    let user = state
        .users
        .modify(id, move |user| user.add_book(book, rule))
        .await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
async fn remove_book(
    State(state): State<UsersState>,
    Path(id): Path<EntityId>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let book = json_body(payload)?;
    let rule = state.match_rule;
    let user = state
        .users
        .modify(id, move |user| user.remove_book(&book, rule))
        .await?;
    Ok(Json(user))
}

/// Create a new instance of the users module
pub fn create_module(
    store: Arc<UserStore>,
    authenticator: Arc<dyn Authenticator>,
    match_rule: MatchRule,
) -> Arc<dyn Module> {
    Arc::new(UsersModule::new(store, authenticator, match_rule))
}
