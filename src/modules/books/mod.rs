pub mod error;
pub mod models;
pub mod repo;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Migration, Module};
use sqlx::SqlitePool;

pub use error::BookError;
pub use models::{Book, BookPatch, Column, ListQuery, NewBook, SortSpec};
pub use repo::BookRepo;

/// Schema for the `books` table. The CHECK makes SQLite reject any date
/// text that `date()` does not reproduce unchanged.
const BOOKS_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        title       TEXT NOT NULL,
        date        TEXT NOT NULL CHECK (date IS date(date)),
        author      TEXT NOT NULL,
        description TEXT NOT NULL,
        image       TEXT NOT NULL
    );
"#;

/// The books resource: list, create, and partial update over HTTP
pub struct BooksModule {
    repo: BookRepo,
}

impl BooksModule {
    pub fn new(repo: BookRepo) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &BookRepo {
        &self.repo
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let stored = self.repo.count().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            stored,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.repo.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error_response = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "text/plain": {
                        "schema": { "type": "string" }
                    }
                }
            })
        };
        let book_response = serde_json::json!({
            "description": "The stored book",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        });
        let book_input = |description: &str| {
            serde_json::json!({
                "description": description,
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/BookInput" }
                    }
                }
            })
        };
        let string_field = |description: &str| {
            serde_json::json!({ "type": "string", "description": description })
        };

        Some(serde_json::json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "sort",
                                "in": "query",
                                "required": false,
                                "description": "Comma-separated fields; prefix with '-' for descending",
                                "schema": { "type": "string", "default": "id" }
                            },
                            {
                                "name": "limit",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "integer", "default": 10 }
                            },
                            {
                                "name": "offset",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "integer", "default": 0 }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Page of books",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            },
                            "400": error_response("Invalid field")
                        }
                    },
                    "post": {
                        "summary": "Create a book",
                        "tags": ["Books"],
                        "requestBody": book_input("All fields are required"),
                        "responses": {
                            "200": book_response.clone(),
                            "400": error_response("Invalid date, Empty fields, or Invalid field")
                        }
                    }
                },
                "/books/{book_id}": {
                    "put": {
                        "summary": "Update some fields of a book",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "book_id",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "integer" }
                            }
                        ],
                        "requestBody": book_input("Only the fields to change"),
                        "responses": {
                            "200": book_response,
                            "400": error_response("Invalid date, Empty fields, or Invalid field"),
                            "404": error_response("Book not found")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "description": "Server-assigned identifier" },
                            "title": string_field("Title of the book"),
                            "date": { "type": "string", "format": "date" },
                            "author": string_field("Author of the book"),
                            "description": string_field("Summary of the book"),
                            "image": string_field("Cover image location")
                        },
                        "required": ["id", "title", "date", "author", "description", "image"]
                    },
                    "BookInput": {
                        "type": "object",
                        "properties": {
                            "title": string_field("Title of the book"),
                            "date": { "type": "string", "format": "date" },
                            "author": string_field("Author of the book"),
                            "description": string_field("Summary of the book"),
                            "image": string_field("Cover image location")
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: BOOKS_DDL,
        }]
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module over `pool`
pub fn create_module(pool: SqlitePool) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(BookRepo::new(pool)))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Repo over a fresh in-memory database with the books schema applied
    pub async fn memory_repo() -> BookRepo {
        let pool = bookshelf_db::connect_with("sqlite::memory:", 1)
            .await
            .expect("in-memory pool");
        let module = BooksModule::new(BookRepo::new(pool.clone()));
        let migrations: Vec<_> = module
            .migrations()
            .into_iter()
            .map(|migration| (module.name().to_string(), migration))
            .collect();
        bookshelf_db::run_migrations(&pool, &migrations)
            .await
            .expect("books migration");
        module.repo().clone()
    }

    pub fn new_book() -> NewBook {
        NewBook {
            title: Some("foo".into()),
            date: Some("1000-01-01".into()),
            author: Some("foo".into()),
            description: Some("foo".into()),
            image: Some("foo".into()),
        }
    }

    /// A complete book whose text fields are prefixed with `{i}-`
    pub fn prefixed(i: usize) -> NewBook {
        NewBook {
            title: Some(format!("{i}-foo")),
            date: Some("1000-01-01".into()),
            author: Some(format!("{i}-foo")),
            description: Some(format!("{i}-foo")),
            image: Some(format!("{i}-foo")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn openapi_fragment_documents_every_route() {
        let module = BooksModule::new(BookRepo::new(
            sqlx::sqlite::SqlitePoolOptions::new().connect_lazy("sqlite::memory:").unwrap(),
        ));
        let spec = module.openapi().unwrap();

        assert!(spec["paths"]["/books"]["get"].is_object());
        assert!(spec["paths"]["/books"]["post"].is_object());
        assert!(spec["paths"]["/books/{book_id}"]["put"].is_object());
        assert_eq!(spec["components"]["schemas"]["Book"]["required"][0], "id");
    }
}
