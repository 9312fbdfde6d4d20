//! HTTP handlers for the Books module.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use bookshelf_http::error::AppError;
use serde_json::{Map, Value};

use super::error::BookError;
use super::models::{Book, ListQuery, NewBook, SortSpec};
use super::repo::BookRepo;
use crate::utils;

/// Raw list parameters. Kept as text so malformed numbers fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Default)]
pub struct ListParams {
    pub sort: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Collect query pairs. A repeated key keeps its last value; keys other
/// than `sort`, `limit` and `offset` are ignored.
impl FromIterator<(String, String)> for ListParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut params = ListParams::default();
        for (key, value) in pairs {
            match key.as_str() {
                "sort" => params.sort = Some(value),
                "limit" => params.limit = Some(value),
                "offset" => params.offset = Some(value),
                _ => {}
            }
        }
        params
    }
}

impl TryFrom<ListParams> for ListQuery {
    type Error = BookError;

    fn try_from(params: ListParams) -> Result<Self, Self::Error> {
        Ok(ListQuery {
            sort: SortSpec::parse(params.sort.as_deref().unwrap_or_default())?,
            limit: utils::parse_count_or(params.limit.as_deref(), ListQuery::DEFAULT_LIMIT),
            offset: utils::parse_count_or(params.offset.as_deref(), ListQuery::DEFAULT_OFFSET),
        })
    }
}

/// Build the books router over `repo`
pub fn router(repo: BookRepo) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/{book_id}", put(update_book))
        .with_state(repo)
}

async fn list_books(
    State(repo): State<BookRepo>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<Book>>, AppError> {
    let query = ListQuery::try_from(pairs.into_iter().collect::<ListParams>())?;
    Ok(Json(repo.list(&query).await?))
}

async fn create_book(
    State(repo): State<BookRepo>,
    body: Bytes,
) -> Result<Json<Book>, AppError> {
    let input = NewBook::try_from(body_fields(&body)?)?;
    let book = repo.create(&input).await?;

    tracing::info!(book_id = book.id, "book created");
    Ok(Json(book))
}

async fn update_book(
    State(repo): State<BookRepo>,
    Path(book_id): Path<String>,
    body: Bytes,
) -> Result<Json<Book>, AppError> {
    // Ids that are not integers cannot exist.
    let id: i64 = book_id.parse().map_err(|_| BookError::BookNotFound)?;
    let book = repo.update(id, body_fields(&body)?).await?;

    tracing::info!(book_id = book.id, "book updated");
    Ok(Json(book))
}

/// Decode a flat JSON object body. An empty body is an empty object.
fn body_fields(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    serde_json::from_slice(body).map_err(|err| {
        tracing::debug!(error = %err, "rejected request body");
        AppError::bad_request(INVALID_BODY)
    })
}

const INVALID_BODY: &str = "Invalid JSON body";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_fall_back_to_defaults() {
        let query = ListQuery::try_from(ListParams {
            sort: None,
            limit: Some("lots".into()),
            offset: Some("-3".into()),
        })
        .unwrap();

        assert_eq!(query, ListQuery::default());
    }

    #[test]
    fn list_params_reject_unknown_sort_field() {
        let params = ListParams {
            sort: Some("foo".into()),
            ..ListParams::default()
        };

        assert!(matches!(
            ListQuery::try_from(params),
            Err(BookError::InvalidField)
        ));
    }

    #[test]
    fn repeated_list_params_keep_last_value() {
        let params: ListParams = [
            ("sort", "foo"),
            ("limit", "5"),
            ("sort", "-title"),
            ("page", "2"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        assert_eq!(params.sort.as_deref(), Some("-title"));
        assert_eq!(params.limit.as_deref(), Some("5"));
        assert!(params.offset.is_none());
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert!(body_fields(&Bytes::new()).unwrap().is_empty());
        assert!(body_fields(&Bytes::from_static(b" \n")).unwrap().is_empty());
    }

    #[test]
    fn non_object_body_is_rejected() {
        let err = body_fields(&Bytes::from_static(b"[1, 2]")).unwrap_err();
        assert_eq!(err.to_string(), INVALID_BODY);
    }
}
