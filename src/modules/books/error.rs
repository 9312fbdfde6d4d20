use std::convert::Infallible;

use bookshelf_http::error::AppError;
use sqlx::error::ErrorKind;
use thiserror::Error;

/// Failures of book operations.
///
/// The messages of the validation variants are stable identifiers and are
/// sent verbatim as HTTP response bodies.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("Book not found")]
    BookNotFound,

    #[error("Invalid date")]
    InvalidDate,

    #[error("Empty fields")]
    EmptyFields,

    #[error("Invalid field")]
    InvalidField,

    #[error(transparent)]
    Storage(sqlx::Error),
}

/// Driver-independent category of a rejected statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintCategory {
    /// A NOT NULL column received NULL
    NotNull,
    /// A CHECK constraint failed; on `books` the only one is the date check
    Check,
    /// The statement named a column the table does not have
    UnknownColumn,
}

impl ConstraintCategory {
    /// Classify a driver error, or `None` when it is not a constraint failure.
    pub fn of(err: &sqlx::Error) -> Option<Self> {
        let sqlx::Error::Database(db_err) = err else {
            return None;
        };

        match db_err.kind() {
            ErrorKind::NotNullViolation => Some(ConstraintCategory::NotNull),
            ErrorKind::CheckViolation => Some(ConstraintCategory::Check),
            _ if db_err.message().starts_with("no such column") => {
                Some(ConstraintCategory::UnknownColumn)
            }
            _ => None,
        }
    }
}

impl From<ConstraintCategory> for BookError {
    fn from(category: ConstraintCategory) -> Self {
        match category {
            ConstraintCategory::Check => BookError::InvalidDate,
            ConstraintCategory::NotNull => BookError::EmptyFields,
            ConstraintCategory::UnknownColumn => BookError::InvalidField,
        }
    }
}

impl From<sqlx::Error> for BookError {
    fn from(err: sqlx::Error) -> Self {
        match ConstraintCategory::of(&err) {
            Some(category) => {
                tracing::debug!(?category, error = %err, "storage rejected book");
                category.into()
            }
            None => BookError::Storage(err),
        }
    }
}

impl From<Infallible> for BookError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::BookNotFound => AppError::not_found(err.to_string()),
            BookError::InvalidDate | BookError::EmptyFields | BookError::InvalidField => {
                AppError::bad_request(err.to_string())
            }
            BookError::Storage(source) => AppError::Internal(source.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn constraint_table() {
        assert!(matches!(
            BookError::from(ConstraintCategory::Check),
            BookError::InvalidDate
        ));
        assert!(matches!(
            BookError::from(ConstraintCategory::NotNull),
            BookError::EmptyFields
        ));
        assert!(matches!(
            BookError::from(ConstraintCategory::UnknownColumn),
            BookError::InvalidField
        ));
    }

    #[test]
    fn unclassified_storage_errors_pass_through() {
        let err = BookError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, BookError::Storage(sqlx::Error::PoolTimedOut)));
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (BookError::BookNotFound, StatusCode::NOT_FOUND),
            (BookError::InvalidDate, StatusCode::BAD_REQUEST),
            (BookError::EmptyFields, StatusCode::BAD_REQUEST),
            (BookError::InvalidField, StatusCode::BAD_REQUEST),
            (
                BookError::Storage(sqlx::Error::PoolClosed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                BookError::Storage(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn messages_are_stable_identifiers() {
        assert_eq!(BookError::BookNotFound.to_string(), "Book not found");
        assert_eq!(BookError::InvalidDate.to_string(), "Invalid date");
        assert_eq!(BookError::EmptyFields.to_string(), "Empty fields");
        assert_eq!(BookError::InvalidField.to_string(), "Invalid field");
    }
}
