//! Query layer for the `books` table.
//!
//! Every value reaches SQLite as a bound parameter. Column names in `ORDER BY`
//! and `SET` clauses come from [`Column`] identifiers, never from input text.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::error::BookError;
use super::models::{Book, BookPatch, ListQuery, NewBook};

const SELECT_BOOK_BY_ID: &str =
    "SELECT id, title, date, author, description, image FROM books WHERE id = ?";

const INSERT_BOOKS: &str = "INSERT INTO books (title, date, author, description, image) ";

/// Book storage backed by a shared connection pool
#[derive(Clone)]
pub struct BookRepo {
    pool: SqlitePool,
}

impl BookRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List books ordered by `query.sort`, paginated by limit and offset.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<Book>, BookError> {
        let sql = format!(
            "SELECT id, title, date, author, description, image FROM books ORDER BY {} LIMIT ? OFFSET ?",
            query.sort.order_by_clause()
        );

        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(to_sql_int(query.limit))
            .bind(to_sql_int(query.offset))
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            sort = %query.sort.order_by_clause(),
            limit = query.limit,
            offset = query.offset,
            returned = books.len(),
            "listed books"
        );
        Ok(books)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Book>, BookError> {
        let book = sqlx::query_as::<_, Book>(SELECT_BOOK_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Insert one book and return it as stored.
    pub async fn create(&self, input: &NewBook) -> Result<Book, BookError> {
        let mut builder = QueryBuilder::<Sqlite>::new(INSERT_BOOKS);
        push_book_values(&mut builder, std::slice::from_ref(input));

        let id = builder
            .build()
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        tracing::debug!(book_id = id, "created book");
        self.reread(id).await
    }

    /// Insert many books in one statement. Either every row is inserted or none.
    pub async fn create_many(&self, inputs: &[NewBook]) -> Result<u64, BookError> {
        if inputs.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(INSERT_BOOKS);
        push_book_values(&mut builder, inputs);

        let inserted = builder.build().execute(&self.pool).await?.rows_affected();

        tracing::debug!(inserted, "created books");
        Ok(inserted)
    }

    /// Apply a partial update and return the book as stored afterwards.
    ///
    /// Existence is checked before the patch is validated, so an unknown id
    /// reports [`BookError::BookNotFound`] whatever the payload.
    pub async fn update<P>(&self, id: i64, patch: P) -> Result<Book, BookError>
    where
        P: TryInto<BookPatch>,
        BookError: From<P::Error>,
    {
        let current = self.get(id).await?.ok_or(BookError::BookNotFound)?;
        let patch: BookPatch = patch.try_into()?;
        if patch.is_empty() {
            return Ok(current);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE books SET ");
        let mut assignments = builder.separated(", ");
        for (column, value) in patch.iter() {
            assignments.push(column.ident());
            assignments.push_unseparated(" = ");
            assignments.push_bind_unseparated(value.map(str::to_owned));
        }
        builder.push(" WHERE id = ").push_bind(id);

        builder.build().execute(&self.pool).await?;

        tracing::debug!(book_id = id, fields = patch.len(), "updated book");
        self.reread(id).await
    }

    /// Read back a row this repo just wrote. A vanished row is a storage
    /// fault, not a client error.
    async fn reread(&self, id: i64) -> Result<Book, BookError> {
        self.get(id)
            .await?
            .ok_or(BookError::Storage(sqlx::Error::RowNotFound))
    }

    /// Remove every book. Administrative reset only.
    pub async fn delete_all(&self) -> Result<u64, BookError> {
        let deleted = sqlx::query("DELETE FROM books")
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(deleted, "deleted all books");
        Ok(deleted)
    }

    pub async fn count(&self) -> Result<i64, BookError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn push_book_values(builder: &mut QueryBuilder<'_, Sqlite>, inputs: &[NewBook]) {
    builder.push_values(inputs, |mut row, book| {
        row.push_bind(book.title.clone())
            .push_bind(book.date.clone())
            .push_bind(book.author.clone())
            .push_bind(book.description.clone())
            .push_bind(book.image.clone());
    });
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
