use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::BookError;

/// A stored book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Server-assigned identifier, never reassigned
    pub id: i64,
    pub title: String,
    /// Publication date, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
    pub author: String,
    pub description: String,
    pub image: String,
}

/// Columns of the `books` table. The only way a name reaches SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    Title,
    Date,
    Author,
    Description,
    Image,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Id,
        Column::Title,
        Column::Date,
        Column::Author,
        Column::Description,
        Column::Image,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Title => "title",
            Column::Date => "date",
            Column::Author => "author",
            Column::Description => "description",
            Column::Image => "image",
        }
    }

    /// Quoted SQL identifier.
    pub const fn ident(self) -> &'static str {
        match self {
            Column::Id => "\"id\"",
            Column::Title => "\"title\"",
            Column::Date => "\"date\"",
            Column::Author => "\"author\"",
            Column::Description => "\"description\"",
            Column::Image => "\"image\"",
        }
    }

    /// Whether clients may set this column on create or update.
    pub const fn is_writable(self) -> bool {
        !matches!(self, Column::Id)
    }
}

impl FromStr for Column {
    type Err = BookError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == name)
            .ok_or(BookError::InvalidField)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    const fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: Column,
    pub direction: Direction,
}

/// Multi-key ordering applied left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec(Vec<SortKey>);

impl SortSpec {
    /// Parse `title,-date` style input. Every term must name a column; a
    /// leading `-` sorts that term descending. Empty input means `id`.
    pub fn parse(raw: &str) -> Result<Self, BookError> {
        if raw.is_empty() {
            return Ok(Self::default());
        }

        raw.split(',')
            .map(|term| {
                let (name, direction) = match term.strip_prefix('-') {
                    Some(name) => (name, Direction::Desc),
                    None => (term, Direction::Asc),
                };
                Ok(SortKey {
                    column: name.parse()?,
                    direction,
                })
            })
            .collect::<Result<Vec<_>, BookError>>()
            .map(SortSpec)
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    /// Render the `ORDER BY` body from allow-listed identifiers only.
    pub fn order_by_clause(&self) -> String {
        self.0
            .iter()
            .map(|key| format!("{} {}", key.column.ident(), key.direction.keyword()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec(vec![SortKey {
            column: Column::Id,
            direction: Direction::Asc,
        }])
    }
}

/// A validated list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: SortSpec,
    pub limit: u64,
    pub offset: u64,
}

impl ListQuery {
    pub const DEFAULT_LIMIT: u64 = 10;
    pub const DEFAULT_OFFSET: u64 = 0;
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            sort: SortSpec::default(),
            limit: Self::DEFAULT_LIMIT,
            offset: Self::DEFAULT_OFFSET,
        }
    }
}

/// Fields for a new book. `None` is written as NULL so that the storage
/// layer reports which required field is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl TryFrom<Map<String, Value>> for NewBook {
    type Error = BookError;

    /// Keys that are not writable columns are ignored.
    fn try_from(body: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut book = NewBook::default();
        for (key, value) in body {
            let Ok(column) = key.parse::<Column>() else {
                tracing::debug!(%key, "ignoring unknown field on create");
                continue;
            };
            let value = field_text(value)?;
            match column {
                Column::Id => {}
                Column::Title => book.title = value,
                Column::Date => book.date = value,
                Column::Author => book.author = value,
                Column::Description => book.description = value,
                Column::Image => book.image = value,
            }
        }
        Ok(book)
    }
}

/// Partial update keyed by column. A column absent from the patch keeps its
/// stored value; a column present with `None` is set to NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    changes: BTreeMap<Column, Option<String>>,
}

impl BookPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: Column, value: Option<String>) -> Result<(), BookError> {
        if !column.is_writable() {
            return Err(BookError::InvalidField);
        }
        self.changes.insert(column, value);
        Ok(())
    }

    pub fn with(mut self, column: Column, value: impl Into<String>) -> Result<Self, BookError> {
        self.set(column, Some(value.into()))?;
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Column, Option<&str>)> {
        self.changes
            .iter()
            .map(|(column, value)| (*column, value.as_deref()))
    }
}

impl TryFrom<Map<String, Value>> for BookPatch {
    type Error = BookError;

    /// Every key must name a writable column.
    fn try_from(body: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut patch = BookPatch::new();
        for (key, value) in body {
            patch.set(key.parse()?, field_text(value)?)?;
        }
        Ok(patch)
    }
}

/// Text of a scalar JSON value. Numbers and booleans are stringified and
/// left for the storage layer to judge; arrays and objects never fit a column.
fn field_text(value: Value) -> Result<Option<String>, BookError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        Value::Array(_) | Value::Object(_) => Err(BookError::InvalidField),
    }
}
