//! PostgreSQL catalog store.

use std::time::Duration;

use async_trait::async_trait;
use rust_common::{StoreError, with_timeout};
use sqlx::PgPool;

use super::{Book, CatalogStore, Page};

#[derive(sqlx::FromRow)]
struct BookRow {
    id: String,
    title: String,
    author: String,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            author: row.author,
        }
    }
}

/// `books` table backed store.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgCatalogStore {
    /// Wraps a pool; every query is bounded by `timeout`.
    #[must_use]
    pub const fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

fn to_sql_bound(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn insert_if_absent(&self, book: &Book) -> Result<bool, StoreError> {
        with_timeout(self.timeout, async {
            let result = sqlx::query(
                "INSERT INTO books (id, title, author) VALUES ($1, $2, $3) \
                 ON CONFLICT (id) DO NOTHING",
            )
            .bind(&book.id)
            .bind(&book.title)
            .bind(&book.author)
            .execute(&self.pool)
            .await?;
            Ok::<_, StoreError>(result.rows_affected() == 1)
        })
        .await
    }

    async fn update_if_present(&self, book: &Book) -> Result<bool, StoreError> {
        with_timeout(self.timeout, async {
            let result = sqlx::query("UPDATE books SET title = $2, author = $3 WHERE id = $1")
                .bind(&book.id)
                .bind(&book.title)
                .bind(&book.author)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(result.rows_affected() > 0)
        })
        .await
    }

    async fn delete_if_present(&self, id: &str) -> Result<bool, StoreError> {
        with_timeout(self.timeout, async {
            let result = sqlx::query("DELETE FROM books WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
            Ok::<_, StoreError>(result.rows_affected() > 0)
        })
        .await
    }

    async fn scan(&self, offset: u64, limit: u64) -> Result<Page, StoreError> {
        with_timeout(self.timeout, async {
            let rows: Vec<BookRow> = sqlx::query_as(
                "SELECT id, title, author FROM books ORDER BY id ASC LIMIT $1 OFFSET $2",
            )
            .bind(to_sql_bound(limit))
            .bind(to_sql_bound(offset))
            .fetch_all(&self.pool)
            .await?;

            let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
                .fetch_one(&self.pool)
                .await?;

            Ok::<_, StoreError>(Page {
                items: rows.into_iter().map(Book::from).collect(),
                total: u64::try_from(total).unwrap_or_default(),
            })
        })
        .await
    }
}
