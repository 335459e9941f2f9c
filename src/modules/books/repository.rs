use anyhow::Context;
use async_trait::async_trait;
use bookshelf_kernel::{Entity, Repository};
use sqlx::SqlitePool;
use time::Date;

use super::models::{Book, BookId};

/// `books` table access through a shared SQLite pool.
pub struct SqliteBookRepository {
    pool: SqlitePool,
}

impl SqliteBookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: i64,
    title: String,
    author: String,
    pages: i32,
    price: f64,
    release_date: Date,
    online: bool,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: Some(row.id),
            title: row.title,
            author: row.author,
            pages: row.pages,
            price: row.price,
            release_date: row.release_date,
            online: row.online,
        }
    }
}

#[async_trait]
impl Repository<Book> for SqliteBookRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, author, pages, price, release_date, online
            FROM books
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to list books")?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn find_by_id(&self, id: BookId) -> anyhow::Result<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, author, pages, price, release_date, online
            FROM books
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to load book {}", id))?;

        Ok(row.map(Book::from))
    }

    async fn exists_by_id(&self, id: BookId) -> anyhow::Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to check book {}", id))?;

        Ok(count > 0)
    }

    async fn save(&self, book: Book) -> anyhow::Result<Book> {
        let id = match book.id {
            None => sqlx::query(
                r#"
                INSERT INTO books (title, author, pages, price, release_date, online)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.pages)
            .bind(book.price)
            .bind(book.release_date)
            .bind(book.online)
            .execute(&self.pool)
            .await
            .context("failed to insert book")?
            .last_insert_rowid(),
            // Unknown ids are inserted rather than rejected.
            Some(id) => {
                sqlx::query(
                    r#"
                    INSERT INTO books (id, title, author, pages, price, release_date, online)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT (id) DO UPDATE SET
                        title = excluded.title,
                        author = excluded.author,
                        pages = excluded.pages,
                        price = excluded.price,
                        release_date = excluded.release_date,
                        online = excluded.online
                    "#,
                )
                .bind(id)
                .bind(&book.title)
                .bind(&book.author)
                .bind(book.pages)
                .bind(book.price)
                .bind(book.release_date)
                .bind(book.online)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to save book {}", id))?;
                id
            }
        };

        Ok(book.with_id(id))
    }

    async fn delete_by_id(&self, id: BookId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete book {}", id))?;
        Ok(())
    }
}
