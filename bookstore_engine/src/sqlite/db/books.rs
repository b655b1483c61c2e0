use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Blob, Book, CoverImage, NewBook},
    traits::StorefrontError,
};

pub async fn insert_book(book: NewBook, conn: &mut SqliteConnection) -> Result<Book, StorefrontError> {
    let book = sqlx::query_as(
        r#"
            INSERT INTO books (title, author, price, stock_quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(book.title)
    .bind(book.author)
    .bind(book.price)
    .bind(book.stock_quantity)
    .fetch_one(conn)
    .await?;
    Ok(book)
}

/// Fetches a live book. Tombstoned rows are excluded, as they are from every default query.
pub async fn fetch_book(book_id: i64, conn: &mut SqliteConnection) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM books WHERE id = $1 AND deleted_at IS NULL")
        .bind(book_id)
        .fetch_optional(conn)
        .await
}

/// Fetches a book regardless of tombstone state.
pub async fn fetch_book_any(book_id: i64, conn: &mut SqliteConnection) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM books WHERE id = $1").bind(book_id).fetch_optional(conn).await
}

/// Decrements stock for one order line, guarded by `stock_quantity >= qty` so the counter can
/// never go negative. Zero rows affected means the stock was insufficient (or the book is
/// tombstoned) and the caller must roll back the surrounding transaction: overlapping
/// reservations serialize here, at the row, not behind an application lock.
pub async fn reserve_stock_line(
    book_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, StorefrontError> {
    let result = sqlx::query(
        r#"
            UPDATE books
            SET stock_quantity = stock_quantity - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND deleted_at IS NULL AND stock_quantity >= $1
        "#,
    )
    .bind(quantity)
    .bind(book_id)
    .execute(conn)
    .await?;
    trace!("📚️ Conditional stock decrement for book #{book_id} (-{quantity}): {} row(s)", result.rows_affected());
    Ok(result.rows_affected() == 1)
}

/// Restores a previously reserved quantity. Only ever called from release paths that hold the
/// order's `stock_released` guard, so it applies unconditionally.
pub async fn restore_stock_line(
    book_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), StorefrontError> {
    sqlx::query(
        "UPDATE books SET stock_quantity = stock_quantity + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
    )
    .bind(quantity)
    .bind(book_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Attaches cover art to a book. Blobs are deduplicated on their storage key: if another
/// attachment already brought this blob in, the existing row is reused.
pub async fn attach_cover_image(
    book_id: i64,
    storage_key: &str,
    conn: &mut SqliteConnection,
) -> Result<CoverImage, StorefrontError> {
    sqlx::query("INSERT INTO blobs (storage_key) VALUES ($1) ON CONFLICT (storage_key) DO NOTHING")
        .bind(storage_key)
        .execute(&mut *conn)
        .await?;
    let blob: Blob =
        sqlx::query_as("SELECT * FROM blobs WHERE storage_key = $1").bind(storage_key).fetch_one(&mut *conn).await?;
    let cover = sqlx::query_as("INSERT INTO cover_images (book_id, blob_id) VALUES ($1, $2) RETURNING *")
        .bind(book_id)
        .bind(blob.id)
        .fetch_one(conn)
        .await?;
    Ok(cover)
}

pub async fn fetch_cover_images(book_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CoverImage>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cover_images WHERE book_id = $1").bind(book_id).fetch_all(conn).await
}

pub async fn fetch_blob(blob_id: i64, conn: &mut SqliteConnection) -> Result<Option<Blob>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM blobs WHERE id = $1").bind(blob_id).fetch_optional(conn).await
}
