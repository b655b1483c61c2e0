use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Book, Coupon, CoverImage, NewBook, NewCoupon},
    events::{CatalogChange, CatalogChangedEvent, EventProducers},
    traits::{StorefrontDatabase, StorefrontError, Tombstonable},
};

/// `CatalogApi` manages the bookstore catalog: books and their cover art, coupons, and the
/// tombstone lifecycle (soft delete, restore, scheduled purge).
pub struct CatalogApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> CatalogApi<B>
where B: StorefrontDatabase
{
    pub async fn add_book(&self, book: NewBook) -> Result<Book, StorefrontError> {
        let book = self.db.insert_book(book).await?;
        info!("📖️ Book '{}' added to the catalog with id {}", book.title, book.id);
        self.call_catalog_changed_hook(Book::TABLE, book.id, CatalogChange::Created).await;
        Ok(book)
    }

    pub async fn fetch_book(&self, book_id: i64) -> Result<Option<Book>, StorefrontError> {
        self.db.fetch_book(book_id).await
    }

    /// Fetches a book even if it is tombstoned. Admin surface only.
    pub async fn fetch_book_any(&self, book_id: i64) -> Result<Option<Book>, StorefrontError> {
        self.db.fetch_book_any(book_id).await
    }

    pub async fn attach_cover_image(&self, book_id: i64, storage_key: &str) -> Result<CoverImage, StorefrontError> {
        let cover = self.db.attach_cover_image(book_id, storage_key).await?;
        self.call_catalog_changed_hook(Book::TABLE, book_id, CatalogChange::Updated).await;
        Ok(cover)
    }

    pub async fn add_coupon(&self, coupon: NewCoupon) -> Result<Coupon, StorefrontError> {
        let coupon = self.db.insert_coupon(coupon).await?;
        info!("🎟️ Coupon '{}' added with id {}", coupon.code, coupon.id);
        Ok(coupon)
    }

    /// Tombstones a book and its cover art. The book drops out of the storefront and out of
    /// checkout immediately; open orders that already reference it are unaffected. Returns
    /// `false` if the book was missing or already deleted.
    pub async fn soft_delete_book(&self, book_id: i64) -> Result<bool, StorefrontError> {
        let deleted = self.db.soft_delete::<Book>(book_id).await?;
        if deleted {
            info!("📖️ Book #{book_id} soft-deleted");
            self.call_catalog_changed_hook(Book::TABLE, book_id, CatalogChange::SoftDeleted).await;
        }
        Ok(deleted)
    }

    /// Brings a tombstoned book (and its cover art) back, provided the purge worker has not
    /// claimed it yet. Returns `false` if there was nothing to restore.
    pub async fn restore_book(&self, book_id: i64) -> Result<bool, StorefrontError> {
        let restored = self.db.restore::<Book>(book_id).await?;
        if restored {
            info!("📖️ Book #{book_id} restored");
            self.call_catalog_changed_hook(Book::TABLE, book_id, CatalogChange::Restored).await;
        }
        Ok(restored)
    }

    pub async fn soft_delete_coupon(&self, coupon_id: i64) -> Result<bool, StorefrontError> {
        let deleted = self.db.soft_delete::<Coupon>(coupon_id).await?;
        if deleted {
            info!("🎟️ Coupon #{coupon_id} soft-deleted");
        }
        Ok(deleted)
    }

    pub async fn restore_coupon(&self, coupon_id: i64) -> Result<bool, StorefrontError> {
        let restored = self.db.restore::<Coupon>(coupon_id).await?;
        if restored {
            info!("🎟️ Coupon #{coupon_id} restored");
        }
        Ok(restored)
    }

    /// One sweep of the purge schedule: permanently removes every tombstoned book and coupon
    /// whose retention window has lapsed. Returns the number of entities purged.
    pub async fn purge_expired(&self) -> Result<u64, StorefrontError> {
        let retention = self.db.purge_retention().await?;
        let books = self.db.purge_tombstones::<Book>(retention).await?;
        let coupons = self.db.purge_tombstones::<Coupon>(retention).await?;
        let total = books + coupons;
        if total > 0 {
            info!("🪦️ Purge sweep removed {books} book(s) and {coupons} coupon(s)");
        }
        Ok(total)
    }

    async fn call_catalog_changed_hook(&self, entity: &str, entity_id: i64, change: CatalogChange) {
        for emitter in &self.producers.catalog_changed_producer {
            trace!("📖️ Notifying catalog changed hook subscribers");
            emitter.publish_event(CatalogChangedEvent::new(entity, entity_id, change)).await;
        }
    }
}
