use crate::db_types::{Book, Coupon};

/// Describes one attachment-like relation of a tombstonable entity: rows in `table` that point at
/// the owner through `owner_fk` and at shared blob storage through `blob_fk`.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentRelation {
    pub table: &'static str,
    pub owner_fk: &'static str,
    pub blob_table: &'static str,
    pub blob_fk: &'static str,
}

/// The capability an entity type implements to take part in soft-delete, restore and scheduled
/// purge.
///
/// An implementor's table must carry a nullable `deleted_at` column; non-null means "logically
/// absent from default queries, physically present". Attachment relations are declared
/// explicitly rather than discovered by reflection, so the sweep only ever touches tables an
/// entity has opted in.
pub trait Tombstonable {
    const TABLE: &'static str;
    const ATTACHMENTS: &'static [AttachmentRelation];
}

impl Tombstonable for Book {
    const ATTACHMENTS: &'static [AttachmentRelation] = &[AttachmentRelation {
        table: "cover_images",
        owner_fk: "book_id",
        blob_table: "blobs",
        blob_fk: "blob_id",
    }];
    const TABLE: &'static str = "books";
}

impl Tombstonable for Coupon {
    const ATTACHMENTS: &'static [AttachmentRelation] = &[];
    const TABLE: &'static str = "coupons";
}
