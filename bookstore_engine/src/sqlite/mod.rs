//! SQLite backend for the bookstore order engine.
//!
//! [`SqliteDatabase`] implements the [`crate::traits::StorefrontDatabase`] trait on top of the
//! low-level query functions in [`db`].
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
