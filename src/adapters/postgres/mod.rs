pub mod borrow_store;
pub mod catalog_store;

pub use borrow_store::BorrowStore;
pub use catalog_store::CatalogStore;
