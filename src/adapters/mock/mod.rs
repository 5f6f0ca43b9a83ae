pub mod borrow_store;
pub mod catalog_store;
pub mod clock;

pub use borrow_store::BorrowStore;
pub use catalog_store::CatalogStore;
pub use clock::ManualClock;
