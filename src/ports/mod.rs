pub mod borrow_store;
pub mod catalog_store;
pub mod clock;

pub use borrow_store::*;
pub use catalog_store::*;
pub use clock::*;
