mod errors;
mod lending_service;
mod overdue_sweep;

pub use errors::{ErrorClass, LendingError, Result};
pub use lending_service::{
    MAX_ACTIVE_BORROWS, ServiceDependencies, all_records, borrow_book, borrow_history,
    borrows_for_user, cancel_reservation, renew_borrow, reservations_for_user, reserve_book,
    return_book,
};
pub use overdue_sweep::{SweepReport, sweep_overdue};
