mod errors;
mod lending_service;
mod listing;

pub use errors::{LendingError, Result};
pub use lending_service::{borrow_item, return_item};
pub use listing::{
    item_availability, list_open_loans_for_borrower, list_overdue, list_overdue_at,
};
