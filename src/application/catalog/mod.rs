mod catalog_service;
mod errors;

pub use catalog_service::{
    create_borrower, create_item, delete_borrower, delete_item, list_borrowers, list_items,
    search_items, update_borrower, update_item,
};
pub use errors::{CatalogError, Result};
