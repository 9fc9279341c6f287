pub mod catalog;
pub mod ledger_store;

pub use catalog::{Catalog, ItemDeletion};
pub use ledger_store::*;
