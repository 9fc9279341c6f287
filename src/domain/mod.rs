pub mod catalog;
pub mod commands;
pub mod errors;
pub mod ledger;
pub mod value_objects;

pub use errors::*;
pub use value_objects::*;
