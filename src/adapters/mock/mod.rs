mod catalog;
mod ledger_store;
mod store;

pub use ledger_store::MemoryTransaction;
pub use store::MemoryStore;
