pub mod catalog;
pub mod ledger_store;

// パブリックに型を再エクスポート
pub use catalog::Catalog as PostgresCatalog;
pub use ledger_store::LedgerStore as PostgresLedgerStore;
pub use ledger_store::PgLedgerTransaction;

/// `migrations/` 以下のスキーマ定義
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
