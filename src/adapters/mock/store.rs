use crate::domain::{
    catalog::{Borrower, Item},
    ledger::LedgerEntry,
    value_objects::{BorrowerId, ItemId},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// インメモリのテーブル群
#[derive(Debug, Clone, Default)]
pub(super) struct Tables {
    pub(super) items: HashMap<ItemId, Item>,
    pub(super) borrowers: HashMap<BorrowerId, Borrower>,
    /// 挿入順
    pub(super) entries: Vec<LedgerEntry>,
}

/// 次の操作で1回だけ発生させる障害
#[derive(Debug, Default)]
pub(super) struct Faults {
    pub(super) fail_insert: bool,
    pub(super) fail_increment: bool,
    pub(super) fail_commit: bool,
}

impl Faults {
    /// フラグが立っていれば下ろして障害を返す
    pub(super) fn take(flag: &mut bool, what: &str) -> Result<(), std::io::Error> {
        if std::mem::take(flag) {
            return Err(std::io::Error::other(format!("injected {} failure", what)));
        }
        Ok(())
    }
}

/// LedgerStore と Catalog のインメモリ実装
///
/// トランザクションはストア全体のロックを保持し、作業用コピーに書き込む。
/// コミットで作業用コピーを反映し、ロールバックまたは破棄で捨てる。
/// テストとデータベースなしでの起動に使う。
#[derive(Clone, Default)]
pub struct MemoryStore {
    pub(super) tables: Arc<tokio::sync::Mutex<Tables>>,
    pub(super) faults: Arc<Mutex<Faults>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用：次の台帳エントリ追加を失敗させる
    pub fn fail_next_insert(&self) {
        self.faults.lock().unwrap().fail_insert = true;
    }

    /// テスト用：次の貸出可能数の加算を失敗させる
    pub fn fail_next_increment(&self) {
        self.faults.lock().unwrap().fail_increment = true;
    }

    /// テスト用：次のコミットを失敗させる
    pub fn fail_next_commit(&self) {
        self.faults.lock().unwrap().fail_commit = true;
    }

    /// テスト用：資料の未返却エントリ数
    pub async fn open_entry_count(&self, item_id: ItemId) -> usize {
        let tables = self.tables.lock().await;
        tables
            .entries
            .iter()
            .filter(|e| e.item_id == item_id && e.is_open())
            .count()
    }

    /// テスト用：台帳の全エントリ（挿入順）
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.tables.lock().await.entries.clone()
    }
}
