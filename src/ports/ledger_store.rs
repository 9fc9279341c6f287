use crate::domain::{
    ledger::LedgerEntry,
    value_objects::{BorrowerId, ItemId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 一覧表示用の資料情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub item_id: ItemId,
    pub title: String,
    pub author: String,
}

/// 一覧表示用の利用者情報
///
/// カタログから削除された利用者は `name` が `None` になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerSummary {
    pub borrower_id: BorrowerId,
    pub name: Option<String>,
}

/// 利用者の貸出中エントリ（資料情報付き）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenLoan {
    pub item: ItemSummary,
    pub entry: LedgerEntry,
}

/// 延滞中エントリ（資料・利用者情報付き）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueLoan {
    pub item: ItemSummary,
    pub entry: LedgerEntry,
    pub borrower: BorrowerSummary,
}

/// 台帳ストアポート
///
/// 貸出台帳と資料の貸出可能数を保持するトランザクショナルなストア。
/// 書き込みはすべて `begin` で開始したトランザクションの中で行う。
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// トランザクションを開始する
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>>;

    /// 利用者の貸出中エントリを返却期限の昇順でストリーム配信する
    ///
    /// 呼び出すたびに新しく問い合わせる。
    fn open_loans_for_borrower(&self, borrower_id: BorrowerId) -> BoxStream<'_, Result<OpenLoan>>;

    /// `now` 時点で延滞中のエントリを返却期限の昇順でストリーム配信する
    fn overdue_loans(&self, now: DateTime<Utc>) -> BoxStream<'_, Result<OverdueLoan>>;

    /// 資料の現在の貸出可能数（表示用）
    ///
    /// トランザクション外の読み取りのため古い値の可能性がある。
    /// 書き込みの判断に使ってはならない。
    async fn item_availability(&self, item_id: ItemId) -> Result<Option<u32>>;
}

/// 台帳トランザクション
///
/// `commit` も `rollback` も呼ばずに破棄した場合はロールバックされる。
#[async_trait]
pub trait LedgerTransaction: Send {
    /// 貸出可能数が1以上の場合に限り1減らす
    ///
    /// 判定と書き込みは不可分。減らした場合 `true`。
    /// 資料が存在しない場合も `false`。
    async fn conditional_decrement(&mut self, item_id: ItemId) -> Result<bool>;

    /// 貸出可能数を1増やす
    ///
    /// 資料が存在しない場合は `false`。
    async fn conditional_increment(&mut self, item_id: ItemId) -> Result<bool>;

    /// 新しい台帳エントリを追加する
    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<()>;

    /// 資料・利用者の組で最も古い未返却エントリを返却済みにする
    ///
    /// `returned_at IS NULL` を条件とした1回の条件付き更新。
    /// 該当がなければ `None`。
    async fn close_oldest_open_entry(
        &mut self,
        item_id: ItemId,
        borrower_id: BorrowerId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<LedgerEntry>>;

    /// 資料が存在するか
    async fn item_exists(&mut self, item_id: ItemId) -> Result<bool>;

    /// 利用者が存在するか
    ///
    /// トランザクション終了まで利用者の削除を防ぐ。
    async fn borrower_exists(&mut self, borrower_id: BorrowerId) -> Result<bool>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
