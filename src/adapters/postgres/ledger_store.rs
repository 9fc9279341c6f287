use crate::domain::{
    ledger::LedgerEntry,
    value_objects::{BorrowerId, ItemId, LoanId},
};
use crate::ports::ledger_store::{
    BorrowerSummary, ItemSummary, LedgerStore as LedgerStoreTrait, LedgerTransaction, OpenLoan,
    OverdueLoan, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

/// Map the ledger columns of a row to a LedgerEntry
///
/// Expects `loan_id, item_id, borrower_id, created_at, due_at, returned_at`.
pub(super) fn map_row_to_entry(row: &PgRow) -> std::result::Result<LedgerEntry, sqlx::Error> {
    Ok(LedgerEntry {
        loan_id: LoanId::from_uuid(row.try_get("loan_id")?),
        item_id: ItemId::from_uuid(row.try_get("item_id")?),
        borrower_id: BorrowerId::from_uuid(row.try_get("borrower_id")?),
        created_at: row.try_get("created_at")?,
        due_at: row.try_get("due_at")?,
        returned_at: row.try_get("returned_at")?,
    })
}

fn map_row_to_item_summary(row: &PgRow) -> std::result::Result<ItemSummary, sqlx::Error> {
    Ok(ItemSummary {
        item_id: ItemId::from_uuid(row.try_get("item_id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
    })
}

/// Convert a stored available_count to the domain type
pub(super) fn to_count(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("available_count out of range: {}", value),
        )) as Box<dyn std::error::Error + Send + Sync>
    })
}

/// PostgreSQL implementation of LedgerStore
///
/// Availability lives in `items.available_count`; loans live in
/// `ledger_entries`. Every write goes through a `PgLedgerTransaction`.
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    /// Create a new LedgerStore with a PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A ledger transaction on one pooled connection
///
/// Dropping it without commit rolls back before the connection is reused.
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerStoreTrait for LedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }

    /// Stream open loans of a borrower, soonest due first
    fn open_loans_for_borrower(&self, borrower_id: BorrowerId) -> BoxStream<'_, Result<OpenLoan>> {
        sqlx::query(
            r#"
            SELECT
                l.loan_id,
                l.item_id,
                l.borrower_id,
                l.created_at,
                l.due_at,
                l.returned_at,
                i.title,
                i.author
            FROM ledger_entries l
            JOIN items i ON i.item_id = l.item_id
            WHERE l.borrower_id = $1 AND l.returned_at IS NULL
            ORDER BY l.due_at ASC, l.loan_id ASC
            "#,
        )
        .bind(borrower_id.value())
        .fetch(&self.pool)
        .map(|row_result| -> Result<OpenLoan> {
            let row = row_result?;
            Ok(OpenLoan {
                item: map_row_to_item_summary(&row)?,
                entry: map_row_to_entry(&row)?,
            })
        })
        .boxed()
    }

    /// Stream loans still open after their due date, oldest due first
    ///
    /// Borrowers missing from the catalog are kept (LEFT JOIN) with no name.
    fn overdue_loans(&self, now: DateTime<Utc>) -> BoxStream<'_, Result<OverdueLoan>> {
        sqlx::query(
            r#"
            SELECT
                l.loan_id,
                l.item_id,
                l.borrower_id,
                l.created_at,
                l.due_at,
                l.returned_at,
                i.title,
                i.author,
                b.name AS borrower_name
            FROM ledger_entries l
            JOIN items i ON i.item_id = l.item_id
            LEFT JOIN borrowers b ON b.borrower_id = l.borrower_id
            WHERE l.returned_at IS NULL AND l.due_at < $1
            ORDER BY l.due_at ASC, l.loan_id ASC
            "#,
        )
        .bind(now)
        .fetch(&self.pool)
        .map(|row_result| -> Result<OverdueLoan> {
            let row = row_result?;
            let entry = map_row_to_entry(&row)?;
            Ok(OverdueLoan {
                item: map_row_to_item_summary(&row)?,
                borrower: BorrowerSummary {
                    borrower_id: entry.borrower_id,
                    name: row.try_get("borrower_name")?,
                },
                entry,
            })
        })
        .boxed()
    }

    async fn item_availability(&self, item_id: ItemId) -> Result<Option<u32>> {
        let count: Option<i32> =
            sqlx::query_scalar("SELECT available_count FROM items WHERE item_id = $1")
                .bind(item_id.value())
                .fetch_optional(&self.pool)
                .await?;

        count.map(to_count).transpose()
    }
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    /// Decrement only when a copy is left
    ///
    /// The predicate sits in the UPDATE itself, so the row lock taken by the
    /// update serializes concurrent borrowers of the same item.
    async fn conditional_decrement(&mut self, item_id: ItemId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET available_count = available_count - 1
            WHERE item_id = $1 AND available_count > 0
            "#,
        )
        .bind(item_id.value())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn conditional_increment(&mut self, item_id: ItemId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET available_count = available_count + 1
            WHERE item_id = $1
            "#,
        )
        .bind(item_id.value())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                loan_id,
                item_id,
                borrower_id,
                created_at,
                due_at,
                returned_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.loan_id.value())
        .bind(entry.item_id.value())
        .bind(entry.borrower_id.value())
        .bind(entry.created_at)
        .bind(entry.due_at)
        .bind(entry.returned_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    /// Close the oldest open entry for (item, borrower)
    ///
    /// The sub-select locks the candidate row; the outer predicate re-checks
    /// `returned_at IS NULL` after the lock, so a concurrent duplicate return
    /// updates zero rows instead of closing the entry twice.
    async fn close_oldest_open_entry(
        &mut self,
        item_id: ItemId,
        borrower_id: BorrowerId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(
            r#"
            UPDATE ledger_entries
            SET returned_at = $3
            WHERE loan_id = (
                SELECT loan_id
                FROM ledger_entries
                WHERE item_id = $1 AND borrower_id = $2 AND returned_at IS NULL
                ORDER BY created_at ASC, loan_id ASC
                LIMIT 1
                FOR UPDATE
            )
            AND returned_at IS NULL
            RETURNING loan_id, item_id, borrower_id, created_at, due_at, returned_at
            "#,
        )
        .bind(item_id.value())
        .bind(borrower_id.value())
        .bind(returned_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(map_row_to_entry).transpose()?)
    }

    async fn item_exists(&mut self, item_id: ItemId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE item_id = $1)")
                .bind(item_id.value())
                .fetch_one(&mut *self.tx)
                .await?;

        Ok(exists)
    }

    /// Check the borrower and hold a key-share lock until the transaction ends
    async fn borrower_exists(&mut self, borrower_id: BorrowerId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM borrowers WHERE borrower_id = $1 FOR KEY SHARE")
            .bind(borrower_id.value())
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.is_some())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
