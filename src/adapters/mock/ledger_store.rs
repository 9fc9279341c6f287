use crate::domain::{
    catalog::{Borrower, Item},
    ledger::{self, LedgerEntry},
    value_objects::{BorrowerId, ItemId},
};
use crate::ports::ledger_store::{
    BorrowerSummary, ItemSummary, LedgerStore as LedgerStoreTrait, LedgerTransaction, OpenLoan,
    OverdueLoan, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

use super::store::{Faults, MemoryStore, Tables};

fn item_summary(item: &Item) -> ItemSummary {
    ItemSummary {
        item_id: item.item_id,
        title: item.title.clone(),
        author: item.author.clone(),
    }
}

fn borrower_summary(borrower_id: BorrowerId, borrower: Option<&Borrower>) -> BorrowerSummary {
    BorrowerSummary {
        borrower_id,
        name: borrower.map(|b| b.name.clone()),
    }
}

/// インメモリのトランザクション
///
/// ストアのロックをトランザクション終了まで保持する。
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    faults: Arc<Mutex<Faults>>,
}

#[async_trait]
impl LedgerStoreTrait for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(MemoryTransaction {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }

    fn open_loans_for_borrower(&self, borrower_id: BorrowerId) -> BoxStream<'_, Result<OpenLoan>> {
        let tables = self.tables.clone();

        stream::once(async move {
            let tables = tables.lock().await;
            let mut loans: Vec<OpenLoan> = tables
                .entries
                .iter()
                .filter(|e| e.is_open() && e.borrower_id == borrower_id)
                .filter_map(|e| {
                    tables.items.get(&e.item_id).map(|item| OpenLoan {
                        item: item_summary(item),
                        entry: e.clone(),
                    })
                })
                .collect();
            loans.sort_by_key(|l| (l.entry.due_at, l.entry.loan_id));
            loans
        })
        .flat_map(|loans| stream::iter(loans.into_iter().map(Ok)))
        .boxed()
    }

    fn overdue_loans(&self, now: DateTime<Utc>) -> BoxStream<'_, Result<OverdueLoan>> {
        let tables = self.tables.clone();

        stream::once(async move {
            let tables = tables.lock().await;
            let mut loans: Vec<OverdueLoan> = tables
                .entries
                .iter()
                .filter(|e| ledger::is_overdue(e, now))
                .filter_map(|e| {
                    tables.items.get(&e.item_id).map(|item| OverdueLoan {
                        item: item_summary(item),
                        entry: e.clone(),
                        borrower: borrower_summary(
                            e.borrower_id,
                            tables.borrowers.get(&e.borrower_id),
                        ),
                    })
                })
                .collect();
            loans.sort_by_key(|l| (l.entry.due_at, l.entry.loan_id));
            loans
        })
        .flat_map(|loans| stream::iter(loans.into_iter().map(Ok)))
        .boxed()
    }

    async fn item_availability(&self, item_id: ItemId) -> Result<Option<u32>> {
        let tables = self.tables.lock().await;
        Ok(tables.items.get(&item_id).map(|item| item.available_count))
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn conditional_decrement(&mut self, item_id: ItemId) -> Result<bool> {
        match self.working.items.get_mut(&item_id) {
            Some(item) if item.available_count > 0 => {
                item.available_count -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn conditional_increment(&mut self, item_id: ItemId) -> Result<bool> {
        Faults::take(&mut self.faults.lock().unwrap().fail_increment, "increment")?;

        match self.working.items.get_mut(&item_id) {
            Some(item) => {
                item.available_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_entry(&mut self, entry: &LedgerEntry) -> Result<()> {
        Faults::take(&mut self.faults.lock().unwrap().fail_insert, "insert")?;

        if !self.working.items.contains_key(&entry.item_id) {
            return Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("ledger entry references unknown item {}", entry.item_id),
            )));
        }
        self.working.entries.push(entry.clone());
        Ok(())
    }

    async fn close_oldest_open_entry(
        &mut self,
        item_id: ItemId,
        borrower_id: BorrowerId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<LedgerEntry>> {
        let Some(target) = ledger::oldest_open_entry(&self.working.entries, item_id, borrower_id)
            .map(|e| e.loan_id)
        else {
            return Ok(None);
        };

        let Some(entry) = self.working.entries.iter_mut().find(|e| e.loan_id == target) else {
            return Ok(None);
        };

        let closed = ledger::close_entry(entry, returned_at);
        if let Some(closed) = &closed {
            *entry = closed.clone();
        }
        Ok(closed)
    }

    async fn item_exists(&mut self, item_id: ItemId) -> Result<bool> {
        Ok(self.working.items.contains_key(&item_id))
    }

    async fn borrower_exists(&mut self, borrower_id: BorrowerId) -> Result<bool> {
        Ok(self.working.borrowers.contains_key(&borrower_id))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            mut guard,
            working,
            faults,
        } = *self;

        Faults::take(&mut faults.lock().unwrap().fail_commit, "commit")?;

        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        // 作業用コピーを捨ててロックを解放する
        drop(self);
        Ok(())
    }
}
