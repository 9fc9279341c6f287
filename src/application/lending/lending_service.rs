use crate::application::{LendingPolicy, ServiceDependencies};
use crate::domain::{
    commands::{BorrowItem, ReturnItem},
    ledger::{self, LedgerEntry},
};
use crate::ports::LedgerTransaction;
use std::future::Future;

use super::errors::{LendingError, Result};

/// 1件の作業単位を独立したタスクで最後まで実行する
///
/// 呼び出し側のFutureが破棄されても、トランザクションは
/// コミットかロールバックのどちらかで必ず完了する。
async fn run_to_completion<T, F>(unit: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(unit)
        .await
        .map_err(|e| LendingError::TransactionFailed(Box::new(e)))?
}

/// トランザクションをロールバックし、元のエラーを返す
///
/// ロールバックの完了を待ってから戻る。
/// ロールバック自体の失敗はログに残し、元のエラーを優先する。
async fn abort(tx: Box<dyn LedgerTransaction>, error: LendingError) -> LendingError {
    if let Err(e) = tx.rollback().await {
        tracing::error!(error = %e, cause = %error, "Rollback failed");
    }
    error
}

/// 資料を貸し出す
///
/// ビジネスルール：
/// - 返却期限は要求時刻より後であること
/// - （ポリシーで要求する場合）利用者が登録済みであること
/// - 資料が存在し、貸出可能数が1以上であること
///
/// 貸出可能数の減算と台帳エントリの追加は1つのトランザクションで行う。
/// 減算は条件付き更新で判定と書き込みを不可分に行うため、
/// 最後の1冊に対する同時貸出はどちらか一方だけが成功する。
///
/// # 戻り値
/// 作成された台帳エントリ
///
/// # エラー
/// - InvalidDueDate: 返却期限が未来でない
/// - BorrowerNotFound: 利用者が未登録
/// - ItemNotFound: 資料が存在しない
/// - ItemUnavailable: 貸出可能な冊数がない
/// - TransactionFailed: ストアの障害
pub async fn borrow_item(deps: &ServiceDependencies, cmd: BorrowItem) -> Result<LedgerEntry> {
    // 1. 返却期限の検証（ストアに触れる前）
    let entry = ledger::open_entry(cmd.item_id, cmd.borrower_id, cmd.requested_at, cmd.due_at)
        .map_err(LendingError::InvalidDueDate)?;

    let deps = deps.clone();
    run_to_completion(async move {
        let mut tx = deps
            .ledger_store
            .begin()
            .await
            .map_err(LendingError::TransactionFailed)?;

        // 2. トランザクション内の手順
        let outcome = borrow_steps(tx.as_mut(), deps.policy, &entry).await;
        if let Err(e) = outcome {
            tracing::debug!(item_id = %entry.item_id, borrower_id = %entry.borrower_id, error = %e, "Borrow rejected");
            return Err(abort(tx, e).await);
        }

        // 3. コミット
        tx.commit().await.map_err(LendingError::TransactionFailed)?;

        tracing::info!(
            loan_id = %entry.loan_id,
            item_id = %entry.item_id,
            borrower_id = %entry.borrower_id,
            due_at = %entry.due_at,
            "Item borrowed"
        );
        Ok(entry)
    })
    .await
}

async fn borrow_steps(
    tx: &mut dyn LedgerTransaction,
    policy: LendingPolicy,
    entry: &LedgerEntry,
) -> Result<()> {
    if policy.require_registered_borrower
        && !tx
            .borrower_exists(entry.borrower_id)
            .await
            .map_err(LendingError::TransactionFailed)?
    {
        return Err(LendingError::BorrowerNotFound);
    }

    let decremented = tx
        .conditional_decrement(entry.item_id)
        .await
        .map_err(LendingError::TransactionFailed)?;

    if !decremented {
        // 減算できなかった理由を区別する（資料なし／在庫なし）
        let exists = tx
            .item_exists(entry.item_id)
            .await
            .map_err(LendingError::TransactionFailed)?;
        return Err(if exists {
            LendingError::ItemUnavailable
        } else {
            LendingError::ItemNotFound
        });
    }

    tx.insert_entry(entry)
        .await
        .map_err(LendingError::TransactionFailed)
}

/// 資料を返却する
///
/// ビジネスルール：
/// - 資料・利用者の組で未返却のエントリがあること
/// - 複数ある場合は最も古いエントリを返却する
///
/// エントリの返却と貸出可能数の加算は1つのトランザクションで行う。
/// 返却は `returned_at IS NULL` を条件とした更新のため、
/// 同じ返却を繰り返しても二重に加算されない。
///
/// # エラー
/// - LoanNotFound: 未返却のエントリがない（未貸出・返却済みを区別しない）
/// - ItemNotFound: 加算対象の資料がない（返却も取り消される）
/// - TransactionFailed: ストアの障害
pub async fn return_item(deps: &ServiceDependencies, cmd: ReturnItem) -> Result<LedgerEntry> {
    let deps = deps.clone();
    run_to_completion(async move {
        let mut tx = deps
            .ledger_store
            .begin()
            .await
            .map_err(LendingError::TransactionFailed)?;

        let outcome = return_steps(tx.as_mut(), &cmd).await;
        let closed = match outcome {
            Ok(closed) => closed,
            Err(e) => {
                tracing::debug!(item_id = %cmd.item_id, borrower_id = %cmd.borrower_id, error = %e, "Return rejected");
                return Err(abort(tx, e).await);
            }
        };

        tx.commit().await.map_err(LendingError::TransactionFailed)?;

        tracing::info!(
            loan_id = %closed.loan_id,
            item_id = %closed.item_id,
            borrower_id = %closed.borrower_id,
            "Item returned"
        );
        Ok(closed)
    })
    .await
}

async fn return_steps(tx: &mut dyn LedgerTransaction, cmd: &ReturnItem) -> Result<LedgerEntry> {
    let closed = tx
        .close_oldest_open_entry(cmd.item_id, cmd.borrower_id, cmd.returned_at)
        .await
        .map_err(LendingError::TransactionFailed)?
        .ok_or(LendingError::LoanNotFound)?;

    let incremented = tx
        .conditional_increment(cmd.item_id)
        .await
        .map_err(LendingError::TransactionFailed)?;

    if !incremented {
        return Err(LendingError::ItemNotFound);
    }

    Ok(closed)
}
