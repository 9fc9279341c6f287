use crate::domain::{
    catalog::{Borrower, BorrowerPatch, Item, ItemPatch, ItemQuery, NewBorrower, NewItem},
    value_objects::{BorrowerId, ItemId},
};
use crate::ports::catalog::{Catalog as CatalogTrait, ItemDeletion, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, postgres::PgRow};

use super::ledger_store::to_count;

const ITEM_COLUMNS: &str =
    "item_id, title, author, isbn, shelf_location, available_count, created_at";
const BORROWER_COLUMNS: &str = "borrower_id, name, email, created_at";

/// PostgreSQLの行データをItemに変換する
///
/// available_countのi32からu32への変換でエラーハンドリングを行う。
fn map_row_to_item(row: &PgRow) -> Result<Item> {
    Ok(Item {
        item_id: ItemId::from_uuid(row.try_get("item_id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        isbn: row.try_get("isbn")?,
        shelf_location: row.try_get("shelf_location")?,
        available_count: to_count(row.try_get("available_count")?)?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_row_to_borrower(row: &PgRow) -> Result<Borrower> {
    Ok(Borrower {
        borrower_id: BorrowerId::from_uuid(row.try_get("borrower_id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

/// LIKE のワイルドカードをエスケープする
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// CatalogのPostgreSQL実装
///
/// 資料は `items`、利用者は `borrowers` テーブルに保存する。
/// `available_count` は登録時にのみ書き込む。
pub struct Catalog {
    pool: PgPool,
}

impl Catalog {
    /// PostgreSQLコネクションプールから新しいCatalogを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        let sql = format!("SELECT {} FROM items WHERE item_id = $1", ITEM_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(item_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_item).transpose()
    }

    async fn find_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let sql = format!(
            "SELECT {} FROM borrowers WHERE borrower_id = $1",
            BORROWER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(borrower_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_borrower).transpose()
    }
}

#[async_trait]
impl CatalogTrait for Catalog {
    async fn list_items(&self) -> Result<Vec<Item>> {
        let sql = format!(
            "SELECT {} FROM items ORDER BY title ASC, created_at ASC",
            ITEM_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_item).collect()
    }

    async fn create_item(&self, new_item: NewItem) -> Result<Item> {
        let item = new_item.into_item(ItemId::new(), Utc::now());
        let available_count = i32::try_from(item.available_count).map_err(|_| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("copies out of range: {}", item.available_count),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;

        let sql = format!(
            r#"
            INSERT INTO items (
                item_id,
                title,
                author,
                isbn,
                shelf_location,
                available_count,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ITEM_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(item.item_id.value())
            .bind(&item.title)
            .bind(&item.author)
            .bind(&item.isbn)
            .bind(&item.shelf_location)
            .bind(available_count)
            .bind(item.created_at)
            .fetch_one(&self.pool)
            .await?;

        map_row_to_item(&row)
    }

    /// 指定されたフィールドだけを UPDATE する
    async fn update_item(&self, item_id: ItemId, patch: ItemPatch) -> Result<Option<Item>> {
        if patch.is_empty() {
            return self.find_item(item_id).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE items SET ");
        let mut assignments = builder.separated(", ");
        if let Some(title) = patch.title {
            assignments.push("title = ").push_bind_unseparated(title);
        }
        if let Some(author) = patch.author {
            assignments.push("author = ").push_bind_unseparated(author);
        }
        if let Some(isbn) = patch.isbn {
            assignments.push("isbn = ").push_bind_unseparated(isbn);
        }
        if let Some(shelf_location) = patch.shelf_location {
            assignments
                .push("shelf_location = ")
                .push_bind_unseparated(shelf_location);
        }
        builder
            .push(" WHERE item_id = ")
            .push_bind(item_id.value())
            .push(" RETURNING ")
            .push(ITEM_COLUMNS);

        let row = builder.build().fetch_optional(&self.pool).await?;

        row.as_ref().map(map_row_to_item).transpose()
    }

    /// 台帳から参照されている資料は外部キー制約で削除が拒否される
    async fn delete_item(&self, item_id: ItemId) -> Result<ItemDeletion> {
        let sql = format!(
            "DELETE FROM items WHERE item_id = $1 RETURNING {}",
            ITEM_COLUMNS
        );
        let result = sqlx::query(&sql)
            .bind(item_id.value())
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(Some(row)) => Ok(ItemDeletion::Deleted(map_row_to_item(&row)?)),
            Ok(None) => Ok(ItemDeletion::NotFound),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                Ok(ItemDeletion::InUse)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn search_items(&self, query: ItemQuery) -> Result<Vec<Item>> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder.push(ITEM_COLUMNS).push(" FROM items WHERE TRUE");
        if let Some(title) = &query.title {
            builder
                .push(" AND title ILIKE ")
                .push_bind(format!("%{}%", escape_like(title)));
        }
        if let Some(author) = &query.author {
            builder
                .push(" AND author ILIKE ")
                .push_bind(format!("%{}%", escape_like(author)));
        }
        if let Some(isbn) = query.isbn {
            builder.push(" AND isbn = ").push_bind(isbn);
        }
        builder.push(" ORDER BY title ASC, created_at ASC");

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_item).collect()
    }

    async fn list_borrowers(&self) -> Result<Vec<Borrower>> {
        let sql = format!(
            "SELECT {} FROM borrowers ORDER BY created_at ASC",
            BORROWER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_borrower).collect()
    }

    async fn create_borrower(&self, new_borrower: NewBorrower) -> Result<Borrower> {
        let borrower = new_borrower.into_borrower(BorrowerId::new(), Utc::now());

        let sql = format!(
            r#"
            INSERT INTO borrowers (borrower_id, name, email, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BORROWER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(borrower.borrower_id.value())
            .bind(&borrower.name)
            .bind(&borrower.email)
            .bind(borrower.created_at)
            .fetch_one(&self.pool)
            .await?;

        map_row_to_borrower(&row)
    }

    async fn update_borrower(
        &self,
        borrower_id: BorrowerId,
        patch: BorrowerPatch,
    ) -> Result<Option<Borrower>> {
        if patch.name.is_none() && patch.email.is_none() {
            return self.find_borrower(borrower_id).await;
        }

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE borrowers SET ");
        let mut assignments = builder.separated(", ");
        if let Some(name) = patch.name {
            assignments.push("name = ").push_bind_unseparated(name);
        }
        if let Some(email) = patch.email {
            assignments.push("email = ").push_bind_unseparated(email);
        }
        builder
            .push(" WHERE borrower_id = ")
            .push_bind(borrower_id.value())
            .push(" RETURNING ")
            .push(BORROWER_COLUMNS);

        let row = builder.build().fetch_optional(&self.pool).await?;

        row.as_ref().map(map_row_to_borrower).transpose()
    }

    /// 台帳エントリは残す。延滞一覧では名前なしで表示される
    async fn delete_borrower(&self, borrower_id: BorrowerId) -> Result<Option<Borrower>> {
        let sql = format!(
            "DELETE FROM borrowers WHERE borrower_id = $1 RETURNING {}",
            BORROWER_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(borrower_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_borrower).transpose()
    }
}
