use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BorrowerId, DomainError, ItemId};

// ============================================================================
// エンティティ
// ============================================================================

/// 資料（カタログ上の書籍）
///
/// `available_count` は貸出処理だけが変更する。カタログ更新では変わらない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub shelf_location: String,
    pub available_count: u32,
    pub created_at: DateTime<Utc>,
}

/// 利用者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrower {
    pub borrower_id: BorrowerId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// 入力（検証済み）
// ============================================================================

/// 資料の新規登録内容
///
/// `copies` は所蔵冊数で、登録時の `available_count` になる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub shelf_location: String,
    pub copies: u32,
}

impl NewItem {
    pub fn new(
        title: &str,
        author: &str,
        isbn: &str,
        shelf_location: &str,
        copies: u32,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            title: non_empty("title", title)?,
            author: non_empty("author", author)?,
            isbn: parse_isbn(isbn)?,
            shelf_location: non_empty("shelf_location", shelf_location)?,
            copies,
        })
    }

    /// 登録時刻とIDを与えて資料を作る
    pub fn into_item(self, item_id: ItemId, created_at: DateTime<Utc>) -> Item {
        Item {
            item_id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            shelf_location: self.shelf_location,
            available_count: self.copies,
            created_at,
        }
    }
}

/// 資料の部分更新
///
/// 指定されたフィールドだけを変更する。貸出可能数は含まない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub shelf_location: Option<String>,
}

impl ItemPatch {
    pub fn new(
        title: Option<&str>,
        author: Option<&str>,
        isbn: Option<&str>,
        shelf_location: Option<&str>,
    ) -> Result<Self, DomainError> {
        let patch = Self {
            title: title.map(|v| non_empty("title", v)).transpose()?,
            author: author.map(|v| non_empty("author", v)).transpose()?,
            isbn: isbn.map(parse_isbn).transpose()?,
            shelf_location: shelf_location
                .map(|v| non_empty("shelf_location", v))
                .transpose()?,
        };

        if patch.is_empty() {
            return Err(DomainError::NothingToApply(
                "title, author, isbn, shelf_location",
            ));
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.isbn.is_none()
            && self.shelf_location.is_none()
    }

    /// パッチを適用した資料を返す
    pub fn apply(&self, item: &Item) -> Item {
        Item {
            title: self.title.clone().unwrap_or_else(|| item.title.clone()),
            author: self.author.clone().unwrap_or_else(|| item.author.clone()),
            isbn: self.isbn.clone().unwrap_or_else(|| item.isbn.clone()),
            shelf_location: self
                .shelf_location
                .clone()
                .unwrap_or_else(|| item.shelf_location.clone()),
            ..item.clone()
        }
    }
}

/// 資料の検索条件
///
/// タイトル・著者は大文字小文字を区別しない部分一致、ISBNは完全一致。
/// 指定された条件はすべて満たす必要がある。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

impl ItemQuery {
    pub fn new(
        title: Option<&str>,
        author: Option<&str>,
        isbn: Option<&str>,
    ) -> Result<Self, DomainError> {
        let query = Self {
            title: title.map(str::trim).filter(|v| !v.is_empty()).map(String::from),
            author: author.map(str::trim).filter(|v| !v.is_empty()).map(String::from),
            isbn: isbn.map(normalize_isbn).filter(|v| !v.is_empty()),
        };

        if query.title.is_none() && query.author.is_none() && query.isbn.is_none() {
            return Err(DomainError::NothingToApply("title, author, isbn"));
        }
        Ok(query)
    }

    pub fn matches(&self, item: &Item) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };

        self.title.as_deref().is_none_or(|t| contains(&item.title, t))
            && self.author.as_deref().is_none_or(|a| contains(&item.author, a))
            && self.isbn.as_deref().is_none_or(|i| item.isbn == i)
    }
}

/// 利用者の新規登録内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBorrower {
    pub name: String,
    pub email: String,
}

impl NewBorrower {
    pub fn new(name: &str, email: &str) -> Result<Self, DomainError> {
        Ok(Self {
            name: non_empty("name", name)?,
            email: parse_email(email)?,
        })
    }

    pub fn into_borrower(self, borrower_id: BorrowerId, created_at: DateTime<Utc>) -> Borrower {
        Borrower {
            borrower_id,
            name: self.name,
            email: self.email,
            created_at,
        }
    }
}

/// 利用者の部分更新
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BorrowerPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl BorrowerPatch {
    pub fn new(name: Option<&str>, email: Option<&str>) -> Result<Self, DomainError> {
        let patch = Self {
            name: name.map(|v| non_empty("name", v)).transpose()?,
            email: email.map(parse_email).transpose()?,
        };

        if patch.name.is_none() && patch.email.is_none() {
            return Err(DomainError::NothingToApply("name, email"));
        }
        Ok(patch)
    }

    pub fn apply(&self, borrower: &Borrower) -> Borrower {
        Borrower {
            name: self.name.clone().unwrap_or_else(|| borrower.name.clone()),
            email: self.email.clone().unwrap_or_else(|| borrower.email.clone()),
            ..borrower.clone()
        }
    }
}

// ============================================================================
// 検証関数
// ============================================================================

fn non_empty(field: &'static str, value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidField {
            field,
            reason: "must not be empty",
        });
    }
    Ok(trimmed.to_string())
}

/// ハイフンと空白を除いたISBN
fn normalize_isbn(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// ISBN-10 または ISBN-13 をチェックディジット込みで検証する
pub fn parse_isbn(value: &str) -> Result<String, DomainError> {
    let isbn = normalize_isbn(value);
    let invalid = DomainError::InvalidField {
        field: "isbn",
        reason: "must be a valid ISBN-10 or ISBN-13",
    };

    let valid = match isbn.len() {
        10 => {
            let mut sum = 0u32;
            for (i, c) in isbn.chars().enumerate() {
                let digit = match (c, i) {
                    ('X', 9) => 10,
                    (c, _) => match c.to_digit(10) {
                        Some(d) => d,
                        None => return Err(invalid),
                    },
                };
                sum += digit * (10 - i as u32);
            }
            sum % 11 == 0
        }
        13 => {
            let mut sum = 0u32;
            for (i, c) in isbn.chars().enumerate() {
                let Some(digit) = c.to_digit(10) else {
                    return Err(invalid);
                };
                sum += if i % 2 == 0 { digit } else { digit * 3 };
            }
            sum % 10 == 0
        }
        _ => false,
    };

    if valid { Ok(isbn) } else { Err(invalid) }
}

/// メールアドレスの形式を検証する
pub fn parse_email(value: &str) -> Result<String, DomainError> {
    let email = value.trim();
    let invalid = DomainError::InvalidField {
        field: "email",
        reason: "must be a valid email address",
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid);
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid);
    };
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid);
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> Item {
        NewItem::new("Dune", "Frank Herbert", "978-0-306-40615-7", "A-12", 2)
            .unwrap()
            .into_item(ItemId::new(), Utc::now())
    }

    #[test]
    fn test_parse_isbn_accepts_valid_isbn13() {
        assert_eq!(parse_isbn("978-0-306-40615-7").unwrap(), "9780306406157");
    }

    #[test]
    fn test_parse_isbn_accepts_valid_isbn10_with_x() {
        assert_eq!(parse_isbn("0-8044-2957-x").unwrap(), "080442957X");
        assert_eq!(parse_isbn("0306406152").unwrap(), "0306406152");
    }

    #[test]
    fn test_parse_isbn_rejects_bad_checksum() {
        assert!(parse_isbn("978-0-306-40615-8").is_err());
        assert!(parse_isbn("0306406153").is_err());
    }

    #[test]
    fn test_parse_isbn_rejects_wrong_length_and_letters() {
        assert!(parse_isbn("12345").is_err());
        assert!(parse_isbn("97803064061A7").is_err());
        assert!(parse_isbn("X306406152").is_err());
    }

    #[test]
    fn test_parse_email() {
        assert_eq!(parse_email(" reader@example.org ").unwrap(), "reader@example.org");
        assert!(parse_email("reader@example").is_err());
        assert!(parse_email("@example.org").is_err());
        assert!(parse_email("re ader@example.org").is_err());
        assert!(parse_email("a@b@example.org").is_err());
        assert!(parse_email("reader@.org").is_err());
    }

    #[test]
    fn test_new_item_trims_and_sets_available_count() {
        let item = NewItem::new("  Dune ", "Frank Herbert", "0306406152", "A-12", 3)
            .unwrap()
            .into_item(ItemId::new(), Utc::now());

        assert_eq!(item.title, "Dune");
        assert_eq!(item.available_count, 3);
    }

    #[test]
    fn test_new_item_rejects_empty_title() {
        let result = NewItem::new("   ", "Frank Herbert", "0306406152", "A-12", 1);
        assert_eq!(
            result.unwrap_err(),
            DomainError::InvalidField {
                field: "title",
                reason: "must not be empty"
            }
        );
    }

    #[test]
    fn test_item_patch_requires_a_field() {
        let result = ItemPatch::new(None, None, None, None);
        assert!(matches!(result, Err(DomainError::NothingToApply(_))));
    }

    #[test]
    fn test_item_patch_applies_only_present_fields() {
        let item = sample_item();
        let patch = ItemPatch::new(Some("Dune Messiah"), None, None, Some("B-3")).unwrap();

        let updated = patch.apply(&item);

        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.author, item.author);
        assert_eq!(updated.shelf_location, "B-3");
        assert_eq!(updated.available_count, item.available_count);
        assert_eq!(updated.item_id, item.item_id);
    }

    #[test]
    fn test_item_query_matches_case_insensitive_substring() {
        let item = sample_item();

        let query = ItemQuery::new(Some("dun"), Some("HERBERT"), None).unwrap();
        assert!(query.matches(&item));

        let query = ItemQuery::new(Some("dune"), None, Some("0306406152")).unwrap();
        assert!(!query.matches(&item));

        let query = ItemQuery::new(None, None, Some("978-0306406157")).unwrap();
        assert!(query.matches(&item));
    }

    #[test]
    fn test_item_query_requires_a_criterion() {
        assert!(ItemQuery::new(None, Some("  "), None).is_err());
    }

    #[test]
    fn test_borrower_patch_applies_email() {
        let borrower = NewBorrower::new("Ada", "ada@example.org")
            .unwrap()
            .into_borrower(BorrowerId::new(), Utc::now());
        let patch = BorrowerPatch::new(None, Some("ada@lovelace.dev")).unwrap();

        let updated = patch.apply(&borrower);

        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.email, "ada@lovelace.dev");
    }

    #[test]
    fn test_borrower_patch_rejects_invalid_email() {
        assert!(BorrowerPatch::new(Some("Ada"), Some("not-an-email")).is_err());
        assert!(BorrowerPatch::new(None, None).is_err());
    }
}
