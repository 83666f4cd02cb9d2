//! Records ("notes") held in the vault, and the partial form used to
//! create or update them.
//!
//! Category-specific fields live in `RecordKind`, which is flattened into
//! the record's JSON with a `category` tag:
//!
//! ```json
//! {"id":"lx3k9a1b2c","title":"Bank","content":"","createdAt":"…","updatedAt":"…",
//!  "category":"credential","username":"u","secret":"s","url":""}
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::errors::{NoteVaultError, Result};

/// What kind of secret a record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Credential,
    Card,
    Document,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Card => "card",
            Self::Document => "document",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = NoteVaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "credential" | "login" | "password" => Ok(Self::Credential),
            "card" => Ok(Self::Card),
            "document" | "doc" => Ok(Self::Document),
            "other" => Ok(Self::Other),
            _ => Err(NoteVaultError::CommandFailed(format!(
                "unknown category '{s}' — expected credential, card, document or other"
            ))),
        }
    }
}

/// Category-specific payload of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum RecordKind {
    Credential {
        #[serde(default)]
        username: String,
        #[serde(default)]
        secret: String,
        #[serde(default)]
        url: String,
    },
    Card {
        #[serde(default, rename = "cardNumber")]
        card_number: String,
        #[serde(default)]
        expiry: String,
        #[serde(default)]
        cvv: String,
        #[serde(default)]
        holder: String,
    },
    Document,
    Other,
}

impl RecordKind {
    /// A payload of the given category with every field empty.
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Credential => Self::Credential {
                username: String::new(),
                secret: String::new(),
                url: String::new(),
            },
            Category::Card => Self::Card {
                card_number: String::new(),
                expiry: String::new(),
                cvv: String::new(),
                holder: String::new(),
            },
            Category::Document => Self::Document,
            Category::Other => Self::Other,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Credential { .. } => Category::Credential,
            Self::Card { .. } => Category::Card,
            Self::Document => Category::Document,
            Self::Other => Category::Other,
        }
    }

    /// Overwrite the fields the draft specifies.  Fields that belong to
    /// another category are ignored.
    fn merge(&mut self, draft: &RecordDraft) {
        match self {
            Self::Credential {
                username,
                secret,
                url,
            } => {
                assign(username, &draft.username);
                assign(secret, &draft.secret);
                assign(url, &draft.url);
            }
            Self::Card {
                card_number,
                expiry,
                cvv,
                holder,
            } => {
                assign(card_number, &draft.card_number);
                assign(expiry, &draft.expiry);
                assign(cvv, &draft.cvv);
                assign(holder, &draft.holder);
            }
            Self::Document | Self::Other => {}
        }
    }
}

fn assign(field: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        field.clone_from(v);
    }
}

/// A single vault record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique within the vault, never changes after creation.
    pub id: String,

    pub title: String,

    /// Free-form body text.
    #[serde(default)]
    pub content: String,

    pub created_at: DateTime<Utc>,

    /// Always `>= created_at`.
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub kind: RecordKind,
}

impl Record {
    /// Build a new record from a draft.  Unspecified fields are empty and
    /// an unspecified category becomes `Other`.
    pub(crate) fn from_draft(id: String, draft: &RecordDraft, now: DateTime<Utc>) -> Self {
        let mut kind = RecordKind::empty(draft.category.unwrap_or(Category::Other));
        kind.merge(draft);

        Self {
            id,
            title: draft.title.clone().unwrap_or_default(),
            content: draft.content.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
            kind,
        }
    }

    /// Merge a partial update onto this record and bump `updated_at`.
    ///
    /// Switching category starts the new category's fields from empty.
    pub(crate) fn apply(&mut self, draft: &RecordDraft, now: DateTime<Utc>) {
        if let Some(title) = &draft.title {
            self.title.clone_from(title);
        }
        if let Some(content) = &draft.content {
            self.content.clone_from(content);
        }

        if let Some(category) = draft.category {
            if category != self.kind.category() {
                self.kind = RecordKind::empty(category);
            }
        }
        self.kind.merge(draft);

        self.updated_at = now.max(self.created_at);
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn username(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Credential { username, .. } => Some(username),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            RecordKind::Credential { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Case-insensitive substring match over title, username, url and
    /// content.  `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);

        hit(self.title.as_str())
            || self.username().is_some_and(hit)
            || self.url().is_some_and(hit)
            || hit(self.content.as_str())
    }

    /// Best-effort wipe of the sensitive strings before the record is dropped.
    pub(crate) fn wipe(&mut self) {
        self.title.zeroize();
        self.content.zeroize();
        match &mut self.kind {
            RecordKind::Credential {
                username,
                secret,
                url,
            } => {
                username.zeroize();
                secret.zeroize();
                url.zeroize();
            }
            RecordKind::Card {
                card_number,
                expiry,
                cvv,
                holder,
            } => {
                card_number.zeroize();
                expiry.zeroize();
                cvv.zeroize();
                holder.zeroize();
            }
            RecordKind::Document | RecordKind::Other => {}
        }
    }
}

/// A record submitted from a form: every field optional.
///
/// With `id` unset it creates a record; with `id` set it updates that
/// record, leaving unspecified fields as they were.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub id: Option<String>,
    pub title: Option<String>,
    pub category: Option<Category>,
    pub content: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
    pub url: Option<String>,
    pub card_number: Option<String>,
    pub expiry: Option<String>,
    pub cvv: Option<String>,
    pub holder: Option<String>,
}

impl RecordDraft {
    /// Draft for a brand-new record.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Draft that updates the record with this id.
    pub fn update(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn title(mut self, v: impl Into<String>) -> Self {
        self.title = Some(v.into());
        self
    }

    pub fn category(mut self, v: Category) -> Self {
        self.category = Some(v);
        self
    }

    pub fn content(mut self, v: impl Into<String>) -> Self {
        self.content = Some(v.into());
        self
    }

    pub fn username(mut self, v: impl Into<String>) -> Self {
        self.username = Some(v.into());
        self
    }

    pub fn secret(mut self, v: impl Into<String>) -> Self {
        self.secret = Some(v.into());
        self
    }

    pub fn url(mut self, v: impl Into<String>) -> Self {
        self.url = Some(v.into());
        self
    }

    pub fn card_number(mut self, v: impl Into<String>) -> Self {
        self.card_number = Some(v.into());
        self
    }

    pub fn expiry(mut self, v: impl Into<String>) -> Self {
        self.expiry = Some(v.into());
        self
    }

    pub fn cvv(mut self, v: impl Into<String>) -> Self {
        self.cvv = Some(v.into());
        self
    }

    pub fn holder(mut self, v: impl Into<String>) -> Self {
        self.holder = Some(v.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn json_shape_is_flat_and_camel_case() {
        let draft = RecordDraft::new("Visa")
            .category(Category::Card)
            .card_number("4111")
            .holder("A. Person");
        let rec = Record::from_draft("abc".into(), &draft, ts(1_700_000_000));

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["category"], "card");
        assert_eq!(json["cardNumber"], "4111");
        assert_eq!(json["holder"], "A. Person");
        assert!(json.get("createdAt").is_some());

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn missing_category_fields_default_to_empty() {
        let json = r#"{"id":"x","title":"t","createdAt":"2024-01-01T00:00:00Z",
            "updatedAt":"2024-01-01T00:00:00Z","category":"credential","username":"bob"}"#;
        let rec: Record = serde_json::from_str(json).unwrap();
        assert_eq!(rec.username(), Some("bob"));
        assert_eq!(rec.url(), Some(""));
        assert_eq!(rec.content, "");
    }

    #[test]
    fn apply_preserves_unspecified_fields() {
        let draft = RecordDraft::new("Bank")
            .category(Category::Credential)
            .username("u")
            .secret("s");
        let mut rec = Record::from_draft("id1".into(), &draft, ts(100));

        rec.apply(&RecordDraft::update("id1").title("new"), ts(200));

        assert_eq!(rec.title, "new");
        assert_eq!(rec.username(), Some("u"));
        assert_eq!(rec.created_at, ts(100));
        assert_eq!(rec.updated_at, ts(200));
    }

    #[test]
    fn apply_never_moves_updated_before_created() {
        let mut rec = Record::from_draft("id".into(), &RecordDraft::new("t"), ts(500));
        rec.apply(&RecordDraft::update("id").content("c"), ts(10));
        assert!(rec.updated_at >= rec.created_at);
    }

    #[test]
    fn changing_category_resets_kind() {
        let draft = RecordDraft::new("x")
            .category(Category::Credential)
            .username("u");
        let mut rec = Record::from_draft("id".into(), &draft, ts(1));
        rec.apply(
            &RecordDraft::update("id").category(Category::Card).cvv("123"),
            ts(2),
        );
        assert_eq!(rec.category(), Category::Card);
        assert_eq!(rec.username(), None);
        match &rec.kind {
            RecordKind::Card { cvv, .. } => assert_eq!(cvv, "123"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn matches_searches_title_username_url_content() {
        let draft = RecordDraft::new("Email")
            .category(Category::Credential)
            .username("Alice")
            .url("https://Mail.example.com")
            .secret("hunter2");
        let rec = Record::from_draft("id".into(), &draft, ts(1));

        assert!(rec.matches("email"));
        assert!(rec.matches("alice"));
        assert!(rec.matches("mail.example"));
        assert!(!rec.matches("hunter2"), "secrets are not searchable");
    }

    #[test]
    fn category_parsing() {
        assert_eq!("Card".parse::<Category>().unwrap(), Category::Card);
        assert_eq!("login".parse::<Category>().unwrap(), Category::Credential);
        assert!("pizza".parse::<Category>().is_err());
    }
}
