use bookshelf_kernel::Entity;
use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Storage-assigned book identifier.
pub type BookId = i64;

/// Catalogue entry as stored and exchanged over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Absent until the book has been persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    pub title: String,
    pub author: String,
    pub pages: i32,
    pub price: f64,
    #[serde(with = "iso_date")]
    pub release_date: Date,
    pub online: bool,
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> Option<BookId> {
        self.id
    }

    fn with_id(self, id: BookId) -> Self {
        Self {
            id: Some(id),
            ..self
        }
    }
}
