use crate::modules::books::models::Book;

/// Persistence model for a row of the `authors` table.
#[derive(Debug, Clone, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct Author {
    /// Storage-assigned identifier; `0` until created
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Books referencing this author, loaded on read
    #[sqlx(skip)]
    pub books: Vec<Book>,
}
