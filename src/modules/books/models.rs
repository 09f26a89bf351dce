/// Persistence model for a row of the `books` table.
#[derive(Debug, Clone, PartialEq, Eq, Default, sqlx::FromRow)]
pub struct Book {
    /// Storage-assigned identifier; `0` until created
    pub id: i64,
    pub title: String,
    /// Publication year
    pub year: i32,
    pub isbn: String,
    pub summary: Option<String>,
    /// Cover image location
    pub image: Option<String>,
    /// Owning author, if any
    pub author_id: Option<i64>,
}
