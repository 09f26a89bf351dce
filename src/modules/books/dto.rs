use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::rules::not_blank;

/// Request body for creating a book.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BookCreateDto {
    #[garde(length(chars, min = 1, max = 200), custom(not_blank))]
    pub title: String,
    #[garde(range(min = 0, max = 9999))]
    pub year: i32,
    #[garde(length(chars, min = 1, max = 32), custom(not_blank))]
    pub isbn: String,
    #[garde(length(chars, max = 500))]
    pub summary: Option<String>,
    #[garde(length(chars, max = 2048))]
    pub image: Option<String>,
    /// Optional; when set it must name an existing author
    #[garde(range(min = 1))]
    pub author_id: Option<i64>,
}

/// Request body for replacing a book; `id` must match the path.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct BookUpdateDto {
    #[garde(range(min = 1))]
    pub id: i64,
    #[garde(length(chars, min = 1, max = 200), custom(not_blank))]
    pub title: String,
    #[garde(range(min = 0, max = 9999))]
    pub year: i32,
    #[garde(length(chars, min = 1, max = 32), custom(not_blank))]
    pub isbn: String,
    #[garde(length(chars, max = 500))]
    pub summary: Option<String>,
    #[garde(length(chars, max = 2048))]
    pub image: Option<String>,
    #[garde(range(min = 1))]
    pub author_id: Option<i64>,
}

/// Book as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookDto {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub isbn: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub author_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> BookCreateDto {
        BookCreateDto {
            title: "Emma".into(),
            year: 1815,
            isbn: "978-0141439587".into(),
            ..BookCreateDto::default()
        }
    }

    #[test]
    fn complete_book_is_valid() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_fields_deserialize_as_invalid() {
        let dto: BookCreateDto = serde_json::from_str(r#"{"year": 1815}"#).unwrap();
        let report = dto.validate().unwrap_err();

        let fields: Vec<String> = report.iter().map(|(path, _)| path.to_string()).collect();
        assert!(fields.contains(&"title".to_string()));
        assert!(fields.contains(&"isbn".to_string()));
    }

    #[test]
    fn bounds_are_enforced() {
        let too_late = BookCreateDto {
            year: 10_000,
            ..valid()
        };
        assert!(too_late.validate().is_err());

        let long_summary = BookCreateDto {
            summary: Some("x".repeat(501)),
            ..valid()
        };
        assert!(long_summary.validate().is_err());

        let bad_author = BookCreateDto {
            author_id: Some(0),
            ..valid()
        };
        assert!(bad_author.validate().is_err());
    }

    #[test]
    fn text_limits_count_characters() {
        let multibyte = BookCreateDto {
            title: "字".repeat(200),
            summary: Some("ü".repeat(500)),
            ..valid()
        };
        assert!(multibyte.validate().is_ok());

        let long_title = BookCreateDto {
            title: "字".repeat(201),
            ..valid()
        };
        assert!(long_title.validate().is_err());
    }

    #[test]
    fn blank_title_is_rejected() {
        let dto = BookCreateDto {
            title: "  ".into(),
            ..valid()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn author_id_is_read_from_camel_case() {
        let dto: BookUpdateDto =
            serde_json::from_str(r#"{"id": 3, "title": "Emma", "year": 1815, "isbn": "x", "authorId": 5}"#)
                .unwrap();
        assert_eq!(dto.author_id, Some(5));
        assert!(dto.validate().is_ok());
    }
}
