use garde::Validate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::rules::not_blank;

/// Request body for creating an author.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorCreateDto {
    #[garde(length(chars, min = 1, max = 50), custom(not_blank))]
    pub first_name: String,
    #[garde(length(chars, min = 1, max = 50), custom(not_blank))]
    pub last_name: String,
}

/// Request body for replacing an author; `id` must match the path.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorUpdateDto {
    #[garde(range(min = 1))]
    pub id: i64,
    #[garde(length(chars, min = 1, max = 50), custom(not_blank))]
    pub first_name: String,
    #[garde(length(chars, min = 1, max = 50), custom(not_blank))]
    pub last_name: String,
}

/// Author as returned to clients, with the books they wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub books: Vec<AuthorBookDto>,
}

/// Short book projection nested in [`AuthorDto`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorBookDto {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub isbn: String,
}
