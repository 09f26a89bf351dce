//! Conversions between author DTOs and the persistence model.

use super::dto::{AuthorBookDto, AuthorCreateDto, AuthorDto, AuthorUpdateDto};
use super::models::Author;
use crate::modules::books::models::Book;

pub fn from_create(dto: AuthorCreateDto) -> Author {
    Author {
        id: 0,
        first_name: dto.first_name,
        last_name: dto.last_name,
        books: Vec::new(),
    }
}

pub fn from_update(dto: AuthorUpdateDto) -> Author {
    Author {
        id: dto.id,
        first_name: dto.first_name,
        last_name: dto.last_name,
        books: Vec::new(),
    }
}

pub fn to_dto(author: &Author) -> AuthorDto {
    AuthorDto {
        id: author.id,
        first_name: author.first_name.clone(),
        last_name: author.last_name.clone(),
        books: author.books.iter().map(to_book_summary).collect(),
    }
}

fn to_book_summary(book: &Book) -> AuthorBookDto {
    AuthorBookDto {
        id: book.id,
        title: book.title.clone(),
        year: book.year,
        isbn: book.isbn.clone(),
    }
}
