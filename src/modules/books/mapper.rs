//! Conversions between book DTOs and the persistence model.

use super::dto::{BookCreateDto, BookDto, BookUpdateDto};
use super::models::Book;

pub fn from_create(dto: BookCreateDto) -> Book {
    Book {
        id: 0,
        title: dto.title,
        year: dto.year,
        isbn: dto.isbn,
        summary: dto.summary,
        image: dto.image,
        author_id: dto.author_id,
    }
}

pub fn from_update(dto: BookUpdateDto) -> Book {
    Book {
        id: dto.id,
        title: dto.title,
        year: dto.year,
        isbn: dto.isbn,
        summary: dto.summary,
        image: dto.image,
        author_id: dto.author_id,
    }
}

pub fn to_dto(book: &Book) -> BookDto {
    BookDto {
        id: book.id,
        title: book.title.clone(),
        year: book.year,
        isbn: book.isbn.clone(),
        summary: book.summary.clone(),
        image: book.image.clone(),
        author_id: book.author_id,
    }
}
