// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Read-only book queries: search, availability filter, and sort order.
//!
//! # Example
//!
//! ```
//! use library_loans::{BookQuery, BookSort, Library};
//!
//! let library = Library::new();
//! library.add_book("Emma", "Jane Austen", "978-0141439587", 2).unwrap();
//! library.add_book("Dune", "Frank Herbert", "978-0441013593", 5).unwrap();
//!
//! let query = BookQuery::new()
//!     .with_search("austen")
//!     .sorted_by(BookSort::AvailableCopies);
//! let books = library.books(&query);
//! assert_eq!(books.len(), 1);
//! assert_eq!(books[0].title, "Emma");
//! ```

use crate::book::BookRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Book listing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookSort {
    /// Title ascending, case-insensitive.
    #[default]
    Title,
    /// Most available copies first, then title.
    AvailableCopies,
}

impl BookSort {
    /// Parses a sort key, falling back to [`BookSort::Title`] for unknown keys.
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "available_copies" => Self::AvailableCopies,
            _ => Self::Title,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::AvailableCopies => "available_copies",
        }
    }
}

/// Filter and order for book listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    /// Lowercased search term; `None` matches everything.
    search: Option<String>,
    sort: BookSort,
    available_only: bool,
}

impl BookQuery {
    /// Matches every book, ordered by title.
    pub fn new() -> Self {
        Self::default()
    }

    /// Matches books with at least one copy on the shelf, ordered by title.
    pub fn available() -> Self {
        Self::new().only_available()
    }

    /// Restricts to books whose title or author contains `term`,
    /// case-insensitively. A blank term is ignored.
    pub fn with_search(mut self, term: &str) -> Self {
        let term = term.trim();
        self.search = (!term.is_empty()).then(|| term.to_lowercase());
        self
    }

    pub fn sorted_by(mut self, sort: BookSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn only_available(mut self) -> Self {
        self.available_only = true;
        self
    }

    pub fn sort(&self) -> BookSort {
        self.sort
    }

    pub fn matches(&self, book: &BookRecord) -> bool {
        if self.available_only && book.available_copies == 0 {
            return false;
        }
        match &self.search {
            None => true,
            Some(term) => {
                book.title.to_lowercase().contains(term)
                    || book.author.to_lowercase().contains(term)
            }
        }
    }

    /// Filters and orders `books`.
    pub fn apply(&self, books: impl IntoIterator<Item = BookRecord>) -> Vec<BookRecord> {
        let mut matched: Vec<BookRecord> =
            books.into_iter().filter(|book| self.matches(book)).collect();
        match self.sort {
            BookSort::Title => {
                matched.sort_by_cached_key(|book| (book.title.to_lowercase(), book.id));
            }
            BookSort::AvailableCopies => matched.sort_by_cached_key(|book| {
                (
                    Reverse(book.available_copies),
                    book.title.to_lowercase(),
                    book.id,
                )
            }),
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::BookId;

    fn record(id: u32, title: &str, author: &str, available: u32) -> BookRecord {
        BookRecord {
            id: BookId(id),
            title: title.into(),
            author: author.into(),
            catalog_code: format!("code-{id}"),
            total_copies: 5,
            available_copies: available,
        }
    }

    fn shelf() -> Vec<BookRecord> {
        vec![
            record(1, "dune", "Frank Herbert", 2),
            record(2, "Emma", "Jane Austen", 0),
            record(3, "Persuasion", "Jane Austen", 4),
            record(4, "Beloved", "Toni Morrison", 2),
        ]
    }

    fn ids(books: &[BookRecord]) -> Vec<u32> {
        books.iter().map(|book| book.id.0).collect()
    }

    #[test]
    fn default_sorts_by_title_ignoring_case() {
        let books = BookQuery::new().apply(shelf());
        assert_eq!(ids(&books), vec![4, 1, 2, 3]);
    }

    #[test]
    fn available_copies_sort_descends_then_title() {
        let books = BookQuery::new()
            .sorted_by(BookSort::AvailableCopies)
            .apply(shelf());
        assert_eq!(ids(&books), vec![3, 4, 1, 2]);
    }

    #[test]
    fn search_matches_title_or_author() {
        let books = BookQuery::new().with_search("AUSTEN").apply(shelf());
        assert_eq!(ids(&books), vec![2, 3]);

        let books = BookQuery::new().with_search("belov").apply(shelf());
        assert_eq!(ids(&books), vec![4]);
    }

    #[test]
    fn blank_search_matches_everything() {
        assert_eq!(BookQuery::new().with_search("   ").apply(shelf()).len(), 4);
    }

    #[test]
    fn available_skips_exhausted_books() {
        let books = BookQuery::available().apply(shelf());
        assert_eq!(ids(&books), vec![4, 1, 3]);
    }

    #[test]
    fn unknown_sort_key_falls_back_to_title() {
        assert_eq!(BookSort::from_key("available_copies"), BookSort::AvailableCopies);
        assert_eq!(BookSort::from_key("title"), BookSort::Title);
        assert_eq!(BookSort::from_key("isbn; DROP TABLE"), BookSort::Title);
    }
}
