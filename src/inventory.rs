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

//! Inventory ledger.
//!
//! Owns every [`Book`] and the catalog-code index that keeps codes unique.
//! Books are handed out as `Arc<Book>` so callers never hold a map shard
//! lock while working on a book.

use crate::LibraryError;
use crate::base::{BookId, required};
use crate::book::Book;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe book catalog with unique catalog codes.
#[derive(Debug)]
pub struct Inventory {
    /// Books indexed by ID.
    books: DashMap<BookId, Arc<Book>>,
    /// Catalog code to book ID, the uniqueness constraint on codes.
    catalog_codes: DashMap<String, BookId>,
    next_id: AtomicU32,
}

impl Inventory {
    /// Creates an empty inventory. IDs start at 1.
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
            catalog_codes: DashMap::new(),
            next_id: AtomicU32::new(1),
        }
    }

    /// Catalogs a new book with every copy available.
    ///
    /// Text fields are trimmed before storing.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::MissingField`] - a text field is blank.
    /// - [`LibraryError::InvalidCopyCount`] - `total_copies` is zero.
    /// - [`LibraryError::DuplicateCatalogCode`] - the code is already catalogued.
    pub fn add(
        &self,
        title: &str,
        author: &str,
        catalog_code: &str,
        total_copies: u32,
    ) -> Result<Arc<Book>, LibraryError> {
        let title = required(title, "title")?;
        let author = required(author, "author")?;
        let catalog_code = required(catalog_code, "isbn")?;
        if total_copies == 0 {
            return Err(LibraryError::InvalidCopyCount);
        }

        // Claim the code first; the entry API makes check-and-insert atomic.
        let id = match self.catalog_codes.entry(catalog_code.clone()) {
            Entry::Occupied(_) => return Err(LibraryError::DuplicateCatalogCode(catalog_code)),
            Entry::Vacant(entry) => {
                let id = BookId(self.next_id.fetch_add(1, Ordering::SeqCst));
                entry.insert(id);
                id
            }
        };

        let book = Arc::new(Book::new(id, title, author, catalog_code, total_copies));
        self.books.insert(id, Arc::clone(&book));
        Ok(book)
    }

    /// Retrieves a book by ID.
    pub fn get(&self, id: BookId) -> Option<Arc<Book>> {
        self.books.get(&id).map(|book| Arc::clone(book.value()))
    }

    /// Looks up a book by its catalog code.
    pub fn find_by_code(&self, catalog_code: &str) -> Option<Arc<Book>> {
        let id = *self.catalog_codes.get(catalog_code.trim())?;
        self.get(id)
    }

    /// Returns every book, ordered by ID.
    pub fn all(&self) -> Vec<Arc<Book>> {
        let mut books: Vec<Arc<Book>> = self
            .books
            .iter()
            .map(|book| Arc::clone(book.value()))
            .collect();
        books.sort_by_key(|book| book.id());
        books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}
