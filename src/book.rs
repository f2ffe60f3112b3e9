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

//! Book records and copy accounting.
//!
//! Copies are fungible counters. A book tracks how many copies it owns and
//! how many are on the shelf:
//!
//! ```text
//!  available ──check_out──► available - 1   (borrow)
//!  available ◄──check_in─── available + 1   (return)
//!
//!  invariant: 0 <= available <= total
//! ```
//!
//! The counters are only reachable through [`Book::lock_copies`], which is
//! crate-private: the loan engine is the sole writer.

use crate::LibraryError;
use crate::base::BookId;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;

/// Copy counters for one book, guarded by the book's mutex.
#[derive(Debug)]
pub(crate) struct CopyCounts {
    book_id: BookId,
    total: u32,
    available: u32,
}

impl CopyCounts {
    fn new(book_id: BookId, total: u32) -> Self {
        Self {
            book_id,
            total,
            available: total,
        }
    }

    fn assert_invariants(&self) {
        debug_assert!(
            self.available <= self.total,
            "Invariant violated: book {} has {} available of {} total",
            self.book_id,
            self.available,
            self.total
        );
    }

    pub(crate) fn available(&self) -> u32 {
        self.available
    }

    /// Takes one copy off the shelf (borrow).
    pub(crate) fn check_out(&mut self) -> Result<(), LibraryError> {
        if self.available == 0 {
            return Err(LibraryError::NoCopiesAvailable(self.book_id));
        }
        self.available -= 1;
        self.assert_invariants();
        Ok(())
    }

    /// Puts one copy back on the shelf (return).
    pub(crate) fn check_in(&mut self) -> Result<(), LibraryError> {
        if self.available >= self.total {
            return Err(LibraryError::InventoryMismatch(self.book_id));
        }
        self.available += 1;
        self.assert_invariants();
        Ok(())
    }

    /// Returns `true` if a copy can be checked back in.
    pub(crate) fn has_checked_out(&self) -> bool {
        self.available < self.total
    }
}

/// A catalogued book title.
///
/// Descriptive fields are immutable; copy counters sit behind a mutex that
/// the loan engine holds for the whole of a borrow or return.
#[derive(Debug)]
pub struct Book {
    id: BookId,
    title: String,
    author: String,
    catalog_code: String,
    copies: Mutex<CopyCounts>,
}

impl Book {
    pub(crate) fn new(
        id: BookId,
        title: String,
        author: String,
        catalog_code: String,
        total_copies: u32,
    ) -> Self {
        Self {
            id,
            title,
            author,
            catalog_code,
            copies: Mutex::new(CopyCounts::new(id, total_copies)),
        }
    }

    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    /// External catalog identifier, e.g. an ISBN.
    pub fn catalog_code(&self) -> &str {
        &self.catalog_code
    }

    pub fn total_copies(&self) -> u32 {
        self.copies.lock().total
    }

    pub fn available_copies(&self) -> u32 {
        self.copies.lock().available
    }

    /// Returns `total - available`, the number of copies on loan.
    pub fn checked_out_copies(&self) -> u32 {
        let copies = self.copies.lock();
        copies.total - copies.available
    }

    /// Returns a consistent point-in-time copy of the book.
    pub fn record(&self) -> BookRecord {
        let copies = self.copies.lock();
        BookRecord {
            id: self.id,
            title: self.title.clone(),
            author: self.author.clone(),
            catalog_code: self.catalog_code.clone(),
            total_copies: copies.total,
            available_copies: copies.available,
        }
    }

    /// Locks the copy counters. Held for the duration of a borrow or return.
    pub(crate) fn lock_copies(&self) -> MutexGuard<'_, CopyCounts> {
        self.copies.lock()
    }
}

/// Snapshot of a [`Book`], detached from its lock.
///
/// This is the only serialized form of a book; `catalog_code` is written as
/// `isbn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(rename = "isbn")]
    pub catalog_code: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(total: u32) -> Book {
        Book::new(
            BookId(1),
            "Dune".into(),
            "Frank Herbert".into(),
            "978-0441013593".into(),
            total,
        )
    }

    // === CopyCounts Internal Tests ===

    #[test]
    fn new_book_has_all_copies_available() {
        let book = book(3);
        assert_eq!(book.total_copies(), 3);
        assert_eq!(book.available_copies(), 3);
        assert_eq!(book.checked_out_copies(), 0);
    }

    #[test]
    fn check_out_and_in_round_trip() {
        let book = book(2);
        {
            let mut copies = book.lock_copies();
            copies.check_out().unwrap();
            copies.check_out().unwrap();
            assert_eq!(copies.available(), 0);
        }
        assert_eq!(book.checked_out_copies(), 2);

        book.lock_copies().check_in().unwrap();
        assert_eq!(book.available_copies(), 1);
    }

    #[test]
    fn check_out_with_no_copies_fails() {
        let book = book(1);
        book.lock_copies().check_out().unwrap();

        let result = book.lock_copies().check_out();
        assert_eq!(result, Err(LibraryError::NoCopiesAvailable(BookId(1))));
        assert_eq!(book.available_copies(), 0);
    }

    #[test]
    fn check_in_beyond_total_fails() {
        let book = book(1);
        let mut copies = book.lock_copies();
        assert!(!copies.has_checked_out());

        let result = copies.check_in();
        assert_eq!(result, Err(LibraryError::InventoryMismatch(BookId(1))));
        assert_eq!(copies.available(), 1);
    }

    // === Serialization Tests ===

    #[test]
    fn record_serializes_counters() {
        let book = book(4);
        book.lock_copies().check_out().unwrap();

        let parsed = serde_json::to_value(book.record()).unwrap();

        assert_eq!(parsed["id"], 1);
        assert_eq!(parsed["title"], "Dune");
        assert_eq!(parsed["isbn"], "978-0441013593");
        assert_eq!(parsed["total_copies"], 4);
        assert_eq!(parsed["available_copies"], 3);
    }
}
