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

//! Error types for library operations.

use crate::base::{BookId, LoanId, PatronId};
use thiserror::Error;

/// Broad classification of a [`LibraryError`].
///
/// Callers that only need to decide how to react (report, retry, reject the
/// input) can match on the kind instead of every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced patron, book, or loan does not exist.
    NotFound,
    /// The operation collides with existing state.
    Conflict,
    /// No copies are left to lend. Callers may retry later.
    ResourceExhausted,
    /// The arguments themselves are unacceptable.
    InvalidInput,
}

/// Library operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// Referenced patron does not exist
    #[error("patron {0} not found")]
    PatronNotFound(PatronId),

    /// Referenced book does not exist
    #[error("book {0} not found")]
    BookNotFound(BookId),

    /// Referenced loan does not exist
    #[error("loan {0} not found")]
    LoanNotFound(LoanId),

    /// Every copy of the book is checked out
    #[error("no copies of book {0} are available")]
    NoCopiesAvailable(BookId),

    /// Patron already holds an unreturned copy of this book
    #[error("patron {patron_id} already has an active loan for book {book_id}")]
    DuplicateActiveLoan { patron_id: PatronId, book_id: BookId },

    /// Loan has already been returned
    #[error("loan {0} is already closed")]
    LoanAlreadyClosed(LoanId),

    /// Another book is registered under this catalog code
    #[error("a book with catalog code '{0}' already exists")]
    DuplicateCatalogCode(String),

    /// Another patron is registered under this contact
    #[error("a patron with contact '{0}' already exists")]
    DuplicateContact(String),

    /// Return date would precede the borrow date
    #[error("loan {0} cannot be returned before it was borrowed")]
    ReturnBeforeBorrow(LoanId),

    /// A required text field is blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A new book must have at least one copy
    #[error("invalid copy count (must be greater than zero)")]
    InvalidCopyCount,

    /// Date arithmetic left the supported calendar range
    #[error("date out of range")]
    DateOutOfRange,

    /// Copy counters would leave `0..=total`
    #[error("inventory counters for book {0} are inconsistent")]
    InventoryMismatch(BookId),
}

impl LibraryError {
    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PatronNotFound(_) | Self::BookNotFound(_) | Self::LoanNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::DuplicateActiveLoan { .. }
            | Self::LoanAlreadyClosed(_)
            | Self::DuplicateCatalogCode(_)
            | Self::DuplicateContact(_)
            | Self::InventoryMismatch(_) => ErrorKind::Conflict,
            Self::NoCopiesAvailable(_) => ErrorKind::ResourceExhausted,
            Self::ReturnBeforeBorrow(_)
            | Self::MissingField(_)
            | Self::InvalidCopyCount
            | Self::DateOutOfRange => ErrorKind::InvalidInput,
        }
    }
}
