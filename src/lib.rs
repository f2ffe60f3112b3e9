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

//! # Library Loans
//!
//! This library provides a loan lifecycle engine for a lending library:
//! cataloguing books, registering patrons, borrowing and returning copies,
//! and deriving overdue fines on demand instead of storing them.
//!
//! ## Core Components
//!
//! - [`Library`]: Central engine coordinating inventory, patrons, and loans
//! - [`Book`] / [`Inventory`]: Book records with total and available copy counts
//! - [`PatronRegistry`]: Patrons with unique contact identifiers
//! - [`Loan`]: Loan records, active until returned
//! - [`compute_fine`]: Pure fine derivation from due and reference dates
//! - [`LibraryError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use library_loans::Library;
//! use rust_decimal_macros::dec;
//!
//! let library = Library::new();
//! let book = library.add_book("Dune", "Frank Herbert", "978-0441013593", 1).unwrap();
//! let patron = library.add_patron("Ada", "ada@example.com").unwrap();
//!
//! let borrowed = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
//! let loan = library.borrow(patron, book, borrowed).unwrap();
//! assert_eq!(loan.due_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
//! assert_eq!(library.book(book).unwrap().available_copies, 0);
//!
//! // Returned six days late at 5 per day.
//! let returned = NaiveDate::from_ymd_opt(2024, 1, 21).unwrap();
//! let receipt = library.return_loan(loan.id, returned).unwrap();
//! assert_eq!(receipt.fine.amount, dec!(30));
//! assert_eq!(library.book(book).unwrap().available_copies, 1);
//! ```
//!
//! ## Thread Safety
//!
//! [`Library`] is `Send + Sync`. Borrows and returns of the same book are
//! serialized on that book's lock, so two patrons racing for the last copy
//! cannot both win; operations on different books run in parallel.

mod base;
pub mod book;
pub mod config;
mod engine;
pub mod error;
pub mod inventory;
pub mod loan;
mod loan_table;
pub mod logging;
pub mod patron;
pub mod policy;
pub mod query;

pub use base::{BookId, LoanId, PatronId};
pub use book::{Book, BookRecord};
pub use config::{
    ConfigError, DEFAULT_JOURNAL_CAPACITY, JournalConfig, LibraryConfig, LogFormat, LoggingConfig,
    MAX_DAILY_FINE,
};
pub use engine::Library;
pub use error::{ErrorKind, LibraryError};
pub use inventory::Inventory;
pub use loan::{ActiveLoan, Loan, LoanEvent, LoanStatus, ReturnReceipt};
pub use patron::{Patron, PatronRegistry};
pub use policy::{DEFAULT_DAILY_FINE, DEFAULT_GRACE_PERIOD_DAYS, Fine, LoanPolicy, compute_fine};
pub use query::{BookQuery, BookSort};
