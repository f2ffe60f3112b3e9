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

//! Loan lifecycle engine.
//!
//! The [`Library`] is the central component that owns the inventory, the
//! patron registry, and the loan table, and is the only code path that
//! moves copies between the shelf and patrons.
//!
//! # Operations
//!
//! - **Borrow**: Opens a loan due after the grace period and takes one copy
//!   off the shelf.
//! - **Return**: Closes the loan, puts the copy back, and reports the fine.
//! - **Active loans**: Projects every open loan with its live fine.
//!
//! # Thread Safety
//!
//! Each borrow or return runs while holding the book's copy mutex, so all
//! loan operations on one title are serialized while different titles
//! proceed in parallel. Map shard guards are short-lived and never held
//! while waiting on a book mutex.

use crate::base::{BookId, LoanId, PatronId};
use crate::book::BookRecord;
use crate::config::LibraryConfig;
use crate::inventory::Inventory;
use crate::loan::{ActiveLoan, Loan, LoanEvent, ReturnReceipt};
use crate::loan_table::LoanTable;
use crate::patron::{Patron, PatronRegistry};
use crate::policy::{Fine, LoanPolicy};
use crate::query::BookQuery;
use crate::LibraryError;
use chrono::NaiveDate;

/// Library loan engine managing books, patrons, and loans.
///
/// # Invariants
///
/// - `0 <= available_copies <= total_copies` for every book.
/// - `total_copies - available_copies` equals the number of active loans of
///   the book.
/// - At most one active loan per `(patron, book)` pair.
/// - A return date, once set, never changes and is never before the borrow date.
pub struct Library {
    inventory: Inventory,
    patrons: PatronRegistry,
    loans: LoanTable,
    policy: LoanPolicy,
}

impl Library {
    /// Creates an empty library with the default loan policy.
    pub fn new() -> Self {
        Self::with_policy(LoanPolicy::default())
    }

    /// Creates an empty library with a custom loan policy.
    pub fn with_policy(policy: LoanPolicy) -> Self {
        Library {
            inventory: Inventory::new(),
            patrons: PatronRegistry::new(),
            loans: LoanTable::new(),
            policy,
        }
    }

    /// Creates an empty library using the loan and journal sections of `config`.
    pub fn from_config(config: &LibraryConfig) -> Self {
        Self::with_policy(config.loans).with_journal_capacity(config.journal.capacity)
    }

    /// Limits undrained journal events to `capacity`, dropping the oldest
    /// first. `0` turns the journal off.
    pub fn with_journal_capacity(mut self, capacity: usize) -> Self {
        self.loans.set_journal_capacity(capacity);
        self
    }

    /// Returns the grace period and fine rate in effect.
    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// Catalogs a book with every copy available.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::DuplicateCatalogCode`] - Catalog code already registered.
    /// - [`LibraryError::InvalidCopyCount`] - `total_copies` is zero.
    /// - [`LibraryError::MissingField`] - A text field is blank.
    pub fn add_book(
        &self,
        title: &str,
        author: &str,
        catalog_code: &str,
        total_copies: u32,
    ) -> Result<BookId, LibraryError> {
        match self.inventory.add(title, author, catalog_code, total_copies) {
            Ok(book) => {
                tracing::debug!(
                    book_id = %book.id(),
                    catalog_code = book.catalog_code(),
                    total_copies,
                    "book added"
                );
                Ok(book.id())
            }
            Err(e) => {
                tracing::debug!(error = %e, "book rejected");
                Err(e)
            }
        }
    }

    /// Registers a patron.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::DuplicateContact`] - Contact already registered.
    /// - [`LibraryError::MissingField`] - Name or contact is blank.
    pub fn add_patron(&self, name: &str, contact: &str) -> Result<PatronId, LibraryError> {
        match self.patrons.add(name, contact) {
            Ok(patron) => {
                tracing::debug!(patron_id = %patron.id, "patron registered");
                Ok(patron.id)
            }
            Err(e) => {
                tracing::debug!(error = %e, "patron rejected");
                Err(e)
            }
        }
    }

    /// Lends one copy of `book_id` to `patron_id` on `today`.
    ///
    /// The loan is due `grace_period_days` after `today`. Either both the loan
    /// and the copy decrement happen, or neither does.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    ///
    /// - [`LibraryError::PatronNotFound`] - Unknown patron.
    /// - [`LibraryError::BookNotFound`] - Unknown book.
    /// - [`LibraryError::DateOutOfRange`] - Due date overflows the calendar.
    /// - [`LibraryError::DuplicateActiveLoan`] - Patron already holds this book.
    /// - [`LibraryError::NoCopiesAvailable`] - Every copy is on loan.
    pub fn borrow(
        &self,
        patron_id: PatronId,
        book_id: BookId,
        today: NaiveDate,
    ) -> Result<Loan, LibraryError> {
        let result = self.try_borrow(patron_id, book_id, today);
        match &result {
            Ok(loan) => tracing::debug!(
                loan_id = %loan.id,
                %patron_id,
                %book_id,
                due_date = %loan.due_date,
                "book borrowed"
            ),
            Err(e) => tracing::debug!(%patron_id, %book_id, error = %e, "borrow rejected"),
        }
        result
    }

    fn try_borrow(
        &self,
        patron_id: PatronId,
        book_id: BookId,
        today: NaiveDate,
    ) -> Result<Loan, LibraryError> {
        if !self.patrons.contains(patron_id) {
            return Err(LibraryError::PatronNotFound(patron_id));
        }
        let book = self
            .inventory
            .get(book_id)
            .ok_or(LibraryError::BookNotFound(book_id))?;
        let due_date = self.policy.due_date(today)?;

        let mut copies = book.lock_copies();

        // Pre-check for a clear error; the loan table index enforces it below.
        if self.loans.active_loan(patron_id, book_id).is_some() {
            return Err(LibraryError::DuplicateActiveLoan { patron_id, book_id });
        }

        copies.check_out()?;
        let loan = match self.loans.open(patron_id, book_id, today, due_date) {
            Ok(loan) => loan,
            Err(e) => {
                copies.check_in()?;
                return Err(e);
            }
        };

        self.loans.record(LoanEvent::Borrowed {
            loan_id: loan.id,
            patron_id,
            book_id,
            date: today,
            due_date,
        });
        Ok(loan)
    }

    /// Closes `loan_id` on `today` and puts the copy back on the shelf.
    ///
    /// Returns the closed loan and its fine as of `today`. The fine is not
    /// stored anywhere.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::LoanNotFound`] - Unknown loan.
    /// - [`LibraryError::LoanAlreadyClosed`] - Loan was already returned.
    /// - [`LibraryError::ReturnBeforeBorrow`] - `today` precedes the borrow date.
    pub fn return_loan(
        &self,
        loan_id: LoanId,
        today: NaiveDate,
    ) -> Result<ReturnReceipt, LibraryError> {
        let result = self.try_return(loan_id, today);
        match &result {
            Ok(receipt) => tracing::debug!(
                %loan_id,
                book_id = %receipt.loan.book_id,
                days_late = receipt.fine.days_late,
                fine = %receipt.fine.amount,
                "book returned"
            ),
            Err(e) => tracing::debug!(%loan_id, error = %e, "return rejected"),
        }
        result
    }

    fn try_return(&self, loan_id: LoanId, today: NaiveDate) -> Result<ReturnReceipt, LibraryError> {
        let loan = self
            .loans
            .get(loan_id)
            .ok_or(LibraryError::LoanNotFound(loan_id))?;
        if !loan.is_active() {
            return Err(LibraryError::LoanAlreadyClosed(loan_id));
        }
        let book = self
            .inventory
            .get(loan.book_id)
            .ok_or(LibraryError::BookNotFound(loan.book_id))?;

        let mut copies = book.lock_copies();
        // Returns of this loan are serialized on the book lock; re-read it.
        if self.loans.get(loan_id).is_none_or(|loan| !loan.is_active()) {
            return Err(LibraryError::LoanAlreadyClosed(loan_id));
        }
        if !copies.has_checked_out() {
            return Err(LibraryError::InventoryMismatch(loan.book_id));
        }

        let closed = self.loans.close(loan_id, today)?;
        copies.check_in()?;

        let fine = closed.fine(&self.policy, today);
        self.loans.record(LoanEvent::Returned {
            loan_id,
            patron_id: closed.patron_id,
            book_id: closed.book_id,
            date: today,
            fine,
        });

        Ok(ReturnReceipt { loan: closed, fine })
    }

    /// Lists every active loan with its fine accrued as of `today`.
    ///
    /// Ordered by due date, then loan ID. Read-only.
    pub fn active_loans(&self, today: NaiveDate) -> Vec<ActiveLoan> {
        let mut active: Vec<ActiveLoan> = self
            .loans
            .snapshot(Loan::is_active)
            .into_iter()
            .filter_map(|loan| {
                let patron = self.patrons.get(loan.patron_id)?;
                let book = self.inventory.get(loan.book_id)?;
                let fine = self.policy.fine(loan.due_date, today);
                Some(ActiveLoan {
                    loan_id: loan.id,
                    patron_id: patron.id,
                    patron_name: patron.name,
                    patron_email: patron.contact,
                    book_id: book.id(),
                    book_title: book.title().to_owned(),
                    borrow_date: loan.borrow_date,
                    due_date: loan.due_date,
                    is_overdue: loan.is_overdue(today),
                    days_late: fine.days_late,
                    fine: fine.amount,
                })
            })
            .collect();
        active.sort_by_key(|loan| (loan.due_date, loan.loan_id));
        active
    }

    /// Computes a fine at this library's rate. Pure.
    pub fn compute_fine(&self, due_date: NaiveDate, reference_date: NaiveDate) -> Fine {
        self.policy.fine(due_date, reference_date)
    }

    /// Returns the fine of any loan: accrued to `today` if active, frozen at
    /// the return date if closed.
    ///
    /// # Errors
    ///
    /// [`LibraryError::LoanNotFound`] if the loan does not exist.
    pub fn fine_for(&self, loan_id: LoanId, today: NaiveDate) -> Result<Fine, LibraryError> {
        self.loans
            .get(loan_id)
            .map(|loan| loan.fine(&self.policy, today))
            .ok_or(LibraryError::LoanNotFound(loan_id))
    }

    pub fn book(&self, book_id: BookId) -> Option<BookRecord> {
        self.inventory.get(book_id).map(|book| book.record())
    }

    pub fn book_by_code(&self, catalog_code: &str) -> Option<BookRecord> {
        self.inventory.find_by_code(catalog_code).map(|book| book.record())
    }

    /// Returns books matching `query`, in the query's order.
    pub fn books(&self, query: &BookQuery) -> Vec<BookRecord> {
        query.apply(self.inventory.all().iter().map(|book| book.record()))
    }

    /// Returns books with at least one copy on the shelf, by title.
    pub fn available_books(&self) -> Vec<BookRecord> {
        self.books(&BookQuery::available())
    }

    pub fn patron(&self, patron_id: PatronId) -> Option<Patron> {
        self.patrons.get(patron_id)
    }

    /// Returns every patron ordered by name, case-insensitively.
    pub fn patrons(&self) -> Vec<Patron> {
        let mut patrons = self.patrons.all();
        patrons.sort_by_cached_key(|patron| (patron.name.to_lowercase(), patron.id));
        patrons
    }

    pub fn loan(&self, loan_id: LoanId) -> Option<Loan> {
        self.loans.get(loan_id)
    }

    /// Returns every loan, active and closed, ordered by ID.
    pub fn loans(&self) -> Vec<Loan> {
        self.loans.snapshot(|_| true)
    }

    /// Returns a patron's loan history, ordered by ID.
    pub fn patron_loans(&self, patron_id: PatronId) -> Vec<Loan> {
        self.loans.snapshot(|loan| loan.patron_id == patron_id)
    }

    pub fn active_loan_count(&self) -> usize {
        self.loans.active_count()
    }

    /// Removes and returns journaled loan events, oldest first.
    ///
    /// Only the most recent events up to the journal capacity are kept.
    pub fn drain_events(&self) -> Vec<LoanEvent> {
        self.loans.drain()
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::new()
    }
}
