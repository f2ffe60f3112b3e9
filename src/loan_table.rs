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

//! Loan table with an enforced one-active-loan-per-pair index.
//!
//! Combines a [`DashMap`] of loan records with a second map keyed by
//! `(patron, book)` that holds only active loans. Claiming a vacant entry in
//! that index is the uniqueness constraint; closing a loan releases it.
//! Completed operations are appended to a lock-free [`SegQueue`] journal
//! that keeps at most `journal_capacity` events, dropping the oldest.

use crate::LibraryError;
use crate::base::{BookId, LoanId, PatronId};
use crate::config::DEFAULT_JOURNAL_CAPACITY;
use crate::loan::{Loan, LoanEvent};
use chrono::NaiveDate;
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub(crate) struct LoanTable {
    /// Every loan ever opened, active or closed.
    loans: DashMap<LoanId, Loan>,
    /// Active loans by `(patron, book)`. At most one entry per pair.
    active: DashMap<(PatronId, BookId), LoanId>,
    /// Completed operations in FIFO order, drained by the caller.
    journal: SegQueue<LoanEvent>,
    /// Upper bound on undrained events. `0` disables the journal.
    journal_capacity: usize,
    next_id: AtomicU64,
}

impl LoanTable {
    pub(crate) fn new() -> Self {
        Self {
            loans: DashMap::new(),
            active: DashMap::new(),
            journal: SegQueue::new(),
            journal_capacity: DEFAULT_JOURNAL_CAPACITY,
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn set_journal_capacity(&mut self, capacity: usize) {
        self.journal_capacity = capacity;
        while self.journal.len() > capacity {
            self.journal.pop();
        }
    }

    /// Returns the active loan for the pair, if any.
    pub(crate) fn active_loan(&self, patron_id: PatronId, book_id: BookId) -> Option<LoanId> {
        self.active.get(&(patron_id, book_id)).map(|id| *id)
    }

    /// Opens a new active loan.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::DuplicateActiveLoan`] if the patron already has
    /// an active loan for the book.
    pub(crate) fn open(
        &self,
        patron_id: PatronId,
        book_id: BookId,
        borrow_date: NaiveDate,
        due_date: NaiveDate,
    ) -> Result<Loan, LibraryError> {
        // Entry API gives an atomic check-and-insert on the pair.
        let id = match self.active.entry((patron_id, book_id)) {
            Entry::Occupied(_) => {
                return Err(LibraryError::DuplicateActiveLoan { patron_id, book_id });
            }
            Entry::Vacant(entry) => {
                let id = LoanId(self.next_id.fetch_add(1, Ordering::SeqCst));
                entry.insert(id);
                id
            }
        };

        let loan = Loan {
            id,
            patron_id,
            book_id,
            borrow_date,
            due_date,
            return_date: None,
        };
        self.loans.insert(id, loan.clone());
        Ok(loan)
    }

    /// Closes an active loan on `return_date`.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::LoanNotFound`] - no such loan.
    /// - [`LibraryError::LoanAlreadyClosed`] - the loan was already returned.
    /// - [`LibraryError::ReturnBeforeBorrow`] - `return_date` precedes the borrow date.
    pub(crate) fn close(&self, loan_id: LoanId, return_date: NaiveDate) -> Result<Loan, LibraryError> {
        let closed = {
            let mut loan = self
                .loans
                .get_mut(&loan_id)
                .ok_or(LibraryError::LoanNotFound(loan_id))?;
            if loan.return_date.is_some() {
                return Err(LibraryError::LoanAlreadyClosed(loan_id));
            }
            if return_date < loan.borrow_date {
                return Err(LibraryError::ReturnBeforeBorrow(loan_id));
            }
            loan.return_date = Some(return_date);
            loan.clone()
        };

        // Shard guards are never held across maps.
        self.active
            .remove_if(&(closed.patron_id, closed.book_id), |_, id| *id == loan_id);
        Ok(closed)
    }

    pub(crate) fn get(&self, loan_id: LoanId) -> Option<Loan> {
        self.loans.get(&loan_id).map(|loan| loan.value().clone())
    }

    /// Returns loans matching `filter`, ordered by ID.
    pub(crate) fn snapshot(&self, filter: impl Fn(&Loan) -> bool) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self
            .loans
            .iter()
            .filter(|loan| filter(loan.value()))
            .map(|loan| loan.value().clone())
            .collect();
        loans.sort_by_key(|loan| loan.id);
        loans
    }

    pub(crate) fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Appends an event, evicting the oldest once the journal is full.
    pub(crate) fn record(&self, event: LoanEvent) {
        if self.journal_capacity == 0 {
            return;
        }
        self.journal.push(event);
        while self.journal.len() > self.journal_capacity {
            if self.journal.pop().is_none() {
                break;
            }
        }
    }

    /// Removes and returns every journaled event, oldest first.
    pub(crate) fn drain(&self) -> Vec<LoanEvent> {
        let mut events = Vec::with_capacity(self.journal.len());
        while let Some(event) = self.journal.pop() {
            events.push(event);
        }
        events
    }
}
