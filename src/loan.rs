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

//! Loan records.
//!
//! A loan follows a two-state lifecycle:
//! - [`LoanStatus::Active`] → [`LoanStatus::Closed`] (via return)
//!
//! The return date is set exactly once and is never earlier than the borrow
//! date. Fines are derived from the dates on demand, never stored.

use crate::base::{BookId, LoanId, PatronId};
use crate::policy::{Fine, LoanPolicy};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Closed,
}

/// Snapshot of a loan record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Loan {
    pub id: LoanId,
    pub patron_id: PatronId,
    pub book_id: BookId,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        match self.return_date {
            None => LoanStatus::Active,
            Some(_) => LoanStatus::Closed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.return_date.is_none()
    }

    /// Returns `true` if the loan is still out and `today` is past the due date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && today > self.due_date
    }

    /// Computes the fine for this loan.
    ///
    /// An active loan accrues up to `today`; a closed loan's fine is fixed at
    /// its return date and `today` is ignored.
    pub fn fine(&self, policy: &LoanPolicy, today: NaiveDate) -> Fine {
        policy.fine(self.due_date, self.return_date.unwrap_or(today))
    }
}

/// Result of a successful return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnReceipt {
    /// The loan after closing.
    pub loan: Loan,
    /// Fine as of the return date. Informational, not persisted.
    pub fine: Fine,
}

/// Read-only projection of an active loan with its live fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveLoan {
    pub loan_id: LoanId,
    pub patron_id: PatronId,
    pub patron_name: String,
    pub patron_email: String,
    pub book_id: BookId,
    pub book_title: String,
    pub borrow_date: NaiveDate,
    pub due_date: NaiveDate,
    pub is_overdue: bool,
    pub days_late: u32,
    pub fine: Decimal,
}

/// Journal entry for a completed loan operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LoanEvent {
    Borrowed {
        loan_id: LoanId,
        patron_id: PatronId,
        book_id: BookId,
        date: NaiveDate,
        due_date: NaiveDate,
    },
    Returned {
        loan_id: LoanId,
        patron_id: PatronId,
        book_id: BookId,
        date: NaiveDate,
        fine: Fine,
    },
}

impl LoanEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Self::Borrowed { loan_id, .. } => *loan_id,
            Self::Returned { loan_id, .. } => *loan_id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Borrowed { date, .. } => *date,
            Self::Returned { date, .. } => *date,
        }
    }
}
