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

//! Loan policy and fine derivation.
//!
//! Fines are never stored. They are a pure function of a due date, a
//! reference date, and the daily rate:
//!
//! ```text
//! days_late = max(0, reference_date - due_date)
//! fine      = days_late * daily_fine
//! ```
//!
//! For an active loan the reference date is "today"; for a closed loan it
//! is the loan's own return date, which freezes the fine at return.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use library_loans::compute_fine;
//! use rust_decimal_macros::dec;
//!
//! let due = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
//! let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//!
//! let fine = compute_fine(due, today, dec!(5));
//! assert_eq!(fine.days_late, 5);
//! assert_eq!(fine.amount, dec!(25));
//! ```

use crate::LibraryError;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Days between borrowing and the due date unless configured otherwise.
pub const DEFAULT_GRACE_PERIOD_DAYS: u32 = 14;

/// Fine per day past due unless configured otherwise.
pub const DEFAULT_DAILY_FINE: Decimal = dec!(5);

/// Business parameters of the loan lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanPolicy {
    /// Days from the borrow date to the due date.
    pub grace_period_days: u32,
    /// Amount charged per whole day past the due date.
    pub daily_fine: Decimal,
}

impl LoanPolicy {
    /// Returns the due date of a loan borrowed on `borrow_date`.
    ///
    /// # Errors
    ///
    /// [`LibraryError::DateOutOfRange`] if the due date is past the end of
    /// the supported calendar.
    pub fn due_date(&self, borrow_date: NaiveDate) -> Result<NaiveDate, LibraryError> {
        borrow_date
            .checked_add_days(Days::new(u64::from(self.grace_period_days)))
            .ok_or(LibraryError::DateOutOfRange)
    }

    /// Computes the fine for `due_date` as of `reference_date` at this policy's rate.
    pub fn fine(&self, due_date: NaiveDate, reference_date: NaiveDate) -> Fine {
        compute_fine(due_date, reference_date, self.daily_fine)
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
            daily_fine: DEFAULT_DAILY_FINE,
        }
    }
}

/// A derived fine. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fine {
    /// Whole days past the due date, zero if not late.
    pub days_late: u32,
    /// `days_late * daily_fine`.
    pub amount: Decimal,
}

impl Fine {
    /// No days late, nothing owed.
    pub const NONE: Fine = Fine {
        days_late: 0,
        amount: Decimal::ZERO,
    };

    /// Returns `true` if anything is owed.
    pub fn is_due(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// Computes the fine owed for an item due on `due_date`, evaluated on
/// `reference_date`.
///
/// Pure: the same inputs always give the same result. A reference date on or
/// before the due date yields [`Fine::NONE`].
///
/// If `days_late * daily_fine` overflows [`Decimal`], the amount saturates at
/// [`Decimal::MAX`]. Rates within [`MAX_DAILY_FINE`](crate::MAX_DAILY_FINE)
/// cannot overflow over any calendar span.
pub fn compute_fine(due_date: NaiveDate, reference_date: NaiveDate, daily_fine: Decimal) -> Fine {
    let days_late = reference_date.signed_duration_since(due_date).num_days();
    if days_late <= 0 {
        return Fine::NONE;
    }

    // NaiveDate spans well under u32::MAX days.
    let days_late = u32::try_from(days_late).unwrap_or(u32::MAX);
    let amount = daily_fine
        .checked_mul(Decimal::from(days_late))
        .unwrap_or(Decimal::MAX);

    Fine { days_late, amount }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fine_is_zero_on_due_date() {
        assert_eq!(
            compute_fine(date(2024, 1, 10), date(2024, 1, 10), dec!(5)),
            Fine::NONE
        );
    }

    #[test]
    fn fine_is_zero_before_due_date() {
        assert_eq!(
            compute_fine(date(2024, 1, 10), date(2024, 1, 9), dec!(5)),
            Fine::NONE
        );
        assert_eq!(
            compute_fine(date(2024, 1, 10), date(2023, 6, 1), dec!(5)),
            Fine::NONE
        );
    }

    #[test]
    fn fine_accrues_per_day_late() {
        let fine = compute_fine(date(2024, 1, 10), date(2024, 1, 15), dec!(5));
        assert_eq!(fine.days_late, 5);
        assert_eq!(fine.amount, dec!(25));
        assert!(fine.is_due());
    }

    #[test]
    fn fine_spans_month_and_leap_day() {
        let fine = compute_fine(date(2024, 2, 27), date(2024, 3, 2), dec!(5));
        assert_eq!(fine.days_late, 4);
        assert_eq!(fine.amount, dec!(20));
    }

    #[test]
    fn fractional_rate_is_exact() {
        let fine = compute_fine(date(2024, 1, 1), date(2024, 1, 4), dec!(0.35));
        assert_eq!(fine.amount, dec!(1.05));
    }

    #[test]
    fn zero_rate_counts_days_but_owes_nothing() {
        let fine = compute_fine(date(2024, 1, 1), date(2024, 1, 4), Decimal::ZERO);
        assert_eq!(fine.days_late, 3);
        assert!(!fine.is_due());
    }

    #[test]
    fn default_policy_is_fourteen_days_at_five() {
        let policy = LoanPolicy::default();
        assert_eq!(policy.grace_period_days, 14);
        assert_eq!(policy.daily_fine, dec!(5));
        assert_eq!(policy.due_date(date(2024, 1, 1)).unwrap(), date(2024, 1, 15));
    }

    #[test]
    fn due_date_past_calendar_end_is_rejected() {
        let policy = LoanPolicy::default();
        assert_eq!(
            policy.due_date(NaiveDate::MAX),
            Err(LibraryError::DateOutOfRange)
        );
    }

    #[test]
    fn overflowing_fine_saturates() {
        let fine = compute_fine(NaiveDate::MIN, NaiveDate::MAX, Decimal::MAX);
        assert!(fine.days_late > 0);
        assert_eq!(fine.amount, Decimal::MAX);
    }

    #[test]
    fn capped_rate_never_saturates() {
        let fine = compute_fine(NaiveDate::MIN, NaiveDate::MAX, crate::MAX_DAILY_FINE);
        assert!(fine.amount < Decimal::MAX);
        assert_eq!(fine.amount, Decimal::from(fine.days_late) * crate::MAX_DAILY_FINE);
    }
}
