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

//! Property-based tests for the loan engine.
//!
//! These tests verify invariants that should hold for any sequence of
//! borrows and returns, successful or not.

use chrono::{Days, NaiveDate};
use library_loans::{BookId, Library, LibraryError, LoanId, LoanPolicy, PatronId, compute_fine};
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

// =============================================================================
// Arbitrary Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Borrow { patron: u32, book: u32 },
    /// Return the n-th loan ever opened, modulo the number of loans.
    Return { nth: usize },
    /// Advance the clock.
    Wait { days: u64 },
}

fn arb_op(patrons: u32, books: u32) -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1..=patrons + 1, 1..=books + 1).prop_map(|(patron, book)| Op::Borrow { patron, book }),
        3 => any::<usize>().prop_map(|nth| Op::Return { nth }),
        1 => (0u64..10).prop_map(|days| Op::Wait { days }),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..3650).prop_map(|offset| start_date() + Days::new(offset))
}

/// Daily rate from 0.00 to 50.00.
fn arb_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=5000).prop_map(|cents| Decimal::new(cents, 2))
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn make_library(copies: &[u32], patrons: u32) -> Library {
    let library = Library::new();
    for (i, total) in copies.iter().enumerate() {
        library
            .add_book(&format!("Book {i}"), "Author", &format!("isbn-{i}"), *total)
            .unwrap();
    }
    for i in 0..patrons {
        library
            .add_patron(&format!("Patron {i}"), &format!("p{i}@example.com"))
            .unwrap();
    }
    library
}

// =============================================================================
// Inventory Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Copies stay in bounds and always match the active loan count.
    #[test]
    fn copies_match_active_loans(
        copies in prop::collection::vec(1u32..4, 1..5),
        patrons in 1u32..5,
        ops in prop::collection::vec(arb_op(5, 5), 1..80),
    ) {
        let library = make_library(&copies, patrons);
        let mut today = start_date();
        let mut opened: Vec<LoanId> = Vec::new();

        for op in ops {
            match op {
                Op::Borrow { patron, book } => {
                    if let Ok(loan) = library.borrow(PatronId(patron), BookId(book), today) {
                        opened.push(loan.id);
                    }
                }
                Op::Return { nth } if !opened.is_empty() => {
                    let _ = library.return_loan(opened[nth % opened.len()], today);
                }
                Op::Return { .. } => {}
                Op::Wait { days } => today = today + Days::new(days),
            }

            let loans = library.loans();
            for book in library.books(&Default::default()) {
                prop_assert!(book.available_copies <= book.total_copies);
                let active = loans
                    .iter()
                    .filter(|loan| loan.book_id == book.id && loan.is_active())
                    .count() as u32;
                prop_assert_eq!(book.total_copies - book.available_copies, active);
            }
        }
    }

    /// At most one active loan per (patron, book) pair.
    #[test]
    fn one_active_loan_per_pair(
        ops in prop::collection::vec(arb_op(3, 3), 1..80),
    ) {
        let library = make_library(&[3, 3, 3], 3);
        let mut opened: Vec<LoanId> = Vec::new();

        for op in ops {
            match op {
                Op::Borrow { patron, book } => {
                    if let Ok(loan) = library.borrow(PatronId(patron), BookId(book), start_date()) {
                        opened.push(loan.id);
                    }
                }
                Op::Return { nth } if !opened.is_empty() => {
                    let _ = library.return_loan(opened[nth % opened.len()], start_date());
                }
                _ => {}
            }

            let mut pairs = HashSet::new();
            for loan in library.loans().iter().filter(|loan| loan.is_active()) {
                prop_assert!(pairs.insert((loan.patron_id, loan.book_id)));
            }
            prop_assert_eq!(pairs.len(), library.active_loan_count());
        }
    }

    /// Engine outcomes agree with a single-threaded reference model.
    #[test]
    fn engine_matches_reference_model(
        ops in prop::collection::vec(arb_op(3, 2), 1..60),
    ) {
        let copies = [1u32, 2];
        let library = make_library(&copies, 3);
        let mut available: HashMap<u32, u32> = (1..=2).zip(copies).collect();
        let mut active: HashSet<(u32, u32)> = HashSet::new();
        let mut opened: Vec<(LoanId, u32, u32)> = Vec::new();
        let mut closed: HashSet<LoanId> = HashSet::new();

        for op in ops {
            match op {
                Op::Borrow { patron, book } => {
                    let result = library.borrow(PatronId(patron), BookId(book), start_date());
                    if patron > 3 {
                        prop_assert_eq!(result, Err(LibraryError::PatronNotFound(PatronId(patron))));
                    } else if book > 2 {
                        prop_assert_eq!(result, Err(LibraryError::BookNotFound(BookId(book))));
                    } else if active.contains(&(patron, book)) {
                        prop_assert_eq!(
                            result,
                            Err(LibraryError::DuplicateActiveLoan {
                                patron_id: PatronId(patron),
                                book_id: BookId(book),
                            })
                        );
                    } else if available[&book] == 0 {
                        prop_assert_eq!(result, Err(LibraryError::NoCopiesAvailable(BookId(book))));
                    } else {
                        let loan = result.unwrap();
                        *available.get_mut(&book).unwrap() -= 1;
                        active.insert((patron, book));
                        opened.push((loan.id, patron, book));
                    }
                }
                Op::Return { nth } if !opened.is_empty() => {
                    let (loan_id, patron, book) = opened[nth % opened.len()];
                    let result = library.return_loan(loan_id, start_date());
                    if closed.contains(&loan_id) {
                        prop_assert_eq!(result, Err(LibraryError::LoanAlreadyClosed(loan_id)));
                    } else {
                        prop_assert!(result.is_ok());
                        closed.insert(loan_id);
                        active.remove(&(patron, book));
                        *available.get_mut(&book).unwrap() += 1;
                    }
                }
                _ => {}
            }
        }

        for (book, expected) in &available {
            prop_assert_eq!(library.book(BookId(*book)).unwrap().available_copies, *expected);
        }
        prop_assert_eq!(library.active_loan_count(), active.len());
    }
}

// =============================================================================
// Fine Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Fine is max(0, days late) times the daily rate.
    #[test]
    fn fine_is_days_late_times_rate(
        due in arb_date(),
        reference in arb_date(),
        rate in arb_rate(),
    ) {
        let fine = compute_fine(due, reference, rate);
        let days = (reference - due).num_days().max(0);

        prop_assert_eq!(i64::from(fine.days_late), days);
        prop_assert_eq!(fine.amount, Decimal::from(days) * rate);
        prop_assert!(fine.amount >= Decimal::ZERO);
    }

    /// Same inputs, same fine.
    #[test]
    fn fine_is_pure(
        due in arb_date(),
        reference in arb_date(),
        rate in arb_rate(),
    ) {
        prop_assert_eq!(compute_fine(due, reference, rate), compute_fine(due, reference, rate));
    }

    /// Fines never shrink as the reference date moves forward.
    #[test]
    fn fine_is_monotonic(
        due in arb_date(),
        reference in arb_date(),
        later in 0u64..365,
        rate in arb_rate(),
    ) {
        let earlier = compute_fine(due, reference, rate);
        let after = compute_fine(due, reference + Days::new(later), rate);
        prop_assert!(after.amount >= earlier.amount);
    }

    /// A returned loan's fine depends only on its return date.
    #[test]
    fn closed_loan_fine_is_frozen(
        held_for in 0u64..60,
        queried_after in 0u64..3650,
        grace in 1u32..30,
        rate in arb_rate(),
    ) {
        let library = Library::with_policy(LoanPolicy { grace_period_days: grace, daily_fine: rate });
        let book = library.add_book("Dune", "Herbert", "111", 1).unwrap();
        let patron = library.add_patron("Ada", "ada@example.com").unwrap();

        let loan = library.borrow(patron, book, start_date()).unwrap();
        let returned_on = start_date() + Days::new(held_for);
        let receipt = library.return_loan(loan.id, returned_on).unwrap();

        let later = library.fine_for(loan.id, returned_on + Days::new(queried_after)).unwrap();
        prop_assert_eq!(later, receipt.fine);
        prop_assert_eq!(receipt.fine, compute_fine(loan.due_date, returned_on, rate));
    }
}
