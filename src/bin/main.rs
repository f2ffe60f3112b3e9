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

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim, Writer};
use library_loans::{
    BookId, BookQuery, Library, LibraryConfig, LoanEvent, LoanId, PatronId, logging,
};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

/// Library Loans - Replay loan events from CSV files
///
/// Loads the catalog and patron list, replays borrow/return events in order,
/// and writes a CSV report to stdout.
#[derive(Parser, Debug)]
#[command(name = "library-loans")]
#[command(about = "A library loan engine that replays loan event CSVs", long_about = None)]
struct Args {
    /// Path to CSV file with loan events
    ///
    /// Expected format: type,date,patron,book,loan
    /// Example: cargo run -- --books books.csv --patrons patrons.csv events.csv > loans.csv
    #[arg(value_name = "EVENTS")]
    events: PathBuf,

    /// Book catalog CSV (title,author,isbn,total_copies)
    #[arg(long, value_name = "FILE")]
    books: PathBuf,

    /// Patron CSV (name,email)
    #[arg(long, value_name = "FILE")]
    patrons: PathBuf,

    /// TOML config with loan policy and logging settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report date (YYYY-MM-DD); defaults to today
    #[arg(long, value_name = "DATE")]
    as_of: Option<NaiveDate>,

    /// Which report to write
    #[arg(long, value_enum, default_value_t = Report::ActiveLoans)]
    report: Report,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    /// Active loans with fines accrued as of the report date
    ActiveLoans,
    /// Book inventory with copy counts
    Books,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match LibraryConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                process::exit(1);
            }
        },
        None => LibraryConfig::default(),
    };

    if let Err(e) = logging::init(&config.logging, args.verbose) {
        eprintln!("Error initializing logging: {}", e);
    }

    let library = Library::from_config(&config);

    let loaded = open(&args.books)
        .and_then(|file| load_books(&library, file))
        .and_then(|_| open(&args.patrons))
        .and_then(|file| load_patrons(&library, file))
        .and_then(|_| open(&args.events))
        .and_then(|file| process_events(&library, file));
    if let Err(e) = loaded {
        eprintln!("Error processing input: {}", e);
        process::exit(1);
    }

    let as_of = args
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    tracing::info!(
        books = library.books(&BookQuery::new()).len(),
        active_loans = library.active_loan_count(),
        %as_of,
        "replay complete"
    );

    let written = match args.report {
        Report::ActiveLoans => write_active_loans(&library, as_of, std::io::stdout()),
        Report::Books => write_books(&library, std::io::stdout()),
    };
    if let Err(e) = written {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn open(path: &Path) -> Result<BufReader<File>, csv::Error> {
    File::open(path).map(BufReader::new).map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "cannot open input");
        csv::Error::from(e)
    })
}

fn reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Catalog CSV record.
///
/// Fields: `title, author, isbn, total_copies`
#[derive(Debug, Deserialize)]
struct BookRow {
    title: String,
    author: String,
    isbn: String,
    total_copies: u32,
}

/// Patron CSV record.
///
/// Fields: `name, email`
#[derive(Debug, Deserialize)]
struct PatronRow {
    name: String,
    email: String,
}

/// Loan event CSV record.
///
/// Fields: `type, date, patron, book, loan`
#[derive(Debug, Deserialize)]
struct EventRow {
    #[serde(rename = "type")]
    kind: String,
    date: NaiveDate,
    #[serde(deserialize_with = "csv::invalid_option")]
    patron: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    book: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    loan: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Borrow {
        patron_id: PatronId,
        book_id: BookId,
        date: NaiveDate,
    },
    Return {
        loan_id: LoanId,
        date: NaiveDate,
    },
}

impl EventRow {
    /// Converts the CSV record to a command.
    ///
    /// Returns `None` for unknown event types or missing required fields.
    fn into_command(self) -> Option<Command> {
        match self.kind.to_lowercase().as_str() {
            "borrow" => Some(Command::Borrow {
                patron_id: PatronId(self.patron?),
                book_id: BookId(self.book?),
                date: self.date,
            }),
            "return" => Some(Command::Return {
                loan_id: LoanId(self.loan?),
                date: self.date,
            }),
            _ => None,
        }
    }
}

/// Catalogs every valid book row. Rejected rows are logged and skipped.
///
/// Returns the number of books added.
pub fn load_books<R: Read>(library: &Library, input: R) -> Result<usize, csv::Error> {
    let mut added = 0;
    for result in reader(input).deserialize::<BookRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed book row");
                continue;
            }
        };
        match library.add_book(&row.title, &row.author, &row.isbn, row.total_copies) {
            Ok(_) => added += 1,
            Err(e) => tracing::warn!(isbn = %row.isbn, error = %e, "skipping book"),
        }
    }
    Ok(added)
}

/// Registers every valid patron row. Rejected rows are logged and skipped.
///
/// Returns the number of patrons registered.
pub fn load_patrons<R: Read>(library: &Library, input: R) -> Result<usize, csv::Error> {
    let mut added = 0;
    for result in reader(input).deserialize::<PatronRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed patron row");
                continue;
            }
        };
        match library.add_patron(&row.name, &row.email) {
            Ok(_) => added += 1,
            Err(e) => tracing::warn!(email = %row.email, error = %e, "skipping patron"),
        }
    }
    Ok(added)
}

/// Replays loan events in file order.
///
/// # CSV Format
///
/// Expected columns: `type, date, patron, book, loan`
/// - `type`: `borrow` or `return`
/// - `date`: calendar date of the event (`YYYY-MM-DD`)
/// - `patron`, `book`: IDs for a borrow
/// - `loan`: loan ID for a return
///
/// # Example
///
/// ```csv
/// type,date,patron,book,loan
/// borrow,2024-01-01,1,1,
/// return,2024-01-21,,,1
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails. Malformed rows and rejected
/// operations are logged and skipped.
pub fn process_events<R: Read>(library: &Library, input: R) -> Result<usize, csv::Error> {
    let mut applied = 0;
    for result in reader(input).deserialize::<EventRow>() {
        let command = match result.map(EventRow::into_command) {
            Ok(Some(command)) => command,
            Ok(None) => {
                tracing::warn!("skipping invalid event record");
                continue;
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed event row");
                continue;
            }
        };

        let outcome = match command {
            Command::Borrow {
                patron_id,
                book_id,
                date,
            } => library.borrow(patron_id, book_id, date).map(|_| ()),
            Command::Return { loan_id, date } => library.return_loan(loan_id, date).map(|_| ()),
        };
        match outcome {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!(?command, error = %e, "skipping event"),
        }

        for event in library.drain_events() {
            log_event(&event);
        }
    }
    Ok(applied)
}

fn log_event(event: &LoanEvent) {
    let loan_id = event.loan_id();
    let date = event.date();
    match event {
        LoanEvent::Borrowed {
            patron_id,
            book_id,
            due_date,
            ..
        } => tracing::info!(%loan_id, %date, %patron_id, %book_id, %due_date, "borrowed"),
        LoanEvent::Returned { fine, .. } if fine.is_due() => tracing::info!(
            %loan_id,
            %date,
            days_late = fine.days_late,
            fine = %fine.amount,
            "returned late, fine due"
        ),
        LoanEvent::Returned { .. } => tracing::info!(%loan_id, %date, "returned, no fine due"),
    }
}

/// Writes active loans with fines as of `as_of`.
///
/// # CSV Format
///
/// Columns: `loan_id, patron_id, patron_name, patron_email, book_id,
/// book_title, borrow_date, due_date, is_overdue, days_late, fine`
pub fn write_active_loans<W: Write>(
    library: &Library,
    as_of: NaiveDate,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for loan in library.active_loans(as_of) {
        wtr.serialize(&loan)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes the inventory ordered by title.
///
/// # CSV Format
///
/// Columns: `id, title, author, isbn, total_copies, available_copies`
pub fn write_books<W: Write>(library: &Library, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for book in library.books(&BookQuery::new()) {
        wtr.serialize(&book)?;
    }
    wtr.flush()?;
    Ok(())
}
