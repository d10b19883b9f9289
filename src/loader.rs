use crate::types::{
    BookingRecord, Dataset, ExceptionRecord, RawBookingRow, RawExceptionRow, RawRevenueRow,
    RevenueRecord,
};
use crate::util::{parse_int_or_zero, text_or};
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub booking_rows: usize,
    pub exception_rows: usize,
    pub revenue_rows: usize,
    /// Rows the CSV reader could not decode at all (wrong column count etc.).
    pub parse_errors: usize,
}

/// Read every row of a headed CSV file. Rows that fail to decode are counted
/// and skipped; numeric leniency is handled later per field.
fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize), Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let mut rows = Vec::new();
    let mut parse_errors = 0usize;
    for (idx, result) in rdr.deserialize::<T>().enumerate() {
        match result {
            Ok(r) => rows.push(r),
            Err(e) => {
                debug!(path = %path.display(), row = idx + 1, error = %e, "skipping undecodable row");
                parse_errors += 1;
            }
        }
    }
    if parse_errors > 0 {
        warn!(path = %path.display(), parse_errors, "some rows could not be decoded");
    }
    Ok((rows, parse_errors))
}

// Only exception rows default a blank country to "Unknown"; booking and
// revenue rows keep it blank so they never join with those exceptions.
pub fn booking_from_row(row: RawBookingRow) -> BookingRecord {
    BookingRecord {
        year: parse_int_or_zero(row.year.as_deref()),
        month: parse_int_or_zero(row.month.as_deref()),
        country: text_or(row.country.as_deref(), ""),
        booking_type: text_or(row.booking_type.as_deref(), "Unspecified"),
        record_count: parse_int_or_zero(row.record_count.as_deref()),
    }
}

pub fn exception_from_row(row: RawExceptionRow) -> ExceptionRecord {
    ExceptionRecord {
        year: parse_int_or_zero(row.year.as_deref()),
        month: parse_int_or_zero(row.month.as_deref()),
        country: text_or(row.country.as_deref(), "Unknown"),
        record_count: parse_int_or_zero(row.record_count.as_deref()),
        ops_source_code: text_or(row.ops_source_code.as_deref(), "Unknown"),
    }
}

pub fn revenue_from_row(row: RawRevenueRow) -> RevenueRecord {
    RevenueRecord {
        year: parse_int_or_zero(row.year.as_deref()),
        month: parse_int_or_zero(row.month.as_deref()),
        country: text_or(row.country.as_deref(), ""),
        record_count: parse_int_or_zero(row.record_count.as_deref()),
        division: text_or(row.division.as_deref(), "Unknown"),
        revenue_eur: parse_int_or_zero(row.revenue_eur.as_deref()),
    }
}

pub fn load_bookings(path: &Path) -> Result<(Vec<BookingRecord>, usize), Box<dyn Error>> {
    let (rows, errors) = read_rows::<RawBookingRow>(path)?;
    Ok((rows.into_iter().map(booking_from_row).collect(), errors))
}

pub fn load_exceptions(path: &Path) -> Result<(Vec<ExceptionRecord>, usize), Box<dyn Error>> {
    let (rows, errors) = read_rows::<RawExceptionRow>(path)?;
    Ok((rows.into_iter().map(exception_from_row).collect(), errors))
}

pub fn load_revenue(path: &Path) -> Result<(Vec<RevenueRecord>, usize), Box<dyn Error>> {
    let (rows, errors) = read_rows::<RawRevenueRow>(path)?;
    Ok((rows.into_iter().map(revenue_from_row).collect(), errors))
}

/// Load all three sources. Any missing file fails the whole load so a
/// session never mixes a fresh file with a stale one.
pub fn load_dataset(
    bookings_path: &Path,
    exceptions_path: &Path,
    revenue_path: &Path,
) -> Result<(Dataset, LoadReport), Box<dyn Error>> {
    let (bookings, e1) = load_bookings(bookings_path)?;
    let (exceptions, e2) = load_exceptions(exceptions_path)?;
    let (revenue, e3) = load_revenue(revenue_path)?;
    let report = LoadReport {
        booking_rows: bookings.len(),
        exception_rows: exceptions.len(),
        revenue_rows: revenue.len(),
        parse_errors: e1 + e2 + e3,
    };
    Ok((
        Dataset {
            bookings,
            exceptions,
            revenue,
        },
        report,
    ))
}
