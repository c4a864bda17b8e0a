//! Data loading, date parsing, and transaction-log aggregation.
//!
//! Two input shapes are accepted, both order-significant: a customer-level
//! table with three numeric columns (recency, frequency, monetary) and a
//! transaction log with customer id, date, and amount columns. The
//! transaction log is reduced to one [`Observation`] per customer before
//! scoring.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{Result, RfmError};
use crate::model::ScoredObservation;

/// Accepted reference ("as-of") date formats, tried in order.
const REFERENCE_DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%m-%d-%Y", "%d-%b-%y"];

/// Additional formats accepted for transaction dates.
const TRANSACTION_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const TRANSACTION_DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%d-%b-%y"];

/// One row of the customer-level observation table.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub customer_id: String,
    /// Days since the customer's last transaction. Lower is better.
    pub recency: f64,
    /// Transaction count. Higher is better.
    pub frequency: f64,
    /// Total transaction value. Higher is better.
    pub monetary: f64,
}

/// One transaction-log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub customer_id: String,
    pub date: NaiveDateTime,
    pub amount: f64,
}

/// Parse an as-of date: `MM/DD/YYYY`, `MM-DD-YYYY`, or `DD-Mon-YY`, first
/// successful format wins.
pub fn parse_reference_date(s: &str) -> Result<NaiveDateTime> {
    for format in REFERENCE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err(RfmError::DateParse(s.to_string()))
}

/// Parse a transaction date: ISO datetime or date forms plus the as-of
/// formats. Date-only forms resolve to midnight.
pub fn parse_transaction_date(s: &str) -> Result<NaiveDateTime> {
    for format in TRANSACTION_DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(datetime);
        }
    }
    for format in TRANSACTION_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err(RfmError::DateParse(s.to_string()))
}

/// Reduce a transaction log to one observation per distinct customer.
///
/// Recency is the whole-day difference between `as_of` and the customer's
/// latest transaction; frequency is the transaction count; monetary is the
/// amount sum. Output rows are ordered by customer id.
pub fn aggregate_transactions(
    transactions: &[Transaction],
    as_of: NaiveDateTime,
) -> Vec<Observation> {
    let mut groups: BTreeMap<&str, (NaiveDateTime, usize, f64)> = BTreeMap::new();
    for tx in transactions {
        let entry = groups
            .entry(tx.customer_id.as_str())
            .or_insert((tx.date, 0, 0.0));
        if tx.date > entry.0 {
            entry.0 = tx.date;
        }
        entry.1 += 1;
        entry.2 += tx.amount;
    }

    debug!(customers = groups.len(), "aggregated transaction log");

    groups
        .into_iter()
        .map(|(customer_id, (last_date, count, total))| Observation {
            customer_id: customer_id.to_string(),
            recency: (as_of - last_date).num_days() as f64,
            frequency: count as f64,
            monetary: total,
        })
        .collect()
}

/// Read customer-level rows: exactly 3 numeric columns in recency,
/// frequency, monetary order. Row indexes become customer ids.
pub fn read_customer_rows<R: Read>(reader: R, has_headers: bool) -> Result<Vec<Observation>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() != 3 {
            return Err(RfmError::ShapeMismatch {
                dataset_type: "customer",
                expected: 3,
                actual: record.len(),
            });
        }
        rows.push(Observation {
            customer_id: index.to_string(),
            recency: parse_measure(&record[0], "recency", index)?,
            frequency: parse_measure(&record[1], "frequency", index)?,
            monetary: parse_measure(&record[2], "monetary", index)?,
        });
    }
    Ok(rows)
}

/// Read a transaction log: customer id, date, amount in the first three
/// columns; extra columns are ignored.
pub fn read_transaction_rows<R: Read>(reader: R, has_headers: bool) -> Result<Vec<Transaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() < 3 {
            return Err(RfmError::InvalidInput(format!(
                "transaction row {index} has {} columns, expected customer id, date, amount",
                record.len()
            )));
        }
        rows.push(Transaction {
            customer_id: record[0].to_string(),
            date: parse_transaction_date(&record[1])?,
            amount: parse_measure(&record[2], "amount", index)?,
        });
    }
    Ok(rows)
}

/// Load customer-level rows from a CSV file path.
pub fn load_customer_csv(path: &str, has_headers: bool) -> Result<Vec<Observation>> {
    let file = std::fs::File::open(path)?;
    read_customer_rows(file, has_headers)
}

/// Load a transaction log from a CSV file path.
pub fn load_transaction_csv(path: &str, has_headers: bool) -> Result<Vec<Transaction>> {
    let file = std::fs::File::open(path)?;
    read_transaction_rows(file, has_headers)
}

/// Write the fitted table: original columns plus `*_scores` and
/// `*_weighted` per dimension.
pub fn write_scored_csv(path: &str, rows: &[ScoredObservation]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_measure(field: &str, column: &str, row: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|_| {
        RfmError::InvalidInput(format!("non-numeric {column} value '{field}' at row {row}"))
    })
}
