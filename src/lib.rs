//! rfmforge: a Rust CLI and library for RFM customer segmentation
//!
//! Scores customers 1-5 on Recency, Frequency, and Monetary value using
//! quintile, repeated-mean, or repeated-median binning, then combines the
//! three scores into a weighted composite. Input is either a per-customer
//! summary table or a raw transaction log, which is aggregated first.

pub mod cli;
pub mod cutoffs;
pub mod data;
pub mod error;
pub mod model;

// Re-export public items for easier access
pub use cli::Args;
pub use cutoffs::{CutoffSet, Direction, Strategy};
pub use data::{
    aggregate_transactions, load_customer_csv, load_transaction_csv, parse_reference_date,
    parse_transaction_date, write_scored_csv, Observation, Transaction,
};
pub use error::{Result, RfmError};
pub use model::{
    CutoffSets, Dataset, DatasetKind, Dimension, FitOptions, RfmModel, ScoredObservation,
    SummaryStatistics, Weights,
};
