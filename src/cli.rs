//! Command-line interface definitions and argument parsing

use clap::Parser;

use crate::data::parse_reference_date;
use crate::error::Result;
use crate::model::{DatasetKind, FitOptions, Weights};

/// Customer segmentation CLI scoring RFM data with quintile, mean, or median binning
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Input shape: "customer" (recency,frequency,monetary columns) or
    /// "transactional" (customer id, date, amount columns)
    #[arg(short, long, default_value = "customer")]
    pub dataset_type: String,

    /// Scoring method for all dimensions: mean, median, or quintile
    #[arg(short, long, default_value = "quintile")]
    pub scoring_method: String,

    /// Override the scoring method for the recency dimension
    #[arg(long)]
    pub recency_method: Option<String>,

    /// Override the scoring method for the frequency dimension
    #[arg(long)]
    pub frequency_method: Option<String>,

    /// Override the scoring method for the monetary dimension
    #[arg(long)]
    pub monetary_method: Option<String>,

    /// Score weights as "recency,frequency,monetary", e.g. "0.2,0.2,0.6"
    #[arg(short, long)]
    pub weights: Option<String>,

    /// Reference date for recency (MM/DD/YYYY, MM-DD-YYYY, or DD-Mon-YY);
    /// defaults to today. Only used for transactional input.
    #[arg(long)]
    pub as_of: Option<String>,

    /// Output path for the scored CSV
    #[arg(short, long, default_value = "scored.csv")]
    pub output: String,

    /// Treat the first input row as data rather than a header
    #[arg(long)]
    pub no_header: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the declared dataset type.
    pub fn dataset_kind(&self) -> Result<DatasetKind> {
        self.dataset_type.parse()
    }

    /// Parse the weight triple, falling back to the default (0.2, 0.2, 0.6).
    pub fn parse_weights(&self) -> Result<Weights> {
        match &self.weights {
            Some(triple) => triple.parse(),
            None => Ok(Weights::default()),
        }
    }

    /// Resolve strategies and the optional as-of date into fit options.
    pub fn fit_options(&self) -> Result<FitOptions> {
        Ok(FitOptions {
            scoring_method: self.scoring_method.parse()?,
            recency_method: self.recency_method.as_deref().map(str::parse).transpose()?,
            frequency_method: self
                .frequency_method
                .as_deref()
                .map(str::parse)
                .transpose()?,
            monetary_method: self
                .monetary_method
                .as_deref()
                .map(str::parse)
                .transpose()?,
            as_of: self
                .as_of
                .as_deref()
                .map(parse_reference_date)
                .transpose()?,
        })
    }
}
