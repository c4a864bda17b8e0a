//! RFM model construction, fitting, and summary reporting.
//!
//! [`RfmModel`] holds the weight vector fixed at construction time. A single
//! [`RfmModel::fit`] call aggregates transactional input if needed, builds one
//! [`CutoffSet`] per dimension, scores every row 1-5, applies the weights,
//! and commits the augmented table. The fitted table is assembled in a local
//! working copy, so a failed fit leaves any earlier fitted state untouched.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::cutoffs::{CutoffSet, Direction, Strategy};
use crate::data::{aggregate_transactions, Observation, Transaction};
use crate::error::{Result, RfmError};

/// The three scoring dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Recency,
    Frequency,
    Monetary,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [
        Dimension::Recency,
        Dimension::Frequency,
        Dimension::Monetary,
    ];

    /// Recency ranks low values best; frequency and monetary rank high
    /// values best.
    pub fn direction(self) -> Direction {
        match self {
            Dimension::Recency => Direction::Descending,
            Dimension::Frequency | Dimension::Monetary => Direction::Ascending,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::Recency => "recency",
            Dimension::Frequency => "frequency",
            Dimension::Monetary => "monetary",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-dimension weights applied to scores. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    recency: f64,
    frequency: f64,
    monetary: f64,
}

impl Weights {
    /// Validate a weight vector: three non-negative values summing to
    /// exactly 1 (no tolerance).
    pub fn new(recency: f64, frequency: f64, monetary: f64) -> Result<Self> {
        let non_negative = recency >= 0.0 && frequency >= 0.0 && monetary >= 0.0;
        if !non_negative || recency + frequency + monetary != 1.0 {
            return Err(RfmError::InvalidWeights([recency, frequency, monetary]));
        }
        Ok(Weights {
            recency,
            frequency,
            monetary,
        })
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Recency => self.recency,
            Dimension::Frequency => self.frequency,
            Dimension::Monetary => self.monetary,
        }
    }

    pub fn recency(&self) -> f64 {
        self.recency
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn monetary(&self) -> f64 {
        self.monetary
    }
}

impl Default for Weights {
    /// Monetary-heavy default: recency 0.2, frequency 0.2, monetary 0.6.
    fn default() -> Self {
        Weights {
            recency: 0.2,
            frequency: 0.2,
            monetary: 0.6,
        }
    }
}

impl FromStr for Weights {
    type Err = RfmError;

    /// Parse a comma-separated triple such as `0.2,0.2,0.6`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RfmError::InvalidParameter {
            name: "weights",
            value: s.to_string(),
            expected: "three comma-separated numbers, e.g. 0.2,0.2,0.6",
        };
        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }
        let recency: f64 = parts[0].trim().parse().map_err(|_| invalid())?;
        let frequency: f64 = parts[1].trim().parse().map_err(|_| invalid())?;
        let monetary: f64 = parts[2].trim().parse().map_err(|_| invalid())?;
        Weights::new(recency, frequency, monetary)
    }
}

impl fmt::Display for Weights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.recency, self.frequency, self.monetary
        )
    }
}

/// Declared shape of the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Customer,
    Transactional,
}

impl DatasetKind {
    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Customer => "customer",
            DatasetKind::Transactional => "transactional",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DatasetKind {
    type Err = RfmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(DatasetKind::Customer),
            "transactional" => Ok(DatasetKind::Transactional),
            _ => Err(RfmError::InvalidParameter {
                name: "dataset_type",
                value: s.to_string(),
                expected: "customer or transactional",
            }),
        }
    }
}

/// Input table accepted by [`RfmModel::fit`].
#[derive(Debug, Clone)]
pub enum Dataset {
    /// Per-customer rows, already aggregated.
    Customer(Vec<Observation>),
    /// Raw transaction log, aggregated during `fit`.
    Transactions(Vec<Transaction>),
}

impl Dataset {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Customer(_) => DatasetKind::Customer,
            Dataset::Transactions(_) => DatasetKind::Transactional,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Customer(rows) => rows.len(),
            Dataset::Transactions(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Fit-time options: the global scoring method plus optional per-dimension
/// overrides and an optional reference date for transactional input.
#[derive(Debug, Clone, Default)]
pub struct FitOptions {
    pub scoring_method: Strategy,
    pub recency_method: Option<Strategy>,
    pub frequency_method: Option<Strategy>,
    pub monetary_method: Option<Strategy>,
    /// Reference date for recency aggregation; defaults to the current
    /// local date/time at fit time. Ignored for customer-level input.
    pub as_of: Option<NaiveDateTime>,
}

impl FitOptions {
    /// Effective strategy for a dimension: its override if set, otherwise
    /// the global scoring method.
    pub fn strategy_for(&self, dimension: Dimension) -> Strategy {
        let overridden = match dimension {
            Dimension::Recency => self.recency_method,
            Dimension::Frequency => self.frequency_method,
            Dimension::Monetary => self.monetary_method,
        };
        overridden.unwrap_or(self.scoring_method)
    }
}

/// One fitted table row: the original measures plus scores and weighted
/// scores per dimension. Serializes to the exported CSV column layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredObservation {
    pub customer_id: String,
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
    #[serde(rename = "recency_scores")]
    pub recency_score: u8,
    #[serde(rename = "frequency_scores")]
    pub frequency_score: u8,
    #[serde(rename = "monetary_scores")]
    pub monetary_score: u8,
    pub recency_weighted: f64,
    pub frequency_weighted: f64,
    pub monetary_weighted: f64,
}

impl ScoredObservation {
    pub fn score(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Recency => self.recency_score,
            Dimension::Frequency => self.frequency_score,
            Dimension::Monetary => self.monetary_score,
        }
    }

    pub fn weighted(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Recency => self.recency_weighted,
            Dimension::Frequency => self.frequency_weighted,
            Dimension::Monetary => self.monetary_weighted,
        }
    }
}

/// The three cutoff sets computed at fit time.
#[derive(Debug, Clone)]
pub struct CutoffSets {
    pub recency: CutoffSet,
    pub frequency: CutoffSet,
    pub monetary: CutoffSet,
}

impl CutoffSets {
    pub fn for_dimension(&self, dimension: Dimension) -> &CutoffSet {
        match dimension {
            Dimension::Recency => &self.recency,
            Dimension::Frequency => &self.frequency,
            Dimension::Monetary => &self.monetary,
        }
    }
}

/// Normalized score distributions per dimension, indexed by score level 1-5.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryStatistics {
    pub recency: [f64; 5],
    pub frequency: [f64; 5],
    pub monetary: [f64; 5],
}

impl SummaryStatistics {
    pub fn for_dimension(&self, dimension: Dimension) -> &[f64; 5] {
        match dimension {
            Dimension::Recency => &self.recency,
            Dimension::Frequency => &self.frequency,
            Dimension::Monetary => &self.monetary,
        }
    }
}

impl fmt::Display for SummaryStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "score  recency  frequency  monetary")?;
        for level in 0..5 {
            writeln!(
                f,
                "{:<5}  {:<7.4}  {:<9.4}  {:<8.4}",
                level + 1,
                self.recency[level],
                self.frequency[level],
                self.monetary[level]
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Fitted {
    recency_strategy: Strategy,
    frequency_strategy: Strategy,
    monetary_strategy: Strategy,
    cutoffs: CutoffSets,
    table: Vec<ScoredObservation>,
}

/// RFM scoring model: weights fixed at construction, derived state replaced
/// wholesale by each successful [`RfmModel::fit`].
#[derive(Debug, Clone)]
pub struct RfmModel {
    weights: Weights,
    fitted: Option<Fitted>,
}

impl RfmModel {
    pub fn new(weights: Weights) -> Self {
        RfmModel {
            weights,
            fitted: None,
        }
    }

    /// Construct with a validated weight triple.
    pub fn with_weights(recency: f64, frequency: f64, monetary: f64) -> Result<Self> {
        Ok(RfmModel::new(Weights::new(recency, frequency, monetary)?))
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fit the model: aggregate transactional input, build cutoffs per
    /// dimension, score every row, and apply the weights.
    ///
    /// The augmented table is built locally and only committed on full
    /// success; a failed fit leaves any previous fitted state queryable.
    /// Re-fitting replaces all derived state.
    pub fn fit(&mut self, data: Dataset, options: &FitOptions) -> Result<()> {
        let observations = match data {
            Dataset::Customer(rows) => rows,
            Dataset::Transactions(log) => {
                let as_of = options
                    .as_of
                    .unwrap_or_else(|| Local::now().naive_local());
                aggregate_transactions(&log, as_of)
            }
        };

        if observations.is_empty() {
            return Err(RfmError::InvalidInput(
                "no observations to fit".to_string(),
            ));
        }
        for obs in &observations {
            let finite =
                obs.recency.is_finite() && obs.frequency.is_finite() && obs.monetary.is_finite();
            if !finite {
                return Err(RfmError::InvalidInput(format!(
                    "non-finite measure for customer '{}'",
                    obs.customer_id
                )));
            }
        }

        let recency_strategy = options.strategy_for(Dimension::Recency);
        let frequency_strategy = options.strategy_for(Dimension::Frequency);
        let monetary_strategy = options.strategy_for(Dimension::Monetary);
        debug!(
            rows = observations.len(),
            recency = recency_strategy.name(),
            frequency = frequency_strategy.name(),
            monetary = monetary_strategy.name(),
            "scoring observations"
        );

        let recency_column: Vec<f64> = observations.iter().map(|o| o.recency).collect();
        let frequency_column: Vec<f64> = observations.iter().map(|o| o.frequency).collect();
        let monetary_column: Vec<f64> = observations.iter().map(|o| o.monetary).collect();

        let cutoffs = CutoffSets {
            recency: CutoffSet::build(
                &recency_column,
                Dimension::Recency.direction(),
                recency_strategy,
            )?,
            frequency: CutoffSet::build(
                &frequency_column,
                Dimension::Frequency.direction(),
                frequency_strategy,
            )?,
            monetary: CutoffSet::build(
                &monetary_column,
                Dimension::Monetary.direction(),
                monetary_strategy,
            )?,
        };

        let mut table = Vec::with_capacity(observations.len());
        for obs in observations {
            let recency_score = score_row(&cutoffs.recency, obs.recency, Dimension::Recency)?;
            let frequency_score =
                score_row(&cutoffs.frequency, obs.frequency, Dimension::Frequency)?;
            let monetary_score =
                score_row(&cutoffs.monetary, obs.monetary, Dimension::Monetary)?;
            table.push(ScoredObservation {
                customer_id: obs.customer_id,
                recency: obs.recency,
                frequency: obs.frequency,
                monetary: obs.monetary,
                recency_score,
                frequency_score,
                monetary_score,
                recency_weighted: f64::from(recency_score) * self.weights.recency,
                frequency_weighted: f64::from(frequency_score) * self.weights.frequency,
                monetary_weighted: f64::from(monetary_score) * self.weights.monetary,
            });
        }

        self.fitted = Some(Fitted {
            recency_strategy,
            frequency_strategy,
            monetary_strategy,
            cutoffs,
            table,
        });
        Ok(())
    }

    /// The fitted table. Reference semantics: the slice is replaced by the
    /// next successful `fit`.
    pub fn fitted_data(&self) -> Result<&[ScoredObservation]> {
        self.fitted
            .as_ref()
            .map(|fitted| fitted.table.as_slice())
            .ok_or(RfmError::NotFitted)
    }

    /// The cutoff sets computed by the last successful `fit`.
    pub fn cutoffs(&self) -> Result<&CutoffSets> {
        self.fitted
            .as_ref()
            .map(|fitted| &fitted.cutoffs)
            .ok_or(RfmError::NotFitted)
    }

    /// Fraction of rows at each score level per dimension, on the full 1-5
    /// index with 0.0 for unobserved levels.
    pub fn summary_statistics(&self) -> Result<SummaryStatistics> {
        let fitted = self.fitted.as_ref().ok_or(RfmError::NotFitted)?;
        let n = fitted.table.len() as f64;

        let mut summary = SummaryStatistics {
            recency: [0.0; 5],
            frequency: [0.0; 5],
            monetary: [0.0; 5],
        };
        for row in &fitted.table {
            summary.recency[(row.recency_score - 1) as usize] += 1.0;
            summary.frequency[(row.frequency_score - 1) as usize] += 1.0;
            summary.monetary[(row.monetary_score - 1) as usize] += 1.0;
        }
        for level in 0..5 {
            summary.recency[level] /= n;
            summary.frequency[level] /= n;
            summary.monetary[level] /= n;
        }
        Ok(summary)
    }
}

impl fmt::Display for RfmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameters:")?;
        writeln!(f, "  weights: {}", self.weights)?;
        match &self.fitted {
            Some(fitted) => writeln!(
                f,
                "  strategies: recency={} frequency={} monetary={} ({} rows)",
                fitted.recency_strategy,
                fitted.frequency_strategy,
                fitted.monetary_strategy,
                fitted.table.len()
            ),
            None => writeln!(f, "  not fitted"),
        }
    }
}

fn score_row(cutoffs: &CutoffSet, value: f64, dimension: Dimension) -> Result<u8> {
    cutoffs.score(value).ok_or_else(|| {
        RfmError::InvalidInput(format!(
            "{dimension} value {value} falls outside the fitted range"
        ))
    })
}
