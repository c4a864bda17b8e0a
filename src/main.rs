//! rfmforge: RFM customer scoring CLI
//!
//! This is the main entrypoint that orchestrates data loading, model
//! fitting, summary reporting, and scored-table export.

use anyhow::Result;
use clap::Parser;
use rfmforge::{
    load_customer_csv, load_transaction_csv, write_scored_csv, Args, Dataset, DatasetKind,
    RfmModel,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if args.verbose {
        println!("rfmforge - RFM Customer Scoring");
        println!("===============================\n");
    }

    run_pipeline(&args)
}

/// Run the full scoring pipeline: load, fit, summarize, export.
fn run_pipeline(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let has_headers = !args.no_header;

    // Step 1: Load the input table
    if args.verbose {
        println!("Step 1: Loading data");
        println!("  Input file: {}", args.input);
        println!("  Dataset type: {}", args.dataset_type);
    }

    let load_start = Instant::now();
    let dataset = match args.dataset_kind()? {
        DatasetKind::Customer => Dataset::Customer(load_customer_csv(&args.input, has_headers)?),
        DatasetKind::Transactional => {
            Dataset::Transactions(load_transaction_csv(&args.input, has_headers)?)
        }
    };
    let load_time = load_start.elapsed();

    println!("✓ Data loaded: {} rows", dataset.len());
    if args.verbose {
        println!("  Loading time: {:.2}s", load_time.as_secs_f64());
    }

    // Step 2: Fit the model
    let weights = args.parse_weights()?;
    let options = args.fit_options()?;
    if args.verbose {
        println!("\nStep 2: Fitting RFM model");
        println!("  Scoring method: {}", options.scoring_method);
        println!("  Weights: {}", weights);
    }

    let fit_start = Instant::now();
    let mut model = RfmModel::new(weights);
    model.fit(dataset, &options)?;
    let fit_time = fit_start.elapsed();

    println!("✓ Model fitted successfully");
    if args.verbose {
        println!("  Fitting time: {:.2}s", fit_time.as_secs_f64());
    }

    // Step 3: Print score distributions
    println!("\n=== Score Distributions ===");
    print!("{}", model.summary_statistics()?);

    // Step 4: Export the scored table
    write_scored_csv(&args.output, model.fitted_data()?)?;

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());
    println!("Scored table saved to: {}", args.output);

    Ok(())
}
