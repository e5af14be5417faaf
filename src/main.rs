use anyhow::{Context, Result};
use std::io::stdout;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

use cli::{Command, get_args, year_range};
use swat_extract::config::QueryMode;
use swat_extract::extract::{ExtractRequest, Extractor};
use swat_extract::harness::PerformanceHarness;
use swat_extract::io::csv::write_table;
use swat_extract::validation::{ValidationMode, Validator};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swat_extract=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = get_args();
    let txtinout = args.txtinout.as_path();

    match args.command {
        Command::Bench {
            each_year,
            output_dir,
        } => {
            let mode = if each_year {
                QueryMode::EachYear
            } else {
                QueryMode::AllYears
            };
            bench(txtinout, &output_dir, mode)
        }
        Command::Validate {
            reconcile,
            output_dir,
        } => {
            let mode = if reconcile {
                ValidationMode::Reconcile
            } else {
                ValidationMode::Correlation
            };
            validate(txtinout, &output_dir, mode)
        }
        Command::Extract {
            unit,
            column,
            id,
            year,
            from,
            to,
            method,
            calendar,
            adjust_accuracy,
        } => {
            let mut request = ExtractRequest::new(unit, &column).years(year_range(year, from, to));
            request.id = id;
            request.add_calendar = calendar;
            request.adjust_accuracy = adjust_accuracy;

            let mut extractor = Extractor::from_method(method, txtinout)
                .with_context(|| format!("Failed to read model settings in {:?}", txtinout))?;
            extractor.open().context("Failed to open the result database")?;
            let (table, timing) = extractor
                .extract(&request)
                .with_context(|| format!("Failed to extract {} {}", unit, column))?;
            extractor.close();

            info!(
                "{} rows, prepare {:.4} ms, extract {:.4} ms",
                table.len(),
                timing.prepare_ms,
                timing.extract_ms
            );
            write_table(&table, stdout().lock()).context("Failed to write table")?;
            Ok(())
        }
    }
}

fn bench(txtinout: &Path, output_dir: &Path, mode: QueryMode) -> Result<()> {
    let harness = PerformanceHarness::new(txtinout, output_dir, mode)
        .with_context(|| format!("Failed to read model settings in {:?}", txtinout))?;

    let settings = harness.settings();
    println!("\nPerformance test configuration:");
    println!("  Period: {} to {}", settings.start_year, settings.end_year);
    println!("  Interval: {}", settings.interval);
    println!("  Queries: {}", mode);
    println!("  Output: {}", harness.output_folder().display());

    let results = harness.run().context("Performance test failed")?;

    println!("\nSWAT Unit  Method      Prepare(ms)  Extract(ms)");
    for r in &results {
        println!(
            "{:<10}{:<12}{:>12.4}{:>13.4}",
            r.unit.to_string(),
            r.method.to_string(),
            r.prepare_ms,
            r.average_extract_ms
        );
    }
    Ok(())
}

fn validate(txtinout: &Path, output_dir: &Path, mode: ValidationMode) -> Result<()> {
    let mut validator = Validator::from_folder(txtinout, mode, output_dir)
        .with_context(|| format!("Failed to set up validation in {:?}", txtinout))?;
    let results = validator.compare_all().context("Validation failed")?;
    validator.close();

    println!("\nMean R2 per unit:");
    for (unit, r2) in results {
        match r2 {
            Some(r2) => println!("  {:<5}{:.4}", unit.to_string(), r2),
            None => println!("  {:<5}NoRecord", unit.to_string()),
        }
    }
    Ok(())
}
