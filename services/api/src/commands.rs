use clap::Args;
use grant_insights::config::AppConfig;
use grant_insights::dataset::FileSource;
use grant_insights::error::AppError;
use grant_insights::report::{GrantYearSummary, RemainingBalanceView, TimeToSupportView};
use grant_insights::{CleaningSummary, GrantCleaner, GrantReport};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct CleanArgs {
    /// CSV export of the grant request sheet
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Write the cleaned table to this CSV path
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Match threshold (0-100); defaults to GRANTS_MATCH_THRESHOLD
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub(crate) threshold: Option<u8>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// CSV export of the grant request sheet
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Year to report on (defaults to the latest year in the export)
    #[arg(long)]
    pub(crate) year: Option<i64>,
    /// Match threshold (0-100); defaults to GRANTS_MATCH_THRESHOLD
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub(crate) threshold: Option<u8>,
}

pub(crate) fn run_clean(args: CleanArgs) -> Result<(), AppError> {
    let cleaner = cleaner_for(args.threshold)?;
    let cleaned = cleaner.load(&FileSource::new(&args.input))?;

    render_cleaning_summary(&args.input, &cleaned.summary);

    if let Some(output) = args.output {
        let file = std::fs::File::create(&output)?;
        cleaned.table.write_csv(file)?;
        println!("\nCleaned export written to {}", output.display());
    }

    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let cleaner = cleaner_for(args.threshold)?;
    let cleaned = cleaner.load(&FileSource::new(&args.input))?;
    let report = GrantReport::new(&cleaned.table);
    let years = report.available_years();

    let Some(year) = args.year.or_else(|| years.last().copied()) else {
        println!(
            "No grant request dates found in {}; nothing to report.",
            args.input.display()
        );
        return Ok(());
    };

    render_year_summary(&years, &report.for_year(year));
    Ok(())
}

fn cleaner_for(threshold: Option<u8>) -> Result<GrantCleaner, AppError> {
    let threshold = match threshold {
        Some(threshold) => threshold,
        None => AppConfig::load()?.grants.match_threshold,
    };
    Ok(GrantCleaner::new(threshold))
}

fn render_cleaning_summary(input: &Path, summary: &CleaningSummary) {
    println!("Grant export cleaning");
    println!("Source: {} ({} rows)", input.display(), summary.rows);

    if !summary.renamed.is_empty() {
        println!("Renamed columns: {}", summary.renamed.join(", "));
    }

    println!("\nCategorical fields");
    for field in &summary.fields {
        println!(
            "- {}: {} matched, {} defaulted, {} kept as written, {} missing",
            field.column, field.matched, field.defaulted, field.kept, field.missing
        );
    }

    if summary.derived_columns.is_empty() {
        println!("\nDerived columns: none");
    } else {
        println!("\nDerived columns: {}", summary.derived_columns.join(", "));
    }
}

fn render_year_summary(years: &[i64], summary: &GrantYearSummary) {
    let listed: Vec<String> = years.iter().map(i64::to_string).collect();
    println!("Grant breakdown for {}", summary.year);
    println!("Years available: {}", listed.join(", "));
    println!("Grants requested: {}", summary.grants);

    for breakout in &summary.demographics {
        println!("\nTotal amount by {}", breakout.column);
        for row in &breakout.rows {
            println!(
                "- {}: {} ({} grants)",
                row.category,
                format_amount(row.total_amount),
                row.grants
            );
        }
    }

    match &summary.time_to_support {
        Some(view) => render_time_to_support(view),
        None => println!("\nTime to support: request or payment dates missing"),
    }

    match &summary.remaining_balance {
        Some(view) => render_remaining_balance(view),
        None => println!("\nRemaining balance: no balance data"),
    }

    match &summary.pending_signatures {
        Some(rows) if rows.is_empty() => println!("\nPending applications: none"),
        Some(rows) => {
            println!("\nPending applications");
            for row in rows {
                println!(
                    "- patient {} | signed {} | {}",
                    row.patient_id.as_deref().unwrap_or("unknown"),
                    row.application_signed.as_deref().unwrap_or("unknown"),
                    row.request_status
                );
            }
        }
        None => println!("\nPending applications: status or signature columns missing"),
    }
}

fn render_time_to_support(view: &TimeToSupportView) {
    println!("\nTime to support");
    match (view.average_days, view.min_days, view.max_days) {
        (Some(average), Some(min), Some(max)) => println!(
            "- {} paid requests, average {average} days (min {min}, max {max})",
            view.count
        ),
        _ => println!("- no paid requests"),
    }
}

fn render_remaining_balance(view: &RemainingBalanceView) {
    println!("\nRemaining balance");
    println!("- used all balance: {} patients", view.used_all.patients);
    println!("- balance remaining: {} patients", view.remaining.patients);

    if let Some(by_assistance) = &view.by_assistance {
        println!("\nAmount by assistance type");
        for entry in by_assistance {
            println!(
                "- {}: {}",
                entry.assistance_type,
                format_amount(entry.total_amount)
            );
        }
    }
}

fn format_amount(amount: Option<f64>) -> String {
    match amount {
        Some(amount) => format!("${amount:.2}"),
        None => "no amount recorded".to_string(),
    }
}
