//! Busan CLI binary.
//!
//! Command-line interface for the Korea Fama-French three-factor engine.

mod config;
mod integration;

use busan::{PremiaRun, PremiaRunConfig, update_history};
use busan_data::ecos::{EcosClient, monthly_risk_free};
use busan_data::store::{import_daily_csv, import_fundamentals_csv};
use busan_data::{SecurityDataGateway, SqliteStore, YearMonth};
use busan_factors::{FactorSynthesizer, RiskFreeSchedule, RunStats, TracingObserver};
use busan_output::{
    FactorSummary, RunReportBuilder, load_factor_history, load_risk_free, render_premia_summary,
    save_factor_history, save_risk_free, write_premia,
};
use busan_premia::FamaMacBethConfig;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use config::AppConfig;
use integration::progress::ProgressObserver;
use integration::store_manager::{open_store, print_store_info};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "busan")]
#[command(about = "Busan: Korea Fama-French three-factor engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// SQLite store path (overrides BUSAN_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute monthly MKT, SMB and HML over a range of months
    Compute {
        /// First month (YYYY-MM)
        start: YearMonth,

        /// Last month (YYYY-MM)
        end: YearMonth,

        /// Factor file to write (.csv or .json)
        #[arg(long, default_value = "data/korea_factors_monthly.csv")]
        output: PathBuf,

        /// Monthly risk-free file (date,RF)
        #[arg(long)]
        rf_file: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Compute the months a saved factor file is missing
    Update {
        /// Factor file to update
        #[arg(long, default_value = "data/korea_factors_monthly.csv")]
        file: PathBuf,

        /// First month of the maintained range (YYYY-MM)
        #[arg(long, default_value = "2020-10")]
        start: YearMonth,

        /// Last month (YYYY-MM, default: previous month)
        #[arg(long)]
        end: Option<YearMonth>,

        /// Monthly risk-free file (date,RF)
        #[arg(long)]
        rf_file: Option<PathBuf>,

        /// Write a JSON run report
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Fetch 1-year Korea Treasury yields and save monthly risk-free rates
    RiskFree {
        /// First day (YYYYMMDD or YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        start: NaiveDate,

        /// Last day (YYYYMMDD or YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        end: NaiveDate,

        /// Risk-free file to write
        #[arg(long, default_value = "data/korea_rf_monthly.csv")]
        output: PathBuf,

        /// ECOS API key (overrides ECOS_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Test factor premia with a Fama-MacBeth regression
    Premia {
        /// Factor file
        #[arg(long, default_value = "data/korea_factors_monthly.csv")]
        factors: PathBuf,

        /// First day (YYYYMMDD or YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        start: NaiveDate,

        /// Last day (YYYYMMDD or YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        end: NaiveDate,

        /// Securities in the cross-section, largest by market cap
        #[arg(long, default_value = "200")]
        top_n: usize,

        /// Minimum days for a security's beta
        #[arg(long, default_value = "100")]
        min_observations: usize,

        /// Directory for the result tables and summary
        #[arg(long, default_value = "results/korea")]
        output_dir: PathBuf,
    },

    /// Print summary statistics of a factor file
    Summary {
        /// Factor file
        #[arg(default_value = "data/korea_factors_monthly.csv")]
        file: PathBuf,

        /// Print Markdown instead of a terminal table
        #[arg(long)]
        markdown: bool,
    },

    /// Load raw security and fundamental extracts into the store
    Import {
        /// Daily security CSV
        #[arg(long)]
        daily: Option<PathBuf>,

        /// Annual fundamentals CSV
        #[arg(long)]
        fundamentals: Option<PathBuf>,

        /// Empty the store first
        #[arg(long)]
        clear: bool,
    },

    /// Show store location and contents
    StoreInfo,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::from_env()?;
    let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());

    match cli.command {
        Commands::Compute {
            start,
            end,
            output,
            rf_file,
            report,
        } => {
            compute_factors(&config, &db_path, start, end, &output, rf_file.as_deref(), report.as_deref())?;
        }
        Commands::Update {
            file,
            start,
            end,
            rf_file,
            report,
        } => {
            let end = end.unwrap_or_else(previous_month);
            update_factors(&config, &db_path, &file, start, end, rf_file.as_deref(), report.as_deref())?;
        }
        Commands::RiskFree {
            start,
            end,
            output,
            api_key,
        } => {
            fetch_risk_free(&config, api_key, start, end, &output).await?;
        }
        Commands::Premia {
            factors,
            start,
            end,
            top_n,
            min_observations,
            output_dir,
        } => {
            let run_config = PremiaRunConfig {
                top_n,
                max_days_back: config.max_days_back,
                estimator: FamaMacBethConfig {
                    min_observations,
                    ..Default::default()
                },
            };
            test_premia(&config, &db_path, &factors, start, end, run_config, &output_dir)?;
        }
        Commands::Summary { file, markdown } => {
            summarize(&file, markdown)?;
        }
        Commands::Import {
            daily,
            fundamentals,
            clear,
        } => {
            import_extracts(&db_path, daily.as_deref(), fundamentals.as_deref(), clear)?;
        }
        Commands::StoreInfo => {
            let store = open_store(&db_path)?;
            println!("\nStore:");
            print_store_info(&db_path, &store)?;
        }
    }

    Ok(())
}

/// Accepts `YYYYMMDD` or `YYYY-MM-DD`.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .map_err(|_| format!("invalid date '{}', expected YYYYMMDD or YYYY-MM-DD", s))
}

fn previous_month() -> YearMonth {
    YearMonth::from_date(Local::now().date_naive()).pred()
}

fn open_gateway(config: &AppConfig, db_path: &Path) -> CliResult<SecurityDataGateway<SqliteStore>> {
    let store = open_store(db_path)?;
    tracing::info!(db = %db_path.display(), market = %config.market, "opened security store");
    Ok(SecurityDataGateway::new(store, config.market.clone()))
}

fn build_synthesizer(config: &AppConfig, rf_file: Option<&Path>) -> CliResult<FactorSynthesizer> {
    let mut schedule = RiskFreeSchedule::from_annual(config.risk_free_annual);
    if let Some(path) = rf_file {
        schedule = schedule.with_observed(load_risk_free(path)?);
        tracing::info!(
            path = %path.display(),
            months = schedule.observed_months(),
            "loaded risk-free rates"
        );
    }
    Ok(FactorSynthesizer::new(config.synthesizer_config(), schedule)?)
}

fn write_report(
    path: Option<&Path>,
    command: &str,
    start: YearMonth,
    end: YearMonth,
    stats: RunStats,
    history_months: usize,
    output: &Path,
) -> CliResult<()> {
    if let Some(path) = path {
        RunReportBuilder::new()
            .command(command)
            .range(start, end)
            .stats(stats)
            .history_months(history_months)
            .output(output)
            .build()
            .write_to(path)?;
        tracing::info!(path = %path.display(), "wrote run report");
    }
    Ok(())
}

fn compute_factors(
    config: &AppConfig,
    db_path: &Path,
    start: YearMonth,
    end: YearMonth,
    output: &Path,
    rf_file: Option<&Path>,
    report: Option<&Path>,
) -> CliResult<()> {
    let synthesizer = build_synthesizer(config, rf_file)?;
    let gateway = open_gateway(config, db_path)?;

    println!("\nComputing Korea factors: {} to {}", start, end);

    let mut stats = RunStats::new();
    let mut progress = ProgressObserver::new(YearMonth::range_inclusive(start, end).count())?;
    let history = {
        let mut observer = (&mut stats, (&mut progress, TracingObserver));
        synthesizer.compute_range(&gateway, start, end, &mut observer)?
    };
    progress.finish("done");
    stats.log_summary("compute");

    if history.is_empty() {
        write_report(report, "compute", start, end, stats, 0, output)?;
        return Err("no months were computed".into());
    }

    save_factor_history(&history, output)?;
    println!("Saved {} months to {}", history.len(), output.display());
    if !stats.missed_months.is_empty() {
        let missed: Vec<String> = stats.missed_months.iter().map(ToString::to_string).collect();
        println!("Missing months: {}", missed.join(", "));
    }

    write_report(report, "compute", start, end, stats, history.len(), output)
}

fn update_factors(
    config: &AppConfig,
    db_path: &Path,
    file: &Path,
    start: YearMonth,
    end: YearMonth,
    rf_file: Option<&Path>,
    report: Option<&Path>,
) -> CliResult<()> {
    let existing = load_factor_history(file)?;
    let missing = existing.missing_months(start, end);
    if start <= end && missing.is_empty() {
        println!("{} is up to date through {}", file.display(), end);
        return write_report(report, "update", start, end, RunStats::new(), existing.len(), file);
    }

    let synthesizer = build_synthesizer(config, rf_file)?;
    let gateway = open_gateway(config, db_path)?;

    println!("\nUpdating {}: {} missing month(s)", file.display(), missing.len());

    let mut stats = RunStats::new();
    let mut progress = ProgressObserver::new(missing.len())?;
    let outcome = {
        let mut observer = (&mut stats, (&mut progress, TracingObserver));
        update_history(&synthesizer, &gateway, existing, start, end, &mut observer)?
    };
    progress.finish("done");
    stats.log_summary("update");

    if stats.computed == 0 {
        write_report(report, "update", start, end, stats, outcome.history.len(), file)?;
        return Err("no months were computed".into());
    }

    save_factor_history(&outcome.history, file)?;
    println!(
        "Added {} month(s); {} now holds {} months",
        outcome.merge.added,
        file.display(),
        outcome.history.len()
    );

    write_report(report, "update", start, end, stats, outcome.history.len(), file)
}

async fn fetch_risk_free(
    config: &AppConfig,
    api_key: Option<String>,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
) -> CliResult<()> {
    let key = match api_key {
        Some(key) => key,
        None => config.require_ecos_key()?.to_string(),
    };
    let client = EcosClient::new(key)?;

    println!("\nFetching 1-year Korea Treasury yields: {} to {}", start, end);
    let daily = client.fetch_treasury_1y(start, end).await?;
    let monthly = monthly_risk_free(&daily);
    if monthly.is_empty() {
        return Err(format!("no yields returned between {} and {}", start, end).into());
    }

    save_risk_free(&monthly, output)?;
    tracing::info!(days = daily.len(), months = monthly.len(), path = %output.display(), "saved risk-free rates");

    println!("\n{:<12} {:>10}", "Month end", "RF (%)");
    println!("{}", "-".repeat(23));
    for rate in &monthly {
        println!("{:<12} {:>10.4}", rate.date, rate.rf_percent);
    }
    println!("\nSaved {} months to {}", monthly.len(), output.display());
    Ok(())
}

fn test_premia(
    config: &AppConfig,
    db_path: &Path,
    factors: &Path,
    start: NaiveDate,
    end: NaiveDate,
    run_config: PremiaRunConfig,
    output_dir: &Path,
) -> CliResult<()> {
    let history = load_factor_history(factors)?;
    if history.is_empty() {
        return Err(format!("no factors in {}; run `busan compute` first", factors.display()).into());
    }

    let gateway = open_gateway(config, db_path)?;
    println!(
        "\nFama-MacBeth test: top {} securities, {} to {}",
        run_config.top_n, start, end
    );

    let result = PremiaRun::new(run_config).run(&gateway, &history, start, end)?;
    let artifacts = write_premia(&result, start, end, output_dir)?;

    println!("{}", render_premia_summary(&result, start, end));
    println!("Results saved to {}", output_dir.display());
    println!("  {}", artifacts.betas.display());
    println!("  {}", artifacts.gammas.display());
    println!("  {}", artifacts.summary.display());
    Ok(())
}

fn summarize(file: &Path, markdown: bool) -> CliResult<()> {
    let history = load_factor_history(file)?;
    let summary = FactorSummary::from_history(&history)?;

    if markdown {
        println!("{}", summary.to_markdown());
        return Ok(());
    }

    println!("{}", summary.to_ascii_table());
    println!("\nLatest months:");
    let frame = history.to_frame()?;
    println!("{}", frame.tail(Some(6)));
    Ok(())
}

fn import_extracts(db_path: &Path, daily: Option<&Path>, fundamentals: Option<&Path>, clear: bool) -> CliResult<()> {
    if daily.is_none() && fundamentals.is_none() && !clear {
        return Err("nothing to import; pass --daily, --fundamentals or --clear".into());
    }

    let store = open_store(db_path)?;
    if clear {
        store.clear_all()?;
        println!("Cleared {}", db_path.display());
    }

    if let Some(path) = daily {
        let rows = import_daily_csv(path)?;
        let inserted = store.put_daily_rows(&rows)?;
        tracing::info!(path = %path.display(), rows = rows.len(), inserted, "imported daily records");
        println!("Imported {} daily records from {}", inserted, path.display());
    }

    if let Some(path) = fundamentals {
        let rows = import_fundamentals_csv(path)?;
        let inserted = store.put_fundamental_rows(&rows)?;
        tracing::info!(path = %path.display(), rows = rows.len(), inserted, "imported fundamental records");
        println!("Imported {} fundamental records from {}", inserted, path.display());
    }

    println!("\nStore:");
    print_store_info(db_path, &store)?;
    Ok(())
}
