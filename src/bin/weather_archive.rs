use anyhow::{bail, Context, Result};
use argh::FromArgs;
use chrono::NaiveDate;
use polars::prelude::{col, lit};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use weather_archive::{Config, WeatherArchive, DATE_COLUMN};

#[derive(FromArgs)]
/// Collects OpenWeather day summaries per city and merges them into one CSV
struct Args {
    /// path to a YAML configuration file (optional, uses defaults otherwise)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Fetch(FetchArgs),
    Merge(MergeArgs),
    Summary(SummaryArgs),
}

/// Download one file per city and day
#[derive(FromArgs)]
#[argh(subcommand, name = "fetch")]
struct FetchArgs {
    /// city to collect, repeatable (default: the configured cities)
    #[argh(option)]
    city: Vec<String>,

    /// first day, YYYY-MM-DD
    #[argh(option)]
    start: Option<NaiveDate>,

    /// last day (inclusive), YYYY-MM-DD
    #[argh(option)]
    end: Option<NaiveDate>,

    /// download again even if the file for a day already exists
    #[argh(switch)]
    refresh: bool,
}

/// Merge all per-day files into the aggregated CSV
#[derive(FromArgs)]
#[argh(subcommand, name = "merge")]
struct MergeArgs {
    /// where to write the merged CSV (default: data dir)
    #[argh(option, short = 'o')]
    output: Option<PathBuf>,

    /// overwrite an existing output without asking
    #[argh(switch, short = 'y')]
    yes: bool,
}

/// Print per-city figures from the aggregated CSV
#[derive(FromArgs)]
#[argh(subcommand, name = "summary")]
struct SummaryArgs {
    /// merged CSV to read (default: data dir)
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// only this city
    #[argh(option)]
    city: Option<String>,

    /// first day, YYYY-MM-DD
    #[argh(option)]
    start: Option<NaiveDate>,

    /// last day (inclusive), YYYY-MM-DD
    #[argh(option)]
    end: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = env_logger::Env::default().default_filter_or("info");
    env_logger::init_from_env(env);

    let args: Args = argh::from_env();

    let config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
        None => {
            log::info!("No config file specified, using defaults");
            Config::default()
        }
    };
    let archive = WeatherArchive::new(config);

    match args.command {
        Command::Fetch(fetch) => {
            let cities = (!fetch.city.is_empty()).then_some(fetch.city);
            let report = archive
                .collect()
                .maybe_cities(cities)
                .maybe_start(fetch.start)
                .maybe_end(fetch.end)
                .refresh(fetch.refresh)
                .call()
                .await?;
            println!("{report}");
            for failed in &report.failed {
                println!("  {} {}: {}", failed.city, failed.date, failed.reason);
            }
            if !report.is_complete() {
                bail!("some days could not be collected");
            }
        }
        Command::Merge(merge) => {
            let output = merge.output.unwrap_or_else(|| archive.default_output());
            if output.exists() && !merge.yes && !confirm_overwrite(&output)? {
                println!("Operation cancelled.");
                return Ok(());
            }
            let report = archive.merge().output(output).call().await?;
            println!("{report}");
            if !report.invalid_dates.is_empty() {
                println!("  invalid dates: {}", report.invalid_dates.join(", "));
            }
        }
        Command::Summary(summary) => {
            let mut table = archive.table().maybe_input(summary.input).call()?;
            if let Some(city) = &summary.city {
                table = table.for_city(city);
            }
            table = match (summary.start, summary.end) {
                (Some(start), Some(end)) => table.get_range(start, end),
                (Some(start), None) => table.filter(col(DATE_COLUMN).gt_eq(lit(iso(start)))),
                (None, Some(end)) => table.filter(col(DATE_COLUMN).lt_eq(lit(iso(end)))),
                (None, None) => table,
            };
            println!("{}", table.city_summary_frame()?);
        }
    }

    Ok(())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn confirm_overwrite(output: &Path) -> Result<bool> {
    print!(
        "Output file '{}' already exists. Overwrite? (Y/N) ",
        output.display()
    );
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("y")
}
