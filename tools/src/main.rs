//! bonus-runner: runs one bonus calculation against a SQLite database and a
//! snapshot directory, then prints the run summary as JSON.
//!
//! Usage:
//!   bonus-runner --calc 17 --campaign 4 --marketdata Strom_Online.zip --suffix crm
//!   bonus-runner --config bonus.json --calc 17 --campaign 4 \
//!                --marketdata Gas_Online.zip --suffix crm --date 2024-03-01

use anyhow::{Context, Result};
use bonus_core::{
    clock::BusinessClock,
    config::AppConfig,
    job::{BonusJob, CalculationRequest},
};
use chrono::NaiveDate;
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = match find_arg(&args, "--config") {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let request = CalculationRequest {
        calculation_id:   required_arg(&args, "--calc")?,
        campaign_id:      required_arg(&args, "--campaign")?,
        marketdata_name:  required_arg(&args, "--marketdata")?,
        requester_suffix: required_arg(&args, "--suffix")?,
    };
    let pinned = find_arg(&args, "--date")
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
        .transpose()
        .context("--date expects YYYY-MM-DD")?;

    log::info!(
        "bonus-runner db={} snapshots={} tz={}",
        config.database_path,
        config.snapshot_root,
        config.timezone
    );

    let tz = config.tz()?;
    let mut job = BonusJob::from_config(config)?;
    if let Some(date) = pinned {
        job = job.with_clock(BusinessClock::pinned(tz, date));
    }

    let summary = job.run(&request)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn find_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn required_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    let raw = find_arg(args, flag).with_context(|| format!("missing {flag}"))?;
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("invalid value for {flag} ({raw}): {e}"))
}
