//! Guide window parsing for `--time-since` / `--time-until`.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Tries full datetime formats, returns `None` if both fail.
fn try_full_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Parses a datetime as UTC, completing a bare date with `time_of_day`.
fn parse_utc(s: &str, time_of_day: &str) -> Result<DateTime<Utc>> {
    let naive = match try_full_datetime(s) {
        Some(dt) => dt,
        None => NaiveDateTime::parse_from_str(&format!("{s}T{time_of_day}"), "%Y-%m-%dT%H:%M:%S")
            .with_context(|| format!("invalid datetime format: {s}"))?,
    };
    Ok(naive.and_utc())
}

/// Resolves the guide window from optional since/until strings (UTC).
///
/// When both are `None`, defaults to `[now, now + 1 day)`. A bare date
/// starts at `00:00:00` for since and ends at `23:59:59` for until.
///
/// # Errors
///
/// Returns an error if only one bound is given, parsing fails, or the
/// window is empty.
pub fn resolve_guide_window(
    time_since: Option<&str>,
    time_until: Option<&str>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = match (time_since, time_until) {
        (None, None) => {
            let end = now
                .checked_add_signed(TimeDelta::days(1))
                .context("failed to compute end time")?;
            (now, end)
        }
        (Some(since), Some(until)) => (parse_utc(since, "00:00:00")?, parse_utc(until, "23:59:59")?),
        _ => {
            bail!("both --time-since and --time-until must be specified together");
        }
    };
    if start >= end {
        bail!("--time-since must be earlier than --time-until");
    }
    Ok((start, end))
}
