use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;

/// Parse a quantity with an optional unit name, returning `(quantity, unit)`.
/// Accepts: "45", "5km", "5 km", "1.5 hours", "-40 celsius".
pub(crate) fn parse_quantity_with_unit(s: &str) -> Result<(f64, Option<String>)> {
    let s = s.trim();

    if let Ok(qty) = s.parse::<f64>() {
        return Ok((qty, None));
    }

    // "N<unit>" with no space
    if let Some((qty, unit)) = split_number_unit(s) {
        return Ok((qty, Some(unit.to_string())));
    }

    // "<number> <unit>"
    let parts: Vec<&str> = s.splitn(2, char::is_whitespace).collect();
    if parts.len() == 2 {
        let qty: f64 = parts[0]
            .parse()
            .with_context(|| format!("Invalid quantity: '{s}'"))?;
        return Ok((qty, Some(parts[1].trim().to_string())));
    }

    bail!("Invalid quantity: '{s}'. Use '45', '5km' or '1.5 hours'")
}

/// Split "5km" or "2.5hours" into (5.0, "km") or (2.5, "hours").
fn split_number_unit(s: &str) -> Option<(f64, &str)> {
    let idx = s.find(|c: char| c.is_alphabetic())?;
    if idx == 0 {
        return None;
    }
    let (num_part, unit_part) = s.split_at(idx);
    let qty: f64 = num_part.trim().parse().ok()?;
    Some((qty, unit_part))
}

/// Merge a unit embedded in a quantity string with an explicit `--unit` flag.
pub(crate) fn pick_unit(embedded: Option<String>, flag: Option<String>) -> Result<Option<String>> {
    match (embedded, flag) {
        (Some(a), Some(b)) if a != b => {
            bail!("Conflicting units: '{a}' in the quantity and '{b}' from --unit")
        }
        (Some(a), _) => Ok(Some(a)),
        (None, b) => Ok(b),
    }
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate> {
    match s {
        "today" => Ok(Local::now().date_naive()),
        "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday")),
    }
}

/// Start of the reporting period: local midnight of `--since`, or of the
/// first of the last `--days` days (today counts as one).
pub(crate) fn period_start(
    days: Option<u32>,
    since: Option<&str>,
) -> Result<Option<DateTime<Utc>>> {
    let date = match (days, since) {
        (Some(_), Some(_)) => bail!("Use either --days or --since, not both"),
        (Some(0), None) => bail!("--days must be at least 1"),
        (Some(n), None) => Local::now().date_naive() - chrono::Duration::days(i64::from(n) - 1),
        (None, Some(s)) => parse_date(s)?,
        (None, None) => return Ok(None),
    };
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .and_then(|t| t.and_local_timezone(Local).earliest())
        .with_context(|| format!("No local midnight on {date}"))?;
    Ok(Some(midnight.with_timezone(&Utc)))
}

/// Up to three decimals, trailing zeros dropped: 5000 -> "5000", 1.5 -> "1.5".
pub(crate) fn format_quantity(v: f64) -> String {
    let s = format!("{:.3}", no_neg_zero(v));
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Ten-cell progress bar, capped at full.
pub(crate) fn progress_bar(fraction: f64) -> String {
    #[allow(clippy::cast_sign_loss)]
    let filled = (fraction.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
