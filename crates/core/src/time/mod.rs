use chrono::{DateTime, NaiveDate, Utc};

/// Explicit `YYYY-MM-DD` wins; otherwise the current UTC date.
pub fn resolve_as_of_date(
    as_of_date_arg: Option<&str>,
    now_utc: DateTime<Utc>,
) -> anyhow::Result<NaiveDate> {
    if let Some(s) = as_of_date_arg {
        return Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?);
    }
    Ok(now_utc.date_naive())
}
