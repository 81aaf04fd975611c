use chrono::{DateTime, Duration, Utc};

/// Rounds to two decimal places, the precision used for margins.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of `numerator` over `base`, rounded to two places. Zero base gives zero.
pub fn percentage(numerator: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        round2(numerator / base * 100.0)
    }
}

/// Start of a look-back window of `days` days ending at `now`. A window
/// reaching past the representable range starts at `DateTime::MIN_UTC`.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parses a positive integer query value, falling back to `default` when the
/// value is missing, unparsable or zero.
pub fn parse_positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// Returns the outermost `{...}` span of a model reply, if any.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
