/// An error produced while parsing a GET string of the form `HH:MM:SS[.fff]`.
#[derive(Debug, Clone, PartialEq, Eq, strum_macros::Display)]
pub enum GetParseError {
    /// The string did not split into exactly three `:`-separated fields.
    #[strum(to_string = "malformed GET string: {0}")]
    Malformed(String),
    /// One of the numeric fields could not be parsed.
    #[strum(to_string = "non-numeric GET field: {0}")]
    NotNumeric(String),
    /// Minutes or seconds fell outside `[0, 60)`.
    #[strum(to_string = "GET field out of range: {0}")]
    OutOfRange(String),
}

impl std::error::Error for GetParseError {}

/// Parses a GET string of the form `HH:MM:SS[.fff]` into seconds.
///
/// Hours may exceed 99 (e.g. `196:00:00`); GET is always nonnegative, so a
/// leading `-` is rejected rather than silently producing a negative value.
///
/// # Errors
/// Returns [`GetParseError`] when the string is not exactly three
/// colon-separated fields, a field is not numeric, or minutes/seconds are
/// outside `[0, 60)`.
pub fn parse_get(s: &str) -> Result<f64, GetParseError> {
    let s = s.trim();
    if s.starts_with('-') {
        return Err(GetParseError::OutOfRange(s.to_string()));
    }
    let parts: Vec<&str> = s.split(':').collect();
    let [hh, mm, ss] = parts.as_slice() else {
        return Err(GetParseError::Malformed(s.to_string()));
    };
    let hours: f64 = hh.parse().map_err(|_| GetParseError::NotNumeric((*hh).to_string()))?;
    let minutes: f64 = mm.parse().map_err(|_| GetParseError::NotNumeric((*mm).to_string()))?;
    let seconds: f64 = ss.parse().map_err(|_| GetParseError::NotNumeric((*ss).to_string()))?;
    if !(0.0..60.0).contains(&minutes) {
        return Err(GetParseError::OutOfRange(mm.to_string()));
    }
    if !(0.0..60.0).contains(&seconds) {
        return Err(GetParseError::OutOfRange(ss.to_string()));
    }
    if hours < 0.0 {
        return Err(GetParseError::OutOfRange(hh.to_string()));
    }
    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Formats a GET duration in seconds as `HH:MM:SS.fff`.
///
/// Hours are zero-padded to at least two digits but are allowed to grow past
/// 99 for missions that exceed a hundred hours, matching the parser's
/// tolerance for the same.
#[must_use]
pub fn format_get(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0).round() as i64;
    let total_millis = total_millis.max(0);
    let millis = total_millis % 1000;
    let total_seconds = total_millis / 1000;
    let secs = total_seconds % 60;
    let total_minutes = total_seconds / 60;
    let mins = total_minutes % 60;
    let hours = total_minutes / 60;
    format!("{hours:02}:{mins:02}:{secs:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::{format_get, parse_get};

    #[test]
    fn round_trips_to_millisecond_precision() {
        let samples = [0.0, 1.5, 3661.25, 196.0 * 3600.0, 59.999];
        for &s in &samples {
            let formatted = format_get(s);
            let parsed = parse_get(&formatted).unwrap();
            assert!((parsed - s).abs() < 1e-3, "{s} -> {formatted} -> {parsed}");
        }
    }

    #[test]
    fn formats_hours_beyond_99() {
        assert_eq!(format_get(196.0 * 3600.0), "196:00:00.000");
    }

    #[test]
    fn rejects_negative_and_malformed() {
        assert!(parse_get("-01:00:00").is_err());
        assert!(parse_get("01:00").is_err());
        assert!(parse_get("01:60:00").is_err());
        assert!(parse_get("aa:00:00").is_err());
    }
}
