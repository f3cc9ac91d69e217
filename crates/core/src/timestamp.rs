//! Timestamp parsing and formatting shared by the tools.
//! Accepts `[[HH:]MM:]SS[.mmm]` strings and produces float seconds.

use crate::error::{Error, Result};

/// Parse a timestamp string into total seconds.
/// Two colon separated parts mean MM:SS, three mean HH:MM:SS; any other
/// count is rejected with the offending string.
pub fn parse_timestamp(ts: &str) -> Result<f64> {
    let ts = ts.trim();
    let bad = || Error::Format(ts.to_string());
    let parts: Vec<&str> = ts.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, m.parse::<u64>().map_err(|_| bad())?, *s),
        [h, m, s] => (
            h.parse::<u64>().map_err(|_| bad())?,
            m.parse::<u64>().map_err(|_| bad())?,
            *s,
        ),
        _ => return Err(bad()),
    };
    // The fractional part is right-padded to three digits, never scaled, so
    // "1.5" is 500ms while "1.005" is 5ms.
    let (whole, millis) = match seconds.split_once('.') {
        Some((w, frac)) => (w, format!("{frac:0<3}")),
        None => (seconds, "0".to_string()),
    };
    let whole: u64 = whole.parse().map_err(|_| bad())?;
    let millis: u64 = millis.parse().map_err(|_| bad())?;
    Ok((hours * 3600 + minutes * 60 + whole) as f64 + millis as f64 / 1000.0)
}

/// Format float seconds back to `H:MM:SS.mmm`, dropping the hour field when
/// it is zero. Display helper only; the padding rule above means parsing and
/// formatting are not exact inverses for every input string.
pub fn format_timestamp(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let rem = seconds % 60.0;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{rem:06.3}")
    } else {
        format!("{minutes}:{rem:06.3}")
    }
}
