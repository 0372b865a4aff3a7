use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to milliseconds multiplier (order matters: `ms` before `s` and `m`)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1.0),
    ("s", 1_000.0),
    ("m", 60_000.0),
    ("h", 3_600_000.0),
];

/// Parse poll intervals like "5s", "1500ms", "2m" or a bare "5000".
///
/// A bare number is milliseconds, which is how topic settings express
/// their request frequency. Intervals shorter than one millisecond are
/// rejected.
pub fn parse_interval(s: &str) -> Result<Duration> {
    let s = s.trim();

    let interval = if let Ok(millis) = s.parse::<u64>() {
        Duration::from_millis(millis)
    } else {
        parse_with_unit(s)?
    };

    if interval.is_zero() {
        bail!("Interval must be at least 1ms: {}", s);
    }
    Ok(interval)
}

fn parse_with_unit(s: &str) -> Result<Duration> {
    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            if !val.is_finite() || val < 0.0 {
                bail!("Invalid interval: {}", s);
            }
            return Ok(Duration::from_millis((val * multiplier) as u64));
        }
    }

    bail!("Unknown interval format: {}", s)
}

/// Format an elapsed time compactly: "42s", "5m", "3h", "2d"
pub fn format_age(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3_600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3_600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_interval("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_interval("0.5s").unwrap(), Duration::from_millis(500));
    }

    #[test]
    fn test_parse_milliseconds() {
        assert_eq!(parse_interval("1500ms").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_bare_number_is_millis() {
        assert_eq!(parse_interval("5000").unwrap(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_minutes_and_hours() {
        assert_eq!(parse_interval("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_interval(" 1h ").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_interval("soon").is_err());
        assert!(parse_interval("abcms").is_err());
        assert!(parse_interval("-3s").is_err());
    }

    #[test]
    fn test_parse_zero_rejected() {
        assert!(parse_interval("0").is_err());
        assert!(parse_interval("0s").is_err());
        assert!(parse_interval("0.0001s").is_err());
        assert_eq!(parse_interval("0.001s").unwrap(), Duration::from_millis(1));
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(42)), "42s");
        assert_eq!(format_age(Duration::from_secs(300)), "5m");
        assert_eq!(format_age(Duration::from_secs(3 * 3600 + 10)), "3h");
        assert_eq!(format_age(Duration::from_secs(2 * 86_400)), "2d");
    }
}
