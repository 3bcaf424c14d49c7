//! Swim time codec.
//!
//! Converts free-form sheet time cells (`"1:23.45"`, `"23.4"`, `"58.50 Y"`)
//! into seconds and renders seconds back into the `M:SS.xx` display form.

/// Parses a time cell into seconds.
///
/// Everything except digits, `:` and `.` is stripped first. With a colon, the
/// part before it is minutes and the part after it is seconds; only the first
/// two colon-separated parts are read. An empty side of the colon counts as
/// zero. Returns `None` for blank or non-numeric input. No range validation is
/// applied to the result.
pub fn parse_time(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':' || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    match cleaned.split_once(':') {
        Some((minutes, rest)) => {
            let seconds = rest.split(':').next().unwrap_or("");
            let minutes = number(minutes)?;
            let seconds = number(seconds)?;
            Some(minutes * 60.0 + seconds)
        }
        None => cleaned.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// Numeric coercion for one side of a `m:ss` split. Blank reads as zero.
fn number(s: &str) -> Option<f64> {
    if s.is_empty() {
        return Some(0.0);
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats seconds as `M:SS.xx`, or `SS.xx` under a minute.
///
/// The sign is dropped; callers that display a deficit use [`format_delta`].
/// Non-finite input renders as an empty string.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() {
        return String::new();
    }

    let abs = seconds.abs();
    let minutes = (abs / 60.0).floor();
    let rem = abs - minutes * 60.0;
    let rem_str = format!("{rem:05.2}");

    if minutes > 0.0 {
        format!("{minutes}:{rem_str}")
    } else {
        rem_str
    }
}

/// Formats how much faster a swimmer must go as a negative-prefixed duration,
/// e.g. `-0.02` or `-1:02.34`.
pub fn format_delta(diff_sec: f64) -> String {
    let formatted = format_time(diff_sec);
    if formatted.is_empty() {
        return formatted;
    }
    format!("-{formatted}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_parse_seconds_only() {
        assert!(approx(parse_time("23.4"), 23.4));
        assert!(approx(parse_time(" 58.50 "), 58.5));
    }

    #[test]
    fn test_parse_minutes_and_seconds() {
        assert!(approx(parse_time("1:02.340"), 62.34));
        assert!(approx(parse_time("10:00.00"), 600.0));
    }

    #[test]
    fn test_parse_strips_noise() {
        assert!(approx(parse_time("\"1:05.12Y\""), 65.12));
        assert!(approx(parse_time("58.50 S"), 58.5));
    }

    #[test]
    fn test_parse_blank_or_garbage_is_none() {
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("   "), None);
        assert_eq!(parse_time("NT"), None);
        assert_eq!(parse_time("DQ"), None);
        assert_eq!(parse_time("."), None);
        assert_eq!(parse_time("1.2.3"), None);
    }

    #[test]
    fn test_parse_blank_colon_side_is_zero() {
        assert!(approx(parse_time(":30.5"), 30.5));
        assert!(approx(parse_time("1:"), 60.0));
    }

    #[test]
    fn test_parse_ignores_extra_colon_parts() {
        assert!(approx(parse_time("1:02:03"), 62.0));
    }

    #[test]
    fn test_format_under_a_minute() {
        assert_eq!(format_time(23.4), "23.40");
        assert_eq!(format_time(2.5), "02.50");
        assert_eq!(format_time(0.02), "00.02");
    }

    #[test]
    fn test_format_with_minutes() {
        assert_eq!(format_time(62.34), "1:02.34");
        assert_eq!(format_time(600.0), "10:00.00");
    }

    #[test]
    fn test_format_non_finite_is_empty() {
        assert_eq!(format_time(f64::NAN), "");
        assert_eq!(format_time(f64::INFINITY), "");
    }

    #[test]
    fn test_round_trip_is_canonical() {
        let sec = parse_time("1:02.340").unwrap();
        assert_eq!(format_time(sec), "1:02.34");
        let sec = parse_time("59.5").unwrap();
        assert_eq!(format_time(sec), "59.50");
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(12.34), "-12.34");
        assert_eq!(format_delta(62.34), "-1:02.34");
        assert_eq!(format_delta(f64::NAN), "");
    }
}
