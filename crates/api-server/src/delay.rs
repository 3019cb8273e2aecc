//! Parsing of the `?delay=` query parameter
//!
//! Accepts duration strings such as `200ms`, `2s`, `1.5s` or `1m30s`:
//! a sequence of decimal numbers, each followed by a unit
//! (`ns`, `us`/`µs`, `ms`, `s`, `m`, `h`). A bare `0` is allowed.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DelayError {
    #[error("delay must be >= 0")]
    Negative,

    #[error("invalid duration: {0:?}")]
    Invalid(String),

    #[error("missing unit in duration: {0:?}")]
    MissingUnit(String),

    #[error("unknown unit {unit:?} in duration: {raw:?}")]
    UnknownUnit { unit: String, raw: String },
}

pub fn parse_delay(raw: &str) -> Result<Duration, DelayError> {
    let input = raw.trim();
    let invalid = || DelayError::Invalid(raw.to_string());

    let rest = match input.strip_prefix('-') {
        Some(_) => return Err(DelayError::Negative),
        None => input.strip_prefix('+').unwrap_or(input),
    };
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos: u128 = 0;
    let mut rest = rest;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty())
            || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(DelayError::MissingUnit(raw.to_string()));
        }
        let unit_nanos = unit_nanos(unit).ok_or_else(|| DelayError::UnknownUnit {
            unit: unit.to_string(),
            raw: raw.to_string(),
        })?;

        total_nanos = total_nanos
            .checked_add(scaled(whole, fraction, unit_nanos).ok_or_else(invalid)?)
            .ok_or_else(invalid)?;
        rest = tail;
    }

    let secs = u64::try_from(total_nanos / NANOS_PER_SEC).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total_nanos % NANOS_PER_SEC) as u32))
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// `whole.fraction` units expressed in nanoseconds, truncated
fn scaled(whole: &str, fraction: &str, unit_nanos: u128) -> Option<u128> {
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole.checked_mul(unit_nanos)?;

    // Digits past the 18th cannot contribute a whole nanosecond.
    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let numerator: u128 = fraction.parse().ok()?;
        let denominator = 10u128.pow(fraction.len() as u32);
        nanos = nanos.checked_add(numerator * unit_nanos / denominator)?;
    }
    Some(nanos)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    let nanos = match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    };
    Some(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_delay("200ms").unwrap(), Duration::from_millis(200));
        assert_eq!(parse_delay("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_delay("3m").unwrap(), Duration::from_secs(180));
        assert_eq!(parse_delay("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_delay("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(parse_delay("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_delay("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_delay("+10ms").unwrap(), Duration::from_millis(10));
        assert_eq!(parse_delay(".5ms").unwrap(), Duration::from_micros(500));
        assert_eq!(parse_delay("1h2m3s4ms").unwrap(), Duration::new(3723, 4_000_000));
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(parse_delay("-1s"), Err(DelayError::Negative));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(parse_delay("abc"), Err(DelayError::Invalid(_))));
        assert!(matches!(parse_delay(""), Err(DelayError::Invalid(_))));
        assert!(matches!(parse_delay("1..2s"), Err(DelayError::Invalid(_))));
        assert!(matches!(parse_delay("10"), Err(DelayError::MissingUnit(_))));
        assert!(matches!(
            parse_delay("5d"),
            Err(DelayError::UnknownUnit { .. })
        ));
    }
}
