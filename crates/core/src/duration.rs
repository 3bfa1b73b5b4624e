//! Strict duration grammar for configuration values
//!
//! A duration is one or more `<number><unit>` terms written back to back,
//! e.g. `5s`, `1m30s`, `1.5h` or `2d`. Accepted units are `ns`, `us`/`µs`,
//! `ms`, `s`, `m`, `h` and `d`. A bare `0` is accepted as zero. Negative
//! durations are rejected.

use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use thiserror::Error;

lazy_static! {
    static ref DURATION: Regex =
        Regex::new(r"^(?:(?:\d+(?:\.\d*)?|\.\d+)(?:ns|us|µs|ms|s|m|h|d))+$")
            .expect("duration grammar is a valid regex");
    static ref TERM: Regex = Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|ms|s|m|h|d)")
        .expect("duration term is a valid regex");
}

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Errors produced by [`parse_duration`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,

    #[error("negative duration not allowed: {0:?}")]
    Negative(String),

    #[error("invalid duration {0:?} (expected e.g. 5s, 1m30s, 250ms)")]
    Malformed(String),

    #[error("duration out of range: {0:?}")]
    Overflow(String),
}

/// Parse a duration string like `5s` or `1h15m`
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationError::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(DurationError::Negative(input.to_string()));
    }

    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if body == "0" {
        return Ok(Duration::ZERO);
    }
    if !DURATION.is_match(body) {
        return Err(DurationError::Malformed(input.to_string()));
    }

    let overflow = || DurationError::Overflow(input.to_string());
    let mut total: u128 = 0;

    for caps in TERM.captures_iter(body) {
        let unit = unit_nanos(&caps[2]);
        let number = &caps[1];
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let mut nanos = whole.checked_mul(unit).ok_or_else(overflow)?;

        if !fraction.is_empty() {
            // digits past the 18th cannot move the result by a full nanosecond
            let digits = &fraction[..fraction.len().min(18)];
            let numerator: u128 = digits.parse().map_err(|_| overflow())?;
            let scale = 10u128.pow(u32::try_from(digits.len()).map_err(|_| overflow())?);
            nanos = nanos
                .checked_add(numerator * unit / scale)
                .ok_or_else(overflow)?;
        }

        total = total.checked_add(nanos).ok_or_else(overflow)?;
    }

    let nanos = u64::try_from(total).map_err(|_| overflow())?;
    Ok(Duration::from_nanos(nanos))
}

fn unit_nanos(unit: &str) -> u128 {
    match unit {
        "ns" => 1,
        "us" | "µs" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SECOND,
        "m" => 60 * NANOS_PER_SECOND,
        "h" => 3_600 * NANOS_PER_SECOND,
        // the grammar only admits the units above plus days
        _ => 86_400 * NANOS_PER_SECOND,
    }
}

/// Serde support for durations in JSON documents
///
/// Serializes as integer nanoseconds. Deserializes from either integer
/// nanoseconds or a string in the grammar accepted by [`parse_duration`].
pub mod serde_duration {
    use super::parse_duration;
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DurationVisitor)
    }

    struct DurationVisitor;

    impl Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like \"5s\" or integer nanoseconds")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
            Ok(Duration::from_nanos(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
            u64::try_from(value)
                .map(Duration::from_nanos)
                .map_err(|_| E::custom(format!("negative duration not allowed: {value}")))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
            parse_duration(value).map_err(E::custom)
        }
    }

    /// Used with `skip_serializing_if` to keep unset durations out of the output
    pub fn is_zero(duration: &Duration) -> bool {
        duration.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[test]
    fn test_simple_units() {
        assert_eq!(parse_duration("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_duration("2h"), Ok(Duration::from_secs(7_200)));
        assert_eq!(parse_duration("1d"), Ok(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("10us"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("10µs"), Ok(Duration::from_micros(10)));
        assert_eq!(parse_duration("7ns"), Ok(Duration::from_nanos(7)));
    }

    #[test]
    fn test_compound_and_fractional() {
        assert_eq!(parse_duration("1m30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5_400)));
        assert_eq!(parse_duration(".5s"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("1h15m10s"), Ok(Duration::from_secs(4_510)));
        assert_eq!(parse_duration("+3s"), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(parse_duration(""), Err(DurationError::Empty));
        assert!(matches!(parse_duration("5"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("s"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("5 s"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("5y"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("abc"), Err(DurationError::Malformed(_))));
        assert!(matches!(parse_duration("-5s"), Err(DurationError::Negative(_))));
    }

    #[test]
    fn test_overflow() {
        assert!(matches!(
            parse_duration("99999999999999999999999h"),
            Err(DurationError::Overflow(_))
        ));
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Timers {
        #[serde(with = "serde_duration")]
        interval: Duration,
    }

    #[test]
    fn test_serde_accepts_string_and_nanos() {
        let from_string: Timers = serde_json::from_str(r#"{"interval": "5s"}"#).unwrap();
        assert_eq!(from_string.interval, Duration::from_secs(5));

        let from_nanos: Timers = serde_json::from_str(r#"{"interval": 5000000000}"#).unwrap();
        assert_eq!(from_nanos.interval, Duration::from_secs(5));

        assert!(serde_json::from_str::<Timers>(r#"{"interval": "soon"}"#).is_err());
        assert!(serde_json::from_str::<Timers>(r#"{"interval": -1}"#).is_err());

        let encoded = serde_json::to_string(&from_string).unwrap();
        assert_eq!(encoded, r#"{"interval":5000000000}"#);
    }
}
