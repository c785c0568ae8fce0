//! Interval Vocabulary Translation
//!
//! Maps the canonical interval vocabulary to the provider's kline tokens.
//! The provider spells hour-multiples in minutes (`60m`, `240m`). This
//! table is the only place the provider vocabulary may appear; it is
//! one-directional by design.

use crate::domain::market::Interval;

/// Provider token for a canonical interval.
#[must_use]
pub const fn provider_token(interval: Interval) -> &'static str {
    match interval {
        Interval::OneMinute => "1m",
        Interval::FiveMinutes => "5m",
        Interval::FifteenMinutes => "15m",
        Interval::ThirtyMinutes => "30m",
        Interval::OneHour => "60m",
        Interval::FourHours => "240m",
        Interval::OneDay => "1d",
        Interval::OneWeek => "1w",
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Interval::OneHour, "60m"; "one hour maps to sixty minutes")]
    #[test_case(Interval::FourHours, "240m"; "four hours maps to 240 minutes")]
    #[test_case(Interval::OneMinute, "1m"; "one minute is unchanged")]
    #[test_case(Interval::OneDay, "1d"; "one day is unchanged")]
    fn translation_table(interval: Interval, expected: &str) {
        assert_eq!(provider_token(interval), expected);
    }

    #[test]
    fn provider_tokens_are_not_canonical_for_hours() {
        // The canonical vocabulary never contains the provider spelling.
        assert_eq!(Interval::parse(provider_token(Interval::OneHour)), None);
        assert_eq!(Interval::parse(provider_token(Interval::FourHours)), None);
    }
}
