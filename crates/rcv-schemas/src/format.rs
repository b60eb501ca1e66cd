//! Small value helpers shared by records, keys and display code.
//!
//! The receiving service pads store and item identifiers with leading zeros
//! and ships quantities as decimal strings (`"5.000"`). Everything that
//! builds a key or compares a quantity goes through these functions so the
//! rules live in one place.

use chrono::{DateTime, TimeZone, Utc};

/// Width of a zero-padded store id (`"12"` -> `"0012"`).
pub const STORE_ID_WIDTH: usize = 4;
/// Width of a zero-padded PO item id (`"10"` -> `"00010"`).
pub const ITEM_ID_WIDTH: usize = 5;

/// Left-pad `value` with `'0'` up to `width` characters.
///
/// Values already at or beyond `width` are returned unchanged.
pub fn add_leading_zeros(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }
    let mut out = "0".repeat(width - len);
    out.push_str(value);
    out
}

/// Strip every leading `'0'` (`"000123"` -> `"123"`, `"000"` -> `""`).
pub fn remove_leading_zeros(value: &str) -> String {
    value.trim_start_matches('0').to_string()
}

/// Parse the integer prefix of a service quantity string.
///
/// Mirrors how the service's quantities are read on the device:
/// leading whitespace is skipped, an optional sign is accepted, and digits
/// are consumed up to the first non-digit (`"5.000"` -> `Some(5)`).
/// Returns `None` when no digit is present.
pub fn parse_qty(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Map a blank or `"X"` placeholder to the empty string.
///
/// List bindings pass `"X"` for "no value" when building exception keys.
pub fn placeholder_to_empty(value: Option<&str>) -> String {
    match value {
        Some(v) if v != "X" => v.to_string(),
        _ => String::new(),
    }
}

/// Language used for date display on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayLocale {
    #[default]
    En,
    Fr,
}

impl DisplayLocale {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "FR" => DisplayLocale::Fr,
            _ => DisplayLocale::En,
        }
    }

    /// Date-only pattern (chrono syntax).
    pub fn date_pattern(&self) -> &'static str {
        match self {
            DisplayLocale::En => "%m/%d/%Y",
            DisplayLocale::Fr => "%Y/%m/%d",
        }
    }

    /// Separator between date and time (`"@"`, `"à"`).
    pub fn at_sign(&self) -> &'static str {
        match self {
            DisplayLocale::En => "@",
            DisplayLocale::Fr => "à",
        }
    }

    /// Time-only pattern (chrono syntax).
    pub fn time_pattern(&self) -> &'static str {
        match self {
            DisplayLocale::En => "%I:%M %p",
            DisplayLocale::Fr => "%H:%M",
        }
    }
}

/// Render a timestamp the way the waybill header shows it.
///
/// `with_time == false` renders the date only. `at_sign` is the localized
/// separator placed between date and time (`"@"`, `"à"`).
pub fn format_date_time(
    value: Option<DateTime<Utc>>,
    locale: DisplayLocale,
    with_time: bool,
    at_sign: &str,
) -> String {
    let Some(dt) = value else {
        return String::new();
    };
    if with_time {
        let pattern = format!(
            "{} {} {}",
            locale.date_pattern(),
            at_sign,
            locale.time_pattern()
        );
        dt.format(&pattern).to_string()
    } else {
        dt.format(locale.date_pattern()).to_string()
    }
}

/// Parse a service timestamp.
///
/// Accepts the OData v2 JSON form (`/Date(1709820300000)/`, optionally with
/// an offset suffix that is ignored) and RFC 3339.
pub fn parse_service_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Some(inner) = s.strip_prefix("/Date(").and_then(|r| r.strip_suffix(")/")) {
        let end = inner
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '+' || *c == '-')
            .map(|(i, _)| i)
            .unwrap_or(inner.len());
        let millis: i64 = inner[..end].parse().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Serde adapter for optional service timestamps (see [`parse_service_date`]).
pub mod service_date {
    use chrono::{DateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => s.serialize_str(&dt.to_rfc3339()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_service_date(s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid service date: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn pads_and_strips_zeros() {
        assert_eq!(add_leading_zeros("12", STORE_ID_WIDTH), "0012");
        assert_eq!(add_leading_zeros("10", ITEM_ID_WIDTH), "00010");
        assert_eq!(add_leading_zeros("123456", ITEM_ID_WIDTH), "123456");
        assert_eq!(add_leading_zeros("", STORE_ID_WIDTH), "0000");
        assert_eq!(remove_leading_zeros("0004500012"), "4500012");
        assert_eq!(remove_leading_zeros("000"), "");
    }

    #[test]
    fn qty_uses_integer_prefix() {
        assert_eq!(parse_qty("5.000"), Some(5));
        assert_eq!(parse_qty("  12"), Some(12));
        assert_eq!(parse_qty("-3"), Some(-3));
        assert_eq!(parse_qty("0.500"), Some(0));
        assert_eq!(parse_qty(""), None);
        assert_eq!(parse_qty("abc"), None);
        assert_eq!(parse_qty(".5"), None);
    }

    #[test]
    fn placeholder_x_is_blank() {
        assert_eq!(placeholder_to_empty(Some("X")), "");
        assert_eq!(placeholder_to_empty(None), "");
        assert_eq!(placeholder_to_empty(Some("P-1")), "P-1");
    }

    #[test]
    fn date_display_follows_locale() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 0).unwrap();
        assert_eq!(
            format_date_time(Some(dt), DisplayLocale::En, false, "@"),
            "03/07/2024"
        );
        assert_eq!(
            format_date_time(Some(dt), DisplayLocale::Fr, false, "à"),
            "2024/03/07"
        );
        assert_eq!(
            format_date_time(Some(dt), DisplayLocale::En, true, "@"),
            "03/07/2024 @ 02:05 PM"
        );
        assert_eq!(
            format_date_time(Some(dt), DisplayLocale::Fr, true, "à"),
            "2024/03/07 à 14:05"
        );
        assert_eq!(format_date_time(None, DisplayLocale::En, true, "@"), "");
        assert_eq!(DisplayLocale::parse(" fr "), DisplayLocale::Fr);
        assert_eq!(DisplayLocale::parse("de"), DisplayLocale::En);
        assert_eq!(DisplayLocale::Fr.at_sign(), "à");
    }

    #[test]
    fn service_dates_accept_odata_and_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 0).unwrap();
        assert_eq!(parse_service_date("/Date(1709820300000)/"), Some(expected));
        assert_eq!(
            parse_service_date("/Date(1709820300000+0000)/"),
            Some(expected)
        );
        assert_eq!(
            parse_service_date("2024-03-07T14:05:00Z"),
            Some(expected)
        );
        assert_eq!(parse_service_date("yesterday"), None);
    }
}
