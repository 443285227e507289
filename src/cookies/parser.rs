//! `Set-Cookie` header parsing.
//!
//! Turns one `Set-Cookie` header line into a [`Cookie`]. Only the first
//! `name=value` pair is mandatory; every attribute error is recovered locally
//! and leaves the record as it was before that attribute.
//!
//! Recognized attributes (case-insensitive): `Secure`, `HttpOnly`, `Path`,
//! `Domain`, `Expires`, `Max-Age` and `SameSite`. `Expires` and `Max-Age` are
//! applied in the order they appear, so the last one wins.
use crate::cookies::cookies::{now_millis, Cookie, SameSite};
use crate::errors::SetCookieError;
use log::debug;
use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

/// Parses `header` as seen on a response for host `default_domain`.
pub fn parse_set_cookie(header: &str, default_domain: &str) -> Result<Cookie, SetCookieError> {
    parse_set_cookie_at(header, default_domain, now_millis())
}

/// Same as [`parse_set_cookie`] with an explicit clock (epoch milliseconds).
///
/// `now` is used for `Max-Age` and for the creation/last-access times.
pub fn parse_set_cookie_at(
    header: &str,
    default_domain: &str,
    now: i64,
) -> Result<Cookie, SetCookieError> {
    if header.trim().is_empty() {
        return Err(SetCookieError::Empty);
    }

    let mut parts = header.split(';');
    let pair = parts.next().unwrap_or_default();
    let (name, value) = pair.split_once('=').ok_or(SetCookieError::MissingNameValue)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(SetCookieError::EmptyName);
    }

    let mut cookie = Cookie::new(name, value.trim(), default_domain, "/");
    cookie.created_time = now;
    cookie.last_accessed_time = now;

    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (attr, val) = match part.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim())),
            None => (part, None),
        };

        match (attr.to_ascii_lowercase().as_str(), val) {
            ("secure", _) => cookie.secure = true,
            ("httponly", _) => cookie.http_only = true,
            ("path", Some(v)) => {
                cookie.path = if v.is_empty() { "/".to_string() } else { v.to_string() };
            }
            ("domain", Some(v)) if !v.is_empty() => {
                let v = v.to_ascii_lowercase();
                cookie.domain = if v.starts_with('.') { v } else { format!(".{v}") };
            }
            ("expires", Some(v)) => match parse_http_date(v) {
                Some(at) => {
                    cookie.expiry_time = at;
                    cookie.session_only = false;
                }
                None => debug!("Ignoring unparseable Expires value {v:?} on cookie {name}"),
            },
            ("max-age", Some(v)) => match v.parse::<i64>() {
                Ok(secs) => {
                    cookie.expiry_time = now.saturating_add(secs.saturating_mul(1000));
                    cookie.session_only = false;
                }
                Err(_) => debug!("Ignoring unparseable Max-Age value {v:?} on cookie {name}"),
            },
            ("samesite", Some(v)) => match SameSite::parse(v) {
                Some(same_site) => cookie.same_site = same_site,
                None => debug!("Ignoring unknown SameSite value {v:?} on cookie {name}"),
            },
            _ => debug!("Ignoring cookie attribute {part:?} on cookie {name}"),
        }
    }

    Ok(cookie)
}

/// Parses an HTTP date such as `Wed, 09 Jun 2021 10:18:14 GMT` into epoch
/// milliseconds.
///
/// Also accepts the Netscape form `Wed, 09-Jun-2021 10:18:14 GMT` (two-digit
/// years as in RFC 6265 §5.1.1), a missing weekday, the RFC 822 North
/// American zone names (`PST`, `EDT`, ...) and numeric zones (`+0200`,
/// `GMT+02:00`).
pub fn parse_http_date(value: &str) -> Option<i64> {
    let value = value.trim();
    // Weekday is informational only
    let rest = match value.split_once(',') {
        Some((_, rest)) => rest,
        None => value,
    };

    let tokens: Vec<&str> = rest.split_whitespace().collect();
    let first = *tokens.first()?;
    let (day, month, year, tail) = if first.contains('-') {
        let mut dmy = first.split('-');
        (dmy.next()?, dmy.next()?, dmy.next()?, &tokens[1..])
    } else {
        (first, *tokens.get(1)?, *tokens.get(2)?, tokens.get(3..)?)
    };

    let day: u8 = day.parse().ok()?;
    let month = parse_month(month)?;
    let year = match year.parse::<i32>().ok()? {
        y @ 0..=69 => y + 2000,
        y @ 70..=99 => y + 1900,
        y => y,
    };
    let clock = parse_clock(tail.first()?)?;
    let offset = match tail.get(1) {
        Some(zone) => parse_zone(zone)?,
        None => UtcOffset::UTC,
    };

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let at = PrimitiveDateTime::new(date, clock).assume_offset(offset);
    Some((at.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn parse_month(name: &str) -> Option<Month> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => Month::January,
        "feb" => Month::February,
        "mar" => Month::March,
        "apr" => Month::April,
        "may" => Month::May,
        "jun" => Month::June,
        "jul" => Month::July,
        "aug" => Month::August,
        "sep" => Month::September,
        "oct" => Month::October,
        "nov" => Month::November,
        "dec" => Month::December,
        _ => return None,
    };
    Some(month)
}

fn parse_clock(value: &str) -> Option<Time> {
    let mut parts = value.split(':');
    let hour: u8 = parts.next()?.parse().ok()?;
    let minute: u8 = parts.next()?.parse().ok()?;
    let second: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Time::from_hms(hour, minute, second).ok()
}

fn parse_zone(zone: &str) -> Option<UtcOffset> {
    let upper = zone.to_ascii_uppercase();
    // RFC 822 zone names
    let hours = match upper.as_str() {
        "GMT" | "UTC" | "UT" | "Z" => Some(0),
        "EDT" => Some(-4),
        "EST" | "CDT" => Some(-5),
        "CST" | "MDT" => Some(-6),
        "MST" | "PDT" => Some(-7),
        "PST" => Some(-8),
        _ => None,
    };
    if let Some(hours) = hours {
        return UtcOffset::from_hms(hours, 0, 0).ok();
    }
    let numeric = upper
        .strip_prefix("GMT")
        .or_else(|| upper.strip_prefix("UTC"))
        .unwrap_or(&upper);
    parse_numeric_offset(numeric)
}

fn parse_numeric_offset(value: &str) -> Option<UtcOffset> {
    let (sign, digits) = match value.as_bytes().first()? {
        b'+' => (1i8, &value[1..]),
        b'-' => (-1i8, &value[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i8 = digits[..2].parse().ok()?;
    let minutes: i8 = digits[2..].parse().ok()?;
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn parses_attributes() {
        let c = parse_set_cookie_at(
            "sid=abc123; Path=/app; Secure; HttpOnly; SameSite=Strict",
            "example.com",
            NOW,
        )
        .unwrap();

        assert_eq!(c.name, "sid");
        assert_eq!(c.value, "abc123");
        assert_eq!(c.domain, "example.com");
        assert_eq!(c.path, "/app");
        assert!(c.secure);
        assert!(c.http_only);
        assert_eq!(c.same_site, SameSite::Strict);
        assert!(c.session_only);
        assert_eq!(c.expiry_time, 0);
        assert_eq!(c.created_time, NOW);
    }

    #[test]
    fn attribute_names_are_case_insensitive() {
        let c = parse_set_cookie_at("a=b; path=/x; SECURE; httponly; samesite=none", "h.test", NOW).unwrap();
        assert_eq!(c.path, "/x");
        assert!(c.secure);
        assert!(c.http_only);
        assert_eq!(c.same_site, SameSite::None);
    }

    #[test]
    fn domain_attribute_gets_leading_dot() {
        let c = parse_set_cookie_at("a=b; Domain=Example.com", "www.example.com", NOW).unwrap();
        assert_eq!(c.domain, ".example.com");

        let c = parse_set_cookie_at("a=b; Domain=.example.com", "www.example.com", NOW).unwrap();
        assert_eq!(c.domain, ".example.com");

        // empty Domain keeps the host-only default
        let c = parse_set_cookie_at("a=b; Domain=", "www.example.com", NOW).unwrap();
        assert_eq!(c.domain, "www.example.com");
    }

    #[test]
    fn value_may_contain_equals_signs() {
        let c = parse_set_cookie_at("token=a=b==; Path=/", "h.test", NOW).unwrap();
        assert_eq!(c.value, "a=b==");
    }

    #[test]
    fn empty_path_is_root() {
        let c = parse_set_cookie_at("a=b; Path=", "h.test", NOW).unwrap();
        assert_eq!(c.path, "/");
    }

    #[test]
    fn malformed_lines_are_rejected() {
        assert_eq!(parse_set_cookie_at("", "h.test", NOW), Err(SetCookieError::Empty));
        assert_eq!(parse_set_cookie_at("   ", "h.test", NOW), Err(SetCookieError::Empty));
        assert_eq!(parse_set_cookie_at("novalue; Path=/", "h.test", NOW), Err(SetCookieError::MissingNameValue));
        assert_eq!(parse_set_cookie_at("=abc", "h.test", NOW), Err(SetCookieError::EmptyName));
    }

    #[test]
    fn max_age_sets_expiry_relative_to_now() {
        let c = parse_set_cookie_at("a=b; Max-Age=60", "h.test", NOW).unwrap();
        assert!(!c.session_only);
        assert_eq!(c.expiry_time, NOW + 60_000);

        let c = parse_set_cookie_at("a=b; Max-Age=0", "h.test", NOW).unwrap();
        assert!(c.is_expired_at(NOW + 1));
    }

    #[test]
    fn last_expiry_attribute_wins() {
        let c = parse_set_cookie_at(
            "a=b; Max-Age=60; Expires=Wed, 09 Jun 2021 10:18:14 GMT",
            "h.test",
            NOW,
        )
        .unwrap();
        assert_eq!(c.expiry_time, 1_623_233_894_000);

        let c = parse_set_cookie_at(
            "a=b; Expires=Wed, 09 Jun 2021 10:18:14 GMT; Max-Age=60",
            "h.test",
            NOW,
        )
        .unwrap();
        assert_eq!(c.expiry_time, NOW + 60_000);
    }

    #[test]
    fn bad_expiry_values_are_ignored() {
        let c = parse_set_cookie_at("a=b; Expires=soon; Max-Age=abc; SameSite=maybe", "h.test", NOW).unwrap();
        assert!(c.session_only);
        assert_eq!(c.expiry_time, 0);
        assert_eq!(c.same_site, SameSite::Lax);

        // An earlier valid Max-Age survives a later broken Expires
        let c = parse_set_cookie_at("a=b; Max-Age=10; Expires=never", "h.test", NOW).unwrap();
        assert_eq!(c.expiry_time, NOW + 10_000);
    }

    #[test]
    fn expires_with_named_zone_makes_cookie_persistent() {
        let c = parse_set_cookie_at("a=b; Expires=Wed, 09 Jun 2021 02:18:14 PST", "h.test", NOW).unwrap();
        assert!(!c.session_only);
        assert_eq!(c.expiry_time, 1_623_233_894_000);
    }

    #[test]
    fn http_date_formats() {
        let expected = Some(1_623_233_894_000);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 10:18:14 GMT"), expected);
        assert_eq!(parse_http_date("Wed, 09-Jun-2021 10:18:14 GMT"), expected);
        assert_eq!(parse_http_date("09 Jun 2021 10:18:14 UTC"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 12:18:14 +0200"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 12:18:14 GMT+02:00"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 08:18:14 GMT-02:00"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 08:18:14 -0200"), expected);
        assert_eq!(parse_http_date("Wednesday, 09-Jun-21 10:18:14 GMT"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 02:18:14 PST"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 03:18:14 PDT"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 03:18:14 mst"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 04:18:14 CST"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 05:18:14 EST"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 06:18:14 EDT"), expected);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 03:18:14 PST"), Some(1_623_233_894_000 + 3_600_000));
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 10:18:14 XYZ"), None);

        assert_eq!(parse_http_date("Wed, 31 Feb 2021 10:18:14 GMT"), None);
        assert_eq!(parse_http_date("Wed, 09 Foo 2021 10:18:14 GMT"), None);
        assert_eq!(parse_http_date("Wed, 09 Jun 2021 25:18:14 GMT"), None);
        assert_eq!(parse_http_date("tomorrow"), None);
    }
}
