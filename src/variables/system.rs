//! Dynamic variable functions.
//!
//! This module implements the `{{$function args}}` placeholders:
//! `{{$guid}}`, `{{$timestamp}}`, `{{$randomInt}}`, `{{$datetime}}`,
//! `{{$localDatetime}}`, `{{$processEnv}}` and `{{$dotEnv}}`.
//!
//! Every function is total. Malformed arguments fall back to a sensible
//! default instead of failing, and unknown function names are reported as
//! `None` so the caller can leave the placeholder in place.

use chrono::{DateTime, Duration, Local, Months, Offset, TimeZone, Utc};
use rand::Rng;
use std::env;
use uuid::Uuid;

/// Format used when `$datetime` gets no format argument (ISO 8601, UTC).
const ISO8601_UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// ISO 8601 with an explicit offset, for local times.
const ISO8601_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Evaluates a dynamic function by name (case-insensitive).
///
/// `args` is the raw argument text after the function name, if any.
/// Returns `None` for an unknown function.
///
/// # Examples
///
/// ```
/// use dothttp::variables::system::resolve_dynamic_function;
///
/// let id = resolve_dynamic_function("guid", None).unwrap();
/// assert_eq!(id.len(), 36);
///
/// let n: i64 = resolve_dynamic_function("randomInt", Some("5 10")).unwrap().parse().unwrap();
/// assert!((5..10).contains(&n));
///
/// assert!(resolve_dynamic_function("nope", None).is_none());
/// ```
pub fn resolve_dynamic_function(name: &str, args: Option<&str>) -> Option<String> {
    let args = args.map(str::trim).filter(|a| !a.is_empty());

    let value = match name.to_lowercase().as_str() {
        "guid" => resolve_guid(),
        "timestamp" => resolve_timestamp(args),
        "randomint" => resolve_random_int(args),
        "datetime" => resolve_datetime(args, false),
        "localdatetime" => resolve_datetime(args, true),
        "processenv" | "dotenv" => resolve_process_env(args),
        _ => return None,
    };

    Some(value)
}

/// Generates a new UUID v4
fn resolve_guid() -> String {
    Uuid::new_v4().to_string()
}

/// Current Unix time in seconds, with an optional `value unit` offset.
///
/// - `{{$timestamp}}` - now
/// - `{{$timestamp -1 d}}` - one day ago
/// - `{{$timestamp 2 h}}` - two hours from now
fn resolve_timestamp(args: Option<&str>) -> String {
    let now = Utc::now();
    let parts: Vec<&str> = args.map(|a| a.split_whitespace().collect()).unwrap_or_default();

    let instant = match parts.as_slice() {
        [value, unit, ..] => match value.parse::<i64>() {
            Ok(value) => apply_offset(now, value, unit),
            Err(_) => now,
        },
        _ => now,
    };

    instant.timestamp().to_string()
}

/// Random integer in `[0, max)` or `[min, max)`.
///
/// Any argument that is not an integer selects the full `[0, i32::MAX)`
/// range. An empty range yields its lower bound.
fn resolve_random_int(args: Option<&str>) -> String {
    let parts: Vec<&str> = args.map(|a| a.split_whitespace().collect()).unwrap_or_default();
    let parsed: Option<Vec<i32>> = parts.iter().map(|p| p.parse::<i32>().ok()).collect();

    let (min, max) = match parsed.as_deref() {
        Some([max]) => (0, *max),
        Some([min, max, ..]) => (*min, *max),
        _ => (0, i32::MAX),
    };

    if min >= max {
        return min.to_string();
    }

    rand::thread_rng().gen_range(min..max).to_string()
}

/// Current time formatted, with optional format and offset.
///
/// - `{{$datetime}}` - ISO 8601
/// - `{{$datetime rfc1123}}` / `{{$datetime iso8601}}`
/// - `{{$datetime "dd MMM yyyy HH:mm"}}` - custom pattern
/// - `{{$localDatetime iso8601 -1 d}}` - local time, one day ago
fn resolve_datetime(args: Option<&str>, local: bool) -> String {
    let parsed = parse_datetime_arguments(args);
    let unit = parsed.offset_unit.as_deref().unwrap_or("");
    let format = parsed.format.as_deref().map(DateTimeFormat::from_token);

    if local {
        let instant = apply_offset(Local::now(), parsed.offset_value, unit);
        format_datetime(&instant, format)
    } else {
        let instant = apply_offset(Utc::now(), parsed.offset_value, unit);
        format_datetime(&instant, format)
    }
}

/// Reads a process environment variable; empty if unset.
///
/// A leading `%` on the name is accepted and ignored.
fn resolve_process_env(args: Option<&str>) -> String {
    let Some(name) = args.and_then(|a| a.split_whitespace().next()) else {
        return String::new();
    };
    let name = name.strip_prefix('%').unwrap_or(name);

    env::var(name).unwrap_or_default()
}

/// A recognized datetime output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateTimeFormat {
    /// `Tue, 15 Nov 1994 08:12:31 GMT`
    Rfc1123,
    /// `1994-11-15T08:12:31Z`
    Iso8601,
    /// A custom pattern such as `yyyy-MM-dd HH:mm`.
    Custom(String),
}

impl DateTimeFormat {
    /// Classifies a format token; the named formats match case-insensitively.
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("rfc1123") {
            DateTimeFormat::Rfc1123
        } else if token.eq_ignore_ascii_case("iso8601") {
            DateTimeFormat::Iso8601
        } else {
            DateTimeFormat::Custom(token.to_string())
        }
    }
}

/// Time offset units accepted by `$timestamp` and `$datetime`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl OffsetUnit {
    /// Parses a unit symbol. Symbols are case-sensitive: `m` is minutes and
    /// `M` is months.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "ms" => Some(OffsetUnit::Milliseconds),
            "s" => Some(OffsetUnit::Seconds),
            "m" => Some(OffsetUnit::Minutes),
            "h" => Some(OffsetUnit::Hours),
            "d" => Some(OffsetUnit::Days),
            "w" => Some(OffsetUnit::Weeks),
            "M" => Some(OffsetUnit::Months),
            "y" => Some(OffsetUnit::Years),
            _ => None,
        }
    }
}

/// Shifts `instant` by `value` units.
///
/// Weeks are seven days; months and years use calendar arithmetic, so
/// January 31st plus one month is the last day of February. An unknown unit
/// or an out-of-range result returns `instant` unchanged.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use dothttp::variables::system::apply_offset;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
/// assert_eq!(apply_offset(start, 1, "M"), Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
/// assert_eq!(apply_offset(start, -2, "h"), Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap());
/// assert_eq!(apply_offset(start, 5, "fortnights"), start);
/// ```
pub fn apply_offset<Tz: TimeZone>(instant: DateTime<Tz>, value: i64, unit: &str) -> DateTime<Tz> {
    let Some(unit) = OffsetUnit::parse(unit) else {
        return instant;
    };

    let shifted = match unit {
        OffsetUnit::Milliseconds => add_duration(&instant, Duration::try_milliseconds(value)),
        OffsetUnit::Seconds => add_duration(&instant, Duration::try_seconds(value)),
        OffsetUnit::Minutes => add_duration(&instant, Duration::try_minutes(value)),
        OffsetUnit::Hours => add_duration(&instant, Duration::try_hours(value)),
        OffsetUnit::Days => add_duration(&instant, Duration::try_days(value)),
        OffsetUnit::Weeks => add_duration(&instant, Duration::try_weeks(value)),
        OffsetUnit::Months => add_months(&instant, value),
        OffsetUnit::Years => value
            .checked_mul(12)
            .and_then(|months| add_months(&instant, months)),
    };

    shifted.unwrap_or(instant)
}

fn add_duration<Tz: TimeZone>(instant: &DateTime<Tz>, delta: Option<Duration>) -> Option<DateTime<Tz>> {
    instant.clone().checked_add_signed(delta?)
}

fn add_months<Tz: TimeZone>(instant: &DateTime<Tz>, months: i64) -> Option<DateTime<Tz>> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        instant.clone().checked_add_months(magnitude)
    } else {
        instant.clone().checked_sub_months(magnitude)
    }
}

/// Arguments of a `$datetime` / `$localDatetime` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateTimeArguments {
    /// Format token, unquoted. `None` selects the default ISO 8601 format.
    pub format: Option<String>,
    /// Signed offset amount; `0` when absent.
    pub offset_value: i64,
    /// Offset unit symbol, e.g. `d` or `M`.
    pub offset_unit: Option<String>,
}

/// Splits `$datetime` arguments into format and offset.
///
/// The format comes first and may be quoted (`"dd MMM yyyy"` or
/// `'HH:mm'`) to allow spaces. An optional `value unit` pair follows.
///
/// # Examples
///
/// ```
/// use dothttp::variables::system::parse_datetime_arguments;
///
/// let args = parse_datetime_arguments(Some("\"yyyy-MM-dd HH:mm\" -1 d"));
/// assert_eq!(args.format.as_deref(), Some("yyyy-MM-dd HH:mm"));
/// assert_eq!(args.offset_value, -1);
/// assert_eq!(args.offset_unit.as_deref(), Some("d"));
///
/// let args = parse_datetime_arguments(None);
/// assert_eq!(args.format, None);
/// assert_eq!(args.offset_value, 0);
/// ```
pub fn parse_datetime_arguments(args: Option<&str>) -> DateTimeArguments {
    let mut parsed = DateTimeArguments::default();
    let Some(args) = args.map(str::trim).filter(|a| !a.is_empty()) else {
        return parsed;
    };

    let rest = match args.chars().next() {
        Some(quote @ ('"' | '\'')) => match args[1..].find(quote) {
            Some(end) => {
                parsed.format = Some(args[1..1 + end].to_string());
                &args[end + 2..]
            }
            None => {
                parsed.format = Some(args[1..].to_string());
                ""
            }
        },
        _ => {
            let (first, remainder) = args
                .split_once(char::is_whitespace)
                .unwrap_or((args, ""));
            if first.parse::<i64>().is_ok() {
                args
            } else {
                parsed.format = Some(first.to_string());
                remainder
            }
        }
    };

    let mut tokens = rest.split_whitespace();
    if let (Some(value), Some(unit)) = (tokens.next(), tokens.next()) {
        if let Ok(value) = value.parse::<i64>() {
            parsed.offset_value = value;
            parsed.offset_unit = Some(unit.to_string());
        }
    }

    parsed
}

/// Formats `instant` with the given format (ISO 8601 when `None`).
pub fn format_datetime<Tz>(instant: &DateTime<Tz>, format: Option<DateTimeFormat>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let is_utc = instant.offset().fix().local_minus_utc() == 0;

    match format {
        None | Some(DateTimeFormat::Iso8601) if is_utc => instant.format(ISO8601_UTC_FORMAT).to_string(),
        None | Some(DateTimeFormat::Iso8601) => instant.format(ISO8601_OFFSET_FORMAT).to_string(),
        Some(DateTimeFormat::Rfc1123) => instant
            .with_timezone(&Utc)
            .format(RFC1123_FORMAT)
            .to_string(),
        Some(DateTimeFormat::Custom(pattern)) => format_custom(instant, &pattern),
    }
}

/// Pattern tokens, longest first so `yyyy` wins over `yy`.
const CUSTOM_TOKENS: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("YYYY", "%Y"),
    ("MMMM", "%B"),
    ("dddd", "%A"),
    ("fff", "%3f"),
    ("SSS", "%3f"),
    ("MMM", "%b"),
    ("ddd", "%a"),
    ("zzz", "%:z"),
    ("yy", "%y"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("dd", "%d"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("tt", "%p"),
    ("M", "%-m"),
    ("d", "%-d"),
    ("D", "%-d"),
    ("H", "%-H"),
    ("h", "%-I"),
    ("m", "%-M"),
    ("s", "%-S"),
    ("A", "%p"),
    ("Z", "%:z"),
];

/// Formats with a .NET / Day.js style pattern (`yyyy-MM-dd HH:mm:ss`).
///
/// Text inside single quotes or square brackets is copied literally, as is
/// any character that is not part of a token.
fn format_custom<Tz>(instant: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut strftime = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    'outer: while let Some(ch) = rest.chars().next() {
        if ch == '\'' || ch == '[' {
            let close = if ch == '\'' { '\'' } else { ']' };
            let body = &rest[1..];
            let end = body.find(close).unwrap_or(body.len());
            push_literal(&mut strftime, &body[..end]);
            rest = body.get(end + 1..).unwrap_or("");
            continue;
        }

        for (token, directive) in CUSTOM_TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                strftime.push_str(directive);
                rest = after;
                continue 'outer;
            }
        }

        push_literal(&mut strftime, &rest[..ch.len_utf8()]);
        rest = &rest[ch.len_utf8()..];
    }

    instant.format(&strftime).to_string()
}

fn push_literal(out: &mut String, literal: &str) {
    for ch in literal.chars() {
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
    }
}
