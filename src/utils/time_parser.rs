//! 过期时间解析
//!
//! 支持 RFC3339（`2026-10-01T12:00:00Z`）与相对时长（`1d`、`2h30m`、`1w2d`）。

use chrono::{DateTime, Duration, Utc};

/// 解析过期时间，相对时长以 `now` 为起点
pub fn parse_expire_time_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty expiration time".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let duration = parse_relative(input)?;
    now.checked_add_signed(duration)
        .ok_or_else(|| format!("expiration '{}' is out of range", input))
}

pub fn parse_expire_time(input: &str) -> Result<DateTime<Utc>, String> {
    parse_expire_time_at(input, Utc::now())
}

fn parse_relative(input: &str) -> Result<Duration, String> {
    let mut total = Duration::zero();
    let mut chars = input.char_indices().peekable();

    while chars.peek().is_some() {
        let start = chars.peek().map(|(i, _)| *i).unwrap_or(0);
        let mut digits_end = start;
        while let Some((i, c)) = chars.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            digits_end = i + c.len_utf8();
            chars.next();
        }
        if digits_end == start {
            return Err(format!("invalid time format: '{}'", input));
        }
        let amount: i64 = input[start..digits_end]
            .parse()
            .map_err(|_| format!("invalid number in '{}'", input))?;

        let unit_start = digits_end;
        let mut unit_end = unit_start;
        while let Some((i, c)) = chars.peek().copied() {
            if !c.is_alphabetic() {
                break;
            }
            unit_end = i + c.len_utf8();
            chars.next();
        }
        if unit_end == unit_start {
            return Err(format!("missing unit after '{}'", amount));
        }

        // "M" 为月，其余单位大小写不敏感
        let unit = &input[unit_start..unit_end];
        let step = match unit {
            "M" => Duration::try_days(amount.saturating_mul(30)),
            _ => match unit.to_lowercase().as_str() {
                "s" | "sec" | "secs" | "second" | "seconds" => Duration::try_seconds(amount),
                "m" | "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(amount),
                "h" | "hr" | "hour" | "hours" => Duration::try_hours(amount),
                "d" | "day" | "days" => Duration::try_days(amount),
                "w" | "week" | "weeks" => Duration::try_weeks(amount),
                "month" | "months" => Duration::try_days(amount.saturating_mul(30)),
                "y" | "year" | "years" => Duration::try_days(amount.saturating_mul(365)),
                _ => return Err(format!("unsupported time unit: '{}'", unit)),
            },
        }
        .ok_or_else(|| format!("duration '{}' is out of range", input))?;

        total = total
            .checked_add(&step)
            .ok_or_else(|| format!("duration '{}' is out of range", input))?;
    }

    if total.is_zero() {
        return Err("duration must be greater than zero".to_string());
    }
    Ok(total)
}
