use std::fmt::Display;

use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// How the local send date typed by the user reaches the API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendDateMode {
    /// Interpret as local time and send the UTC instant.
    #[default]
    Convert,
    /// Append a `Z` to the input unchanged, as older clients did.
    Verbatim,
}

pub fn normalize_send_date(input: &str, mode: SendDateMode) -> AppResult<String> {
    match mode {
        SendDateMode::Convert => local_to_utc(input, &Local),
        SendDateMode::Verbatim => Ok(format!("{input}Z")),
    }
}

pub fn local_to_utc<Tz: TimeZone>(input: &str, tz: &Tz) -> AppResult<String> {
    let naive = parse_local(input)?;
    let local = tz.from_local_datetime(&naive).earliest().ok_or_else(|| {
        AppError::InvalidInput(format!(
            "send date `{}` does not exist in the local time zone",
            input.trim()
        ))
    })?;

    Ok(local.with_timezone(&Utc).format(WIRE_FORMAT).to_string())
}

fn parse_local(input: &str) -> AppResult<NaiveDateTime> {
    let trimmed = input.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "send date `{trimmed}` must look like yyyy-MM-dd HH:mm:ss"
            ))
        })
}

pub fn default_send_date<Tz: TimeZone>(now: DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    (now + TimeDelta::hours(1)).format(DISPLAY_FORMAT).to_string()
}

pub fn display_send_date(stored: &str) -> String {
    display_send_date_in(stored, &Local)
}

pub fn display_send_date_in<Tz: TimeZone>(stored: &str, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    match DateTime::parse_from_rfc3339(stored.trim()) {
        Ok(instant) => instant.with_timezone(tz).format(DISPLAY_FORMAT).to_string(),
        Err(_) => stored.replace('Z', ""),
    }
}
