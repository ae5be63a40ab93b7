use std::fmt::Display;

use chrono::{DateTime, TimeZone, Timelike};
use serde::Serialize;

/// A stored photo as exposed over the API. Derived from the file on every read.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Photo {
    pub filename: String,
    pub url: String,
    pub timestamp: String,
}

impl Photo {
    pub fn new<Tz: TimeZone>(filename: impl Into<String>, at: &DateTime<Tz>) -> Self
    where
        Tz::Offset: Display,
    {
        let filename = filename.into();
        Self {
            url: format!("/fotos/{filename}"),
            timestamp: format_timestamp(at),
            filename,
        }
    }
}

/// Renders `at` the way the gallery frontend (es-SV locale) displays it,
/// e.g. `05/03/2024, 02:07 p. m.`.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let (pm, _) = at.hour12();
    format!(
        "{} {}",
        at.format("%d/%m/%Y, %I:%M"),
        if pm { "p. m." } else { "a. m." }
    )
}
