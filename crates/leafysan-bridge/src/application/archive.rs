//! Archive formatting: row layout, daily file names, and downsampling.
//!
//! One file per local calendar day, named `data_<Y>-<M>-<D>.csv` with month
//! and day not zero-padded, holding one row per tick:
//!
//! ```text
//! time,temperature,moisture,brightness,co2,heating,watering,lighting,ventilation
//! 14:03:07,22.4,48.7,4177,612,1,0,1,0
//! ```
//!
//! Dashboards plot a whole day at once, so a long archive is thinned to about
//! [`MAX_ARCHIVE_ROWS`] rows before it is sent.

use chrono::{Datelike, Local, NaiveDate, NaiveTime, TimeZone};

use leafysan_core::ChannelValues;

use crate::domain::display::format_tenths;

/// CSV header row of every archive file.
pub const ARCHIVE_HEADER: [&str; 9] = [
    "time",
    "temperature",
    "moisture",
    "brightness",
    "co2",
    "heating",
    "watering",
    "lighting",
    "ventilation",
];

/// Upper bound on data rows sent to a dashboard for one day.
pub const MAX_ARCHIVE_ROWS: usize = 1000;

/// File name of the archive for `date`.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use leafysan_bridge::application::archive_file_name;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
/// assert_eq!(archive_file_name(date), "data_2024-3-7.csv");
/// ```
pub fn archive_file_name(date: NaiveDate) -> String {
    format!("data_{}-{}-{}.csv", date.year(), date.month(), date.day())
}

/// Lays out one archive row in [`ARCHIVE_HEADER`] order.
pub fn archive_record(time: NaiveTime, values: &ChannelValues) -> [String; 9] {
    let flag = |on: bool| if on { "1" } else { "0" }.to_string();
    [
        time.format("%H:%M:%S").to_string(),
        format_tenths(values.temperature_tenths),
        format_tenths(values.moisture_tenths),
        values.brightness.to_string(),
        values.co2.to_string(),
        flag(values.actuators.heating),
        flag(values.actuators.watering),
        flag(values.actuators.lighting),
        flag(values.actuators.ventilation),
    ]
}

/// Resolves the day an archive request asks for.
///
/// `date_ms` is any instant within the day in milliseconds since the Unix
/// epoch, read in local time.  Missing, non-positive or unrepresentable
/// timestamps fall back to `today`.
pub fn archive_date(date_ms: Option<f64>, today: NaiveDate) -> NaiveDate {
    match date_ms {
        Some(ms) if ms.is_finite() && ms > 0.0 => Local
            .timestamp_millis_opt(ms as i64)
            .single()
            .map(|dt| dt.date_naive())
            .unwrap_or(today),
        _ => today,
    }
}

/// Thins `csv_text` to about `max_rows` data rows, keeping the header.
///
/// Rows are kept with an even-stride accumulator: each row adds
/// `max_rows / total` to a fractional counter and is kept when the counter
/// wraps.  Archives already within the limit are returned unchanged.
pub fn downsample(csv_text: &str, max_rows: usize) -> String {
    let mut lines = csv_text.lines();
    let Some(header) = lines.next() else {
        return String::new();
    };
    let rows: Vec<&str> = lines.filter(|l| !l.is_empty()).collect();

    let mut out = String::with_capacity(csv_text.len().min((max_rows + 1) * 64));
    out.push_str(header);
    out.push('\n');

    if rows.len() <= max_rows {
        for row in rows {
            out.push_str(row);
            out.push('\n');
        }
        return out;
    }

    let ratio = max_rows as f64 / rows.len() as f64;
    let mut acc = 0.0_f64;
    for row in rows {
        acc = (acc + ratio) % 1.0;
        if acc < ratio {
            out.push_str(row);
            out.push('\n');
        }
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
