use std::{collections::BTreeMap, fs::File, io, path::Path, sync::Arc};

use chrono::NaiveDate;
use serde::Deserialize;
use shared::domain::{month_from_name, BookingRecord, HotelType};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: invalid {column} value '{value}'")]
    InvalidRecord {
        line: usize,
        column: &'static str,
        value: String,
    },
    #[error("dataset contains no bookings")]
    Empty,
}

/// Immutable, cheaply cloneable handle over the loaded booking table.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Arc<[BookingRecord]>,
    coverage: Arc<BTreeMap<i32, Vec<u32>>>,
    years: Arc<[i32]>,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Hotel type")]
    hotel_type: String,
    #[serde(rename = "Arrival year")]
    arrival_year: String,
    #[serde(rename = "Arrival month")]
    arrival_month: String,
    #[serde(rename = "Arrival day")]
    arrival_day: String,
    #[serde(rename = "Country of origin", default)]
    country: String,
    #[serde(rename = "Weekend nights")]
    weekend_nights: String,
    #[serde(rename = "Week nights")]
    week_nights: String,
    #[serde(rename = "Adults")]
    adults: String,
    #[serde(rename = "Children", default)]
    children: String,
    #[serde(rename = "Babies")]
    babies: String,
    #[serde(rename = "Average daily rate")]
    average_daily_rate: String,
    #[serde(rename = "Required parking spaces")]
    required_parking_spaces: String,
    #[serde(rename = "Booking changes")]
    booking_changes: String,
    #[serde(rename = "Special requests")]
    special_requests: String,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            bookings = dataset.len(),
            years = ?dataset.years(),
            "loaded booking dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (idx, row) in reader.deserialize::<CsvRow>().enumerate() {
            // header occupies line 1
            let line = idx + 2;
            records.push(parse_row(row?, line)?);
        }
        Self::from_records(records)
    }

    pub fn from_records(records: Vec<BookingRecord>) -> Result<Self, DatasetError> {
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut coverage: BTreeMap<i32, Vec<u32>> = BTreeMap::new();
        for record in &records {
            let months = coverage.entry(record.arrival_year).or_default();
            if !months.contains(&record.arrival_month) {
                months.push(record.arrival_month);
            }
        }
        for months in coverage.values_mut() {
            months.sort_unstable();
        }
        let years: Vec<i32> = coverage.keys().copied().collect();
        debug!(?coverage, "computed dataset coverage");

        Ok(Self {
            records: records.into(),
            coverage: Arc::new(coverage),
            years: years.into(),
        })
    }

    pub fn records(&self) -> &[BookingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct arrival years, ascending.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    pub fn contains_year(&self, year: i32) -> bool {
        self.coverage.contains_key(&year)
    }

    /// Months with at least one booking in `year`, ascending. Empty for unknown years.
    pub fn months_for_year(&self, year: i32) -> &[u32] {
        self.coverage
            .get(&year)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn parse_row(row: CsvRow, line: usize) -> Result<BookingRecord, DatasetError> {
    let hotel_type = row
        .hotel_type
        .parse::<HotelType>()
        .map_err(|_| invalid(line, "Hotel type", &row.hotel_type))?;
    let arrival_year = row
        .arrival_year
        .parse::<i32>()
        .map_err(|_| invalid(line, "Arrival year", &row.arrival_year))?;
    let arrival_month = parse_month(&row.arrival_month)
        .ok_or_else(|| invalid(line, "Arrival month", &row.arrival_month))?;
    let arrival_day = parse_count(&row.arrival_day, line, "Arrival day")?;
    if NaiveDate::from_ymd_opt(arrival_year, arrival_month, arrival_day).is_none() {
        return Err(invalid(line, "Arrival day", &row.arrival_day));
    }

    let average_daily_rate = row
        .average_daily_rate
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate >= 0.0)
        .ok_or_else(|| invalid(line, "Average daily rate", &row.average_daily_rate))?;

    let weekend_nights = parse_count(&row.weekend_nights, line, "Weekend nights")?;
    let week_nights = parse_count(&row.week_nights, line, "Week nights")?;
    let total_nights = weekend_nights
        .checked_add(week_nights)
        .ok_or_else(|| invalid(line, "Week nights", &row.week_nights))?;

    Ok(BookingRecord {
        hotel_type,
        arrival_year,
        arrival_month,
        arrival_day,
        country: normalize_country(&row.country),
        total_nights,
        average_daily_rate,
        adults: parse_count(&row.adults, line, "Adults")?,
        children: parse_optional_count(&row.children, line, "Children")?,
        babies: parse_count(&row.babies, line, "Babies")?,
        required_parking_spaces: parse_count(
            &row.required_parking_spaces,
            line,
            "Required parking spaces",
        )?,
        booking_changes: parse_count(&row.booking_changes, line, "Booking changes")?,
        special_requests: parse_count(&row.special_requests, line, "Special requests")?,
    })
}

fn parse_month(raw: &str) -> Option<u32> {
    match raw.parse::<u32>() {
        Ok(month) if (1..=12).contains(&month) => Some(month),
        Ok(_) => None,
        Err(_) => month_from_name(raw),
    }
}

/// Counts may be written as floats ("2.0") by the cleaning step.
fn parse_count(raw: &str, line: usize, column: &'static str) -> Result<u32, DatasetError> {
    if let Ok(value) = raw.parse::<u32>() {
        return Ok(value);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
        .filter(|value| *value <= f64::from(u32::MAX))
        .map(|value| value as u32)
        .ok_or_else(|| invalid(line, column, raw))
}

fn parse_optional_count(
    raw: &str,
    line: usize,
    column: &'static str,
) -> Result<u32, DatasetError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("NA") || raw.eq_ignore_ascii_case("nan") {
        return Ok(0);
    }
    parse_count(raw, line, column)
}

fn normalize_country(raw: &str) -> String {
    if raw.is_empty() || raw.eq_ignore_ascii_case("NULL") || raw.eq_ignore_ascii_case("NA") {
        "Unknown".to_string()
    } else {
        raw.to_string()
    }
}

fn invalid(line: usize, column: &'static str, value: &str) -> DatasetError {
    DatasetError::InvalidRecord {
        line,
        column,
        value: value.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
