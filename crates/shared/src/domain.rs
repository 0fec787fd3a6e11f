use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
}

pub fn month_from_name(name: &str) -> Option<u32> {
    let name = name.trim();
    MONTH_NAMES
        .iter()
        .position(|candidate| {
            candidate.eq_ignore_ascii_case(name)
                || (name.len() == 3 && candidate[..3].eq_ignore_ascii_case(name))
        })
        .map(|idx| idx as u32 + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HotelType {
    Resort,
    City,
}

impl HotelType {
    pub fn as_str(self) -> &'static str {
        match self {
            HotelType::Resort => "Resort",
            HotelType::City => "City",
        }
    }
}

impl FromStr for HotelType {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "Resort" | "Resort Hotel" => Ok(HotelType::Resort),
            "City" | "City Hotel" => Ok(HotelType::City),
            other => Err(FilterError::invalid(ControlField::HotelType, other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HotelFilter {
    #[default]
    All,
    Resort,
    City,
}

impl HotelFilter {
    pub const ALL: [HotelFilter; 3] = [HotelFilter::All, HotelFilter::Resort, HotelFilter::City];

    pub fn admits(self, hotel_type: HotelType) -> bool {
        match self {
            HotelFilter::All => true,
            HotelFilter::Resort => hotel_type == HotelType::Resort,
            HotelFilter::City => hotel_type == HotelType::City,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HotelFilter::All => "All",
            HotelFilter::Resort => "Resort",
            HotelFilter::City => "City",
        }
    }
}

impl fmt::Display for HotelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HotelFilter {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        HotelFilter::ALL
            .into_iter()
            .find(|filter| filter.as_str().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| FilterError::invalid(ControlField::HotelType, raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Metric {
    #[default]
    #[serde(rename = "Reservations")]
    Reservations,
    #[serde(rename = "Average daily rate")]
    AverageDailyRate,
    #[serde(rename = "Adults")]
    Adults,
    #[serde(rename = "Children")]
    Children,
    #[serde(rename = "Babies")]
    Babies,
    #[serde(rename = "Required parking spaces")]
    RequiredParkingSpaces,
    #[serde(rename = "Booking changes")]
    BookingChanges,
    #[serde(rename = "Special requests")]
    SpecialRequests,
}

impl Metric {
    pub const ALL: [Metric; 8] = [
        Metric::Reservations,
        Metric::AverageDailyRate,
        Metric::Adults,
        Metric::Children,
        Metric::Babies,
        Metric::RequiredParkingSpaces,
        Metric::BookingChanges,
        Metric::SpecialRequests,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Metric::Reservations => "Reservations",
            Metric::AverageDailyRate => "Average daily rate",
            Metric::Adults => "Adults",
            Metric::Children => "Children",
            Metric::Babies => "Babies",
            Metric::RequiredParkingSpaces => "Required parking spaces",
            Metric::BookingChanges => "Booking changes",
            Metric::SpecialRequests => "Special requests",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = FilterError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.label().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| FilterError::invalid(ControlField::Metric, raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlField {
    HotelType,
    Metric,
    Year,
    Month,
}

impl fmt::Display for ControlField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlField::HotelType => "hotel_type",
            ControlField::Metric => "metric",
            ControlField::Year => "year",
            ControlField::Month => "month",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub hotel_type: HotelFilter,
    pub metric: Metric,
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub hotel_type: HotelType,
    pub arrival_year: i32,
    pub arrival_month: u32,
    pub arrival_day: u32,
    pub country: String,
    pub total_nights: u32,
    pub average_daily_rate: f64,
    pub adults: u32,
    pub children: u32,
    pub babies: u32,
    pub required_parking_spaces: u32,
    pub booking_changes: u32,
    pub special_requests: u32,
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
