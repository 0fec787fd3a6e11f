use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{ControlField, ControlState, HotelFilter, Metric};

/// Control events carry raw values; the binder validates them against the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ControlEvent {
    HotelTypeChanged(String),
    MetricChanged(String),
    YearChanged(i32),
    MonthChanged(u32),
}

impl ControlEvent {
    pub fn field(&self) -> ControlField {
        match self {
            ControlEvent::HotelTypeChanged(_) => ControlField::HotelType,
            ControlEvent::MetricChanged(_) => ControlField::Metric,
            ControlEvent::YearChanged(_) => ControlField::Year,
            ControlEvent::MonthChanged(_) => ControlField::Month,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    MonthOptions,
    Yearly,
    Monthly,
    Countries,
    StayLength,
}

impl ViewId {
    /// Evaluation order: month options settle before the views that read the month.
    pub const ALL: [ViewId; 5] = [
        ViewId::MonthOptions,
        ViewId::Yearly,
        ViewId::Monthly,
        ViewId::Countries,
        ViewId::StayLength,
    ];
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ViewId::MonthOptions => "month_options",
            ViewId::Yearly => "yearly",
            ViewId::Monthly => "monthly",
            ViewId::Countries => "countries",
            ViewId::StayLength => "stay_length",
        })
    }
}

/// Serialized as its display text: `"Average"` or the year, e.g. `"2016"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SeriesLabel {
    Average,
    Year(i32),
}

impl From<SeriesLabel> for String {
    fn from(label: SeriesLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for SeriesLabel {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw == "Average" {
            return Ok(SeriesLabel::Average);
        }
        raw.parse::<i32>()
            .map(SeriesLabel::Year)
            .map_err(|_| format!("invalid series label '{raw}'"))
    }
}

impl fmt::Display for SeriesLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesLabel::Average => f.write_str("Average"),
            SeriesLabel::Year(year) => write!(f, "{year}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    /// Month (1-12) for yearly views, day of month (1-31) for monthly views.
    pub bucket: u32,
    pub label: SeriesLabel,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekday: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineStats {
    pub mean: Option<f64>,
    pub max: Option<f64>,
    pub max_bucket: Option<u32>,
    pub min: Option<f64>,
    pub min_bucket: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub average: LineStats,
    pub selected: LineStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesView {
    pub title: String,
    pub rows: Vec<SeriesRow>,
    pub stats: SeriesStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRow {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StayLengthRow {
    pub nights: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ViewPayload {
    MonthOptions(Vec<u32>),
    Series(SeriesView),
    Countries(Vec<CountryRow>),
    StayLength(Vec<StayLengthRow>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshedView {
    pub view: ViewId,
    pub generation: u64,
    pub payload: ViewPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub controls: ControlState,
    pub views: Vec<RefreshedView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlDomain {
    pub hotel_types: Vec<HotelFilter>,
    pub metrics: Vec<Metric>,
    pub years: Vec<i32>,
    pub controls: ControlState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DashboardEvent {
    ViewsRefreshed {
        controls: ControlState,
        views: Vec<RefreshedView>,
    },
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
