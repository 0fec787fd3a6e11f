//! Aggregation engine: reshapes the immutable booking table into the small
//! derived tables the dashboard charts consume.
//!
//! Every query takes `&self` and reads the injected [`Dataset`]; nothing is
//! cached or mutated, so one engine can be shared freely across threads.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use dataset::Dataset;
use shared::{
    domain::{month_name, BookingRecord, HotelFilter, Metric},
    protocol::{CountryRow, LineStats, SeriesLabel, SeriesRow, SeriesStats, SeriesView, StayLengthRow},
};

mod strategy;

pub use strategy::{metric_value, Accumulator, MetricStrategy};

pub const TOP_COUNTRIES_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct AggregationEngine {
    dataset: Dataset,
}

#[derive(Default)]
struct Bucket {
    all_years: Accumulator,
    years_present: BTreeSet<i32>,
    selected: Option<Accumulator>,
}

/// Divisor used to turn cross-year counts and sums into a per-year average.
#[derive(Clone, Copy)]
enum Normalization {
    /// Distinct years seen in the bucket itself.
    PerBucket,
    /// Distinct years seen anywhere in the filtered scope.
    AcrossScope,
}

impl AggregationEngine {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Month-keyed "Average" and selected-year series.
    pub fn yearly_series(&self, hotel_type: HotelFilter, metric: Metric, year: i32) -> Vec<SeriesRow> {
        self.series(
            hotel_type,
            metric,
            year,
            |_| true,
            |record| record.arrival_month,
            Normalization::PerBucket,
        )
    }

    /// Day-keyed series restricted to `month`, tagged with the weekday of the selected year.
    pub fn monthly_series(
        &self,
        hotel_type: HotelFilter,
        metric: Metric,
        year: i32,
        month: u32,
    ) -> Vec<SeriesRow> {
        let mut rows = self.series(
            hotel_type,
            metric,
            year,
            |record| record.arrival_month == month,
            |record| record.arrival_day,
            Normalization::AcrossScope,
        );
        for row in &mut rows {
            row.weekday = NaiveDate::from_ymd_opt(year, month, row.bucket)
                .map(|date| date.format("%A").to_string());
        }
        rows
    }

    pub fn top_countries(&self, hotel_type: HotelFilter, year: i32, month: u32) -> Vec<CountryRow> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut rows: Vec<CountryRow> = Vec::new();

        for record in self.in_period(hotel_type, year, month) {
            match positions.get(record.country.as_str()) {
                Some(&idx) => rows[idx].count += 1,
                None => {
                    positions.insert(record.country.as_str(), rows.len());
                    rows.push(CountryRow {
                        country: record.country.clone(),
                        count: 1,
                    });
                }
            }
        }

        // stable: equal counts keep first-encountered order
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows.truncate(TOP_COUNTRIES_LIMIT);
        rows
    }

    pub fn stay_length_distribution(
        &self,
        hotel_type: HotelFilter,
        year: i32,
        month: u32,
    ) -> Vec<StayLengthRow> {
        let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
        let mut total = 0u64;
        for record in self.in_period(hotel_type, year, month) {
            *counts.entry(record.total_nights).or_default() += 1;
            total += 1;
        }

        counts
            .into_iter()
            .map(|(nights, count)| StayLengthRow {
                nights,
                percent: count as f64 / total as f64 * 100.0,
            })
            .collect()
    }

    pub fn yearly_view(&self, hotel_type: HotelFilter, metric: Metric, year: i32) -> SeriesView {
        let rows = self.yearly_series(hotel_type, metric, year);
        SeriesView {
            title: format!("{metric} for {year}"),
            stats: series_stats(&rows),
            rows,
        }
    }

    pub fn monthly_view(
        &self,
        hotel_type: HotelFilter,
        metric: Metric,
        year: i32,
        month: u32,
    ) -> SeriesView {
        let rows = self.monthly_series(hotel_type, metric, year, month);
        SeriesView {
            title: format!("{metric} for {} {year}", month_name(month).unwrap_or("?")),
            stats: series_stats(&rows),
            rows,
        }
    }

    fn in_period(
        &self,
        hotel_type: HotelFilter,
        year: i32,
        month: u32,
    ) -> impl Iterator<Item = &BookingRecord> {
        self.dataset.records().iter().filter(move |record| {
            hotel_type.admits(record.hotel_type)
                && record.arrival_year == year
                && record.arrival_month == month
        })
    }

    fn series(
        &self,
        hotel_type: HotelFilter,
        metric: Metric,
        year: i32,
        in_scope: impl Fn(&BookingRecord) -> bool,
        bucket_of: impl Fn(&BookingRecord) -> u32,
        normalization: Normalization,
    ) -> Vec<SeriesRow> {
        let strategy = MetricStrategy::for_metric(metric);
        let mut buckets: BTreeMap<u32, Bucket> = BTreeMap::new();
        let mut scope_years = BTreeSet::new();

        for record in self.dataset.records() {
            if !hotel_type.admits(record.hotel_type) || !in_scope(record) {
                continue;
            }
            let value = metric_value(metric, record);
            let bucket = buckets.entry(bucket_of(record)).or_default();
            bucket.all_years.push(value);
            bucket.years_present.insert(record.arrival_year);
            if record.arrival_year == year {
                bucket.selected.get_or_insert_with(Accumulator::default).push(value);
            }
            scope_years.insert(record.arrival_year);
        }

        let mut average = Vec::with_capacity(buckets.len());
        let mut selected = Vec::new();
        for (key, bucket) in &buckets {
            let years = match normalization {
                Normalization::PerBucket => bucket.years_present.len(),
                Normalization::AcrossScope => scope_years.len(),
            };
            average.push(SeriesRow {
                bucket: *key,
                label: SeriesLabel::Average,
                value: strategy.finish(&bucket.all_years, years),
                weekday: None,
            });
            if let Some(group) = &bucket.selected {
                selected.push(SeriesRow {
                    bucket: *key,
                    label: SeriesLabel::Year(year),
                    value: strategy.finish(group, 1),
                    weekday: None,
                });
            }
        }

        average.extend(selected);
        average
    }
}

/// Headline numbers for the "Average" line and the selected-year line of a series.
pub fn series_stats(rows: &[SeriesRow]) -> SeriesStats {
    SeriesStats {
        average: line_stats(rows.iter().filter(|row| row.label == SeriesLabel::Average)),
        selected: line_stats(rows.iter().filter(|row| row.label != SeriesLabel::Average)),
    }
}

fn line_stats<'a>(rows: impl Iterator<Item = &'a SeriesRow>) -> LineStats {
    let mut stats = LineStats::default();
    let mut total = 0.0;
    let mut len = 0usize;

    for row in rows {
        total += row.value;
        len += 1;
        if stats.max.map_or(true, |max| row.value > max) {
            stats.max = Some(row.value);
            stats.max_bucket = Some(row.bucket);
        }
        if stats.min.map_or(true, |min| row.value < min) {
            stats.min = Some(row.value);
            stats.min_bucket = Some(row.bucket);
        }
    }

    if len > 0 {
        stats.mean = Some((total / len as f64 * 10.0).round() / 10.0);
    }
    stats
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
