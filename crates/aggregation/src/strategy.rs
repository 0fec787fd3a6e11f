use shared::domain::{BookingRecord, Metric};

/// How a metric folds a group of bookings into one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricStrategy {
    /// Number of bookings.
    Count,
    /// Arithmetic mean of the per-booking value.
    Mean,
    /// Total of the per-booking value.
    Sum,
}

const METRIC_STRATEGIES: [(Metric, MetricStrategy); 8] = [
    (Metric::Reservations, MetricStrategy::Count),
    (Metric::AverageDailyRate, MetricStrategy::Mean),
    (Metric::Adults, MetricStrategy::Sum),
    (Metric::Children, MetricStrategy::Sum),
    (Metric::Babies, MetricStrategy::Sum),
    (Metric::RequiredParkingSpaces, MetricStrategy::Sum),
    (Metric::BookingChanges, MetricStrategy::Sum),
    (Metric::SpecialRequests, MetricStrategy::Sum),
];

impl MetricStrategy {
    pub fn for_metric(metric: Metric) -> Self {
        METRIC_STRATEGIES
            .iter()
            .find(|(candidate, _)| *candidate == metric)
            .map(|(_, strategy)| *strategy)
            .unwrap_or(MetricStrategy::Sum)
    }

    /// Folds an accumulated group. `years` is the cross-year divisor; pass 1 for a single year.
    pub fn finish(self, group: &Accumulator, years: usize) -> f64 {
        let years = years.max(1) as f64;
        match self {
            MetricStrategy::Count => group.count as f64 / years,
            MetricStrategy::Sum => group.sum / years,
            MetricStrategy::Mean if group.count == 0 => 0.0,
            MetricStrategy::Mean => group.sum / group.count as f64,
        }
    }
}

pub fn metric_value(metric: Metric, record: &BookingRecord) -> f64 {
    match metric {
        Metric::Reservations => 1.0,
        Metric::AverageDailyRate => record.average_daily_rate,
        Metric::Adults => f64::from(record.adults),
        Metric::Children => f64::from(record.children),
        Metric::Babies => f64::from(record.babies),
        Metric::RequiredParkingSpaces => f64::from(record.required_parking_spaces),
        Metric::BookingChanges => f64::from(record.booking_changes),
        Metric::SpecialRequests => f64::from(record.special_requests),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pub count: u64,
    pub sum: f64,
}

impl Accumulator {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }
}
