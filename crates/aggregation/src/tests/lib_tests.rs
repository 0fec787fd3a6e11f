use super::*;
use shared::domain::HotelType;

fn booking(hotel_type: HotelType, year: i32, month: u32, day: u32) -> BookingRecord {
    BookingRecord {
        hotel_type,
        arrival_year: year,
        arrival_month: month,
        arrival_day: day,
        country: "PRT".into(),
        total_nights: 1,
        average_daily_rate: 100.0,
        adults: 2,
        children: 0,
        babies: 0,
        required_parking_spaces: 0,
        booking_changes: 0,
        special_requests: 0,
    }
}

fn engine(records: Vec<BookingRecord>) -> AggregationEngine {
    AggregationEngine::new(Dataset::from_records(records).expect("dataset"))
}

fn value_of(rows: &[SeriesRow], label: SeriesLabel, bucket: u32) -> Option<f64> {
    rows.iter()
        .find(|row| row.label == label && row.bucket == bucket)
        .map(|row| row.value)
}

#[test]
fn strategy_table_covers_every_metric() {
    assert_eq!(MetricStrategy::for_metric(Metric::Reservations), MetricStrategy::Count);
    assert_eq!(MetricStrategy::for_metric(Metric::AverageDailyRate), MetricStrategy::Mean);
    for metric in Metric::ALL
        .into_iter()
        .filter(|m| !matches!(m, Metric::Reservations | Metric::AverageDailyRate))
    {
        assert_eq!(MetricStrategy::for_metric(metric), MetricStrategy::Sum, "{metric}");
    }
}

#[test]
fn yearly_reservations_average_divides_by_years_present_in_month() {
    let mut records = vec![
        booking(HotelType::Resort, 2015, 7, 1),
        booking(HotelType::Resort, 2015, 7, 2),
    ];
    records.extend((0..4).map(|day| booking(HotelType::Resort, 2016, 7, day + 1)));
    records.push(booking(HotelType::Resort, 2016, 1, 5));
    let engine = engine(records);

    let rows = engine.yearly_series(HotelFilter::All, Metric::Reservations, 2016);
    assert_eq!(value_of(&rows, SeriesLabel::Average, 7), Some(3.0));
    assert_eq!(value_of(&rows, SeriesLabel::Year(2016), 7), Some(4.0));
    // January only exists in 2016, so its average is not halved
    assert_eq!(value_of(&rows, SeriesLabel::Average, 1), Some(1.0));
}

#[test]
fn yearly_rows_list_average_then_selected_year_without_zero_fill() {
    let engine = engine(vec![
        booking(HotelType::City, 2015, 9, 1),
        booking(HotelType::City, 2016, 3, 1),
    ]);
    let rows = engine.yearly_series(HotelFilter::All, Metric::Reservations, 2016);
    let layout: Vec<(SeriesLabel, u32)> = rows.iter().map(|row| (row.label, row.bucket)).collect();
    assert_eq!(
        layout,
        vec![
            (SeriesLabel::Average, 3),
            (SeriesLabel::Average, 9),
            (SeriesLabel::Year(2016), 3),
        ]
    );
}

#[test]
fn average_daily_rate_uses_plain_mean() {
    let mut cheap = booking(HotelType::City, 2015, 8, 1);
    cheap.average_daily_rate = 50.0;
    let mut pricey = booking(HotelType::City, 2016, 8, 1);
    pricey.average_daily_rate = 150.0;
    let mut pricier = booking(HotelType::City, 2016, 8, 2);
    pricier.average_daily_rate = 250.0;
    let engine = engine(vec![cheap, pricey, pricier]);

    let rows = engine.yearly_series(HotelFilter::City, Metric::AverageDailyRate, 2016);
    assert_eq!(value_of(&rows, SeriesLabel::Average, 8), Some(150.0));
    assert_eq!(value_of(&rows, SeriesLabel::Year(2016), 8), Some(200.0));
}

#[test]
fn summed_metrics_are_normalized_by_distinct_years() {
    let mut a = booking(HotelType::Resort, 2015, 12, 1);
    a.special_requests = 3;
    let mut b = booking(HotelType::Resort, 2016, 12, 1);
    b.special_requests = 1;
    let engine = engine(vec![a, b]);

    let rows = engine.yearly_series(HotelFilter::Resort, Metric::SpecialRequests, 2015);
    assert_eq!(value_of(&rows, SeriesLabel::Average, 12), Some(2.0));
    assert_eq!(value_of(&rows, SeriesLabel::Year(2015), 12), Some(3.0));
}

#[test]
fn hotel_filter_restricts_rows() {
    let engine = engine(vec![
        booking(HotelType::Resort, 2016, 5, 1),
        booking(HotelType::City, 2016, 5, 1),
        booking(HotelType::City, 2016, 5, 2),
    ]);
    let all = engine.yearly_series(HotelFilter::All, Metric::Reservations, 2016);
    let resort = engine.yearly_series(HotelFilter::Resort, Metric::Reservations, 2016);
    let city = engine.yearly_series(HotelFilter::City, Metric::Reservations, 2016);
    assert_eq!(value_of(&all, SeriesLabel::Year(2016), 5), Some(3.0));
    assert_eq!(value_of(&resort, SeriesLabel::Year(2016), 5), Some(1.0));
    assert_eq!(value_of(&city, SeriesLabel::Year(2016), 5), Some(2.0));
}

#[test]
fn unmatched_filters_yield_empty_series() {
    let engine = engine(vec![booking(HotelType::Resort, 2016, 5, 1)]);
    assert!(engine
        .yearly_series(HotelFilter::City, Metric::Reservations, 2016)
        .is_empty());
    assert!(engine
        .monthly_series(HotelFilter::All, Metric::Reservations, 2016, 6)
        .is_empty());
}

#[test]
fn monthly_average_divides_by_years_present_for_the_month() {
    let engine = engine(vec![
        booking(HotelType::City, 2015, 7, 10),
        booking(HotelType::City, 2016, 7, 1),
        booking(HotelType::City, 2016, 7, 1),
        booking(HotelType::City, 2017, 7, 1),
        // a different month does not widen July's year coverage
        booking(HotelType::City, 2014, 3, 1),
    ]);
    let rows = engine.monthly_series(HotelFilter::All, Metric::Reservations, 2016, 7);
    assert_eq!(value_of(&rows, SeriesLabel::Average, 1), Some(1.0));
    assert!((value_of(&rows, SeriesLabel::Average, 10).expect("day 10") - 1.0 / 3.0).abs() < 1e-9);
    assert_eq!(value_of(&rows, SeriesLabel::Year(2016), 1), Some(2.0));
    assert_eq!(value_of(&rows, SeriesLabel::Year(2016), 10), None);
}

#[test]
fn monthly_rows_carry_weekday_of_selected_year() {
    let engine = engine(vec![
        booking(HotelType::Resort, 2016, 2, 29),
        booking(HotelType::Resort, 2016, 2, 1),
        booking(HotelType::Resort, 2017, 2, 1),
    ]);
    let rows = engine.monthly_series(HotelFilter::All, Metric::Reservations, 2017, 2);
    let feb_first = rows
        .iter()
        .find(|row| row.label == SeriesLabel::Year(2017) && row.bucket == 1)
        .expect("row");
    assert_eq!(feb_first.weekday.as_deref(), Some("Wednesday"));

    let leap_day = rows
        .iter()
        .find(|row| row.label == SeriesLabel::Average && row.bucket == 29)
        .expect("row");
    assert_eq!(leap_day.weekday, None);
}

#[test]
fn top_countries_sorts_descending_with_stable_ties() {
    let countries = ["ESP", "GBR", "GBR", "FRA", "ESP", "DEU", "GBR"];
    let records = countries
        .iter()
        .map(|code| {
            let mut record = booking(HotelType::City, 2016, 4, 1);
            record.country = code.to_string();
            record
        })
        .collect();
    let engine = engine(records);

    let rows = engine.top_countries(HotelFilter::All, 2016, 4);
    let flat: Vec<(&str, u64)> = rows.iter().map(|r| (r.country.as_str(), r.count)).collect();
    assert_eq!(flat, vec![("GBR", 3), ("ESP", 2), ("FRA", 1), ("DEU", 1)]);
    assert_eq!(engine.top_countries(HotelFilter::All, 2016, 4), rows);
}

#[test]
fn top_countries_caps_at_ten() {
    let records = (0..15)
        .map(|idx| {
            let mut record = booking(HotelType::Resort, 2016, 4, 1);
            record.country = format!("C{idx:02}");
            record
        })
        .collect();
    let engine = engine(records);
    let rows = engine.top_countries(HotelFilter::Resort, 2016, 4);
    assert_eq!(rows.len(), TOP_COUNTRIES_LIMIT);
    assert_eq!(rows[0].country, "C00");
    assert!(engine.top_countries(HotelFilter::City, 2016, 4).is_empty());
}

#[test]
fn stay_length_splits_evenly_between_two_bookings() {
    let mut two = booking(HotelType::Resort, 2016, 1, 3);
    two.total_nights = 2;
    let mut three = booking(HotelType::Resort, 2016, 1, 4);
    three.total_nights = 3;
    let engine = engine(vec![two, three, booking(HotelType::City, 2016, 1, 4)]);

    let rows = engine.stay_length_distribution(HotelFilter::Resort, 2016, 1);
    assert_eq!(
        rows,
        vec![
            StayLengthRow { nights: 2, percent: 50.0 },
            StayLengthRow { nights: 3, percent: 50.0 },
        ]
    );
    assert!(engine
        .stay_length_distribution(HotelFilter::Resort, 2016, 2)
        .is_empty());
}

#[test]
fn stay_length_percentages_sum_to_one_hundred() {
    let records = (0..7)
        .map(|idx| {
            let mut record = booking(HotelType::City, 2017, 3, idx + 1);
            record.total_nights = idx % 3;
            record
        })
        .collect();
    let engine = engine(records);
    let total: f64 = engine
        .stay_length_distribution(HotelFilter::All, 2017, 3)
        .iter()
        .map(|row| row.percent)
        .sum();
    assert!((total - 100.0).abs() < 0.01);
}

#[test]
fn series_stats_report_extremes_per_line() {
    let rows = vec![
        SeriesRow { bucket: 1, label: SeriesLabel::Average, value: 2.0, weekday: None },
        SeriesRow { bucket: 2, label: SeriesLabel::Average, value: 5.0, weekday: None },
        SeriesRow { bucket: 3, label: SeriesLabel::Average, value: 1.25, weekday: None },
        SeriesRow { bucket: 2, label: SeriesLabel::Year(2016), value: 7.0, weekday: None },
    ];
    let stats = series_stats(&rows);
    assert_eq!(stats.average.mean, Some(2.8));
    assert_eq!(stats.average.max, Some(5.0));
    assert_eq!(stats.average.max_bucket, Some(2));
    assert_eq!(stats.average.min_bucket, Some(3));
    assert_eq!(stats.selected.min, Some(7.0));
    assert_eq!(series_stats(&[]), SeriesStats::default());
}

#[test]
fn views_wrap_rows_with_titles() {
    let engine = engine(vec![booking(HotelType::City, 2016, 1, 1)]);
    let yearly = engine.yearly_view(HotelFilter::All, Metric::Reservations, 2016);
    assert_eq!(yearly.title, "Reservations for 2016");
    let monthly = engine.monthly_view(HotelFilter::All, Metric::AverageDailyRate, 2016, 1);
    assert_eq!(monthly.title, "Average daily rate for January 2016");
    assert_eq!(monthly.stats.selected.mean, Some(100.0));
}

#[test]
fn engine_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AggregationEngine>();

    let engine = std::sync::Arc::new(engine(vec![booking(HotelType::City, 2016, 1, 1)]));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.top_countries(HotelFilter::All, 2016, 1))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread").len(), 1);
    }
}
