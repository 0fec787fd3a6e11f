use aggregation::AggregationEngine;
use dataset::Dataset;
use shared::{
    domain::{HotelFilter, Metric},
    protocol::SeriesLabel,
};

const SAMPLE: &str = include_str!("../../../data/sample_hotels.csv");

fn engine() -> AggregationEngine {
    AggregationEngine::new(Dataset::from_reader(SAMPLE.as_bytes()).expect("sample dataset"))
}

#[test]
fn yearly_series_is_bounded_for_every_filter() {
    let engine = engine();
    for hotel_type in HotelFilter::ALL {
        for metric in Metric::ALL {
            for &year in engine.dataset().years() {
                let rows = engine.yearly_series(hotel_type, metric, year);
                assert!(rows.len() <= 24);
                assert!(rows.iter().all(|row| (1..=12).contains(&row.bucket)));
            }
        }
    }
}

#[test]
fn average_line_ignores_selected_year() {
    let engine = engine();
    for hotel_type in HotelFilter::ALL {
        for metric in Metric::ALL {
            let averages: Vec<Vec<(u32, f64)>> = engine
                .dataset()
                .years()
                .iter()
                .map(|&year| {
                    engine
                        .yearly_series(hotel_type, metric, year)
                        .into_iter()
                        .filter(|row| row.label == SeriesLabel::Average)
                        .map(|row| (row.bucket, row.value))
                        .collect()
                })
                .collect();
            assert!(averages.windows(2).all(|pair| pair[0] == pair[1]));
        }
    }
}

#[test]
fn histograms_hold_their_invariants_on_sample() {
    let engine = engine();
    for hotel_type in HotelFilter::ALL {
        for &year in engine.dataset().years() {
            for &month in engine.dataset().months_for_year(year) {
                let countries = engine.top_countries(hotel_type, year, month);
                assert!(countries.len() <= 10);
                assert!(countries.windows(2).all(|pair| pair[0].count >= pair[1].count));
                assert_eq!(countries, engine.top_countries(hotel_type, year, month));

                let stays = engine.stay_length_distribution(hotel_type, year, month);
                if !stays.is_empty() {
                    let total: f64 = stays.iter().map(|row| row.percent).sum();
                    assert!((total - 100.0).abs() < 0.01);
                }
            }
        }
    }
}
