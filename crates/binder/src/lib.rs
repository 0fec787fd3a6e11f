//! Reactive binder for the dashboard.
//!
//! Each view is a node with a static dependency set over the control fields.
//! Applying a batch of control events marks exactly the dependent nodes stale
//! and recomputes each of them once, month options first.

use std::collections::{BTreeMap, BTreeSet};

use aggregation::AggregationEngine;
use shared::{
    domain::{ControlField, ControlState, HotelFilter, Metric},
    error::FilterError,
    protocol::{ControlDomain, ControlEvent, DashboardSnapshot, RefreshedView, ViewId, ViewPayload},
};
use tracing::{debug, info, warn};

const VIEW_DEPENDENCIES: [(ViewId, &[ControlField]); 5] = [
    (ViewId::MonthOptions, &[ControlField::Year]),
    (
        ViewId::Yearly,
        &[ControlField::HotelType, ControlField::Metric, ControlField::Year],
    ),
    (
        ViewId::Monthly,
        &[
            ControlField::HotelType,
            ControlField::Metric,
            ControlField::Year,
            ControlField::Month,
        ],
    ),
    (
        ViewId::Countries,
        &[ControlField::HotelType, ControlField::Year, ControlField::Month],
    ),
    (
        ViewId::StayLength,
        &[ControlField::HotelType, ControlField::Year, ControlField::Month],
    ),
];

/// Control fields a view is recomputed for.
pub fn dependencies(view: ViewId) -> &'static [ControlField] {
    VIEW_DEPENDENCIES
        .iter()
        .find(|(candidate, _)| *candidate == view)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Stale,
    Fresh,
}

#[derive(Debug, Clone)]
struct ViewNode {
    state: NodeState,
    generation: u64,
    payload: Option<ViewPayload>,
}

pub struct DashboardSession {
    engine: AggregationEngine,
    controls: ControlState,
    nodes: BTreeMap<ViewId, ViewNode>,
}

impl DashboardSession {
    /// Builds the session with default controls and computes every view once.
    pub fn new(engine: AggregationEngine, default_year: i32) -> Self {
        let dataset = engine.dataset();
        let year = if dataset.contains_year(default_year) {
            default_year
        } else {
            dataset.years().first().copied().unwrap_or(default_year)
        };
        let month = dataset.months_for_year(year).first().copied().unwrap_or(1);
        let controls = ControlState {
            hotel_type: HotelFilter::default(),
            metric: Metric::default(),
            year,
            month,
        };

        let nodes = ViewId::ALL
            .into_iter()
            .map(|view| {
                (
                    view,
                    ViewNode {
                        state: NodeState::Stale,
                        generation: 0,
                        payload: None,
                    },
                )
            })
            .collect();

        let mut session = Self {
            engine,
            controls,
            nodes,
        };
        session.refresh_stale();
        info!(?controls, "dashboard session initialized");
        session
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }

    pub fn engine(&self) -> &AggregationEngine {
        &self.engine
    }

    pub fn month_options(&self) -> &[u32] {
        self.engine.dataset().months_for_year(self.controls.year)
    }

    pub fn view(&self, view: ViewId) -> Option<&ViewPayload> {
        self.nodes.get(&view).and_then(|node| node.payload.as_ref())
    }

    pub fn generation(&self, view: ViewId) -> u64 {
        self.nodes.get(&view).map_or(0, |node| node.generation)
    }

    pub fn node_state(&self, view: ViewId) -> NodeState {
        self.nodes
            .get(&view)
            .map_or(NodeState::Stale, |node| node.state)
    }

    pub fn control_domain(&self) -> ControlDomain {
        ControlDomain {
            hotel_types: HotelFilter::ALL.to_vec(),
            metrics: Metric::ALL.to_vec(),
            years: self.engine.dataset().years().to_vec(),
            controls: self.controls,
        }
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            controls: self.controls,
            views: ViewId::ALL
                .into_iter()
                .filter_map(|view| self.refreshed(view))
                .collect(),
        }
    }

    pub fn apply(&mut self, event: ControlEvent) -> Result<Vec<RefreshedView>, FilterError> {
        self.apply_batch(std::slice::from_ref(&event))
    }

    /// Applies simultaneous control changes. Either every event is accepted or
    /// the session is left untouched.
    pub fn apply_batch(
        &mut self,
        events: &[ControlEvent],
    ) -> Result<Vec<RefreshedView>, FilterError> {
        let candidate = self.resolve(events).map_err(|err| {
            warn!(%err, "rejected control events");
            err
        })?;

        let changed = changed_fields(&self.controls, &candidate);
        if changed.is_empty() {
            return Ok(Vec::new());
        }
        self.controls = candidate;

        for (view, fields) in VIEW_DEPENDENCIES {
            if fields.iter().any(|field| changed.contains(field)) {
                if let Some(node) = self.nodes.get_mut(&view) {
                    node.state = NodeState::Stale;
                }
            }
        }
        Ok(self.refresh_stale())
    }

    fn resolve(&self, events: &[ControlEvent]) -> Result<ControlState, FilterError> {
        let dataset = self.engine.dataset();
        let mut candidate = self.controls;
        let mut month_selected = false;

        for event in events {
            match event {
                ControlEvent::HotelTypeChanged(raw) => candidate.hotel_type = raw.parse()?,
                ControlEvent::MetricChanged(raw) => candidate.metric = raw.parse()?,
                ControlEvent::YearChanged(year) => {
                    if !dataset.contains_year(*year) {
                        return Err(FilterError::invalid(ControlField::Year, year));
                    }
                    candidate.year = *year;
                }
                ControlEvent::MonthChanged(month) => {
                    if !(1..=12).contains(month) {
                        return Err(FilterError::invalid(ControlField::Month, month));
                    }
                    candidate.month = *month;
                    month_selected = true;
                }
            }
        }

        let options = dataset.months_for_year(candidate.year);
        if !options.contains(&candidate.month) {
            if month_selected {
                return Err(FilterError::invalid(ControlField::Month, candidate.month));
            }
            let Some(&first) = options.first() else {
                return Err(FilterError::invalid(ControlField::Year, candidate.year));
            };
            info!(
                year = candidate.year,
                from = candidate.month,
                to = first,
                "selected month not covered by year, resetting"
            );
            candidate.month = first;
        }

        Ok(candidate)
    }

    fn refresh_stale(&mut self) -> Vec<RefreshedView> {
        let mut refreshed = Vec::new();
        for view in ViewId::ALL {
            if self.node_state(view) == NodeState::Fresh {
                continue;
            }
            let payload = self.compute(view);
            if let Some(node) = self.nodes.get_mut(&view) {
                node.payload = Some(payload);
                node.generation += 1;
                node.state = NodeState::Fresh;
                debug!(%view, generation = node.generation, "recomputed view");
            }
            refreshed.extend(self.refreshed(view));
        }
        refreshed
    }

    fn compute(&self, view: ViewId) -> ViewPayload {
        let ControlState {
            hotel_type,
            metric,
            year,
            month,
        } = self.controls;

        match view {
            ViewId::MonthOptions => ViewPayload::MonthOptions(self.month_options().to_vec()),
            ViewId::Yearly => ViewPayload::Series(self.engine.yearly_view(hotel_type, metric, year)),
            ViewId::Monthly => {
                ViewPayload::Series(self.engine.monthly_view(hotel_type, metric, year, month))
            }
            ViewId::Countries => {
                ViewPayload::Countries(self.engine.top_countries(hotel_type, year, month))
            }
            ViewId::StayLength => ViewPayload::StayLength(
                self.engine
                    .stay_length_distribution(hotel_type, year, month),
            ),
        }
    }

    fn refreshed(&self, view: ViewId) -> Option<RefreshedView> {
        let node = self.nodes.get(&view)?;
        Some(RefreshedView {
            view,
            generation: node.generation,
            payload: node.payload.clone()?,
        })
    }
}

fn changed_fields(before: &ControlState, after: &ControlState) -> BTreeSet<ControlField> {
    let mut changed = BTreeSet::new();
    if before.hotel_type != after.hotel_type {
        changed.insert(ControlField::HotelType);
    }
    if before.metric != after.metric {
        changed.insert(ControlField::Metric);
    }
    if before.year != after.year {
        changed.insert(ControlField::Year);
    }
    if before.month != after.month {
        changed.insert(ControlField::Month);
    }
    changed
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
