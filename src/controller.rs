//! Interaction controller: turns UI events into selection transitions and
//! produces the next set of chart specifications.
//!
//! Events are consumed exactly once. Each carries a client sequence number and
//! anything at or below the last consumed number is dropped as stale, so a
//! re-delivered click is never applied twice. Echoes of the current dropdown
//! values report [`Outcome::Unchanged`] and trigger no re-render, which keeps
//! state-originated control updates from feeding back into new events.

use crate::config::AppConfig;
use crate::data::DataStore;
use crate::error::SelectionResult;
use crate::filter::{rows_for_line, rows_for_map, EmptySelectionPolicy};
use crate::render::{render_line, render_map, LineSpec, MapSpec, MapStyle};
use crate::selection::{SelectionDomain, SelectionState};
use crate::types::Indicator;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Typed UI event payloads.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    YearSelected { year: i32 },
    IndicatorSelected { indicator: String },
    DistrictsSelected { districts: Vec<u32> },
    /// Click on a map region carrying its district code.
    MapClick { location: u32 },
    /// Click on a line-chart point carrying its year.
    LineClick { x: i32 },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EventEnvelope {
    pub seq: u64,
    #[serde(flatten)]
    pub event: Event,
}

/// Values the UI writes back into its dropdowns after an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlSync {
    pub year: i32,
    pub districts: BTreeSet<u32>,
    pub indicator: Indicator,
}

impl From<&SelectionState> for ControlSync {
    fn from(state: &SelectionState) -> Self {
        Self {
            year: state.year,
            districts: state.districts.clone(),
            indicator: state.indicator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub controls: ControlSync,
    pub map: MapSpec,
    pub line: LineSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Applied { view: View },
    Unchanged { controls: ControlSync },
    Stale { seq: u64, last_seq: u64 },
}

/// Shared, immutable part of the dashboard: the data and everything derived
/// from configuration at startup.
pub struct Dashboard {
    store: DataStore,
    domain: SelectionDomain,
    initial: SelectionState,
    policy: EmptySelectionPolicy,
    style: MapStyle,
}

impl Dashboard {
    pub fn new(store: DataStore, config: &AppConfig) -> Result<Self> {
        let domain = SelectionDomain::from_store(&store);
        let initial = domain.initial_state(&config.selection)?;
        let style = MapStyle::from_config(&config.map)?;

        info!(
            years = domain.years.len(),
            districts = domain.districts.len(),
            default_year = initial.year,
            default_indicator = %initial.indicator,
            policy = ?config.selection.empty_districts,
            "Dashboard ready"
        );

        Ok(Self {
            store,
            domain,
            initial,
            policy: config.selection.empty_districts,
            style,
        })
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn domain(&self) -> &SelectionDomain {
        &self.domain
    }

    pub fn initial_state(&self) -> &SelectionState {
        &self.initial
    }

    pub fn view(&self, state: &SelectionState) -> View {
        let map_rows = rows_for_map(&self.store, state.year, state.indicator);
        let line_rows = rows_for_line(&self.store, &state.districts, state.indicator, self.policy);

        View {
            controls: ControlSync::from(state),
            map: render_map(
                &map_rows,
                self.store.regions(),
                state.indicator,
                state.year,
                &state.districts,
                &self.style,
            ),
            line: render_line(&line_rows, state.indicator, self.store.regions(), &state.districts),
        }
    }
}

/// One user's selection plus the event-consumption cursor.
#[derive(Debug, Clone)]
pub struct Session {
    state: SelectionState,
    last_seq: Option<u64>,
}

impl Session {
    pub fn new(dashboard: &Dashboard) -> Self {
        Self {
            state: dashboard.initial_state().clone(),
            last_seq: None,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn view(&self, dashboard: &Dashboard) -> View {
        dashboard.view(&self.state)
    }

    /// Applies one event. A rejected event still consumes its sequence number
    /// and leaves the selection untouched.
    pub fn handle(&mut self, dashboard: &Dashboard, envelope: EventEnvelope) -> SelectionResult<Outcome> {
        let EventEnvelope { seq, event } = envelope;

        if let Some(last_seq) = self.last_seq {
            if seq <= last_seq {
                debug!(seq, last_seq, "Dropping stale event");
                return Ok(Outcome::Stale { seq, last_seq });
            }
        }
        self.last_seq = Some(seq);

        let domain = dashboard.domain();
        let before = self.state.clone();

        let applied = match &event {
            Event::YearSelected { year } => self.state.set_year(domain, *year),
            Event::IndicatorSelected { indicator } => self.state.set_indicator(indicator),
            Event::DistrictsSelected { districts } => self.state.set_districts(domain, districts),
            Event::MapClick { location } => self.state.toggle_district(domain, *location),
            Event::LineClick { x } => self.state.set_year(domain, *x),
        };

        if let Err(err) = applied {
            debug!(seq, ?event, %err, "Rejected event");
            return Err(err);
        }

        if self.state == before {
            debug!(seq, ?event, "Event left selection unchanged");
            return Ok(Outcome::Unchanged {
                controls: ControlSync::from(&self.state),
            });
        }

        debug!(seq, ?event, state = ?self.state, "Applied event");
        Ok(Outcome::Applied {
            view: dashboard.view(&self.state),
        })
    }
}
