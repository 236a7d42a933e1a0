//! Cross-filtering: the row subsets behind the map and the line chart.
//!
//! Both functions are pure linear scans over the store's rows and keep the
//! store's load order, so repeated calls with the same input give the same
//! sequence.

use crate::data::DataStore;
use crate::types::{Indicator, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What the line chart shows while no district is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptySelectionPolicy {
    /// Every district with data for the indicator.
    #[default]
    ShowAll,
    /// Nothing until at least one district is selected.
    ShowNone,
}

/// Rows of `year` that carry a value for `indicator`.
pub fn rows_for_map(store: &DataStore, year: i32, indicator: Indicator) -> Vec<&Row> {
    store
        .rows()
        .iter()
        .filter(|row| row.year == year && row.value(indicator).is_some())
        .collect()
}

/// Rows of the selected districts, across all years, that carry a value for `indicator`.
pub fn rows_for_line<'a>(
    store: &'a DataStore,
    districts: &BTreeSet<u32>,
    indicator: Indicator,
    policy: EmptySelectionPolicy,
) -> Vec<&'a Row> {
    if districts.is_empty() && policy == EmptySelectionPolicy::ShowNone {
        return Vec::new();
    }

    store
        .rows()
        .iter()
        .filter(|row| row.value(indicator).is_some())
        .filter(|row| districts.is_empty() || districts.contains(&row.district))
        .collect()
}
