use crate::config::SelectionConfig;
use crate::data::DataStore;
use crate::error::{SelectionError, SelectionResult};
use crate::types::Indicator;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// The values a selection may take, derived once from the loaded data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionDomain {
    pub years: BTreeSet<i32>,
    pub districts: BTreeSet<u32>,
}

impl SelectionDomain {
    pub fn from_store(store: &DataStore) -> Self {
        Self {
            years: store.years().clone(),
            districts: store.district_codes(),
        }
    }

    pub fn check_year(&self, year: i32) -> SelectionResult<()> {
        if self.years.contains(&year) {
            Ok(())
        } else {
            Err(SelectionError::UnknownYear(year))
        }
    }

    pub fn check_district(&self, code: u32) -> SelectionResult<()> {
        if self.districts.contains(&code) {
            Ok(())
        } else {
            Err(SelectionError::UnknownDistrict(code))
        }
    }

    /// Initial state for a new session.
    ///
    /// A configured default year must exist in the data; without one the
    /// latest year is used.
    pub fn initial_state(&self, config: &SelectionConfig) -> Result<SelectionState> {
        let year = match config.default_year {
            Some(year) => {
                self.check_year(year)
                    .map_err(|e| anyhow!("Invalid [selection] default_year: {}", e))?;
                year
            }
            None => *self
                .years
                .iter()
                .next_back()
                .ok_or_else(|| anyhow!("Dataset contains no rows, no default year available"))?,
        };

        Ok(SelectionState {
            year,
            districts: BTreeSet::new(),
            indicator: config.default_indicator,
        })
    }
}

/// One session's selection. Fields are independent; every setter validates
/// against the domain and leaves the state untouched when it fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub year: i32,
    pub districts: BTreeSet<u32>,
    pub indicator: Indicator,
}

impl SelectionState {
    pub fn set_year(&mut self, domain: &SelectionDomain, year: i32) -> SelectionResult<()> {
        domain.check_year(year)?;
        self.year = year;
        Ok(())
    }

    pub fn set_indicator(&mut self, key: &str) -> SelectionResult<()> {
        self.indicator = key.parse()?;
        Ok(())
    }

    /// Adds `code` when absent, removes it when present.
    pub fn toggle_district(&mut self, domain: &SelectionDomain, code: u32) -> SelectionResult<()> {
        domain.check_district(code)?;
        if !self.districts.remove(&code) {
            self.districts.insert(code);
        }
        Ok(())
    }

    /// Replaces the whole district set, as a multi-select dropdown does.
    pub fn set_districts(&mut self, domain: &SelectionDomain, codes: &[u32]) -> SelectionResult<()> {
        for &code in codes {
            domain.check_district(code)?;
        }
        self.districts = codes.iter().copied().collect();
        Ok(())
    }
}
