//! Shared fixtures for unit tests.

use crate::config::AppConfig;
use crate::data::DataStore;
use crate::types::{district_label, DistrictRegion, Row};
use geo::{polygon, MultiPolygon};

fn square(code: u32, x0: f64, y0: f64) -> DistrictRegion {
    DistrictRegion {
        code,
        name: district_label(code),
        geometry: MultiPolygon::new(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0),
            (x: x0, y: y0),
        ]]),
    }
}

fn row(district: u32, year: i32, rent: f64, income: f64, income_female: Option<f64>) -> Row {
    Row {
        district,
        year,
        rent: Some(rent),
        income_total: Some(income),
        income_male: Some(income * 1.1),
        income_female,
        rent_income_total: Some(rent / income),
        rent_income_male: Some(rent / (income * 1.1)),
        rent_income_female: income_female.map(|f| rent / f),
    }
}

/// Districts 901, 902, 903, 905 and 910 over the years 2018, 2020 and 2023.
///
/// 902 has a boundary but no rows; 910 has no female income in 2020.
pub fn sample_store() -> DataStore {
    let regions = vec![
        square(901, 0.0, 0.0),
        square(902, 1.0, 0.0),
        square(903, 2.0, 0.0),
        square(905, 0.0, 1.0),
        square(910, 1.0, 1.0),
    ];

    let rows = vec![
        row(901, 2018, 14.1, 31_000.0, Some(28_000.0)),
        row(901, 2020, 15.0, 32_500.0, Some(29_100.0)),
        row(901, 2023, 16.4, 34_000.0, Some(30_900.0)),
        row(903, 2018, 11.2, 25_000.0, Some(23_000.0)),
        row(903, 2020, 11.9, 25_800.0, Some(23_600.0)),
        row(903, 2023, 12.8, 27_100.0, Some(24_900.0)),
        row(905, 2018, 10.6, 23_400.0, Some(21_500.0)),
        row(905, 2020, 11.3, 24_100.0, Some(22_200.0)),
        row(905, 2023, 12.2, 25_300.0, Some(23_300.0)),
        row(910, 2018, 8.9, 20_100.0, Some(18_400.0)),
        row(910, 2020, 9.4, 20_600.0, None),
        row(910, 2023, 10.3, 21_700.0, Some(19_800.0)),
    ];

    DataStore::new(rows, regions).expect("sample store is consistent")
}

pub fn sample_config() -> AppConfig {
    AppConfig::from_toml_str(
        r#"
        [input]
        data_csv = "unused.csv"
        geojson = "unused.json"
        "#,
    )
    .expect("sample config parses")
}
