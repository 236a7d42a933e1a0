//! Chart specifications handed to the client-side plotting library.

use crate::config::MapConfig;
use crate::types::{DistrictRegion, Indicator, Row};
use anyhow::{anyhow, bail, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Key the client uses to join `RegionFill::code` to boundary features.
pub const FEATURE_ID_KEY: &str = "properties.DISTRICT_CODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rgb([u8; 3]);

impl Rgb {
    fn to_hex(self) -> String {
        let [r, g, b] = self.0;
        format!("#{:02x}{:02x}{:02x}", r, g, b)
    }
}

fn parse_hex(hex: &str) -> Result<Rgb> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        bail!("'{}' is not a #rrggbb color", hex);
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| anyhow!("'{}' is not a #rrggbb color", hex))
    };
    Ok(Rgb([channel(0..2)?, channel(2..4)?, channel(4..6)?]))
}

/// Map styling resolved from `[map]` configuration, colors validated.
#[derive(Debug, Clone)]
pub struct MapStyle {
    stops: Vec<Rgb>,
    no_data: Rgb,
    highlight: Rgb,
    style: String,
    center: [f64; 2],
    zoom: f64,
}

impl MapStyle {
    pub fn from_config(config: &MapConfig) -> Result<Self> {
        if config.color_stops.is_empty() {
            bail!("[map] color_stops must contain at least one color");
        }
        Ok(Self {
            stops: config.color_stops.iter().map(|c| parse_hex(c)).collect::<Result<_>>()?,
            no_data: parse_hex(&config.no_data_color)?,
            highlight: parse_hex(&config.highlight_color)?,
            style: config.style.clone(),
            center: config.center,
            zoom: config.zoom,
        })
    }

    /// Linear interpolation over the stops; `t` is clamped to [0, 1].
    fn color_at(&self, t: f64) -> Rgb {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let last = self.stops.len() - 1;
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last);
        if i == last {
            return self.stops[last];
        }
        let frac = pos - i as f64;
        let (a, b) = (self.stops[i].0, self.stops[i + 1].0);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        Rgb([mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])])
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapSpec {
    pub indicator: Indicator,
    pub title: String,
    pub year: i32,
    pub regions: Vec<RegionFill>,
    pub scale: ColorScale,
    pub layout: MapLayout,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RegionFill {
    pub code: u32,
    pub name: String,
    pub value: Option<f64>,
    pub color: String,
    pub highlighted: bool,
    pub outline: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColorScale {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub stops: Vec<String>,
    pub no_data_color: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapLayout {
    pub style: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub feature_id_key: &'static str,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LineSpec {
    pub indicator: Indicator,
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub series: Vec<LineSeries>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LineSeries {
    pub district: u32,
    pub name: String,
    pub mode: &'static str,
    pub highlighted: bool,
    pub points: Vec<LinePoint>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct LinePoint {
    pub x: i32,
    pub y: f64,
}

/// Choropleth for one year. Every known region is present; regions without a
/// row in `rows` get no value and the no-data color.
pub fn render_map(
    rows: &[&Row],
    regions: &[DistrictRegion],
    indicator: Indicator,
    year: i32,
    selected: &BTreeSet<u32>,
    style: &MapStyle,
) -> MapSpec {
    // Rows without a boundary never reach the map and stay out of the scale.
    let drawn: HashSet<u32> = regions.iter().map(|r| r.code).collect();
    let values: HashMap<u32, f64> = rows
        .iter()
        .filter(|row| drawn.contains(&row.district))
        .filter_map(|row| row.value(indicator).map(|v| (row.district, v)))
        .collect();

    let min = values.values().copied().reduce(f64::min);
    let max = values.values().copied().reduce(f64::max);

    let scale_position = |v: f64| match (min, max) {
        (Some(lo), Some(hi)) if hi > lo => (v - lo) / (hi - lo),
        _ => 0.5,
    };

    let regions = regions
        .iter()
        .map(|region| {
            let value = values.get(&region.code).copied();
            let color = match value {
                Some(v) => style.color_at(scale_position(v)),
                None => style.no_data,
            };
            let highlighted = selected.contains(&region.code);
            RegionFill {
                code: region.code,
                name: region.name.clone(),
                value,
                color: color.to_hex(),
                highlighted,
                outline: highlighted.then(|| style.highlight.to_hex()),
            }
        })
        .collect();

    MapSpec {
        indicator,
        title: format!("{} ({})", indicator.label(), year),
        year,
        regions,
        scale: ColorScale {
            min,
            max,
            stops: style.stops.iter().map(|c| c.to_hex()).collect(),
            no_data_color: style.no_data.to_hex(),
        },
        layout: MapLayout {
            style: style.style.clone(),
            center_lat: style.center[0],
            center_lon: style.center[1],
            zoom: style.zoom,
            feature_id_key: FEATURE_ID_KEY,
        },
    }
}

/// One series per district in `rows`, ordered by district code, points by year.
pub fn render_line(
    rows: &[&Row],
    indicator: Indicator,
    regions: &[DistrictRegion],
    selected: &BTreeSet<u32>,
) -> LineSpec {
    let mut by_district: BTreeMap<u32, Vec<LinePoint>> = BTreeMap::new();
    for row in rows {
        if let Some(y) = row.value(indicator) {
            by_district
                .entry(row.district)
                .or_default()
                .push(LinePoint { x: row.year, y });
        }
    }

    let series = by_district
        .into_iter()
        .map(|(district, mut points)| {
            points.sort_by_key(|p| p.x);
            let name = regions
                .iter()
                .find(|r| r.code == district)
                .map(|r| r.name.clone())
                .unwrap_or_else(|| crate::types::district_label(district));
            LineSeries {
                district,
                name,
                mode: "lines+markers",
                highlighted: selected.contains(&district),
                points,
            }
        })
        .collect();

    LineSpec {
        indicator,
        title: format!("{} over time", indicator.label()),
        x_label: "Year",
        y_label: indicator.label(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{rows_for_line, rows_for_map, EmptySelectionPolicy};
    use crate::test_support::sample_store;

    fn style() -> MapStyle {
        MapStyle::from_config(&MapConfig::default()).unwrap()
    }

    #[test]
    fn hex_colors_are_validated() {
        assert_eq!(parse_hex("#440154").unwrap(), Rgb([0x44, 0x01, 0x54]));
        assert_eq!(parse_hex("fde725").unwrap(), Rgb([0xfd, 0xe7, 0x25]));
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("#zzzzzz").is_err());

        let config = MapConfig {
            no_data_color: "grey".to_string(),
            ..MapConfig::default()
        };
        assert!(MapStyle::from_config(&config).is_err());
    }

    #[test]
    fn color_ramp_hits_both_ends_and_interpolates() {
        let config = MapConfig {
            color_stops: vec!["#000000".to_string(), "#ffffff".to_string()],
            ..MapConfig::default()
        };
        let style = MapStyle::from_config(&config).unwrap();
        assert_eq!(style.color_at(0.0).to_hex(), "#000000");
        assert_eq!(style.color_at(1.0).to_hex(), "#ffffff");
        assert_eq!(style.color_at(0.5).to_hex(), "#808080");
        assert_eq!(style.color_at(7.0).to_hex(), "#ffffff");
    }

    #[test]
    fn district_without_value_is_rendered_as_no_data() {
        let store = sample_store();
        let rows = rows_for_map(&store, 2020, Indicator::IncomeFemale);
        let spec = render_map(&rows, store.regions(), Indicator::IncomeFemale, 2020, &BTreeSet::new(), &style());

        let favoriten = spec.regions.iter().find(|r| r.code == 910).expect("910 must not be omitted");
        assert_eq!(favoriten.value, None);
        assert_eq!(favoriten.color, spec.scale.no_data_color);
        assert_eq!(spec.regions.len(), store.regions().len());
    }

    #[test]
    fn map_scale_spans_the_rows() {
        let store = sample_store();
        let rows = rows_for_map(&store, 2020, Indicator::Rent);
        let spec = render_map(&rows, store.regions(), Indicator::Rent, 2020, &BTreeSet::new(), &style());

        let min = spec.regions.iter().filter_map(|r| r.value).fold(f64::INFINITY, f64::min);
        let max = spec.regions.iter().filter_map(|r| r.value).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(spec.scale.min, Some(min));
        assert_eq!(spec.scale.max, Some(max));

        let lowest = spec.regions.iter().find(|r| r.value == Some(min)).unwrap();
        let highest = spec.regions.iter().find(|r| r.value == Some(max)).unwrap();
        assert_eq!(lowest.color, "#440154");
        assert_eq!(highest.color, "#fde725");
    }

    #[test]
    fn rows_without_a_region_stay_out_of_the_scale() {
        let store = sample_store();
        let mut rows = rows_for_map(&store, 2020, Indicator::Rent);
        let orphan = Row {
            district: 999,
            rent: Some(1_000.0),
            ..rows[0].clone()
        };
        rows.push(&orphan);

        let spec = render_map(&rows, store.regions(), Indicator::Rent, 2020, &BTreeSet::new(), &style());
        assert_eq!(spec.scale.max, Some(15.0));
        assert!(spec.regions.iter().all(|r| r.code != 999));
        let highest = spec.regions.iter().find(|r| r.value == Some(15.0)).unwrap();
        assert_eq!(highest.color, "#fde725");
    }

    #[test]
    fn selected_regions_are_outlined() {
        let store = sample_store();
        let rows = rows_for_map(&store, 2020, Indicator::Rent);
        let selected = BTreeSet::from([903]);
        let spec = render_map(&rows, store.regions(), Indicator::Rent, 2020, &selected, &style());

        for region in &spec.regions {
            assert_eq!(region.highlighted, region.code == 903);
            assert_eq!(region.outline.is_some(), region.code == 903);
        }
    }

    #[test]
    fn empty_rows_render_every_region_as_no_data() {
        let store = sample_store();
        let spec = render_map(&[], store.regions(), Indicator::Rent, 2020, &BTreeSet::new(), &style());
        assert_eq!(spec.scale.min, None);
        assert!(spec.regions.iter().all(|r| r.value.is_none()));
    }

    #[test]
    fn line_has_one_series_per_district_sorted_by_year() {
        let store = sample_store();
        let selected = BTreeSet::from([901, 910]);
        let rows = rows_for_line(&store, &selected, Indicator::Rent, EmptySelectionPolicy::ShowAll);
        let spec = render_line(&rows, Indicator::Rent, store.regions(), &selected);

        let districts: Vec<u32> = spec.series.iter().map(|s| s.district).collect();
        assert_eq!(districts, vec![901, 910]);
        for series in &spec.series {
            let years: Vec<i32> = series.points.iter().map(|p| p.x).collect();
            assert_eq!(years, vec![2018, 2020, 2023]);
            assert_eq!(series.mode, "lines+markers");
            assert!(series.highlighted);
        }
        assert_eq!(spec.series[1].name, "10. District - Favoriten");
    }

    #[test]
    fn line_series_skip_missing_years() {
        let store = sample_store();
        let selected = BTreeSet::from([910]);
        let rows = rows_for_line(&store, &selected, Indicator::IncomeFemale, EmptySelectionPolicy::ShowAll);
        let spec = render_line(&rows, Indicator::IncomeFemale, store.regions(), &selected);
        let years: Vec<i32> = spec.series[0].points.iter().map(|p| p.x).collect();
        assert_eq!(years, vec![2018, 2023]);
    }
}
