use crate::config::{AppConfig, InputConfig};
use crate::spatial::RegionIndex;
use crate::types::{district_label, DistrictRegion, Indicator, Row};
use anyhow::{anyhow, bail, Context, Result};
use axum::body::Bytes;
use csv::{ReaderBuilder, StringRecord};
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Cell contents treated as "no value".
const MISSING_TOKENS: [&str; 5] = ["", "na", "nan", "-", "null"];

/// Immutable, in-memory dataset and district boundaries.
pub struct DataStore {
    rows: Vec<Row>,
    regions: Vec<DistrictRegion>,
    years: BTreeSet<i32>,
    index: RegionIndex,
    boundaries: FeatureCollection,
    boundaries_json: Bytes,
}

impl DataStore {
    pub fn load(config: &AppConfig) -> Result<Self> {
        info!("Loading data...");

        let rows = load_rows(&config.input.data_csv)?;
        info!("Loaded {} rows from {:?}", rows.len(), config.input.data_csv);

        let regions = load_regions(&config.input)?;
        info!("Loaded {} district regions from {:?}", regions.len(), config.input.geojson);

        Self::new(rows, regions)
    }

    pub fn new(rows: Vec<Row>, regions: Vec<DistrictRegion>) -> Result<Self> {
        let mut seen = HashSet::new();
        for region in &regions {
            if !seen.insert(region.code) {
                bail!("Duplicate district code {} in boundary collection", region.code);
            }
        }

        let mut keys = HashSet::new();
        for row in &rows {
            if !keys.insert((row.district, row.year)) {
                bail!("Duplicate row for district {} in year {}", row.district, row.year);
            }
        }

        let unmatched: BTreeSet<u32> = rows
            .iter()
            .map(|r| r.district)
            .filter(|code| !seen.contains(code))
            .collect();
        if !unmatched.is_empty() {
            warn!(?unmatched, "Dataset rows reference districts without a boundary; they will not appear on the map");
        }

        let years = rows.iter().map(|r| r.year).collect();
        let index = RegionIndex::build(&regions);
        let boundaries = normalized_boundaries(&regions);
        let boundaries_json = Bytes::from(
            serde_json::to_vec(&boundaries).context("Failed to serialize boundary collection")?,
        );

        Ok(Self {
            rows,
            regions,
            years,
            index,
            boundaries,
            boundaries_json,
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn regions(&self) -> &[DistrictRegion] {
        &self.regions
    }

    pub fn years(&self) -> &BTreeSet<i32> {
        &self.years
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.years.iter().next_back().copied()
    }

    pub fn district_codes(&self) -> BTreeSet<u32> {
        self.regions.iter().map(|r| r.code).collect()
    }

    /// District whose boundary contains the given coordinate.
    pub fn district_at(&self, lat: f64, lon: f64) -> Option<&DistrictRegion> {
        self.index.locate(&self.regions, lon, lat)
    }

    /// Normalized boundary collection for the client map: each feature carries
    /// `DISTRICT_CODE` and `name` regardless of the source property names.
    pub fn boundary_collection(&self) -> &FeatureCollection {
        &self.boundaries
    }

    /// `boundary_collection` serialized once at load.
    pub fn boundary_json(&self) -> Bytes {
        self.boundaries_json.clone()
    }
}

fn normalized_boundaries(regions: &[DistrictRegion]) -> FeatureCollection {
    let features = regions
        .iter()
        .map(|region| {
            let mut properties = serde_json::Map::new();
            properties.insert("DISTRICT_CODE".to_string(), region.code.into());
            properties.insert("name".to_string(), region.name.clone().into());
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&region.geometry))),
                id: Some(geojson::feature::Id::Number(region.code.into())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn load_rows(path: &Path) -> Result<Vec<Row>> {
    let file = File::open(path).with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    read_rows(file).with_context(|| format!("Failed to read dataset {:?}", path))
}

/// Column positions resolved from the header row.
struct Columns {
    district: usize,
    year: usize,
    indicators: HashMap<Indicator, usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

        let district = find("district").ok_or_else(|| anyhow!("Column 'district' not found in CSV"))?;
        let year = find("year").ok_or_else(|| anyhow!("Column 'year' not found in CSV"))?;

        let indicators: HashMap<Indicator, usize> = Indicator::ALL
            .into_iter()
            .filter_map(|i| find(i.key()).map(|idx| (i, idx)))
            .collect();

        if indicators.is_empty() {
            bail!("CSV has no indicator columns (expected any of RENT, INC_TOT_VALUE, ...)");
        }

        Ok(Self { district, year, indicators })
    }

    fn value(&self, record: &StringRecord, indicator: Indicator, line: u64) -> Result<Option<f64>> {
        match self.indicators.get(&indicator) {
            Some(&idx) => parse_cell(record.get(idx).unwrap_or(""))
                .with_context(|| format!("line {}, column {}", line, indicator.key())),
            None => Ok(None),
        }
    }
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();
    let columns = Columns::resolve(&headers)?;
    debug!(indicators = ?columns.indicators.keys().collect::<Vec<_>>(), "Resolved CSV columns");

    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let district = parse_code(record.get(columns.district).unwrap_or(""))
            .with_context(|| format!("line {}, column district", line))?;
        let year = parse_year(record.get(columns.year).unwrap_or(""))
            .with_context(|| format!("line {}, column year", line))?;

        let mut row = Row {
            district,
            year,
            rent: columns.value(&record, Indicator::Rent, line)?,
            income_total: columns.value(&record, Indicator::IncomeTotal, line)?,
            income_male: columns.value(&record, Indicator::IncomeMale, line)?,
            income_female: columns.value(&record, Indicator::IncomeFemale, line)?,
            rent_income_total: columns.value(&record, Indicator::RentIncomeTotal, line)?,
            rent_income_male: columns.value(&record, Indicator::RentIncomeMale, line)?,
            rent_income_female: columns.value(&record, Indicator::RentIncomeFemale, line)?,
        };
        derive_ratios(&mut row);
        rows.push(row);
    }

    Ok(rows)
}

fn parse_cell(raw: &str) -> Result<Option<f64>> {
    let cell = raw.trim();
    if MISSING_TOKENS.iter().any(|t| cell.eq_ignore_ascii_case(t)) {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(anyhow!("'{}' is not a finite number", cell)),
    }
}

// Codes sometimes arrive as "901.0" when the source was exported from a float column.
fn parse_code(raw: &str) -> Result<u32> {
    let cell = raw.trim();
    if let Ok(code) = cell.parse::<u32>() {
        return Ok(code);
    }
    cell.parse::<f64>()
        .ok()
        .and_then(code_from_f64)
        .ok_or_else(|| anyhow!("'{}' is not a district code", cell))
}

fn code_from_f64(v: f64) -> Option<u32> {
    (v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64).then_some(v as u32)
}

fn parse_year(raw: &str) -> Result<i32> {
    let cell = raw.trim();
    if let Ok(year) = cell.parse::<i32>() {
        return Ok(year);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(anyhow!("'{}' is not a year", cell)),
    }
}

fn derive_ratios(row: &mut Row) {
    fn ratio(rent: Option<f64>, income: Option<f64>) -> Option<f64> {
        match (rent, income) {
            (Some(rent), Some(income)) if income > 0.0 => Some(rent / income),
            _ => None,
        }
    }

    if row.rent_income_total.is_none() {
        row.rent_income_total = ratio(row.rent, row.income_total);
    }
    if row.rent_income_male.is_none() {
        row.rent_income_male = ratio(row.rent, row.income_male);
    }
    if row.rent_income_female.is_none() {
        row.rent_income_female = ratio(row.rent, row.income_female);
    }
}

pub fn load_regions(input: &InputConfig) -> Result<Vec<DistrictRegion>> {
    let file = File::open(&input.geojson)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", input.geojson))?;
    read_regions(BufReader::new(file), &input.district_property, input.name_property.as_deref())
}

pub fn read_regions<R: Read>(
    reader: R,
    district_property: &str,
    name_property: Option<&str>,
) -> Result<Vec<DistrictRegion>> {
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut regions = Vec::new();

    for (position, feature) in collection.features.into_iter().enumerate() {
        let props = feature.properties.as_ref();

        let code = match props.and_then(|p| p.get(district_property)) {
            Some(serde_json::Value::Number(n)) => match n.as_u64() {
                Some(v) => u32::try_from(v).ok(),
                None => n.as_f64().and_then(code_from_f64),
            },
            Some(serde_json::Value::String(s)) => parse_code(s).ok(),
            _ => None,
        };
        let Some(code) = code else {
            warn!(position, property = district_property, "Skipping feature without a district code");
            continue;
        };

        let name = name_property
            .and_then(|key| props.and_then(|p| p.get(key)))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| district_label(code));

        let geometry = match feature.geometry {
            Some(geom) => {
                let valid_geo: geo::Geometry<f64> = geom
                    .value
                    .try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of district {}: {:?}", code, e))?;

                match valid_geo {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        warn!(code, "Skipping non-polygon geometry");
                        continue;
                    }
                }
            }
            None => {
                warn!(code, "Skipping feature without geometry");
                continue;
            }
        };

        regions.push(DistrictRegion { code, name, geometry });
    }

    regions.sort_by_key(|r| r.code);
    Ok(regions)
}
