use crate::error::SelectionError;
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One observation for a district in a given year.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub district: u32,
    pub year: i32,
    pub rent: Option<f64>,
    pub income_total: Option<f64>,
    pub income_male: Option<f64>,
    pub income_female: Option<f64>,
    pub rent_income_total: Option<f64>,
    pub rent_income_male: Option<f64>,
    pub rent_income_female: Option<f64>,
}

impl Row {
    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::Rent => self.rent,
            Indicator::IncomeTotal => self.income_total,
            Indicator::IncomeMale => self.income_male,
            Indicator::IncomeFemale => self.income_female,
            Indicator::RentIncomeTotal => self.rent_income_total,
            Indicator::RentIncomeMale => self.rent_income_male,
            Indicator::RentIncomeFemale => self.rent_income_female,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DistrictRegion {
    pub code: u32,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Serialized as its column key; deserialized case-insensitively via `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Indicator {
    #[default]
    #[serde(rename = "RENT")]
    Rent,
    #[serde(rename = "INC_TOT_VALUE")]
    IncomeTotal,
    #[serde(rename = "INC_MAL_VALUE")]
    IncomeMale,
    #[serde(rename = "INC_FEM_VALUE")]
    IncomeFemale,
    #[serde(rename = "RENT_INC_TOT_RATIO")]
    RentIncomeTotal,
    #[serde(rename = "RENT_INC_MAL_RATIO")]
    RentIncomeMale,
    #[serde(rename = "RENT_INC_FEM_RATIO")]
    RentIncomeFemale,
}

impl Indicator {
    pub const ALL: [Indicator; 7] = [
        Indicator::Rent,
        Indicator::IncomeTotal,
        Indicator::IncomeMale,
        Indicator::IncomeFemale,
        Indicator::RentIncomeTotal,
        Indicator::RentIncomeMale,
        Indicator::RentIncomeFemale,
    ];

    /// Column name in the CSV and key used by the UI.
    pub fn key(self) -> &'static str {
        match self {
            Indicator::Rent => "RENT",
            Indicator::IncomeTotal => "INC_TOT_VALUE",
            Indicator::IncomeMale => "INC_MAL_VALUE",
            Indicator::IncomeFemale => "INC_FEM_VALUE",
            Indicator::RentIncomeTotal => "RENT_INC_TOT_RATIO",
            Indicator::RentIncomeMale => "RENT_INC_MAL_RATIO",
            Indicator::RentIncomeFemale => "RENT_INC_FEM_RATIO",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::Rent => "Average rent (EUR/m²)",
            Indicator::IncomeTotal => "Average net income, total (EUR)",
            Indicator::IncomeMale => "Average net income, men (EUR)",
            Indicator::IncomeFemale => "Average net income, women (EUR)",
            Indicator::RentIncomeTotal => "Rent to income ratio, total",
            Indicator::RentIncomeMale => "Rent to income ratio, men",
            Indicator::RentIncomeFemale => "Rent to income ratio, women",
        }
    }
}

impl TryFrom<String> for Indicator {
    type Error = SelectionError;

    fn try_from(key: String) -> Result<Self, Self::Error> {
        key.parse()
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Indicator {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim();
        Indicator::ALL
            .into_iter()
            .find(|i| i.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| SelectionError::UnknownIndicator(key.to_string()))
    }
}

/// Built-in labels for the 23 Vienna districts, keyed by district code.
pub const VIENNA_DISTRICTS: [(u32, &str); 23] = [
    (901, "1. District - Innere Stadt"),
    (902, "2. District - Leopoldstadt"),
    (903, "3. District - Landstraße"),
    (904, "4. District - Wieden"),
    (905, "5. District - Margareten"),
    (906, "6. District - Mariahilf"),
    (907, "7. District - Neubau"),
    (908, "8. District - Josefstadt"),
    (909, "9. District - Alsergrund"),
    (910, "10. District - Favoriten"),
    (911, "11. District - Simmering"),
    (912, "12. District - Meidling"),
    (913, "13. District - Hietzing"),
    (914, "14. District - Penzing"),
    (915, "15. District - Rudolfsheim-Fünfhaus"),
    (916, "16. District - Ottakring"),
    (917, "17. District - Hernals"),
    (918, "18. District - Währing"),
    (919, "19. District - Döbling"),
    (920, "20. District - Brigittenau"),
    (921, "21. District - Floridsdorf"),
    (922, "22. District - Donaustadt"),
    (923, "23. District - Liesing"),
];

pub fn district_label(code: u32) -> String {
    VIENNA_DISTRICTS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("District {}", code))
}
