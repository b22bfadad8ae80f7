use serde::{Deserialize, Serialize};

/// Column headers of the population table, in record order.
pub const POPULATION_COLUMNS: [&str; 6] = [
    "Country",
    "Population (millions) mid-2023",
    "Births per 1,000 Population",
    "Deaths per 1,000 Population",
    "Rate of Natural Increase (%)",
    "Net Migration Rate",
];

/// One country row of the population data sheet.
///
/// Values stay as the text found in the report; an empty cell is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Population (millions) mid-2023")]
    pub population: Option<String>,
    #[serde(rename = "Births per 1,000 Population")]
    pub birth_rate: Option<String>,
    #[serde(rename = "Deaths per 1,000 Population")]
    pub death_rate: Option<String>,
    #[serde(rename = "Rate of Natural Increase (%)")]
    pub natural_increase: Option<String>,
    #[serde(rename = "Net Migration Rate")]
    pub net_migration: Option<String>,
}

impl PopulationRecord {
    /// Builds a record from a Country and the five remaining cells in column order.
    pub fn from_cells(country: String, values: [Option<String>; 5]) -> Self {
        let [population, birth_rate, death_rate, natural_increase, net_migration] = values;
        Self {
            country,
            population,
            birth_rate,
            death_rate,
            natural_increase,
            net_migration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub timestamp: String,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCard {
    pub symbol: String,
    pub stock_position: f64,
    pub change_pts: f64,
}

