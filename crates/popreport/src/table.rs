//! Row-level transforms turning raw page grids into a clean population dataset.

use std::collections::{BTreeMap, HashSet};

use crate::types::PopulationRecord;

/// Number of leading grid columns kept per row.
pub const RECORD_COLUMNS: usize = 6;

/// Aggregate labels of the data sheet that are not countries.
pub const AGGREGATE_LABELS: [&str; 9] = [
    "WORLD",
    "More Developed",
    "Less Developed",
    "Least Developed",
    "High Income",
    "Middle Income",
    "Upper-Middle Income",
    "Lower-Middle Income",
    "Low Income",
];

/// A grid row truncated to [`RECORD_COLUMNS`] cells, `None` for empty cells.
pub type RawRow = [Option<String>; RECORD_COLUMNS];

/// Drops the first `skip_rows` rows, truncates to the record columns and nulls blank cells.
///
/// Non-blank cells are kept exactly as extracted.
pub fn normalize_rows(grid: Vec<Vec<String>>, skip_rows: usize) -> Vec<RawRow> {
    grid.into_iter()
        .skip(skip_rows)
        .map(|row| {
            let mut cells = row.into_iter();
            std::array::from_fn(|_| {
                cells.next().filter(|c| !c.trim().is_empty())
            })
        })
        .collect()
}

/// Fills a missing Country with the last Country seen above it.
pub fn forward_fill(rows: &mut [RawRow]) {
    let mut last: Option<String> = None;
    for row in rows.iter_mut() {
        match &row[0] {
            Some(country) => last = Some(country.clone()),
            None => row[0] = last.clone(),
        }
    }
}

/// One record per Country, taking for each field the first non-null value of its rows.
///
/// Rows without a Country are dropped; records come out in ascending Country order.
pub fn group_by_first(rows: Vec<RawRow>) -> Vec<PopulationRecord> {
    let mut groups: BTreeMap<String, [Option<String>; RECORD_COLUMNS - 1]> = BTreeMap::new();

    for row in rows {
        let [country, values @ ..] = row;
        let Some(country) = country else {
            continue;
        };
        let slot = groups.entry(country).or_default();
        for (field, value) in slot.iter_mut().zip(values) {
            if field.is_none() {
                *field = value;
            }
        }
    }

    groups
        .into_iter()
        .map(|(country, values)| PopulationRecord::from_cells(country, values))
        .collect()
}

/// Runs the per-page reshaping: normalize, forward-fill, then group-reduce.
pub fn page_records(grid: Vec<Vec<String>>, skip_rows: usize) -> Vec<PopulationRecord> {
    let mut rows = normalize_rows(grid, skip_rows);
    forward_fill(&mut rows);
    group_by_first(rows)
}

/// Keeps the first record of every Country, preserving order.
pub fn dedup_by_country(records: Vec<PopulationRecord>) -> Vec<PopulationRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.country.clone()))
        .collect()
}

/// True when the label has at least one cased letter and no lowercase ones.
pub fn is_all_uppercase(label: &str) -> bool {
    label.chars().any(char::is_uppercase) && !label.chars().any(char::is_lowercase)
}

/// Whether a Country value names an aggregate or a section header rather than a country.
///
/// The uppercase check also drops real countries the report prints in capitals.
pub fn is_aggregate(country: &str) -> bool {
    AGGREGATE_LABELS.contains(&country) || is_all_uppercase(country)
}

/// Drops aggregate rows and sorts by Country.
pub fn clean(mut records: Vec<PopulationRecord>) -> Vec<PopulationRecord> {
    records.retain(|r| !is_aggregate(&r.country));
    records.sort_by(|a, b| a.country.cmp(&b.country));
    records
}
