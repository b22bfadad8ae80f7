use std::fmt::Display;
use std::path::Path;

use serde::Serialize;

use crate::store::StoreError;

/// Rows shown in the preview.
pub const HEAD_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Narrowest type every non-empty value parses as. An all-empty column is `Float`.
    pub fn infer<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
        let mut kind = ColumnType::Integer;
        let mut seen_any = false;
        for value in values.map(str::trim).filter(|v| !v.is_empty()) {
            seen_any = true;
            if kind == ColumnType::Integer && value.parse::<i64>().is_err() {
                kind = ColumnType::Float;
            }
            if kind == ColumnType::Float && value.parse::<f64>().is_err() {
                return ColumnType::Text;
            }
        }
        if seen_any { kind } else { ColumnType::Float }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Text => write!(f, "text"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub nulls: usize,
    pub kind: ColumnType,
}

fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}

/// Shape, preview and per-column diagnostics of a CSV table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub head: Vec<Vec<String>>,
}

impl DatasetSummary {
    pub fn from_csv(path: &Path) -> Result<Self, StoreError> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
        let rows = reader
            .records()
            .map(|r| r.map(|rec| rec.iter().map(String::from).collect::<Vec<_>>()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(headers, rows))
    }

    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let columns = headers
            .into_iter()
            .enumerate()
            .map(|(i, name)| ColumnSummary {
                name,
                nulls: rows.iter().filter(|r| cell(r, i).trim().is_empty()).count(),
                kind: ColumnType::infer(rows.iter().map(|r| cell(r, i))),
            })
            .collect();

        Self {
            rows: rows.len(),
            head: rows.into_iter().take(HEAD_ROWS).collect(),
            columns,
        }
    }

    /// Number of cells, rows times columns.
    pub fn size(&self) -> usize {
        self.rows * self.columns.len()
    }
}

impl Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "First {} records:", self.head.len().min(HEAD_ROWS))?;
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        writeln!(f, "  {}", names.join(" | "))?;
        for (i, row) in self.head.iter().enumerate() {
            writeln!(f, "{:>3}. {}", i, row.join(" | "))?;
        }

        writeln!(f, "\nSize of the dataset (cells): {}", self.size())?;
        writeln!(
            f,
            "Dimensions of the dataset (rows, columns): ({}, {})",
            self.rows,
            self.columns.len()
        )?;

        let width = self.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
        writeln!(f, "\nMissing data in each column:")?;
        for column in &self.columns {
            writeln!(f, "  {:<width$}  {}", column.name, column.nulls)?;
        }
        writeln!(f, "\nData types of each column:")?;
        for column in &self.columns {
            writeln!(f, "  {:<width$}  {}", column.name, column.kind)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_infer_column_types() {
        assert_eq!(
            ColumnType::infer(["1", "2", "", "-7"].into_iter()),
            ColumnType::Integer
        );
        assert_eq!(
            ColumnType::infer(["1", "2.5", ""].into_iter()),
            ColumnType::Float
        );
        assert_eq!(
            ColumnType::infer(["1.5", "n/a"].into_iter()),
            ColumnType::Text
        );
        assert_eq!(ColumnType::infer(["", " "].into_iter()), ColumnType::Float);
    }

    #[test]
    fn test_summary_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut body = String::from("Country,Population,Note\n");
        for i in 0..12 {
            body.push_str(&format!("Country {i},{i}.5,\n"));
        }
        body.push_str("Tuvalu,,tiny\n");
        fs::write(&path, body).unwrap();

        let summary = DatasetSummary::from_csv(&path).expect("Failed to summarize");

        assert_eq!(summary.rows, 13);
        assert_eq!(summary.size(), 39);
        assert_eq!(summary.head.len(), HEAD_ROWS);
        assert_eq!(summary.head[0], vec!["Country 0", "0.5", ""]);
        assert_eq!(
            summary.columns,
            vec![
                ColumnSummary {
                    name: "Country".into(),
                    nulls: 0,
                    kind: ColumnType::Text
                },
                ColumnSummary {
                    name: "Population".into(),
                    nulls: 1,
                    kind: ColumnType::Float
                },
                ColumnSummary {
                    name: "Note".into(),
                    nulls: 12,
                    kind: ColumnType::Text
                },
            ]
        );

        let rendered = summary.to_string();
        assert!(rendered.contains("Dimensions of the dataset (rows, columns): (13, 3)"));
        assert!(rendered.contains("Missing data in each column:"));
    }

    #[test]
    fn test_summary_of_missing_file_fails() {
        assert!(DatasetSummary::from_csv(Path::new("/nonexistent/popreport.csv")).is_err());
    }
}
