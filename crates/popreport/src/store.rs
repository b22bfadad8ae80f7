use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes `records` to `path` with a header row, replacing any existing file.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    log::debug!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    log::debug!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}
