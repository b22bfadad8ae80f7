use std::ops::Range;
use std::path::PathBuf;

/// Page range and header layout of the report being extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Zero-indexed, half-open page range to scan.
    pub pages: Range<usize>,
    /// Grid rows discarded at the top of every page table.
    pub skip_rows: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            pages: 2..22,
            skip_rows: 3,
        }
    }
}

impl ExtractConfig {
    pub fn validate(self) -> Result<Self, String> {
        if self.pages.is_empty() {
            return Err(format!(
                "Page range {}..{} is empty",
                self.pages.start, self.pages.end
            ));
        }
        Ok(self)
    }

    /// Parses a 1-based inclusive page span like `3-22` (or a single page `5`).
    pub fn parse_page_span(s: &str) -> Result<Range<usize>, String> {
        let (first, last) = match s.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s.trim(), s.trim()),
        };
        let first: usize = first
            .parse()
            .map_err(|_| format!("Invalid first page: {first}"))?;
        let last: usize = last
            .parse()
            .map_err(|_| format!("Invalid last page: {last}"))?;
        if first == 0 {
            return Err("Pages are numbered from 1".to_string());
        }
        if first > last {
            return Err(format!(
                "First page ({first}) cannot be after last page ({last})"
            ));
        }
        Ok(first - 1..last)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub index_url: String,
    /// Substring picking the report among the discovered PDF links.
    pub keyword: String,
    pub data_dir: PathBuf,
    pub pdf_file_name: String,
    pub csv_file_name: String,
    pub extract: ExtractConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_url: crate::DEFAULT_INDEX_URL.to_string(),
            keyword: "population".to_string(),
            data_dir: PathBuf::from("data"),
            pdf_file_name: "population_report.pdf".to_string(),
            csv_file_name: "population_data.csv".to_string(),
            extract: ExtractConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw_data")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.data_dir.join("processed_data")
    }

    pub fn pdf_path(&self) -> PathBuf {
        self.raw_dir().join(&self.pdf_file_name)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.processed_dir().join(&self.csv_file_name)
    }

    /// Creates the raw and processed data directories if absent.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.raw_dir())?;
        std::fs::create_dir_all(self.processed_dir())
    }
}
