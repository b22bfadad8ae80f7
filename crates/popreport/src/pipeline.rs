use std::path::{Path, PathBuf};

use reqwest::StatusCode;

use crate::config::{ExtractConfig, PipelineConfig};
use crate::parser::{ParseError, parse_latest_news, parse_market_banner};
use crate::pdf::{PdfError, PdfReport};
use crate::report::DatasetSummary;
use crate::scraper::{DownloadOutcome, ScraperError, WebScraper, select_report_link};
use crate::store::{StoreError, read_records, write_records};
use crate::table::{clean, dedup_by_country, page_records};
use crate::types::PopulationRecord;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("No tables were found in the PDF")]
    NoTables,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scraper(#[from] ScraperError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No PDF link containing '{0}' was found")]
    NoReportLink(String),
    #[error("Download failed with status {0}")]
    DownloadFailed(StatusCode),
}

/// Extracts and reshapes the page tables of `report`, deduplicated by Country.
pub fn extract_tables(
    report: &mut PdfReport,
    config: &ExtractConfig,
) -> Result<Vec<PopulationRecord>, ExtractError> {
    let page_count = report.page_count();
    let mut combined = Vec::new();
    let mut tables = 0;

    for index in config.pages.clone() {
        if index >= page_count {
            log::warn!(
                "Page {} is past the end of the document ({} pages), stopping",
                index + 1,
                page_count
            );
            break;
        }

        match report.extract_table(index)? {
            Some(grid) => {
                let records = page_records(grid, config.skip_rows);
                log::info!(
                    "Extracted table from page {} ({} countries)",
                    index + 1,
                    records.len()
                );
                combined.extend(records);
                tables += 1;
            }
            None => log::info!("No table found on page {}", index + 1),
        }
    }

    if tables == 0 {
        return Err(ExtractError::NoTables);
    }
    Ok(dedup_by_country(combined))
}

/// Extracts `pdf_path` into `csv_path`; nothing is written when no table is found.
pub fn extract_to_csv(
    pdf_path: &Path,
    csv_path: &Path,
    config: &ExtractConfig,
) -> Result<usize, ExtractError> {
    let mut report = PdfReport::open(pdf_path)?;
    let records = extract_tables(&mut report, config)?;
    write_records(csv_path, &records)?;
    log::info!("Data saved to {}", csv_path.display());
    Ok(records.len())
}

/// Drops aggregate rows from the CSV at `path`, sorts it and rewrites it in place.
pub fn clean_csv(path: &Path) -> Result<usize, StoreError> {
    let records: Vec<PopulationRecord> = read_records(path)?;
    let before = records.len();
    let cleaned = clean(records);
    write_records(path, &cleaned)?;
    log::info!(
        "Cleaned and sorted data saved to {} ({} of {} rows kept)",
        path.display(),
        cleaned.len(),
        before
    );
    Ok(cleaned.len())
}

/// Parses a saved news page and writes `news_data.csv` and `market_data.csv` into `out_dir`.
pub fn extract_headlines(
    html_path: &Path,
    out_dir: &Path,
) -> Result<(PathBuf, PathBuf), PipelineError> {
    log::info!("Reading and parsing {}", html_path.display());
    let html = std::fs::read_to_string(html_path)?;

    let news = parse_latest_news(&html)?;
    let markets = parse_market_banner(&html)?;

    std::fs::create_dir_all(out_dir)?;
    let news_path = out_dir.join("news_data.csv");
    let market_path = out_dir.join("market_data.csv");

    write_records(&news_path, &news)?;
    log::info!("Saved {} news items to {}", news.len(), news_path.display());
    write_records(&market_path, &markets)?;
    log::info!(
        "Saved {} market cards to {}",
        markets.len(),
        market_path.display()
    );

    Ok((news_path, market_path))
}

pub struct Pipeline {
    scraper: WebScraper,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(scraper: WebScraper, config: PipelineConfig) -> Self {
        Self { scraper, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Discovers, downloads, extracts and cleans the report, then summarizes the result.
    pub async fn run(&self) -> Result<DatasetSummary, PipelineError> {
        self.config.ensure_dirs()?;

        let links = self.scraper.find_pdf_links(&self.config.index_url).await?;
        let report_url = select_report_link(&links, &self.config.keyword)
            .ok_or_else(|| PipelineError::NoReportLink(self.config.keyword.clone()))?;

        let pdf_path = self.config.pdf_path();
        match self.scraper.download(report_url.as_str(), &pdf_path).await? {
            DownloadOutcome::Saved { bytes, .. } => log::debug!("Report is {} bytes", bytes),
            DownloadOutcome::Failed(status) => return Err(PipelineError::DownloadFailed(status)),
        }

        let csv_path = self.config.csv_path();
        extract_to_csv(&pdf_path, &csv_path, &self.config.extract)?;
        clean_csv(&csv_path)?;

        Ok(DatasetSummary::from_csv(&csv_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{build_pdf, open_report, page_operations};
    use axum::Router;
    use axum::routing::get;
    use std::fs;

    fn synthetic_report() -> lopdf::Document {
        build_pdf(&[
            page_operations(&[&["Population Data Sheet"], &["Prepared for testing"]]),
            page_operations(&[
                &["Table 1"],
                &["Country", "Pop", "Births", "Deaths", "RNI", "Migration"],
                &["", "mid-2023", "per 1000", "per 1000", "pct", "rate"],
                &["Andorra", "0.1", "", "4", "", "1"],
                &["", "", "7", "", "0.3", ""],
                &["WORLD", "8045", "17", "8", "0.9", "0"],
            ]),
            page_operations(&[
                &["Table 1 (continued)"],
                &["Country", "Pop", "Births", "Deaths", "RNI", "Migration"],
                &["", "mid-2023", "per 1000", "per 1000", "pct", "rate"],
                &["Andorra", "9.9", "1", "2", "3", "4"],
            ]),
        ])
    }

    fn andorra() -> PopulationRecord {
        PopulationRecord::from_cells(
            "Andorra".to_string(),
            [
                Some("0.1".to_string()),
                Some("7".to_string()),
                Some("4".to_string()),
                Some("0.3".to_string()),
                Some("1".to_string()),
            ],
        )
    }

    fn three_page_config() -> ExtractConfig {
        ExtractConfig {
            pages: 0..3,
            skip_rows: 3,
        }
    }

    #[test]
    fn test_extract_tables_from_synthetic_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = open_report(synthetic_report(), dir.path());

        let records = extract_tables(&mut report, &three_page_config()).expect("Should extract");

        let countries: Vec<&str> = records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["Andorra", "WORLD"]);
        assert_eq!(records[0], andorra());
    }

    #[test]
    fn test_end_to_end_extract_and_clean() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("population_report.pdf");
        let csv_path = dir.path().join("population_data.csv");
        synthetic_report().save(&pdf_path).unwrap();

        let extracted = extract_to_csv(&pdf_path, &csv_path, &three_page_config())
            .expect("Extraction should succeed");
        assert_eq!(extracted, 2);

        let kept = clean_csv(&csv_path).expect("Cleaning should succeed");
        assert_eq!(kept, 1);

        let records: Vec<PopulationRecord> = read_records(&csv_path).unwrap();
        assert_eq!(records, vec![andorra()]);
    }

    #[test]
    fn test_wide_labels_keep_country_key() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("population_report.pdf");
        let csv_path = dir.path().join("population_data.csv");
        build_pdf(&[page_operations(&[
            &["Table 1"],
            &["Country", "Population mid-2023 (millions)", "Births", "Deaths", "RNI", "Migration"],
            &["", "", "Per 1,000", "Per 1,000", "%", "Rate"],
            &["Andorra", "0.1", "", "4", "", "1"],
            &["", "", "7", "", "0.3", ""],
            &["Democratic Republic of the Congo", "102.3", "42", "9", "3.3", "0"],
            &["LESS DEVELOPED", "6769", "19", "7", "1.2", "0"],
        ])])
        .save(&pdf_path)
        .unwrap();
        let config = ExtractConfig {
            pages: 0..1,
            skip_rows: 3,
        };

        extract_to_csv(&pdf_path, &csv_path, &config).expect("Extraction should succeed");
        clean_csv(&csv_path).expect("Cleaning should succeed");

        let records: Vec<PopulationRecord> = read_records(&csv_path).unwrap();
        let countries: Vec<&str> = records.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, vec!["Andorra", "Democratic Republic of the Congo"]);
        assert_eq!(records[0], andorra());
        assert_eq!(records[1].population.as_deref(), Some("102.3"));
        assert_eq!(records[1].net_migration.as_deref(), Some("0"));
    }

    #[test]
    fn test_no_tables_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("prose.pdf");
        let csv_path = dir.path().join("out.csv");
        build_pdf(&[page_operations(&[&["Only prose here"]])])
            .save(&pdf_path)
            .unwrap();

        let result = extract_to_csv(&pdf_path, &csv_path, &three_page_config());

        assert!(matches!(result, Err(ExtractError::NoTables)));
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_page_range_past_end_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = open_report(synthetic_report(), dir.path());
        let config = ExtractConfig {
            pages: 2..40,
            skip_rows: 3,
        };

        let records = extract_tables(&mut report, &config).expect("Page 3 has a table");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].population.as_deref(), Some("9.9"));
    }

    #[test]
    fn test_extract_headlines_writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();

        let (news_path, market_path) =
            extract_headlines(Path::new("fixtures/web_data.html"), dir.path())
                .expect("Headlines should extract");

        let news = fs::read_to_string(news_path).unwrap();
        assert!(news.starts_with("timestamp,title,link\n"));
        assert_eq!(news.lines().count(), 3);

        let markets = fs::read_to_string(market_path).unwrap();
        let mut lines = markets.lines();
        assert_eq!(lines.next(), Some("symbol,stock_position,change_pts"));
        assert_eq!(lines.next(), Some("Dow,43729.93,-34.29"));
    }

    #[tokio::test]
    async fn test_pipeline_run_against_local_server() {
        let mut pdf = synthetic_report();
        let mut pdf_bytes = Vec::new();
        pdf.save_to(&mut pdf_bytes).unwrap();

        let router = Router::new()
            .route(
                "/repository/11620/",
                get(|| async {
                    axum::response::Html(
                        r#"<a href="/files/wallchart.pdf">Chart</a>
                           <a href="/files/2023-Population-Data-Sheet.pdf">Sheet</a>"#,
                    )
                }),
            )
            .route(
                "/files/2023-Population-Data-Sheet.pdf",
                get(move || {
                    let bytes = pdf_bytes.clone();
                    async move { bytes }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            index_url: format!("http://{addr}/repository/11620/"),
            data_dir: dir.path().join("data"),
            extract: three_page_config(),
            ..Default::default()
        };
        let pipeline = Pipeline::new(WebScraper::new().unwrap(), config);

        let summary = pipeline.run().await.expect("Pipeline should succeed");

        assert_eq!(summary.rows, 1);
        assert_eq!(summary.columns.len(), 6);
        assert_eq!(summary.head[0][0], "Andorra");
        assert!(pipeline.config().pdf_path().exists());
    }

    #[tokio::test]
    async fn test_pipeline_without_matching_link() {
        let router = Router::new().route(
            "/",
            get(|| async { axum::response::Html(r#"<a href="/a.pdf">A</a>"#) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            index_url: format!("http://{addr}/"),
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        let result = Pipeline::new(WebScraper::new().unwrap(), config).run().await;

        assert!(matches!(result, Err(PipelineError::NoReportLink(ref k)) if k == "population"));
    }
}
