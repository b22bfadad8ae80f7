use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Client, StatusCode};
use url::Url;

use crate::parser::parse_pdf_links;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a download attempt that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, bytes: usize },
    Failed(StatusCode),
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }

    /// Fetches `url` and returns the absolute URLs of every `.pdf` link on it.
    ///
    /// A non-success status is logged and yields an empty list.
    pub async fn find_pdf_links(&self, url: &str) -> Result<Vec<Url>, ScraperError> {
        let base = Url::parse(url)?;
        log::info!("Looking for PDF links on {}", base);

        let response = self
            .client
            .get(base.clone())
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Failed to access {}. Status code: {}", base, status);
            return Ok(Vec::new());
        }

        let final_url = response.url().clone();
        let html = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        let links = parse_pdf_links(&html, &final_url);
        log::info!("Found {} PDF links on the webpage", links.len());
        for link in &links {
            log::info!("  {}", link);
        }
        Ok(links)
    }

    /// Downloads `url` into `path`, overwriting it.
    ///
    /// A non-success status is logged and leaves `path` untouched.
    pub async fn download(&self, url: &str, path: &Path) -> Result<DownloadOutcome, ScraperError> {
        log::info!("Downloading {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Failed to download PDF. Status code: {}", status);
            return Ok(DownloadOutcome::Failed(status));
        }

        let body = response.bytes().await?;
        std::fs::write(path, &body)?;
        log::info!("PDF downloaded and saved as {}", path.display());

        Ok(DownloadOutcome::Saved {
            path: path.to_path_buf(),
            bytes: body.len(),
        })
    }
}

/// First link whose URL contains `keyword`, ignoring case.
pub fn select_report_link<'a>(links: &'a [Url], keyword: &str) -> Option<&'a Url> {
    let keyword = keyword.to_lowercase();
    links
        .iter()
        .find(|link| link.as_str().to_lowercase().contains(&keyword))
}
