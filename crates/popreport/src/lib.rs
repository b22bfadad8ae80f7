pub mod config;
mod parser;
pub mod pdf;
pub mod pipeline;
pub mod report;
pub mod scraper;
pub mod store;
pub mod table;
pub mod types;

pub use parser::{ParseError, parse_latest_news, parse_market_banner, parse_pdf_links};
pub use pipeline::{Pipeline, PipelineError};
pub use scraper::{DownloadOutcome, ScraperError, WebScraper};

pub const DEFAULT_INDEX_URL: &str = "https://repository.gheli.harvard.edu/repository/11620/";
