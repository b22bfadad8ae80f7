use std::ops::Range;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use popreport::config::{ExtractConfig, PipelineConfig};
use popreport::pipeline::{clean_csv, extract_headlines, extract_to_csv};
use popreport::report::DatasetSummary;
use popreport::{DownloadOutcome, Pipeline, WebScraper};

#[derive(Parser)]
#[command(name = "popreport")]
#[command(
    about = "Find, download and tabulate the population data sheet PDF",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug, Clone)]
struct ExtractArgs {
    #[arg(
        long,
        value_name = "FIRST-LAST",
        default_value = "3-22",
        help = "Pages to scan, 1-based and inclusive",
        value_parser = ExtractConfig::parse_page_span,
    )]
    pages: Range<usize>,

    #[arg(
        long,
        default_value_t = 3,
        help = "Header rows to discard at the top of every page table"
    )]
    skip_rows: usize,
}

impl ExtractArgs {
    fn into_config(self) -> ExtractConfig {
        ExtractConfig {
            pages: self.pages,
            skip_rows: self.skip_rows,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[arg(long, default_value = popreport::DEFAULT_INDEX_URL)]
    index_url: String,

    #[arg(
        long,
        default_value = "population",
        help = "Substring identifying the report among the PDF links"
    )]
    keyword: String,

    #[arg(long, default_value = "data", help = "Directory holding raw_data and processed_data")]
    data_dir: PathBuf,

    #[command(flatten)]
    extract: ExtractArgs,
}

impl Default for RunArgs {
    fn default() -> Self {
        let config = PipelineConfig::default();
        Self {
            index_url: config.index_url,
            keyword: config.keyword,
            data_dir: config.data_dir,
            extract: ExtractArgs {
                pages: config.extract.pages,
                skip_rows: config.extract.skip_rows,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole pipeline: discover, download, extract, clean and report (default)
    Run(RunArgs),
    /// List the PDF links found on a web page
    Links {
        #[arg(help = "URL of the index page")]
        url: String,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Download a PDF to a local path
    Download {
        url: String,
        path: PathBuf,
    },
    /// Extract the population table from a downloaded report into a CSV
    Extract {
        pdf: PathBuf,
        csv: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },
    /// Drop aggregate rows from a population CSV and sort it in place
    Clean { csv: PathBuf },
    /// Print summary statistics of a CSV file
    Report {
        csv: PathBuf,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Parse a saved news page into news_data.csv and market_data.csv
    Headlines {
        html: PathBuf,

        #[arg(long, default_value = "data/processed_data")]
        out_dir: PathBuf,
    },
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn validated(extract: ExtractArgs) -> ExtractConfig {
    extract.into_config().validate().unwrap_or_else(|e| {
        log::error!("Invalid args: {e}");
        process::exit(1);
    })
}

fn print_summary(summary: &DatasetSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => serialize_json(summary),
        OutputFormat::Text => {
            println!("\n##########################################################");
            print!("{}", summary);
            println!("##########################################################");
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level: LevelFilter = cli.log_level.clone().into();
    // pdf_oxide logs per-page progress at info.
    env_logger::Builder::new()
        .filter_level(level)
        .filter_module("pdf_oxide", level.min(LevelFilter::Warn))
        .init();

    let scraper = WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let config = PipelineConfig {
                index_url: args.index_url,
                keyword: args.keyword,
                data_dir: args.data_dir,
                extract: validated(args.extract),
                ..Default::default()
            };

            let summary = Pipeline::new(scraper, config)
                .run()
                .await
                .unwrap_or_else(|e| {
                    log::error!("Pipeline failed: {}", e);
                    process::exit(1);
                });

            print_summary(&summary, OutputFormat::Text);
        }

        Commands::Links { url, format } => {
            let links = scraper.find_pdf_links(&url).await.unwrap_or_else(|e| {
                log::error!("Error fetching {}: {}", url, e);
                process::exit(1);
            });

            match format {
                OutputFormat::Json => {
                    let links: Vec<&str> = links.iter().map(|l| l.as_str()).collect();
                    serialize_json(&links)
                }
                OutputFormat::Text => {
                    if links.is_empty() {
                        println!("No PDF links found.");
                    } else {
                        for (i, link) in links.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, link);
                        }
                    }
                }
            }
        }

        Commands::Download { url, path } => {
            let outcome = scraper.download(&url, &path).await.unwrap_or_else(|e| {
                log::error!("Error downloading {}: {}", url, e);
                process::exit(1);
            });

            if let DownloadOutcome::Failed(status) = outcome {
                log::error!("Server answered {} for {}", status, url);
                process::exit(1);
            }
        }

        Commands::Extract { pdf, csv, extract } => {
            let config = validated(extract);
            let rows = extract_to_csv(&pdf, &csv, &config).unwrap_or_else(|e| {
                log::error!("Error extracting {}: {}", pdf.display(), e);
                process::exit(1);
            });
            println!("Extracted {} countries into {}", rows, csv.display());
        }

        Commands::Clean { csv } => {
            let rows = clean_csv(&csv).unwrap_or_else(|e| {
                log::error!("Error cleaning {}: {}", csv.display(), e);
                process::exit(1);
            });
            println!("{} rows remain in {}", rows, csv.display());
        }

        Commands::Report { csv, format } => {
            let summary = DatasetSummary::from_csv(&csv).unwrap_or_else(|e| {
                log::error!("Error reading {}: {}", csv.display(), e);
                process::exit(1);
            });
            print_summary(&summary, format);
        }

        Commands::Headlines { html, out_dir } => {
            let (news, market) = extract_headlines(&html, &out_dir).unwrap_or_else(|e| {
                log::error!("Error extracting headlines from {}: {}", html.display(), e);
                process::exit(1);
            });
            println!("Wrote {} and {}", news.display(), market.display());
        }
    }
}
