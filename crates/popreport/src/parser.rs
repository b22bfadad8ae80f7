use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::{MarketCard, NewsItem};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Missing element: {0}")]
    MissingElement(String),
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_number(text: &str) -> Result<f64, ParseError> {
    let cleaned = text.trim().replace(',', "");
    cleaned
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(text.trim().to_string()))
}

/// Collects every anchor whose `href` ends in `.pdf` (any case), resolved
/// against `base`, in document order.
///
/// The suffix is checked on the raw attribute, so a padded `" a.pdf "` is not a link.
pub fn parse_pdf_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let anchor_sel = Selector::parse("a[href]").unwrap();

    document
        .select(&anchor_sel)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.to_lowercase().ends_with(".pdf"))
        .filter_map(|href| match base.join(href) {
            Ok(url) => Some(url),
            Err(e) => {
                log::debug!("Skipping unresolvable href {:?}: {}", href, e);
                None
            }
        })
        .collect()
}

pub fn parse_latest_news(html: &str) -> Result<Vec<NewsItem>, ParseError> {
    let document = Html::parse_document(html);

    let list_sel = Selector::parse("ul.LatestNews-list").unwrap();
    let item_sel = Selector::parse("li.LatestNews-item").unwrap();
    let headline_sel = Selector::parse("a.LatestNews-headline").unwrap();
    let time_sel = Selector::parse("time.LatestNews-timestamp").unwrap();

    let list = document
        .select(&list_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("ul.LatestNews-list".into()))?;

    let items = list
        .select(&item_sel)
        .filter_map(|item| {
            let headline = item.select(&headline_sel).next()?;
            let timestamp = item.select(&time_sel).next()?;

            let title = headline
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| normalize_whitespace(&elem_text(headline)));
            let link = headline.value().attr("href").unwrap_or_default().trim();

            Some(NewsItem {
                timestamp: normalize_whitespace(&elem_text(timestamp)),
                title,
                link: link.to_string(),
            })
        })
        .collect();

    Ok(items)
}

pub fn parse_market_banner(html: &str) -> Result<Vec<MarketCard>, ParseError> {
    let document = Html::parse_document(html);

    let banner_sel = Selector::parse("div.MarketsBanner-marketData").unwrap();
    let card_sel = Selector::parse("a.MarketCard-container").unwrap();
    let symbol_sel = Selector::parse("span.MarketCard-symbol").unwrap();
    let position_sel = Selector::parse("span.MarketCard-stockPosition").unwrap();
    let change_sel = Selector::parse("span.MarketCard-changesPts").unwrap();

    let banner = document
        .select(&banner_sel)
        .next()
        .ok_or_else(|| ParseError::MissingElement("div.MarketsBanner-marketData".into()))?;

    let mut cards = Vec::new();
    for card in banner.select(&card_sel) {
        let (Some(symbol), Some(position), Some(change)) = (
            card.select(&symbol_sel).next(),
            card.select(&position_sel).next(),
            card.select(&change_sel).next(),
        ) else {
            log::debug!("Skipping incomplete market card");
            continue;
        };

        cards.push(MarketCard {
            symbol: normalize_whitespace(&elem_text(symbol)),
            stock_position: parse_number(&elem_text(position))?,
            change_pts: parse_number(&elem_text(change))?,
        });
    }

    Ok(cards)
}
