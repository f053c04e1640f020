//! Structural extraction of sale listings from ehorses HTML.

use chrono::NaiveDate;
use scraper::{Html, Selector};

use crate::entity::data_source::DataSource;
use crate::entity::timeline_entry::EntryType;
use crate::source::{CandidateRecord, SourceError};

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::parse(format!("bad selector {css:?}: {e}")))
}

/// Parse a seller/horse listing page into sale candidates.
///
/// A page that parses but contains no listing cards yields an empty vec:
/// "currently not for sale" is data, not an error.
pub fn listings_to_candidates(html: &str) -> Result<Vec<CandidateRecord>, SourceError> {
    let document = Html::parse_document(html);

    let card_sel = selector("div.listing[data-listing-id]")?;
    let title_sel = selector(".listing-title")?;
    let price_sel = selector(".listing-price")?;
    let date_sel = selector("time.listing-date")?;
    let description_sel = selector(".listing-description")?;

    let mut candidates = Vec::new();

    for card in document.select(&card_sel) {
        let listing_id = card
            .value()
            .attr("data-listing-id")
            .ok_or_else(|| SourceError::parse("listing card without data-listing-id"))?
            .to_string();

        let title_text = card
            .select(&title_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SourceError::parse(format!("listing {listing_id} without title")))?;

        let date_raw = card
            .select(&date_sel)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .ok_or_else(|| {
                SourceError::parse(format!("listing {listing_id} without datetime attribute"))
            })?;
        let entry_date = NaiveDate::parse_from_str(date_raw, "%Y-%m-%d")
            .map_err(|e| SourceError::parse(format!("bad date {date_raw:?}: {e}")))?;

        let price_eur = card
            .select(&price_sel)
            .next()
            .map(|el| el.text().collect::<String>())
            .and_then(|text| parse_price(&text));

        let description = card
            .select(&description_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty());

        let mut metadata = serde_json::Map::new();
        metadata.insert("listing_id".to_string(), listing_id.as_str().into());
        if let Some(price) = price_eur {
            metadata.insert("price_eur".to_string(), price.into());
        }

        candidates.push(CandidateRecord {
            entry_type: EntryType::Sale,
            entry_date,
            title: format!("Listed for sale: {title_text}"),
            description,
            source: DataSource::Ehorses,
            source_id: Some(listing_id),
            metadata: serde_json::Value::Object(metadata),
        });
    }

    Ok(candidates)
}

/// Extract a numeric euro amount from marketplace price text such as
/// "€ 85.000", "85.000 €", or "Price on request" (None).
fn parse_price(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_PAGE: &str = r#"
        <html><body>
          <div class="listing" data-listing-id="778812-3">
            <h3 class="listing-title">Cornet's Dream</h3>
            <span class="listing-price">&euro; 85.000</span>
            <time class="listing-date" datetime="2026-06-01">1 June 2026</time>
            <p class="listing-description">Talented 11yo gelding, 1.45m placings.</p>
          </div>
          <div class="listing" data-listing-id="778812-7">
            <h3 class="listing-title">Cornet's Dream</h3>
            <span class="listing-price">Price on request</span>
            <time class="listing-date" datetime="2026-07-15">15 July 2026</time>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_parses_listing_cards() {
        let candidates = listings_to_candidates(LISTING_PAGE).unwrap();
        assert_eq!(candidates.len(), 2);

        let first = &candidates[0];
        assert_eq!(first.entry_type, EntryType::Sale);
        assert_eq!(first.source_id.as_deref(), Some("778812-3"));
        assert_eq!(first.metadata["price_eur"], 85000);
        assert_eq!(
            first.entry_date,
            NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
        );
        assert!(first.description.as_deref().unwrap().contains("gelding"));

        // "Price on request" leaves price_eur out of the metadata.
        assert!(candidates[1].metadata.get("price_eur").is_none());
    }

    #[test]
    fn test_page_without_listings_is_empty_not_an_error() {
        let candidates =
            listings_to_candidates("<html><body><p>No horses for sale</p></body></html>").unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_card_missing_date_is_a_parse_error() {
        let html = r#"
            <div class="listing" data-listing-id="x-1">
              <h3 class="listing-title">Nameless</h3>
            </div>
        "#;
        let err = listings_to_candidates(html).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[test]
    fn test_parse_price_variants() {
        assert_eq!(parse_price("€ 85.000"), Some(85000));
        assert_eq!(parse_price("85.000 €"), Some(85000));
        assert_eq!(parse_price("Price on request"), None);
    }
}
