//! Regex extraction of product name, price, and image from page HTML.
//!
//! The marketplace renders these in class-tagged elements; markup absence is
//! a typed error so callers never see a partial snapshot.

use dropwatch_core::ProductSnapshot;
use regex::Regex;

use crate::error::ScrapeError;

/// Extracts a full [`ProductSnapshot`] from a product page.
///
/// # Errors
///
/// - [`ScrapeError::MissingName`] — no recognizable name element.
/// - [`ScrapeError::MissingPrice`] — no recognizable price element.
/// - [`ScrapeError::PriceFormat`] — price element text carries no digits.
pub(crate) fn extract_snapshot(html: &str, url: &str) -> Result<ProductSnapshot, ScrapeError> {
    let name = extract_name(html).ok_or_else(|| ScrapeError::MissingName {
        url: url.to_owned(),
    })?;

    let raw_price = extract_price_text(html).ok_or_else(|| ScrapeError::MissingPrice {
        url: url.to_owned(),
    })?;
    let price = normalize_price(&raw_price).ok_or_else(|| ScrapeError::PriceFormat {
        url: url.to_owned(),
        raw: raw_price.trim().to_owned(),
    })?;

    Ok(ProductSnapshot {
        name,
        price,
        url: url.to_owned(),
        image: extract_image(html),
    })
}

/// Product title: the `B_NuCI` span, falling back to the first `h1` span.
fn extract_name(html: &str) -> Option<String> {
    let primary = Regex::new(r#"(?is)<span[^>]*class=["'][^"']*B_NuCI[^"']*["'][^>]*>(.*?)</span>"#)
        .expect("valid regex");
    if let Some(cap) = primary.captures(html) {
        let text = clean_text(cap.get(1)?.as_str());
        if !text.is_empty() {
            return Some(text);
        }
    }

    let fallback = Regex::new(r"(?is)<h1[^>]*>\s*<span[^>]*>(.*?)</span>").expect("valid regex");
    let cap = fallback.captures(html)?;
    let text = clean_text(cap.get(1)?.as_str());
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Raw text of the selling-price div (`_30jeq3 _16Jk6d`), currency symbol
/// and separators included.
fn extract_price_text(html: &str) -> Option<String> {
    let re = Regex::new(
        r#"(?is)<div[^>]*class=["'][^"']*_30jeq3[^"']*_16Jk6d[^"']*["'][^>]*>(.*?)</div>"#,
    )
    .expect("valid regex");
    let cap = re.captures(html)?;
    Some(clean_text(cap.get(1)?.as_str()))
}

/// `src` of the main product image (`_396cs4`), when present.
fn extract_image(html: &str) -> Option<String> {
    let tag_re =
        Regex::new(r#"(?i)<img[^>]*class=["'][^"']*_396cs4[^"']*["'][^>]*>"#).expect("valid regex");
    let tag = tag_re.find(html)?.as_str();
    let src_re = Regex::new(r#"(?i)src=["']([^"']+)["']"#).expect("valid regex");
    let cap = src_re.captures(tag)?;
    Some(cap.get(1)?.as_str().to_owned())
}

/// Collapses an element's inner HTML to plain text: nested tags stripped,
/// the handful of entities the marketplace emits decoded, whitespace
/// normalized.
fn clean_text(inner: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").expect("valid regex");
    let without_tags = tag_re.replace_all(inner, " ");

    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduces a displayed price to a plain integer: every non-digit character
/// (currency symbol, thousands separators) is dropped, matching how the
/// marketplace renders whole-unit prices.
///
/// Returns `None` when the text carries no digits or the digits overflow.
fn normalize_price(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<i64>().ok()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
