//! URL helpers for the supported marketplace.

use reqwest::Url;

/// Returns `true` if `url` is an http(s) URL on the supported marketplace
/// domain. Used by the add-command handler to reject foreign URLs before
/// any network traffic.
#[must_use]
pub fn is_marketplace_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }
    parsed
        .host_str()
        .is_some_and(|host| host == "flipkart.com" || host.ends_with(".flipkart.com"))
}

/// Extracts the marketplace product id from the `pid` query parameter.
///
/// Returns `None` when the URL does not carry one; callers fall back to a
/// positional id.
#[must_use]
pub fn extract_product_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == "pid")
        .map(|(_, value)| value.into_owned())
        .filter(|pid| !pid.is_empty())
}
