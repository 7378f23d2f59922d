//! Product-page fetching and extraction for the supported marketplace.
//!
//! [`FlipkartClient`] turns a product URL into a point-in-time
//! `{name, price, image}` snapshot, or a typed [`ScrapeError`]. A missing
//! name or price element is always an error, never a partial snapshot.

mod client;
mod error;
mod extract;
mod retry;
mod urls;

pub use client::FlipkartClient;
pub use error::ScrapeError;
pub use urls::{extract_product_id, is_marketplace_url};
