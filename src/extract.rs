use serde_json::Value;

use crate::error::{Result, TryOnError};
use crate::types::Provider;

/// Known locations of the output image URL, in priority order.
const IMAGE_URL_POINTERS: [&str; 4] = [
    "/image/url",
    "/images/0/url",
    "/data/images/0/url",
    "/output/url",
];

/// Pull the single output image URL out of a provider response.
///
/// Providers (and versions of the same provider) disagree on the response
/// shape, so each known location is probed in turn. The first non-empty
/// string wins.
pub fn extract_image_url(response: &Value, provider: Provider) -> Result<String> {
    IMAGE_URL_POINTERS
        .iter()
        .filter_map(|pointer| response.pointer(pointer).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|url| !url.is_empty())
        .map(String::from)
        .ok_or_else(|| TryOnError::MissingOutput(format!("{} provider", provider)))
}
