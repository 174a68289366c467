use crate::error::{ApiError, Result};
use url::Url;

/// True when `input` is an absolute URL with both a scheme and a host.
pub fn is_valid_url(input: &str) -> bool {
    parse_url(input).is_ok()
}

pub fn parse_url(input: &str) -> Result<Url> {
    let parsed = Url::parse(input.trim()).map_err(|_| ApiError::InvalidUrl)?;

    if parsed.scheme().is_empty() || parsed.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl);
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(ApiError::InvalidUrl),
    }
}
