//! Origin normalization.
//!
//! Every request URL passes through [`canonicalize`] before it touches the
//! record store or the key derivation, so spellings like `Example.COM/x`
//! and `https://example.com/x#top` resolve to one record. Queries are kept
//! verbatim because reordering parameters can change what the origin
//! serves.

use url::Url;

#[derive(Debug, Clone, thiserror::Error)]
pub enum OriginError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Normalize a request URL into its canonical origin form.
///
/// Whitespace is trimmed, a missing scheme defaults to `https`, the host
/// is lowercased, and any fragment is dropped. Only `http` and `https`
/// origins are accepted.
pub fn canonicalize(input: &str) -> Result<Url, OriginError> {
    let raw = input.trim();
    if raw.is_empty() {
        return Err(OriginError::Empty);
    }

    let mut url = parse_with_default_scheme(raw)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(OriginError::UnsupportedScheme(url.scheme().to_string()));
    }

    // Url::parse already lowercases registered domain names, but not every
    // host form, so normalize explicitly.
    if let Some(host) = url.host_str().map(str::to_lowercase) {
        url.set_host(Some(&host))
            .map_err(|e| OriginError::InvalidUrl(e.to_string()))?;
    }

    url.set_fragment(None);

    Ok(url)
}

fn parse_with_default_scheme(raw: &str) -> Result<Url, OriginError> {
    let candidate: std::borrow::Cow<'_, str> = if raw.contains("://") {
        raw.into()
    } else {
        format!("https://{raw}").into()
    };

    Url::parse(&candidate).map_err(|e| OriginError::InvalidUrl(e.to_string()))
}
