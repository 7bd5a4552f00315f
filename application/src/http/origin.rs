//! Request URL resolution against a realm's document URL.

use url::Url;

/// Schemes whose documents inherit the host origin instead of having one.
pub const OPAQUE_BASE_SCHEMES: &[&str] = &["about", "blob", "data", "javascript"];

/// Base for resolving relative URLs: the realm's own URL, or the host
/// origin when the realm sits at an opaque location like `about:blank`.
pub fn effective_base(document_url: &Url, host_origin: &Url) -> Url {
    if OPAQUE_BASE_SCHEMES.contains(&document_url.scheme()) {
        host_origin.clone()
    } else {
        document_url.clone()
    }
}

/// Resolve `input` relative to the realm's effective base.
pub fn resolve_request_url(
    input: &str,
    document_url: &Url,
    host_origin: &Url,
) -> Result<Url, url::ParseError> {
    effective_base(document_url, host_origin).join(input)
}

/// Whether `url` shares its origin with the realm.
pub fn is_same_origin(url: &Url, document_url: &Url, host_origin: &Url) -> bool {
    url.origin() == effective_base(document_url, host_origin).origin()
}
