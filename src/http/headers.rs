//! Header policy module
//!
//! Decides which headers cross the proxy boundary in each direction and which
//! cross-origin headers every response carries. Both the read and the write
//! forwarding paths go through these functions.

use hyper::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Request headers never forwarded upstream
pub const REQUEST_DENY_SET: [HeaderName; 3] =
    [header::CONTENT_LENGTH, header::HOST, header::ACCEPT_ENCODING];

/// Response headers never relayed downstream; the outbound transport recomputes them
pub const RESPONSE_DENY_SET: [HeaderName; 2] = [header::CONTENT_LENGTH, header::TRANSFER_ENCODING];

/// `Accept-Encoding` value sent upstream so the body comes back uncompressed
pub const FORCED_ACCEPT_ENCODING: &str = "identity";

pub const CORS_ALLOW_ORIGIN: &str = "*";
pub const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Build the header set sent upstream from the client's headers
///
/// Multi-valued headers keep all of their values.
pub fn outgoing_request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut outgoing = HeaderMap::with_capacity(incoming.len() + 1);
    for (name, value) in incoming {
        if !REQUEST_DENY_SET.contains(name) {
            outgoing.append(name.clone(), value.clone());
        }
    }
    outgoing.insert(
        header::ACCEPT_ENCODING,
        HeaderValue::from_static(FORCED_ACCEPT_ENCODING),
    );
    outgoing
}

/// Remove framing headers from a response that is about to be re-emitted
pub fn strip_response_framing(headers: &mut HeaderMap) {
    for name in &RESPONSE_DENY_SET {
        headers.remove(name);
    }
}

/// Attach the fixed cross-origin headers, replacing any upstream values
pub fn apply_cors(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(CORS_ALLOW_ORIGIN),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
}
