//! Response normalization module
//!
//! Prepares an upstream response for re-emission on the client connection:
//! framing headers are dropped and gzip bodies are decompressed.

use crate::handler::proxy::UpstreamResponse;
use crate::http::headers;
use crate::logger;
use flate2::read::MultiGzDecoder;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Response, StatusCode};
use std::io::Read;

/// Upstream response ready to be written to the client
#[derive(Debug)]
pub struct NormalizedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl NormalizedResponse {
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Normalize an upstream response
///
/// A body declared as gzip is decompressed and the header rewritten to
/// `identity`. If decompression fails the compressed bytes are relayed and
/// `Content-Encoding: gzip` stays as it was.
pub fn normalize(upstream: UpstreamResponse) -> NormalizedResponse {
    let UpstreamResponse {
        status,
        mut headers,
        body,
    } = upstream;

    headers::strip_response_framing(&mut headers);

    let body = if declares_gzip(&headers) {
        match gunzip(&body) {
            Ok(decoded) => {
                headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("identity"));
                Bytes::from(decoded)
            }
            Err(e) => {
                logger::log_debug(&format!(
                    "Upstream body declared gzip but did not decode ({e}), relaying as-is"
                ));
                body
            }
        }
    } else {
        body
    };

    NormalizedResponse {
        status,
        headers,
        body,
    }
}

/// True when the upstream declared `Content-Encoding: gzip`
fn declares_gzip(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"))
}

/// Decompress a (possibly multi-member) gzip payload; empty input is empty output
pub fn gunzip(input: &[u8]) -> std::io::Result<Vec<u8>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let mut decoder = MultiGzDecoder::new(input);
    let mut output = Vec::new();
    decoder.read_to_end(&mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn upstream(headers: &[(&'static str, &'static str)], body: Vec<u8>) -> UpstreamResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(*name, HeaderValue::from_static(value));
        }
        UpstreamResponse {
            status: StatusCode::CREATED,
            headers: map,
            body: Bytes::from(body),
        }
    }

    #[test]
    fn test_plain_body_relayed() {
        let normalized = normalize(upstream(
            &[("content-type", "application/json"), ("content-length", "7")],
            b"{\"a\":1}".to_vec(),
        ));
        assert_eq!(normalized.status, StatusCode::CREATED);
        assert_eq!(normalized.body.as_ref(), b"{\"a\":1}");
        assert!(normalized.headers.get(header::CONTENT_LENGTH).is_none());
        assert_eq!(normalized.headers[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_transfer_encoding_dropped() {
        let normalized = normalize(upstream(&[("transfer-encoding", "chunked")], b"x".to_vec()));
        assert!(normalized.headers.get(header::TRANSFER_ENCODING).is_none());
    }

    #[test]
    fn test_gzip_body_decoded() {
        let normalized = normalize(upstream(
            &[("content-encoding", "gzip")],
            gzip(b"hello from upstream"),
        ));
        assert_eq!(normalized.body.as_ref(), b"hello from upstream");
        assert_eq!(normalized.headers[header::CONTENT_ENCODING], "identity");
    }

    #[test]
    fn test_invalid_gzip_passed_through() {
        let raw = b"definitely not gzip".to_vec();
        let normalized = normalize(upstream(&[("content-encoding", "gzip")], raw.clone()));
        assert_eq!(normalized.body.as_ref(), raw.as_slice());
        assert_eq!(normalized.headers[header::CONTENT_ENCODING], "gzip");
    }

    #[test]
    fn test_other_encodings_untouched() {
        let raw = gzip(b"payload");
        let normalized = normalize(upstream(&[("content-encoding", "br")], raw.clone()));
        assert_eq!(normalized.body.as_ref(), raw.as_slice());
        assert_eq!(normalized.headers[header::CONTENT_ENCODING], "br");
    }

    #[test]
    fn test_multi_member_gzip() {
        let mut raw = gzip(b"first ");
        raw.extend(gzip(b"second"));
        assert_eq!(gunzip(&raw).unwrap(), b"first second");
    }
}
