//! Client IP extraction utilities.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;

/// Header consulted when running behind a trusted reverse proxy.
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Trait for types that provide access to HTTP headers and extensions.
pub trait HasHeadersAndExtensions {
    fn headers(&self) -> &axum::http::HeaderMap;
    fn extensions(&self) -> &axum::http::Extensions;
}

impl<B> HasHeadersAndExtensions for axum::extract::Request<B> {
    fn headers(&self) -> &axum::http::HeaderMap {
        axum::extract::Request::headers(self)
    }
    fn extensions(&self) -> &axum::http::Extensions {
        axum::extract::Request::extensions(self)
    }
}

/// Extract the client IP address.
///
/// With `trust_forwarded_for`, the first `X-Forwarded-For` entry is used and a
/// missing or empty header is an error (no fallback to the socket address).
/// Otherwise the peer address from `ConnectInfo` is used.
pub fn extract_client_ip<T: HasHeadersAndExtensions>(
    source: &T,
    trust_forwarded_for: bool,
) -> Result<String, &'static str> {
    if trust_forwarded_for {
        let header_value = source
            .headers()
            .get(FORWARDED_FOR_HEADER)
            .ok_or("IP header not present")?
            .to_str()
            .map_err(|_| "IP header contains invalid characters")?;
        let first = header_value.split(',').next().unwrap_or("").trim();
        if first.is_empty() {
            return Err("IP header is empty");
        }
        return Ok(first.to_string());
    }

    source
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .ok_or("No client IP available")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::Request;

    #[test]
    fn test_forwarded_for_first_entry() {
        let request = Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 192.168.1.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&request, true).unwrap(), "10.0.0.1");
    }

    #[test]
    fn test_forwarded_for_missing_is_error() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert!(extract_client_ip(&request, true).is_err());
    }

    #[test]
    fn test_connect_info_used_when_header_not_trusted() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "10.0.0.1")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));

        assert_eq!(extract_client_ip(&request, false).unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_no_connect_info_is_error() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert!(extract_client_ip(&request, false).is_err());
    }
}
