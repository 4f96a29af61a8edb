//! Client address resolution.

use actix_web::HttpRequest;

use authgate_core::services::UNKNOWN_ADDRESS;

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolve the caller's address: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the peer address, then `"unknown"`. Never fails.
pub fn extract_client_ip(req: &HttpRequest) -> String {
    if let Some(first) = header_value(req, "x-forwarded-for")
        .and_then(|xff| xff.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return first.to_string();
    }

    if let Some(real_ip) = header_value(req, "x-real-ip") {
        return real_ip.to_string();
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_forwarded_for_first_entry_wins() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", " 198.51.100.7 , 10.0.0.1"))
            .insert_header(("X-Real-IP", "10.9.9.9"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "198.51.100.7");
    }

    #[test]
    fn test_falls_back_to_real_ip_then_peer() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", " , "))
            .insert_header(("X-Real-IP", "10.9.9.9"))
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "10.9.9.9");

        let req = TestRequest::default()
            .peer_addr("192.0.2.44:51000".parse().unwrap())
            .to_http_request();
        assert_eq!(extract_client_ip(&req), "192.0.2.44");
    }

    #[test]
    fn test_unknown_when_nothing_available() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(extract_client_ip(&req), UNKNOWN_ADDRESS);
    }
}
