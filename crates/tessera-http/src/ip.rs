//! Client address classification.
//!
//! Forwarded-address headers are only trusted when the direct peer is an
//! intranet address (a proxy on the private network) and the caller has
//! disabled safe mode.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use http::HeaderMap;

/// Forwarded-address headers, in priority order.
pub const FORWARDED_HEADERS: [&str; 5] = [
    "x-real-ip",
    "x-forwarded-for",
    "client-ip",
    "x-client-ip",
    "via",
];

/// Supplementary reserved IPv4 ranges (inclusive) treated as intranet.
const RESERVED_V4_RANGES: [(Ipv4Addr, Ipv4Addr); 8] = [
    // carrier-grade NAT
    (Ipv4Addr::new(100, 64, 0, 0), Ipv4Addr::new(100, 127, 255, 255)),
    (Ipv4Addr::new(192, 0, 0, 0), Ipv4Addr::new(192, 0, 0, 255)),
    (Ipv4Addr::new(192, 0, 2, 0), Ipv4Addr::new(192, 0, 2, 255)),
    (Ipv4Addr::new(192, 88, 99, 0), Ipv4Addr::new(192, 88, 99, 255)),
    (Ipv4Addr::new(198, 18, 0, 0), Ipv4Addr::new(198, 19, 255, 255)),
    (Ipv4Addr::new(198, 51, 100, 0), Ipv4Addr::new(198, 51, 100, 255)),
    (Ipv4Addr::new(203, 0, 113, 0), Ipv4Addr::new(203, 0, 113, 255)),
    // multicast
    (Ipv4Addr::new(224, 0, 0, 0), Ipv4Addr::new(239, 255, 255, 255)),
];

/// Returns `true` if `ip` is an intranet address.
///
/// Strings that are not IP addresses are never intranet.
///
/// # Example
///
/// ```
/// use tessera_http::is_intranet_ip;
///
/// assert!(is_intranet_ip("10.0.0.8"));
/// assert!(is_intranet_ip("100.70.0.1"));
/// assert!(!is_intranet_ip("8.8.8.8"));
/// assert!(!is_intranet_ip("not-an-ip"));
/// ```
#[must_use]
pub fn is_intranet_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok_and(is_intranet_addr)
}

/// Returns `true` if `addr` is an intranet address.
#[must_use]
pub fn is_intranet_addr(addr: IpAddr) -> bool {
    if is_private_or_reserved(addr) {
        return true;
    }
    let IpAddr::V4(v4) = addr else {
        return false;
    };
    RESERVED_V4_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&v4))
}

fn is_private_or_reserved(addr: IpAddr) -> bool {
    match addr {
        IpAddr::V4(v4) => {
            let first = v4.octets()[0];
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || first == 0
                || first >= 240
        }
        IpAddr::V6(v6) => is_private_or_reserved_v6(v6),
    }
}

fn is_private_or_reserved_v6(v6: Ipv6Addr) -> bool {
    let head = v6.segments()[0];
    v6.is_loopback()
        || v6.is_unspecified()
        // unique local fc00::/7
        || head & 0xfe00 == 0xfc00
        // link local fe80::/10
        || head & 0xffc0 == 0xfe80
        || v6.to_ipv4_mapped().is_some()
}

/// Resolves the client address of a request.
///
/// With `safe_mode` on, a public peer is returned as-is. Otherwise the first
/// forwarded header present wins if it holds a valid IP address; anything
/// else falls back to the peer.
#[must_use]
pub fn resolve_real_ip(remote: IpAddr, headers: &HeaderMap, safe_mode: bool) -> String {
    let remote_ip = remote.to_string();
    if safe_mode && !is_intranet_addr(remote) {
        return remote_ip;
    }

    let forwarded = FORWARDED_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|value| value.to_str().ok());

    match forwarded {
        Some(candidate) if candidate.parse::<IpAddr>().is_ok() => candidate.to_string(),
        _ => remote_ip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use proptest::prelude::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_intranet_private_ranges() {
        for ip in ["10.1.2.3", "172.16.0.1", "192.168.1.1", "127.0.0.1", "169.254.3.4"] {
            assert!(is_intranet_ip(ip), "{ip} should be intranet");
        }
    }

    #[test]
    fn test_intranet_supplementary_table_edges() {
        assert!(is_intranet_ip("100.64.0.0"));
        assert!(is_intranet_ip("100.127.255.255"));
        assert!(!is_intranet_ip("100.128.0.0"));
        assert!(!is_intranet_ip("100.63.255.255"));
        assert!(is_intranet_ip("198.19.255.255"));
        assert!(!is_intranet_ip("198.20.0.0"));
        assert!(is_intranet_ip("224.0.0.1"));
        assert!(is_intranet_ip("239.255.255.255"));
    }

    #[test]
    fn test_public_addresses() {
        assert!(!is_intranet_ip("8.8.8.8"));
        assert!(!is_intranet_ip("1.1.1.1"));
        assert!(!is_intranet_ip("2001:4860:4860::8888"));
    }

    #[test]
    fn test_ipv6_reserved() {
        assert!(is_intranet_ip("::1"));
        assert!(is_intranet_ip("fd12:3456::1"));
        assert!(is_intranet_ip("fe80::1"));
    }

    #[test]
    fn test_not_an_ip() {
        assert!(!is_intranet_ip("not-an-ip"));
        assert!(!is_intranet_ip(""));
    }

    #[test]
    fn test_safe_mode_ignores_headers_for_public_peer() {
        let remote: IpAddr = "8.8.8.8".parse().unwrap();
        let h = headers(&[("x-real-ip", "1.2.3.4")]);
        assert_eq!(resolve_real_ip(remote, &h, true), "8.8.8.8");
    }

    #[test]
    fn test_intranet_peer_trusts_first_present_header() {
        let remote: IpAddr = "10.0.0.2".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "5.6.7.8"), ("via", "9.9.9.9")]);
        assert_eq!(resolve_real_ip(remote, &h, true), "5.6.7.8");
    }

    #[test]
    fn test_priority_order() {
        let remote: IpAddr = "10.0.0.2".parse().unwrap();
        let h = headers(&[("client-ip", "3.3.3.3"), ("x-real-ip", "1.1.1.1")]);
        assert_eq!(resolve_real_ip(remote, &h, true), "1.1.1.1");
    }

    #[test]
    fn test_safe_mode_off_trusts_public_peer_headers() {
        let remote: IpAddr = "8.8.8.8".parse().unwrap();
        let h = headers(&[("x-client-ip", "4.4.4.4")]);
        assert_eq!(resolve_real_ip(remote, &h, false), "4.4.4.4");
    }

    #[test]
    fn test_invalid_forwarded_value_falls_back() {
        let remote: IpAddr = "10.0.0.2".parse().unwrap();
        let h = headers(&[("x-forwarded-for", "1.2.3.4, 5.6.7.8")]);
        assert_eq!(resolve_real_ip(remote, &h, true), "10.0.0.2");
    }

    #[test]
    fn test_no_forwarded_header_returns_peer() {
        let remote: IpAddr = "192.168.0.9".parse().unwrap();
        assert_eq!(resolve_real_ip(remote, &HeaderMap::new(), false), "192.168.0.9");
    }

    proptest! {
        #[test]
        fn prop_cgnat_block_is_intranet(b in 64u8..=127, c: u8, d: u8) {
            let ip = format!("100.{b}.{c}.{d}");
            prop_assert!(is_intranet_ip(&ip));
        }

        #[test]
        fn prop_multicast_block_is_intranet(a in 224u8..=239, b: u8, c: u8, d: u8) {
            let ip = format!("{a}.{b}.{c}.{d}");
            prop_assert!(is_intranet_ip(&ip));
        }

        #[test]
        fn prop_non_ip_strings_are_not_intranet(s in "[a-z]{1,12}") {
            prop_assert!(!is_intranet_ip(&s));
        }
    }
}
