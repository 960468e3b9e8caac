//! Request forgery protection for upstream fetches.
//!
//! The gateway fetches arbitrary caller-supplied URLs, so every origin
//! host is resolved and checked against private, internal, and reserved
//! address ranges before any request is made.

use std::net::IpAddr;

use url::Url;

/// Error type for fetch guard failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GuardError {
    #[error("missing host")]
    MissingHost,

    #[error("blocked IP: {0} (private/reserved)")]
    BlockedIp(IpAddr),

    #[error("DNS resolution failed: {0}")]
    DnsError(String),
}

/// Check if an IP address is private, reserved, or otherwise blocked.
///
/// This covers loopback, RFC 1918 private ranges, link-local, multicast,
/// unspecified addresses, and IPv6 unique-local ranges.
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Resolve the URL's host and validate that every answer is public.
///
/// Literal IP hosts are checked directly without a DNS round trip.
pub async fn check_url(url: &Url) -> Result<(), GuardError> {
    let host = url.host_str().ok_or(GuardError::MissingHost)?;

    if let Ok(ip) = host.trim_matches(['[', ']']).parse::<IpAddr>() {
        return check_ip(ip);
    }

    let port = url.port_or_known_default().unwrap_or(443);
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| GuardError::DnsError(e.to_string()))?;

    let mut any = false;
    for addr in addrs {
        any = true;
        check_ip(addr.ip())?;
    }
    if !any {
        return Err(GuardError::DnsError(format!("no addresses for {host}")));
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), GuardError> {
    if is_private_or_reserved(ip) { Err(GuardError::BlockedIp(ip)) } else { Ok(()) }
}
