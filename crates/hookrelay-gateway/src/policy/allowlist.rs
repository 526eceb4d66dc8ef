//! Client address allowlist.
//!
//! Addresses are compared as normalized strings: IPv4-mapped IPv6 addresses
//! (`::ffff:a.b.c.d`) collapse to their IPv4 form and `::1` to `127.0.0.1`.

use crate::config::IpAllowlistSection;

const V4_MAPPED_PREFIX: &str = "::ffff:";
const V6_LOOPBACK: &str = "::1";
const V4_LOOPBACK: &str = "127.0.0.1";

pub fn normalize_ip(ip: &str) -> String {
    if let Some(v4) = ip.strip_prefix(V4_MAPPED_PREFIX) {
        return v4.to_string();
    }
    if ip == V6_LOOPBACK {
        return V4_LOOPBACK.to_string();
    }
    ip.to_string()
}

/// Disabled allowlist admits everyone; an enabled one fails closed when the
/// client address is unknown.
pub fn is_ip_allowed(cfg: &IpAllowlistSection, ip: Option<&str>) -> bool {
    if !cfg.enabled {
        return true;
    }
    let Some(ip) = ip.filter(|s| !s.is_empty()) else {
        return false;
    };
    let ip = normalize_ip(ip);
    cfg.ips.iter().any(|allowed| normalize_ip(allowed.trim()) == ip)
}
