//! Target address classification and resolution.
//!
//! Provisioning targets arrive as free text: a plain IP address, a CIDR
//! network, or a hostname that needs DNS resolution before the chain can
//! probe it.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SyncError};

/// Classification of a provisioning target string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A single IP address.
    Ip,
    /// A CIDR network.
    Network,
    /// Anything else; treated as a resolvable hostname.
    Hostname,
}

/// Classifies a target string.
///
/// A parseable IP wins over a network; a string with a `/` that parses as
/// `address/prefix` is a network; everything else is assumed to be a
/// hostname and left to DNS.
#[must_use]
pub fn classify(target: &str) -> TargetKind {
    if target.parse::<IpAddr>().is_ok() {
        return TargetKind::Ip;
    }
    if is_network(target) {
        return TargetKind::Network;
    }
    TargetKind::Hostname
}

fn is_network(target: &str) -> bool {
    let Some((addr, prefix)) = target.split_once('/') else {
        return false;
    };
    let Ok(addr) = addr.parse::<IpAddr>() else {
        return false;
    };

    let max_prefix = match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    prefix.parse::<u8>().is_ok_and(|p| p <= max_prefix)
}

/// Resolves a target to an IP address string.
///
/// IP targets pass through unchanged; hostnames go through DNS and the
/// first resolved address wins.
///
/// # Errors
///
/// Returns an error for network targets (not a single provisionable
/// address) and for hostnames that do not resolve.
pub async fn resolve(target: &str) -> Result<String> {
    match classify(target) {
        TargetKind::Ip => Ok(target.to_string()),
        TargetKind::Network => Err(SyncError::internal(format!(
            "'{target}' is a network, not a provisionable address"
        ))),
        TargetKind::Hostname => {
            // lookup_host needs a port; it is discarded after resolution.
            let mut addrs = tokio::net::lookup_host((target, 0)).await.map_err(|e| {
                SyncError::internal(format!("Could not resolve hostname '{target}': {e}"))
            })?;

            let addr = addrs.next().ok_or_else(|| {
                SyncError::internal(format!("Hostname '{target}' resolved to no addresses"))
            })?;

            debug!("Resolved {target} to {}", addr.ip());
            Ok(addr.ip().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ip() {
        assert_eq!(classify("10.0.0.1"), TargetKind::Ip);
        assert_eq!(classify("2001:db8::1"), TargetKind::Ip);
    }

    #[test]
    fn test_classify_network() {
        assert_eq!(classify("10.0.0.0/24"), TargetKind::Network);
        assert_eq!(classify("2001:db8::/64"), TargetKind::Network);
    }

    #[test]
    fn test_classify_hostname() {
        assert_eq!(classify("sw-access-01.lab"), TargetKind::Hostname);
        assert_eq!(classify("10.0.0.0/99"), TargetKind::Hostname);
        assert_eq!(classify(""), TargetKind::Hostname);
    }

    #[tokio::test]
    async fn test_resolve_passes_ip_through() {
        let resolved = resolve("192.0.2.7").await.expect("resolve");
        assert_eq!(resolved, "192.0.2.7");
    }

    #[tokio::test]
    async fn test_resolve_rejects_network() {
        let err = resolve("10.0.0.0/24").await.expect_err("must fail");
        assert!(err.to_string().contains("network"));
    }

    #[tokio::test]
    async fn test_resolve_localhost() {
        let resolved = resolve("localhost").await.expect("resolve");
        let ip: IpAddr = resolved.parse().expect("ip");
        assert!(ip.is_loopback());
    }
}
