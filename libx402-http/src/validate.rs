//! Request-target validation for paying clients.
//!
//! A client that pays for whatever URL it is handed is a server-side
//! request forgery amplifier: an attacker who controls a URL can point it
//! at internal infrastructure and have the client attach money to the
//! probe. Every outgoing request is therefore validated before any I/O,
//! and loopback or private targets are rejected unless the caller opts in
//! for local development.

use std::net::IpAddr;

use libx402::X402Error;
use url::{Host, Url};

/// Parses `target` and validates it for outgoing payment traffic.
///
/// # Errors
///
/// Returns [`X402Error::DisallowedTarget`] if the string is not an
/// absolute URL or [`validate_target`] rejects it.
pub fn parse_and_validate(target: &str, allow_local: bool) -> Result<Url, X402Error> {
    let url = Url::parse(target).map_err(|e| X402Error::DisallowedTarget {
        reason: format!("invalid url {target:?}: {e}"),
    })?;
    validate_target(&url, allow_local)?;
    Ok(url)
}

/// Validates a parsed URL for outgoing payment traffic.
///
/// The scheme must be `http` or `https` and the URL must carry a host.
/// Unless `allow_local` is set, hosts that name or resolve trivially to
/// loopback, private, or link-local addresses are rejected. Hostnames
/// other than `localhost` are not resolved here; DNS-level rebinding is
/// out of scope for this check.
///
/// # Errors
///
/// Returns [`X402Error::DisallowedTarget`] naming the failed rule.
pub fn validate_target(url: &Url, allow_local: bool) -> Result<(), X402Error> {
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(X402Error::DisallowedTarget {
                reason: format!("scheme {other:?} is not allowed, use http or https"),
            });
        }
    }

    let Some(host) = url.host() else {
        return Err(X402Error::DisallowedTarget {
            reason: "url has no host".to_owned(),
        });
    };

    if allow_local {
        return Ok(());
    }

    match host {
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                return Err(X402Error::DisallowedTarget {
                    reason: format!("local host {domain:?} is not allowed"),
                });
            }
        }
        Host::Ipv4(ip) => check_ip(IpAddr::V4(ip))?,
        Host::Ipv6(ip) => check_ip(IpAddr::V6(ip))?,
    }

    Ok(())
}

fn check_ip(ip: IpAddr) -> Result<(), X402Error> {
    let reason = match ip {
        IpAddr::V4(v4) => {
            if v4.is_loopback() {
                Some("loopback address")
            } else if v4.is_private() {
                Some("private address")
            } else if v4.is_link_local() {
                Some("link-local address")
            } else if v4.is_unspecified() {
                Some("unspecified address")
            } else {
                None
            }
        }
        IpAddr::V6(v6) => {
            if v6.is_loopback() {
                Some("loopback address")
            } else if (v6.segments()[0] & 0xfe00) == 0xfc00 {
                Some("unique-local address")
            } else if (v6.segments()[0] & 0xffc0) == 0xfe80 {
                Some("link-local address")
            } else if v6.is_unspecified() {
                Some("unspecified address")
            } else if let Some(mapped) = v6.to_ipv4_mapped() {
                return check_ip(IpAddr::V4(mapped));
            } else {
                None
            }
        }
    };

    match reason {
        Some(reason) => Err(X402Error::DisallowedTarget {
            reason: format!("{reason} {ip} is not allowed"),
        }),
        None => Ok(()),
    }
}
