//! Parsing of server URLs into [`ServerIdentity`] values.
//!
//! Helper clients hand over registry addresses in loose forms
//! (`registry.example.com`, `registry.example.com:5000`,
//! `https://registry.example.com/v2?x=y`). Addresses without a scheme are
//! treated as `https`; only `http` and `https` are accepted. Query and
//! fragment are dropped.
//!
//! The host keeps the case it was given and the path is percent-decoded,
//! so keys line up with items written by helpers that store the raw
//! components.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{BridgeError, Result};
use crate::identity::{Protocol, ServerIdentity};

/// Parse a server URL into the identity used as a store key.
pub fn parse(server_url: &str) -> Result<ServerIdentity> {
    let input = server_url.trim();
    if input.is_empty() {
        return Err(BridgeError::MissingServerUrl);
    }

    let normalized = if input.contains("://") {
        input.to_string()
    } else if input.starts_with("//") {
        format!("https:{input}")
    } else if input.starts_with('/') {
        return Err(BridgeError::NoHostname);
    } else {
        format!("https://{input}")
    };

    let url = Url::parse(&normalized).map_err(|e| BridgeError::InvalidServerUrl(e.to_string()))?;
    let protocol = Protocol::from_scheme(url.scheme())?;

    let host = match url.host_str() {
        Some(h) if !h.is_empty() => original_host(&normalized, h),
        _ => return Err(BridgeError::NoHostname),
    };

    // The url crate reports "/" for an absent path; keep "no path" distinct
    // from an explicit trailing slash.
    let path = if has_explicit_path(&normalized) {
        percent_decode_str(url.path()).decode_utf8_lossy().into_owned()
    } else {
        String::new()
    };

    Ok(ServerIdentity {
        protocol,
        host,
        path,
        port: url.port().unwrap_or(0),
    })
}

/// The host as written in the input when it differs from the parsed host
/// only by ASCII case. Anything else the parser rewrote (IDNA, IPv6
/// brackets) keeps the parsed form.
fn original_host(normalized: &str, parsed: &str) -> String {
    let rest = normalized
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(normalized);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority
        .rsplit_once('@')
        .map(|(_, h)| h)
        .unwrap_or(authority);
    let raw = host_port.split(':').next().unwrap_or_default();
    if raw.eq_ignore_ascii_case(parsed) {
        raw.to_string()
    } else {
        parsed.to_string()
    }
}

fn has_explicit_path(normalized: &str) -> bool {
    let rest = normalized
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(normalized);
    rest.find(['/', '?', '#'])
        .map(|i| rest.as_bytes()[i] == b'/')
        .unwrap_or(false)
}
