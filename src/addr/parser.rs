//! Address string parsing.
//!
//! # Responsibilities
//! - Recognize `unix:` named-pipe syntax and take the path verbatim
//! - Split URL-shaped addresses into scheme, host, port, and path base
//! - Reject anything matching neither shape

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::addr::endpoint::{EndpointDescriptor, Scheme};

/// Error for an address string that matches neither recognized shape.
#[derive(Debug, Error)]
pub enum AddressParseError {
    #[error("address is empty")]
    Empty,

    #[error("named pipe address has an empty path")]
    EmptyPipePath,

    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("address has no host")]
    MissingHost,

    #[error("address must not carry a query or fragment")]
    UnexpectedComponent,

    #[error("malformed address: {0}")]
    Malformed(#[from] url::ParseError),
}

const PIPE_PREFIX: &str = "unix:";

/// Parse a textual listen address into an endpoint descriptor.
///
/// Pure and deterministic: no I/O, no name resolution.
pub fn parse(input: &str) -> Result<EndpointDescriptor, AddressParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AddressParseError::Empty);
    }

    if trimmed
        .get(..PIPE_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(PIPE_PREFIX))
    {
        let path = &trimmed[PIPE_PREFIX.len()..];
        if path.is_empty() {
            return Err(AddressParseError::EmptyPipePath);
        }
        return Ok(EndpointDescriptor::pipe(PathBuf::from(path)));
    }

    let url = Url::parse(trimmed)?;
    let scheme = match url.scheme() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => return Err(AddressParseError::UnsupportedScheme(other.to_string())),
    };
    if url.query().is_some() || url.fragment().is_some() {
        return Err(AddressParseError::UnexpectedComponent);
    }
    let host = match url.host() {
        Some(url::Host::Domain(domain)) => domain.to_string(),
        Some(url::Host::Ipv4(ip)) => ip.to_string(),
        Some(url::Host::Ipv6(ip)) => ip.to_string(),
        None => return Err(AddressParseError::MissingHost),
    };
    let port = url.port().unwrap_or_else(|| scheme.default_port());
    let path_base = url.path().trim_end_matches('/').to_string();

    Ok(EndpointDescriptor::socket(scheme, host, port, path_base))
}
