//! Endpoint descriptors and resolved listen targets.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::addr::parser::{self, AddressParseError};

/// Transport scheme of a configured endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
    Unix,
}

impl Scheme {
    /// Port implied when an address string omits one.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
            Scheme::Unix => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Unix => "unix",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed, immutable description of one configured listen endpoint.
///
/// Two descriptors are equivalent iff all fields match. The string forms
/// accepted by [`FromStr`] are the ones configuration files and the address
/// feed carry, so the type round-trips through serde as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointDescriptor {
    scheme: Scheme,
    host: String,
    port: u16,
    path_base: String,
    unix_path: Option<PathBuf>,
}

impl EndpointDescriptor {
    /// Descriptor for a socket endpoint.
    pub fn socket(
        scheme: Scheme,
        host: impl Into<String>,
        port: u16,
        path_base: impl Into<String>,
    ) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
            path_base: path_base.into(),
            unix_path: None,
        }
    }

    /// Descriptor for a unix-domain-socket endpoint.
    pub fn pipe(path: impl Into<PathBuf>) -> Self {
        Self {
            scheme: Scheme::Unix,
            host: String::new(),
            port: 0,
            path_base: String::new(),
            unix_path: Some(path.into()),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn path_base(&self) -> &str {
        &self.path_base
    }

    pub fn unix_path(&self) -> Option<&Path> {
        self.unix_path.as_deref()
    }

    /// Whether this is the logical `localhost` case that expands across both
    /// loopback families.
    pub fn is_localhost(&self) -> bool {
        self.unix_path.is_none() && self.host.eq_ignore_ascii_case("localhost")
    }

    /// Resolve the descriptor into a concrete bind target.
    ///
    /// Host literals that do not parse as IPs resolve to the IPv6
    /// any-address; `localhost` never reaches this path.
    pub fn to_listen_target(&self) -> ListenTarget {
        match &self.unix_path {
            Some(path) => ListenTarget::Pipe {
                endpoint: self.clone(),
                path: path.clone(),
            },
            None => {
                let ip = self
                    .host
                    .parse::<IpAddr>()
                    .unwrap_or(IpAddr::V6(Ipv6Addr::UNSPECIFIED));
                ListenTarget::Socket {
                    endpoint: self.clone(),
                    addr: SocketAddr::new(ip, self.port),
                }
            }
        }
    }

    /// Canonical address text with the given concrete port.
    ///
    /// The configured host text is preserved; only the port is substituted,
    /// which is how an ephemeral port 0 resolves to the assigned one.
    pub fn display_with_port(&self, port: u16) -> String {
        match &self.unix_path {
            Some(path) => format!("unix:{}", path.display()),
            None if self.host.contains(':') => {
                format!("{}://[{}]:{}{}", self.scheme, self.host, port, self.path_base)
            }
            None => format!("{}://{}:{}{}", self.scheme, self.host, port, self.path_base),
        }
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with_port(self.port))
    }
}

impl FromStr for EndpointDescriptor {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parser::parse(s)
    }
}

impl TryFrom<String> for EndpointDescriptor {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EndpointDescriptor> for String {
    fn from(endpoint: EndpointDescriptor) -> Self {
        endpoint.to_string()
    }
}

/// A concrete target a listener can be bound to, produced by resolving an
/// [`EndpointDescriptor`].
#[derive(Debug, Clone)]
pub enum ListenTarget {
    /// A socket endpoint with a resolved IP.
    Socket {
        endpoint: EndpointDescriptor,
        addr: SocketAddr,
    },
    /// A unix-domain-socket path.
    Pipe {
        endpoint: EndpointDescriptor,
        path: PathBuf,
    },
}

impl ListenTarget {
    pub fn endpoint(&self) -> &EndpointDescriptor {
        match self {
            ListenTarget::Socket { endpoint, .. } => endpoint,
            ListenTarget::Pipe { endpoint, .. } => endpoint,
        }
    }
}

impl fmt::Display for ListenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenTarget::Socket { addr, .. } => write!(f, "{addr}"),
            ListenTarget::Pipe { path, .. } => write!(f, "unix:{}", path.display()),
        }
    }
}

/// The concrete address a listener ended up bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundAddress {
    Tcp(SocketAddr),
    Pipe(PathBuf),
}

impl BoundAddress {
    pub fn port(&self) -> Option<u16> {
        match self {
            BoundAddress::Tcp(addr) => Some(addr.port()),
            BoundAddress::Pipe(_) => None,
        }
    }
}

impl fmt::Display for BoundAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundAddress::Tcp(addr) => write!(f, "{addr}"),
            BoundAddress::Pipe(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn localhost_is_case_insensitive() {
        let endpoint = EndpointDescriptor::socket(Scheme::Http, "LocalHost", 5000, "");
        assert!(endpoint.is_localhost());
    }

    #[test]
    fn pipe_endpoint_is_never_localhost() {
        assert!(!EndpointDescriptor::pipe("/run/app.sock").is_localhost());
    }

    #[test]
    fn ip_host_resolves_to_itself() {
        let endpoint = EndpointDescriptor::socket(Scheme::Http, "10.1.2.3", 8080, "");
        match endpoint.to_listen_target() {
            ListenTarget::Socket { addr, .. } => assert_eq!(addr.to_string(), "10.1.2.3:8080"),
            ListenTarget::Pipe { .. } => panic!("expected a socket target"),
        }
    }

    #[test]
    fn non_ip_host_falls_back_to_any_address() {
        let endpoint = EndpointDescriptor::socket(Scheme::Http, "example.com", 8080, "");
        match endpoint.to_listen_target() {
            ListenTarget::Socket { addr, .. } => {
                assert!(addr.ip().is_unspecified());
                assert!(addr.is_ipv6());
                assert_eq!(addr.port(), 8080);
            }
            ListenTarget::Pipe { .. } => panic!("expected a socket target"),
        }
    }

    #[test]
    fn display_brackets_ipv6_hosts() {
        let endpoint = EndpointDescriptor::socket(Scheme::Https, "::1", 8443, "/base");
        assert_eq!(endpoint.to_string(), "https://[::1]:8443/base");
    }

    #[test]
    fn display_with_port_substitutes_only_the_port() {
        let endpoint = EndpointDescriptor::socket(Scheme::Http, "127.0.0.1", 0, "");
        assert_eq!(endpoint.display_with_port(49200), "http://127.0.0.1:49200");
    }
}
