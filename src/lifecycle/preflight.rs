//! Platform preflight checks, run once per startup attempt.
//!
//! # Responsibilities
//! - Refuse big-endian targets (the wire layer assumes little-endian)
//! - Probe the platform error codes used to classify bind failures
//!
//! Undeterminable codes degrade classification; they do not stop startup.

use std::io;

use crate::error::StartupError;

/// Platform error codes resolved by the preflight probe.
///
/// `None` means the probe could not pin down a value; bind failures are then
/// classified generically instead of as address conflicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorCodes {
    pub addr_in_use: Option<i32>,
    pub conn_reset: Option<i32>,
}

impl ErrorCodes {
    /// True when `err` is a definite address-in-use conflict.
    pub fn is_addr_in_use(&self, err: &io::Error) -> bool {
        match self.addr_in_use {
            Some(code) => {
                err.raw_os_error() == Some(code) || err.kind() == io::ErrorKind::AddrInUse
            }
            None => false,
        }
    }
}

/// Validate the platform and resolve the error codes.
pub fn check() -> Result<ErrorCodes, StartupError> {
    if cfg!(target_endian = "big") {
        return Err(StartupError::PlatformUnsupported(
            "big-endian platforms are not supported",
        ));
    }

    let codes = probe_error_codes();
    if codes.addr_in_use.is_none() {
        tracing::warn!(
            "could not determine the address-in-use error code; \
             bind conflicts will be reported as generic failures"
        );
    }
    if codes.conn_reset.is_none() {
        tracing::warn!("could not determine the connection-reset error code");
    }
    Ok(codes)
}

#[cfg(unix)]
fn probe_error_codes() -> ErrorCodes {
    let addr_in_use = io::Error::from_raw_os_error(libc::EADDRINUSE).kind()
        == io::ErrorKind::AddrInUse;
    let conn_reset = io::Error::from_raw_os_error(libc::ECONNRESET).kind()
        == io::ErrorKind::ConnectionReset;
    ErrorCodes {
        addr_in_use: addr_in_use.then_some(libc::EADDRINUSE),
        conn_reset: conn_reset.then_some(libc::ECONNRESET),
    }
}

#[cfg(windows)]
fn probe_error_codes() -> ErrorCodes {
    // WSAEADDRINUSE / WSAECONNRESET
    let addr_in_use = io::Error::from_raw_os_error(10048).kind() == io::ErrorKind::AddrInUse;
    let conn_reset = io::Error::from_raw_os_error(10054).kind() == io::ErrorKind::ConnectionReset;
    ErrorCodes {
        addr_in_use: addr_in_use.then_some(10048),
        conn_reset: conn_reset.then_some(10054),
    }
}

#[cfg(not(any(unix, windows)))]
fn probe_error_codes() -> ErrorCodes {
    ErrorCodes::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preflight_passes_on_supported_hosts() {
        assert!(check().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn resolves_the_address_in_use_code() {
        let codes = probe_error_codes();
        assert_eq!(codes.addr_in_use, Some(libc::EADDRINUSE));
        let err = io::Error::from_raw_os_error(libc::EADDRINUSE);
        assert!(codes.is_addr_in_use(&err));
    }

    #[test]
    fn unresolved_codes_never_classify_conflicts() {
        let codes = ErrorCodes::default();
        let err = io::Error::from(io::ErrorKind::AddrInUse);
        assert!(!codes.is_addr_in_use(&err));
    }
}
