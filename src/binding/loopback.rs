//! Dual-stack binding for logical `localhost` endpoints.
//!
//! # Design Decisions
//! - Port 0 is rejected before any bind: the two families would otherwise be
//!   assigned different ports
//! - An address conflict on either family aborts the whole startup
//! - One non-conflict failure is tolerated when the other family bound
//! - The (IPv4, IPv6) outcome pair is resolved through one explicit match so
//!   the tolerance policy stays auditable

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use crate::addr::endpoint::{EndpointDescriptor, ListenTarget};
use crate::engine::{BindError, ConnectionHandler, Engine};
use crate::error::StartupError;
use crate::lifecycle::resources::ResourceStack;

/// Outcome of one loopback-family bind attempt. An address conflict never
/// reaches this type; it aborts the whole operation first.
enum Attempt {
    Bound,
    Failed(io::Error),
}

/// Bind both loopback families for one logical `localhost` endpoint.
///
/// Returns the single published address covering whichever families bound.
/// Listeners bound before a later fatal outcome stay registered in the
/// resource stack; rollback belongs to the caller's unwind path.
pub fn bind_localhost(
    endpoint: &EndpointDescriptor,
    engine: &dyn Engine,
    handler: &Arc<dyn ConnectionHandler>,
    resources: &mut ResourceStack,
) -> Result<String, StartupError> {
    let port = endpoint.port();
    if port == 0 {
        return Err(StartupError::DynamicPortOnLocalhost {
            endpoint: endpoint.to_string(),
        });
    }

    let v4 = attempt(
        endpoint,
        IpAddr::V4(Ipv4Addr::LOCALHOST),
        "IPv4",
        engine,
        handler,
        resources,
    )?;
    let v6 = attempt(
        endpoint,
        IpAddr::V6(Ipv6Addr::LOCALHOST),
        "IPv6",
        engine,
        handler,
        resources,
    )?;

    match (v4, v6) {
        (Attempt::Bound, Attempt::Bound) => {}
        (Attempt::Bound, Attempt::Failed(error)) => {
            tracing::warn!(
                endpoint = %endpoint,
                family = "IPv6",
                %error,
                "one loopback family failed to bind; continuing with the other"
            );
        }
        (Attempt::Failed(error), Attempt::Bound) => {
            tracing::warn!(
                endpoint = %endpoint,
                family = "IPv4",
                %error,
                "one loopback family failed to bind; continuing with the other"
            );
        }
        (Attempt::Failed(ipv4_error), Attempt::Failed(ipv6_error)) => {
            return Err(StartupError::LoopbackBindFailed {
                endpoint: endpoint.to_string(),
                ipv4_error,
                ipv6_error,
            });
        }
    }

    Ok(endpoint.display_with_port(port))
}

/// One sequential bind attempt against a single loopback family.
fn attempt(
    endpoint: &EndpointDescriptor,
    ip: IpAddr,
    family: &'static str,
    engine: &dyn Engine,
    handler: &Arc<dyn ConnectionHandler>,
    resources: &mut ResourceStack,
) -> Result<Attempt, StartupError> {
    let addr = SocketAddr::new(ip, endpoint.port());
    let target = ListenTarget::Socket {
        endpoint: endpoint.clone(),
        addr,
    };
    match engine.create_listener(&target, Arc::clone(handler)) {
        Ok(listener) => {
            tracing::debug!(endpoint = %endpoint, address = %addr, family, "loopback family bound");
            resources.push(Box::new(listener));
            Ok(Attempt::Bound)
        }
        Err(BindError::AddressInUse(source)) => Err(StartupError::AddressInUse {
            endpoint: format!("{endpoint} ({family} loopback {addr})"),
            source,
        }),
        Err(BindError::Other(source)) => Ok(Attempt::Failed(source)),
    }
}
