//! Reconciliation of address sources and the bind loop.
//!
//! # Responsibilities
//! - Decide which address source wins (explicit endpoints vs the feed)
//! - Parse feed entries, routing localhost to the dual-stack binder
//! - Bind every target in order, registering each listener immediately
//! - Enforce the at-least-one-listener invariant

use std::sync::Arc;

use crate::addr::endpoint::EndpointDescriptor;
use crate::addr::feed::{AddressFeed, DEFAULT_SERVER_ADDRESS};
use crate::addr::parser;
use crate::binding::loopback;
use crate::config::schema::ServerConfig;
use crate::engine::{BindError, ConnectionHandler, Engine};
use crate::error::StartupError;
use crate::lifecycle::resources::ResourceStack;
use crate::observability::metrics::LISTENERS_BOUND;

/// One planned bind operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindRequest {
    /// A concrete endpoint bound as-is.
    Endpoint(EndpointDescriptor),
    /// A logical localhost endpoint, expanded across both loopback families.
    Localhost(EndpointDescriptor),
}

/// Reconcile the two address sources into an ordered bind plan.
///
/// Explicit endpoints take precedence; the feed is drained either way. A feed
/// holding exactly the default placeholder is discarded silently, anything
/// else it held is worth telling the operator about.
pub fn reconcile(
    config: &ServerConfig,
    feed: &AddressFeed,
) -> Result<Vec<BindRequest>, StartupError> {
    if !config.listen.is_empty() {
        let discarded = feed.take();
        if !discarded.is_empty() && !is_default_placeholder(&discarded) {
            tracing::warn!(
                addresses = %discarded.join(", "),
                "overriding externally supplied addresses; binding to the configured endpoints instead"
            );
        }
        return Ok(config.listen.iter().cloned().map(request_for).collect());
    }

    let mut requests = Vec::new();
    for address in feed.take() {
        let endpoint = parser::parse(&address).map_err(|source| StartupError::Parse {
            address: address.clone(),
            source,
        })?;
        requests.push(request_for(endpoint));
    }
    Ok(requests)
}

fn is_default_placeholder(addresses: &[String]) -> bool {
    matches!(addresses, [only] if only == DEFAULT_SERVER_ADDRESS)
}

fn request_for(endpoint: EndpointDescriptor) -> BindRequest {
    if endpoint.is_localhost() {
        BindRequest::Localhost(endpoint)
    } else {
        BindRequest::Endpoint(endpoint)
    }
}

/// Bind every planned target in order.
///
/// Each listener is pushed into the resource stack as soon as it exists;
/// the caller's unwind path owns rollback on failure.
pub fn bind_all(
    requests: Vec<BindRequest>,
    engine: &dyn Engine,
    handler: &Arc<dyn ConnectionHandler>,
    resources: &mut ResourceStack,
) -> Result<Vec<String>, StartupError> {
    let mut bound = Vec::new();
    for request in requests {
        match request {
            BindRequest::Endpoint(endpoint) => {
                let target = endpoint.to_listen_target();
                let listener = engine
                    .create_listener(&target, Arc::clone(handler))
                    .map_err(|error| bind_failure(&endpoint.to_string(), error))?;
                let address = listener.published_address();
                resources.push(Box::new(listener));
                tracing::info!(address = %address, "endpoint bound");
                bound.push(address);
            }
            BindRequest::Localhost(endpoint) => {
                let address = loopback::bind_localhost(&endpoint, engine, handler, resources)?;
                bound.push(address);
            }
        }
    }

    if bound.is_empty() {
        return Err(StartupError::NoListeners);
    }
    metrics::counter!(LISTENERS_BOUND).increment(bound.len() as u64);
    Ok(bound)
}

/// Map an engine bind failure onto the startup taxonomy, naming the endpoint.
pub(crate) fn bind_failure(endpoint: &str, error: BindError) -> StartupError {
    match error {
        BindError::AddressInUse(source) => StartupError::AddressInUse {
            endpoint: endpoint.to_string(),
            source,
        },
        BindError::Other(source) => StartupError::Bind {
            endpoint: endpoint.to_string(),
            source,
        },
    }
}
