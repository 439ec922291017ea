//! Public server surface: startup orchestration and teardown.
//!
//! # Data Flow
//! ```text
//! Server::start(handler)
//!     guard (already started? platform preflight)
//!     → validate options
//!     → resource stack opens
//!     → engine + heartbeat acquired
//!     → reconcile addresses → start workers → bind loop
//!     → success: bound addresses published into the feed
//!     → failure: everything acquired unwinds, one error surfaces
//! ```
//!
//! # Design Decisions
//! - Startup and shutdown run synchronously on the calling thread
//! - The resource stack's presence is the single "started" record
//! - Either the full bound-address set is published, or none of it

use std::sync::Arc;

use crate::addr::feed::AddressFeed;
use crate::binding::plan;
use crate::config::schema::ServerConfig;
use crate::config::validation::validate_config;
use crate::engine::tokio_engine::TokioEngineFactory;
use crate::engine::{ConnectionHandler, EngineFactory, EngineResource};
use crate::error::{EngineError, StartupError};
use crate::lifecycle::heartbeat::Heartbeat;
use crate::lifecycle::preflight::{self, ErrorCodes};
use crate::lifecycle::resources::ResourceStack;
use crate::observability::metrics::STARTUP_FAILURES;

/// The startup and listener-binding core of the server engine.
pub struct Server {
    config: ServerConfig,
    feed: AddressFeed,
    engine_factory: Box<dyn EngineFactory>,
    resources: Option<ResourceStack>,
}

impl Server {
    /// Create a server using the production tokio engine.
    pub fn new(config: ServerConfig, feed: AddressFeed) -> Self {
        Self::with_engine(config, feed, Box::new(TokioEngineFactory))
    }

    /// Create a server with a custom engine factory.
    pub fn with_engine(
        config: ServerConfig,
        feed: AddressFeed,
        engine_factory: Box<dyn EngineFactory>,
    ) -> Self {
        Self {
            config,
            feed,
            engine_factory,
            resources: None,
        }
    }

    /// Run the full startup sequence.
    ///
    /// On success at least one listener is live and the final bound-address
    /// set has been published into the address feed. On failure every
    /// resource acquired during the attempt has been released before the
    /// error is returned.
    pub fn start(&mut self, handler: Arc<dyn ConnectionHandler>) -> Result<(), StartupError> {
        if self.resources.is_some() {
            return Err(StartupError::AlreadyStarted);
        }
        let codes = preflight::check()?;
        if let Err(errors) = validate_config(&self.config) {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(StartupError::InvalidOptions(message));
        }

        let mut resources = ResourceStack::new();
        match self.try_start(&mut resources, handler, codes) {
            Ok(addresses) => {
                tracing::info!(addresses = %addresses.join(", "), "server started");
                self.feed.replace(addresses);
                self.resources = Some(resources);
                Ok(())
            }
            Err(error) => {
                tracing::error!(%error, "startup failed; releasing acquired resources");
                metrics::counter!(STARTUP_FAILURES).increment(1);
                resources.unwind_all();
                Err(error)
            }
        }
    }

    fn try_start(
        &mut self,
        resources: &mut ResourceStack,
        handler: Arc<dyn ConnectionHandler>,
        codes: ErrorCodes,
    ) -> Result<Vec<String>, StartupError> {
        let engine = self.engine_factory.create(&self.config, codes)?;
        resources.push(Box::new(EngineResource(Arc::clone(&engine))));

        let heartbeat = Heartbeat::start().map_err(EngineError::Background)?;
        resources.push(Box::new(heartbeat));

        let requests = plan::reconcile(&self.config, &self.feed)?;
        engine.start_workers(self.config.workers)?;
        plan::bind_all(requests, engine.as_ref(), &handler, resources)
    }

    /// Snapshot of the currently published addresses.
    pub fn addresses(&self) -> Vec<String> {
        self.feed.addresses()
    }

    /// Whether a startup attempt currently holds resources.
    pub fn is_running(&self) -> bool {
        self.resources.as_ref().is_some_and(ResourceStack::is_active)
    }

    /// Release every active resource in reverse acquisition order.
    ///
    /// Safe to call when nothing is active; a second call is a no-op. Callers
    /// must serialize shutdown with startup.
    pub fn shutdown(&mut self) {
        if let Some(mut resources) = self.resources.take() {
            tracing::info!(resources = resources.len(), "shutting down");
            resources.unwind_all();
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shutdown();
    }
}
