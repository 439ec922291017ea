//! Externally supplied listen addresses.

use std::sync::{Arc, Mutex, MutexGuard};

/// Address every server falls back to when nothing else is configured.
pub const DEFAULT_SERVER_ADDRESS: &str = "http://0.0.0.0:8080";

/// Shared, ordered list of listen address strings supplied out-of-band
/// (environment, command line, hosting integration).
///
/// The server drains the feed during startup and publishes the final bound
/// addresses back into it. The handle is cheap to clone; the caller keeps one
/// to observe the outcome. Mutating the feed while a startup is in progress
/// is not supported.
#[derive(Debug, Clone)]
pub struct AddressFeed {
    inner: Arc<Mutex<Vec<String>>>,
}

impl AddressFeed {
    /// An empty feed.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A feed holding only the default placeholder address.
    pub fn with_default() -> Self {
        Self::from_addresses([DEFAULT_SERVER_ADDRESS])
    }

    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner: Arc::new(Mutex::new(addresses.into_iter().map(Into::into).collect())),
        }
    }

    pub fn push(&self, address: impl Into<String>) {
        self.lock().push(address.into());
    }

    /// Snapshot of the current contents, in insertion order.
    pub fn addresses(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain the feed, returning everything it held.
    pub(crate) fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    /// Overwrite the contents with the final bound addresses.
    pub(crate) fn replace(&self, addresses: Vec<String>) {
        *self.lock() = addresses;
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for AddressFeed {
    fn default() -> Self {
        Self::new()
    }
}
