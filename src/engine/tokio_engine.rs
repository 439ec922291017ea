//! Tokio-backed worker engine.
//!
//! # Responsibilities
//! - Materialize worker threads as a multi-thread tokio runtime
//! - Bind nonblocking sockets and run one accept loop per listener
//! - Enforce the max_connections limit via semaphore
//! - Stop every accept loop on engine shutdown

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::runtime::Runtime;
use tokio::sync::{broadcast, Semaphore};
use tokio::task::JoinHandle;

use crate::addr::endpoint::{BoundAddress, EndpointDescriptor, ListenTarget};
use crate::config::schema::ServerConfig;
use crate::engine::{
    AcceptedConnection, BindError, BoundListener, ConnectionHandler, Engine, EngineFactory,
};
use crate::error::{EngineError, ReleaseError};
use crate::lifecycle::preflight::ErrorCodes;
use crate::lifecycle::resources::Disposable;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Production engine running listeners on a shared tokio runtime.
pub struct TokioEngine {
    runtime: Mutex<Option<Runtime>>,
    stop: broadcast::Sender<()>,
    codes: ErrorCodes,
    backlog: u32,
    connection_limit: Arc<Semaphore>,
}

impl TokioEngine {
    pub fn new(config: &ServerConfig, codes: ErrorCodes) -> Self {
        let (stop, _) = broadcast::channel(1);
        Self {
            runtime: Mutex::new(None),
            stop,
            codes,
            backlog: config.listener.backlog,
            connection_limit: Arc::new(Semaphore::new(config.listener.max_connections)),
        }
    }

    fn runtime_handle(&self) -> Result<tokio::runtime::Handle, BindError> {
        lock(&self.runtime)
            .as_ref()
            .map(|runtime| runtime.handle().clone())
            .ok_or_else(|| {
                BindError::Other(io::Error::new(
                    io::ErrorKind::Other,
                    EngineError::WorkersNotStarted.to_string(),
                ))
            })
    }

    fn bind_tcp(&self, addr: SocketAddr) -> io::Result<std::net::TcpListener> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        #[cfg(unix)]
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(self.backlog.min(i32::MAX as u32) as i32)?;
        Ok(socket.into())
    }

    #[cfg(unix)]
    fn create_pipe_listener(
        &self,
        endpoint: &EndpointDescriptor,
        path: &PathBuf,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<BoundListener, BindError> {
        let listener = std::os::unix::net::UnixListener::bind(path)
            .map_err(|err| BindError::classify(err, &self.codes))?;
        listener.set_nonblocking(true).map_err(BindError::Other)?;

        let handle = self.runtime_handle()?;
        let task = handle.spawn(accept_unix(
            listener,
            handler,
            self.stop.subscribe(),
            Arc::clone(&self.connection_limit),
            path.clone(),
        ));
        tracing::info!(path = %path.display(), "unix listener bound");

        Ok(BoundListener::new(
            endpoint.clone(),
            BoundAddress::Pipe(path.clone()),
            Box::new(ListenerGuard {
                task: Some(task),
                socket_path: Some(path.clone()),
            }),
        ))
    }

    #[cfg(not(unix))]
    fn create_pipe_listener(
        &self,
        _endpoint: &EndpointDescriptor,
        _path: &PathBuf,
        _handler: Arc<dyn ConnectionHandler>,
    ) -> Result<BoundListener, BindError> {
        Err(BindError::Other(io::Error::new(
            io::ErrorKind::Unsupported,
            "unix socket endpoints are only supported on unix targets",
        )))
    }
}

impl Engine for TokioEngine {
    fn start_workers(&self, count: usize) -> Result<(), EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(count)
            .thread_name("slipway-worker")
            .enable_all()
            .build()
            .map_err(EngineError::Workers)?;
        *lock(&self.runtime) = Some(runtime);
        tracing::info!(workers = count, "worker threads started");
        Ok(())
    }

    fn create_listener(
        &self,
        target: &ListenTarget,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<BoundListener, BindError> {
        match target {
            ListenTarget::Socket { endpoint, addr } => {
                let listener = self
                    .bind_tcp(*addr)
                    .map_err(|err| BindError::classify(err, &self.codes))?;
                let local = listener.local_addr().map_err(BindError::Other)?;

                let handle = self.runtime_handle()?;
                let task = handle.spawn(accept_tcp(
                    listener,
                    handler,
                    self.stop.subscribe(),
                    Arc::clone(&self.connection_limit),
                    local,
                ));
                tracing::info!(address = %local, "listener bound");

                Ok(BoundListener::new(
                    endpoint.clone(),
                    BoundAddress::Tcp(local),
                    Box::new(ListenerGuard {
                        task: Some(task),
                        socket_path: None,
                    }),
                ))
            }
            ListenTarget::Pipe { endpoint, path } => {
                self.create_pipe_listener(endpoint, path, handler)
            }
        }
    }

    fn shutdown(&self) {
        let _ = self.stop.send(());
        let runtime = lock(&self.runtime).take();
        if let Some(runtime) = runtime {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
            tracing::info!("worker threads stopped");
        }
    }
}

async fn accept_tcp(
    listener: std::net::TcpListener,
    handler: Arc<dyn ConnectionHandler>,
    mut stop: broadcast::Receiver<()>,
    limit: Arc<Semaphore>,
    local: SocketAddr,
) {
    let listener = match tokio::net::TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(address = %local, %error, "failed to register listener with the runtime");
            return;
        }
    };

    loop {
        // Acquire a connection slot first (backpressure), then accept.
        let permit = tokio::select! {
            _ = stop.recv() => break,
            permit = Arc::clone(&limit).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        tokio::select! {
            _ = stop.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(peer_addr = %peer, "connection accepted");
                    let work = handler.handle(AcceptedConnection::from_tcp(stream, peer));
                    tokio::spawn(async move {
                        work.await;
                        drop(permit);
                    });
                }
                Err(error) => tracing::warn!(address = %local, %error, "accept failed"),
            },
        }
    }
    tracing::debug!(address = %local, "listener stopped");
}

#[cfg(unix)]
async fn accept_unix(
    listener: std::os::unix::net::UnixListener,
    handler: Arc<dyn ConnectionHandler>,
    mut stop: broadcast::Receiver<()>,
    limit: Arc<Semaphore>,
    path: PathBuf,
) {
    let listener = match tokio::net::UnixListener::from_std(listener) {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(path = %path.display(), %error, "failed to register listener with the runtime");
            return;
        }
    };

    loop {
        let permit = tokio::select! {
            _ = stop.recv() => break,
            permit = Arc::clone(&limit).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        tokio::select! {
            _ = stop.recv() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    tracing::debug!(path = %path.display(), "connection accepted");
                    let work = handler.handle(AcceptedConnection::from_unix(stream));
                    tokio::spawn(async move {
                        work.await;
                        drop(permit);
                    });
                }
                Err(error) => tracing::warn!(path = %path.display(), %error, "accept failed"),
            },
        }
    }
    tracing::debug!(path = %path.display(), "listener stopped");
}

/// Engine-side close handle for one listener.
struct ListenerGuard {
    task: Option<JoinHandle<()>>,
    socket_path: Option<PathBuf>,
}

impl Disposable for ListenerGuard {
    fn name(&self) -> &'static str {
        "listener"
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(path) = self.socket_path.take() {
            if let Err(err) = std::fs::remove_file(&path) {
                if err.kind() != io::ErrorKind::NotFound {
                    return Err(ReleaseError {
                        resource: "listener",
                        message: format!(
                            "failed to remove socket file {}: {}",
                            path.display(),
                            err
                        ),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Factory producing [`TokioEngine`] instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioEngineFactory;

impl EngineFactory for TokioEngineFactory {
    fn create(
        &self,
        config: &ServerConfig,
        codes: ErrorCodes,
    ) -> Result<Arc<dyn Engine>, EngineError> {
        Ok(Arc::new(TokioEngine::new(config, codes)))
    }
}

fn lock(runtime: &Mutex<Option<Runtime>>) -> MutexGuard<'_, Option<Runtime>> {
    match runtime.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
