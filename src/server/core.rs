use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::backend::FtpBackend;
use crate::client::handle_client;
use crate::config::{EngineOptions, ServerConfig};
use crate::error::FtpServerError;

/// State shared by every session of one server: the backend callbacks, the
/// engine options, the live-session counter and the session id source.
pub struct ServerShared {
    backend: Arc<dyn FtpBackend>,
    options: EngineOptions,
    max_clients: usize,
    active_sessions: AtomicUsize,
    next_session_id: AtomicU64,
}

impl ServerShared {
    pub fn new(backend: Arc<dyn FtpBackend>, options: EngineOptions, max_clients: usize) -> Self {
        Self {
            backend,
            options,
            max_clients,
            active_sessions: AtomicUsize::new(0),
            next_session_id: AtomicU64::new(1),
        }
    }

    pub fn backend(&self) -> &dyn FtpBackend {
        self.backend.as_ref()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::Acquire)
    }

    /// Hands out a fresh session id; ids start at 1 and are never reused.
    pub fn next_session_id(&self) -> u64 {
        self.next_session_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Reserves a session slot, or returns `None` when `max_clients` sessions
    /// are already live. The slot is held until the guard is dropped.
    pub fn try_session_guard(&self) -> Option<SessionGuard<'_>> {
        let previous = self.active_sessions.fetch_add(1, Ordering::AcqRel);
        if previous >= self.max_clients {
            self.active_sessions.fetch_sub(1, Ordering::AcqRel);
            return None;
        }
        Some(SessionGuard {
            counter: &self.active_sessions,
        })
    }
}

/// Decrements the live-session counter when dropped.
pub struct SessionGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Handle of a running FTP server.
///
/// Created with [`FtpServer::create`], which binds the control socket and
/// starts accepting; torn down with [`FtpServer::destroy`].
pub struct FtpServer {
    shared: Arc<ServerShared>,
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl FtpServer {
    /// Binds the control socket and spawns the accept loop.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn create(
        config: &ServerConfig,
        backend: Arc<dyn FtpBackend>,
    ) -> Result<Self, FtpServerError> {
        let control_socket = config.control_socket();

        let listener = match TcpListener::bind(&control_socket).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("Failed to bind to {}: {}", control_socket, e);
                return Err(FtpServerError::Bind(control_socket, e));
            }
        };
        let local_addr = listener.local_addr()?;

        let shared = Arc::new(ServerShared::new(
            backend,
            config.engine_options(),
            config.max_clients,
        ));

        info!(
            "FTP server listening on {} (max {} clients)",
            local_addr, config.max_clients
        );

        let accept_task = tokio::spawn(accept_loop(listener, Arc::clone(&shared)));

        Ok(Self {
            shared,
            local_addr,
            accept_task,
        })
    }

    /// Address the control socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn active_sessions(&self) -> usize {
        self.shared.active_sessions()
    }

    /// Stops accepting connections and releases the listening socket.
    ///
    /// Sessions already running keep going until their clients disconnect.
    pub async fn destroy(self) {
        self.accept_task.abort();
        if let Err(e) = self.accept_task.await {
            if !e.is_cancelled() {
                warn!("Accept loop ended abnormally: {}", e);
            }
        }
        info!(
            "FTP server on {} stopped ({} sessions still active)",
            self.local_addr,
            self.shared.active_sessions()
        );
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<ServerShared>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let shared = Arc::clone(&shared);

                // Spawn a task for each client so accept loop doesn't block
                tokio::spawn(async move {
                    serve_connection(stream, addr, shared).await;
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, addr: SocketAddr, shared: Arc<ServerShared>) {
    info!("Client connected: {}", addr);

    match handle_client(stream, &shared, Some(addr)).await {
        Ok(end) => info!("Client {} disconnected ({:?})", addr, end),
        Err(e) => warn!("Session with {} ended with error: {}", addr, e),
    }
}
