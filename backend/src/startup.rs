/// Two-phase bring-up: page store first, then the HTTP replicas
use crate::application::{PageRepository, PageStore, StoreError};
use crate::config::WikiConfig;
use crate::domain::DomainResult;
use crate::http::{wiki_router, WikiState};
use crate::infrastructure::persistence::SqlitePageRepository;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, Instrument};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Page store failed to start: {0}")]
    Store(#[from] StoreError),

    #[error("Could not bind HTTP listener on {address}: {source}")]
    Bind { address: String, source: io::Error },

    #[error("Could not start HTTP replica {replica}: {source}")]
    Replica { replica: usize, source: io::Error },
}

/// A started wiki: a ready page store and its HTTP replicas
pub struct RunningWiki {
    local_addr: SocketAddr,
    store: PageStore,
    replicas: JoinSet<(usize, io::Result<()>)>,
    stop_signal: watch::Sender<bool>,
}

/// Start the wiki backed by the SQLite database named in the config
pub async fn start(config: &WikiConfig) -> Result<RunningWiki, StartupError> {
    let path = config.database_path.clone();
    start_with_repository(
        move || Ok(SqlitePageRepository::new_with_path(&path)?),
        config,
    )
    .await
}

/// Start the wiki over any repository.
///
/// Phase 1 waits for the store to be ready; phase 2 only begins after that.
/// A failure in either phase stops whatever was already started and is
/// returned, so there is never a partially running wiki.
pub async fn start_with_repository<R, F>(
    open: F,
    config: &WikiConfig,
) -> Result<RunningWiki, StartupError>
where
    R: PageRepository + 'static,
    F: FnOnce() -> DomainResult<R> + Send + 'static,
{
    start_with_sockets(open, config, |listener| listener.try_clone()).await
}

/// Startup with a custom source of per-replica sockets; each replica gets the
/// socket `replica_socket` derives from the shared listener
async fn start_with_sockets<R, F, S>(
    open: F,
    config: &WikiConfig,
    mut replica_socket: S,
) -> Result<RunningWiki, StartupError>
where
    R: PageRepository + 'static,
    F: FnOnce() -> DomainResult<R> + Send + 'static,
    S: FnMut(&std::net::TcpListener) -> io::Result<std::net::TcpListener>,
{
    let store = PageStore::start(open, config.page_store()).await?;

    let address = config.listen_address();
    let listener = match bind(&address) {
        Ok(listener) => listener,
        Err(source) => {
            error!("Could not start a HTTP server on {}: {}", address, source);
            store.stop().await;
            return Err(StartupError::Bind { address, source });
        }
    };
    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(source) => {
            store.stop().await;
            return Err(StartupError::Bind { address, source });
        }
    };

    let (stop_signal, _) = watch::channel(false);
    let mut wiki = RunningWiki {
        local_addr,
        store,
        replicas: JoinSet::new(),
        stop_signal,
    };

    for replica in 0..config.http_instances {
        let spawned =
            replica_socket(&listener).and_then(|socket| wiki.spawn_replica(replica, socket));
        if let Err(source) = spawned {
            error!("Could not start HTTP replica {}: {}", replica, source);
            if let Err(e) = wiki.shutdown().await {
                error!("Error while stopping started replicas: {}", e);
            }
            return Err(StartupError::Replica { replica, source });
        }
    }

    info!(
        "HTTP server running on port {} with {} replicas",
        local_addr.port(),
        config.http_instances
    );
    Ok(wiki)
}

fn bind(address: &str) -> io::Result<std::net::TcpListener> {
    let listener = std::net::TcpListener::bind(address)?;
    listener.set_nonblocking(true)?;
    Ok(listener)
}

impl RunningWiki {
    /// Address the replicas accept connections on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of replicas still serving
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// Start one more accept loop on `socket`, with its own router and its
    /// own store handle
    fn spawn_replica(&mut self, replica: usize, socket: std::net::TcpListener) -> io::Result<()> {
        socket.set_nonblocking(true)?;
        let socket = tokio::net::TcpListener::from_std(socket)?;

        let app = wiki_router(WikiState::new(self.store.client()));
        let mut stop = self.stop_signal.subscribe();

        self.replicas.spawn(
            async move {
                let result = axum::serve(socket, app)
                    .with_graceful_shutdown(async move {
                        let _ = stop.wait_for(|stop| *stop).await;
                    })
                    .await;
                (replica, result)
            }
            .instrument(info_span!("http", replica)),
        );
        Ok(())
    }

    /// Serve until `signal` resolves or a replica stops on its own, then shut
    /// everything down
    pub async fn run_until<S>(mut self, signal: S) -> io::Result<()>
    where
        S: Future<Output = ()>,
    {
        let early_exit = tokio::select! {
            _ = signal => {
                info!("Shutdown requested");
                None
            }
            Some(joined) = self.replicas.join_next() => Some(flatten(joined)),
        };

        let early_result = match early_exit {
            Some((replica, Ok(()))) => {
                error!("HTTP replica {} stopped unexpectedly", replica);
                Err(io::Error::other(format!("HTTP replica {replica} stopped")))
            }
            Some((replica, Err(e))) => {
                error!("HTTP replica {} failed: {}", replica, e);
                Err(e)
            }
            None => Ok(()),
        };

        let shutdown_result = self.shutdown().await;
        early_result.and(shutdown_result)
    }

    /// Stop all replicas, wait for in-flight requests, then stop the store
    pub async fn shutdown(mut self) -> io::Result<()> {
        self.stop_signal.send_replace(true);

        let mut first_error = None;
        while let Some(joined) = self.replicas.join_next().await {
            let (replica, result) = flatten(joined);
            if let Err(e) = result {
                error!("HTTP replica {} failed: {}", replica, e);
                first_error.get_or_insert(e);
            }
        }

        self.store.stop().await;
        info!("Wiki stopped");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn flatten(
    joined: Result<(usize, io::Result<()>), tokio::task::JoinError>,
) -> (usize, io::Result<()>) {
    joined.unwrap_or_else(|e| (usize::MAX, Err(io::Error::other(e))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[tokio::test]
    async fn test_replica_failure_stops_started_replicas() {
        let port = free_port();
        let config = WikiConfig {
            database_path: ":memory:".to_string(),
            http_host: "127.0.0.1".to_string(),
            http_port: port,
            http_instances: 3,
            ..WikiConfig::default()
        };

        let mut handed_out = 0;
        let result = start_with_sockets(
            || Ok(SqlitePageRepository::new_in_memory()?),
            &config,
            |listener| {
                handed_out += 1;
                if handed_out == 3 {
                    Err(io::Error::other("no more sockets"))
                } else {
                    listener.try_clone()
                }
            },
        )
        .await;

        assert!(matches!(
            result,
            Err(StartupError::Replica { replica: 2, .. })
        ));
        assert_eq!(handed_out, 3);
        assert!(tokio::net::TcpStream::connect(("127.0.0.1", port))
            .await
            .is_err());
    }
}
