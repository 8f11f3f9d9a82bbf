/// Page store worker and the client facade every caller goes through
use crate::application::repositories::PageRepository;
use crate::domain::aggregates::Page;
use crate::domain::base::{DomainError, DomainResult};
use crate::domain::value_objects::{Markdown, PageId};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Repository error: {0}")]
    Repository(#[from] DomainError),

    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Page store is not running")]
    Unavailable,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Configuration for the page store worker and its clients
#[derive(Debug, Clone)]
pub struct PageStoreConfig {
    /// Upper bound on a single call, queueing included
    pub call_timeout: Duration,
    /// Requests that may wait for the worker before senders have to wait too
    pub queue_capacity: usize,
}

impl Default for PageStoreConfig {
    fn default() -> Self {
        PageStoreConfig {
            call_timeout: Duration::from_secs(5),
            queue_capacity: 64,
        }
    }
}

type Reply<T> = oneshot::Sender<DomainResult<T>>;

/// One request to the worker, carrying its own reply channel
enum StoreCommand {
    FetchAllPages { reply: Reply<Vec<String>> },
    FetchAllPagesData { reply: Reply<Vec<Page>> },
    FetchPage { name: String, reply: Reply<Option<Page>> },
    FetchPageById { id: PageId, reply: Reply<Option<Page>> },
    CreatePage { name: String, content: Markdown, reply: Reply<()> },
    SavePage { id: PageId, content: Markdown, reply: Reply<()> },
    DeletePage { id: PageId, reply: Reply<()> },
}

impl StoreCommand {
    fn operation(&self) -> &'static str {
        match self {
            StoreCommand::FetchAllPages { .. }
            | StoreCommand::FetchAllPagesData { .. }
            | StoreCommand::FetchPage { .. }
            | StoreCommand::FetchPageById { .. } => "query",
            StoreCommand::CreatePage { .. } => "create page",
            StoreCommand::SavePage { .. } => "saving page",
            StoreCommand::DeletePage { .. } => "deletion page",
        }
    }

    /// True once the caller has stopped waiting, e.g. after its timeout
    fn is_abandoned(&self) -> bool {
        match self {
            StoreCommand::FetchAllPages { reply } => reply.is_closed(),
            StoreCommand::FetchAllPagesData { reply } => reply.is_closed(),
            StoreCommand::FetchPage { reply, .. } => reply.is_closed(),
            StoreCommand::FetchPageById { reply, .. } => reply.is_closed(),
            StoreCommand::CreatePage { reply, .. } => reply.is_closed(),
            StoreCommand::SavePage { reply, .. } => reply.is_closed(),
            StoreCommand::DeletePage { reply, .. } => reply.is_closed(),
        }
    }

    fn execute<R: PageRepository>(self, repo: &mut R) {
        match self {
            StoreCommand::FetchAllPages { reply } => {
                respond("query", reply, repo.fetch_all_pages())
            }
            StoreCommand::FetchAllPagesData { reply } => {
                respond("query", reply, repo.fetch_all_pages_data())
            }
            StoreCommand::FetchPage { name, reply } => {
                respond("query", reply, repo.fetch_page(&name))
            }
            StoreCommand::FetchPageById { id, reply } => {
                respond("query", reply, repo.fetch_page_by_id(id))
            }
            StoreCommand::CreatePage { name, content, reply } => {
                respond("create page", reply, repo.create_page(&name, &content))
            }
            StoreCommand::SavePage { id, content, reply } => {
                respond("saving page", reply, repo.save_page(id, &content))
            }
            StoreCommand::DeletePage { id, reply } => {
                respond("deletion page", reply, repo.delete_page(id))
            }
        }
    }
}

fn respond<T>(operation: &str, reply: Reply<T>, result: DomainResult<T>) {
    if let Err(ref e) = result {
        error!("Database {} error: {}", operation, e);
    }
    if reply.send(result).is_err() {
        debug!("Caller gave up before the {} reply was ready", operation);
    }
}

/// The page store: a worker thread that exclusively owns a repository and
/// serves requests from its queue one at a time
pub struct PageStore {
    client: PageStoreClient,
    worker: JoinHandle<()>,
}

impl PageStore {
    /// Start the worker and wait until the repository is open and its schema
    /// is ready.
    ///
    /// `open` runs on the worker thread, so the repository never has to cross
    /// threads. If opening or `initialize` fails, the worker exits and the
    /// failure is returned; no client is ever handed out for a store that is
    /// not ready.
    pub async fn start<R, F>(open: F, config: PageStoreConfig) -> StoreResult<Self>
    where
        R: PageRepository + 'static,
        F: FnOnce() -> DomainResult<R> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let (ready_tx, ready_rx) = oneshot::channel();

        let worker = tokio::task::spawn_blocking(move || run_worker(open, receiver, ready_tx));

        match ready_rx.await {
            Ok(Ok(())) => {
                info!("Database successfully prepared");
                Ok(PageStore {
                    client: PageStoreClient {
                        sender,
                        call_timeout: config.call_timeout,
                    },
                    worker,
                })
            }
            Ok(Err(e)) => {
                error!("Database preparation error: {}", e);
                Err(e.into())
            }
            Err(_) => {
                error!("Database worker stopped before reporting readiness");
                Err(StoreError::Unavailable)
            }
        }
    }

    /// A new handle to this store
    pub fn client(&self) -> PageStoreClient {
        self.client.clone()
    }

    /// Drop this handle and wait for the worker to finish.
    ///
    /// The worker exits once every client clone is gone, so callers must
    /// release theirs first.
    pub async fn stop(self) {
        let PageStore { client, worker } = self;
        drop(client);
        if let Err(e) = worker.await {
            error!("Database worker failed: {}", e);
        }
        debug!("Database worker stopped");
    }
}

fn run_worker<R, F>(
    open: F,
    mut receiver: mpsc::Receiver<StoreCommand>,
    ready: oneshot::Sender<DomainResult<()>>,
) where
    R: PageRepository,
    F: FnOnce() -> DomainResult<R>,
{
    let prepared = open().and_then(|mut repo| {
        repo.initialize()?;
        Ok(repo)
    });

    let mut repo = match prepared {
        Ok(repo) => {
            let _ = ready.send(Ok(()));
            repo
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    while let Some(command) = receiver.blocking_recv() {
        // A caller that timed out has already reported failure
        if command.is_abandoned() {
            debug!("Skipping {} request, caller no longer waiting", command.operation());
            continue;
        }
        command.execute(&mut repo);
    }
}

/// Cloneable handle to the page store.
///
/// Every method mirrors a `PageRepository` operation. Each call gets its own
/// reply channel, so concurrent callers always receive their own results.
/// Calls are bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct PageStoreClient {
    sender: mpsc::Sender<StoreCommand>,
    call_timeout: Duration,
}

impl PageStoreClient {
    async fn call<T>(&self, command: impl FnOnce(Reply<T>) -> StoreCommand) -> StoreResult<T> {
        let (reply, response) = oneshot::channel();
        let command = command(reply);

        let exchange = async {
            self.sender
                .send(command)
                .await
                .map_err(|_| StoreError::Unavailable)?;
            let result = response.await.map_err(|_| StoreError::Unavailable)?;
            Ok::<T, StoreError>(result?)
        };

        match tokio::time::timeout(self.call_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Storage call timed out after {:?}", self.call_timeout);
                Err(StoreError::Timeout(self.call_timeout))
            }
        }
    }

    pub async fn fetch_all_pages(&self) -> StoreResult<Vec<String>> {
        self.call(|reply| StoreCommand::FetchAllPages { reply }).await
    }

    pub async fn fetch_all_pages_data(&self) -> StoreResult<Vec<Page>> {
        self.call(|reply| StoreCommand::FetchAllPagesData { reply })
            .await
    }

    pub async fn fetch_page(&self, name: &str) -> StoreResult<Option<Page>> {
        let name = name.to_string();
        self.call(|reply| StoreCommand::FetchPage { name, reply })
            .await
    }

    pub async fn fetch_page_by_id(&self, id: PageId) -> StoreResult<Option<Page>> {
        self.call(|reply| StoreCommand::FetchPageById { id, reply })
            .await
    }

    pub async fn create_page(&self, name: &str, content: Markdown) -> StoreResult<()> {
        let name = name.to_string();
        self.call(|reply| StoreCommand::CreatePage {
            name,
            content,
            reply,
        })
        .await
    }

    pub async fn save_page(&self, id: PageId, content: Markdown) -> StoreResult<()> {
        self.call(|reply| StoreCommand::SavePage { id, content, reply })
            .await
    }

    pub async fn delete_page(&self, id: PageId) -> StoreResult<()> {
        self.call(|reply| StoreCommand::DeletePage { id, reply })
            .await
    }
}
