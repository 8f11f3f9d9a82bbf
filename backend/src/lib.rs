/// A small Markdown wiki: pages live in SQLite behind a single store worker
/// and several HTTP replicas reach it through a shared client handle
pub mod application;
pub mod config;
pub mod domain;
pub mod http;
pub mod infrastructure;
pub mod startup;

pub use application::{PageStore, PageStoreClient, PageStoreConfig, StoreError};
pub use config::WikiConfig;
pub use startup::{start, start_with_repository, RunningWiki, StartupError};
