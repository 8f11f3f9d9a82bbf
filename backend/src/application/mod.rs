pub mod repositories;
pub mod services;

pub use repositories::PageRepository;
pub use services::{PageStore, PageStoreClient, PageStoreConfig, StoreError, StoreResult};
