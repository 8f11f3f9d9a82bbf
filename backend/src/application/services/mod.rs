pub mod page_store;

pub use page_store::{PageStore, PageStoreClient, PageStoreConfig, StoreError, StoreResult};
