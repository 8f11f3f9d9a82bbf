use crate::domain::{aggregates::Page, value_objects::{Markdown, PageId}, DomainResult};

/// Repository trait for persisting wiki pages.
///
/// This trait defines the contract for the page store. Implementations own
/// their storage handle and are driven from a single thread by the store
/// worker, so methods take `&mut self` / `&self` without any locking.
pub trait PageRepository {
    /// Ensures the page table exists.
    ///
    /// Must succeed before any other method is called. Calling it again on a
    /// ready store is a no-op.
    fn initialize(&mut self) -> DomainResult<()>;

    /// Returns the names of all pages, sorted lexicographically.
    fn fetch_all_pages(&self) -> DomainResult<Vec<String>>;

    /// Returns every page with its id, name and content, ordered by id.
    fn fetch_all_pages_data(&self) -> DomainResult<Vec<Page>>;

    /// Finds a page by its name.
    ///
    /// Returns `Ok(Some(page))` if found, `Ok(None)` if not found,
    /// or an error if the operation fails.
    fn fetch_page(&self, name: &str) -> DomainResult<Option<Page>>;

    /// Finds a page by its id.
    ///
    /// Returns `Ok(Some(page))` if found, `Ok(None)` if not found,
    /// or an error if the operation fails.
    fn fetch_page_by_id(&self, id: PageId) -> DomainResult<Option<Page>>;

    /// Inserts a new page; the store assigns its id.
    fn create_page(&mut self, name: &str, content: &Markdown) -> DomainResult<()>;

    /// Replaces the content of the page with the given id.
    ///
    /// An unknown id is not an error: nothing is updated.
    fn save_page(&mut self, id: PageId, content: &Markdown) -> DomainResult<()>;

    /// Deletes the page with the given id.
    ///
    /// An unknown id is not an error: nothing is deleted.
    fn delete_page(&mut self, id: PageId) -> DomainResult<()>;
}
