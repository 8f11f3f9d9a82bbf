use crate::application::repositories::PageRepository;
use crate::domain::aggregates::Page;
use crate::domain::value_objects::{Markdown, PageId};
use crate::domain::DomainResult;
use rusqlite::{params, Connection, Result as SqliteResult};

/// SQLite-based implementation of the PageRepository trait
pub struct SqlitePageRepository {
    conn: Connection,
}

impl SqlitePageRepository {
    /// Create a new SQLite repository with the given connection
    pub fn new(conn: Connection) -> Self {
        SqlitePageRepository { conn }
    }

    /// Create a new in-memory SQLite repository (useful for testing)
    ///
    /// The schema is not created until `initialize` is called.
    pub fn new_in_memory() -> SqliteResult<Self> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Create a new file-based SQLite repository
    ///
    /// `:memory:` opens a private in-memory database.
    pub fn new_with_path(path: impl AsRef<std::path::Path>) -> SqliteResult<Self> {
        Ok(Self::new(Connection::open(path)?))
    }

    fn row_to_page(id: i64, name: String, content: String) -> Page {
        Page::new(PageId::new(id), name, Markdown::new(content))
    }
}

impl PageRepository for SqlitePageRepository {
    fn initialize(&mut self) -> DomainResult<()> {
        super::schema::initialize_database(&self.conn)?;
        Ok(())
    }

    fn fetch_all_pages(&self) -> DomainResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM pages")?;

        let mut names: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<SqliteResult<Vec<_>>>()?;

        // Listing order is part of the contract, not whatever SQLite yields
        names.sort();
        Ok(names)
    }

    fn fetch_all_pages_data(&self) -> DomainResult<Vec<Page>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, content FROM pages ORDER BY id")?;

        let pages = stmt
            .query_map([], |row| {
                Ok(Self::row_to_page(row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(pages)
    }

    fn fetch_page(&self, name: &str) -> DomainResult<Option<Page>> {
        let result: Result<(i64, String), _> = self.conn.query_row(
            "SELECT id, content FROM pages WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        );

        match result {
            Ok((id, content)) => Ok(Some(Self::row_to_page(id, name.to_string(), content))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn fetch_page_by_id(&self, id: PageId) -> DomainResult<Option<Page>> {
        let result: Result<(String, String), _> = self.conn.query_row(
            "SELECT name, content FROM pages WHERE id = ?1",
            params![id.value()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        );

        match result {
            Ok((name, content)) => Ok(Some(Self::row_to_page(id.value(), name, content))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn create_page(&mut self, name: &str, content: &Markdown) -> DomainResult<()> {
        self.conn.execute(
            "INSERT INTO pages (name, content) VALUES (?1, ?2)",
            params![name, content.as_str()],
        )?;

        tracing::debug!(
            "Created page {:?} with id {}",
            name,
            self.conn.last_insert_rowid()
        );
        Ok(())
    }

    fn save_page(&mut self, id: PageId, content: &Markdown) -> DomainResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE pages SET content = ?1 WHERE id = ?2",
            params![content.as_str(), id.value()],
        )?;

        if rows_affected == 0 {
            tracing::debug!("Save of page {} matched no rows", id);
        }
        Ok(())
    }

    fn delete_page(&mut self, id: PageId) -> DomainResult<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM pages WHERE id = ?1", params![id.value()])?;

        if rows_affected == 0 {
            tracing::debug!("Delete of page {} matched no rows", id);
        }
        Ok(())
    }
}
