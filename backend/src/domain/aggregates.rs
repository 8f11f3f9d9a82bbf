/// Domain aggregates
use super::base::Entity;
use super::value_objects::{Markdown, PageId};
use serde::Serialize;

/// A wiki page: a unique name and its Markdown source, identified by a
/// store-assigned id that never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    id: PageId,
    name: String,
    content: Markdown,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>, content: Markdown) -> Self {
        Page {
            id,
            name: name.into(),
            content,
        }
    }

    /// Get the page name (its title and lookup key)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw Markdown content
    pub fn content(&self) -> &Markdown {
        &self.content
    }
}

impl Entity for Page {
    type Id = PageId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
