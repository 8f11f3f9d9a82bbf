/// Shared state handed to every handler of one server replica
use std::sync::Arc;

use crate::application::PageStoreClient;
use crate::infrastructure::rendering::{HtmlTemplates, TemplateRenderer};

/// Handler state: a store handle and the template renderer
#[derive(Clone)]
pub struct WikiState {
    /// Handle to the page store
    pub store: PageStoreClient,
    /// Renderer for the `index` and `page` views
    pub templates: Arc<dyn TemplateRenderer>,
}

impl WikiState {
    /// State using the built-in HTML templates
    pub fn new(store: PageStoreClient) -> Self {
        Self::with_templates(store, Arc::new(HtmlTemplates))
    }

    /// State using a custom renderer
    pub fn with_templates(store: PageStoreClient, templates: Arc<dyn TemplateRenderer>) -> Self {
        Self { store, templates }
    }
}
