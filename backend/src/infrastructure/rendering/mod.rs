/// Markdown conversion and HTML templates
mod markdown;
mod templates;

pub use markdown::markdown_to_html;
pub use templates::{escape_html, page_url, HtmlTemplates, RenderError, TemplateRenderer, ViewModel};
