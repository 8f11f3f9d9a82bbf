/// Server-side HTML templates for the wiki
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{Map, Value};
use std::fmt::Write;
use thiserror::Error;

/// Key/value data handed to a template
pub type ViewModel = Map<String, Value>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Template {template} is missing field {field}")]
    MissingField {
        template: &'static str,
        field: &'static str,
    },
}

/// Renders a named template against a view model
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, model: &ViewModel) -> Result<String, RenderError>;
}

/// Characters that cannot appear raw inside one path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// URL of the view of the named page, e.g. `/wiki/My%20Page`
pub fn page_url(name: &str) -> String {
    format!("/wiki/{}", utf8_percent_encode(name, PATH_SEGMENT))
}

/// Escape text for use in HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The built-in `index` and `page` templates
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlTemplates;

impl TemplateRenderer for HtmlTemplates {
    fn render(&self, template: &str, model: &ViewModel) -> Result<String, RenderError> {
        match template {
            "index" => render_index(model),
            "page" => render_page(model),
            other => Err(RenderError::UnknownTemplate(other.to_string())),
        }
    }
}

fn text<'a>(
    model: &'a ViewModel,
    template: &'static str,
    field: &'static str,
) -> Result<&'a str, RenderError> {
    model
        .get(field)
        .and_then(Value::as_str)
        .ok_or(RenderError::MissingField { template, field })
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape_html(title),
        body = body,
    )
}

fn render_index(model: &ViewModel) -> Result<String, RenderError> {
    let title = text(model, "index", "title")?;
    let pages = model
        .get("pages")
        .and_then(Value::as_array)
        .ok_or(RenderError::MissingField {
            template: "index",
            field: "pages",
        })?;

    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(title));
    body.push_str(
        "<form action=\"/create\" method=\"post\">\n\
         <input type=\"text\" name=\"name\" placeholder=\"New page name\">\n\
         <button type=\"submit\">Create</button>\n\
         </form>\n",
    );

    if pages.is_empty() {
        body.push_str("<p>The wiki is currently empty!</p>\n");
    } else {
        body.push_str("<ul>\n");
        for name in pages.iter().filter_map(Value::as_str) {
            let _ = writeln!(
                body,
                "<li><a href=\"{}\">{}</a></li>",
                escape_html(&page_url(name)),
                escape_html(name)
            );
        }
        body.push_str("</ul>\n");
    }

    Ok(layout(title, &body))
}

fn render_page(model: &ViewModel) -> Result<String, RenderError> {
    let title = text(model, "page", "title")?;
    let content = text(model, "page", "content")?;
    let raw_content = text(model, "page", "rawContent")?;
    let new_page = text(model, "page", "newPage")?;
    let timestamp = text(model, "page", "timestamp")?;
    let id = model
        .get("id")
        .and_then(Value::as_i64)
        .ok_or(RenderError::MissingField {
            template: "page",
            field: "id",
        })?;

    let mut body = String::new();
    body.push_str("<p><a href=\"/\">Home</a></p>\n");
    let _ = writeln!(body, "<h1>{}</h1>", escape_html(title));

    // `content` is the converter's HTML output and goes in as is
    let _ = writeln!(body, "<div class=\"content\">\n{}</div>", content);

    let _ = write!(
        body,
        "<form action=\"/save\" method=\"post\">\n\
         <input type=\"hidden\" name=\"id\" value=\"{id}\">\n\
         <input type=\"hidden\" name=\"title\" value=\"{title}\">\n\
         <input type=\"hidden\" name=\"newPage\" value=\"{new_page}\">\n\
         <textarea name=\"markdown\" rows=\"15\" cols=\"80\">{raw}</textarea>\n\
         <button type=\"submit\">Save</button>\n\
         </form>\n",
        id = id,
        title = escape_html(title),
        new_page = escape_html(new_page),
        raw = escape_html(raw_content),
    );

    if new_page == "no" {
        let _ = write!(
            body,
            "<form action=\"/delete\" method=\"post\">\n\
             <input type=\"hidden\" name=\"id\" value=\"{}\">\n\
             <button type=\"submit\">Delete</button>\n\
             </form>\n",
            id
        );
    }

    let _ = writeln!(
        body,
        "<p class=\"timestamp\">Rendered {}</p>",
        escape_html(timestamp)
    );

    Ok(layout(title, &body))
}
