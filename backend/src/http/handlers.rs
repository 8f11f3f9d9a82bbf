/// One handler per route; each makes at most one store call, then renders or redirects
use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use crate::domain::{Entity, Markdown, Page, PageId};
use crate::http::error::{WikiError, WikiResult};
use crate::http::state::WikiState;
use crate::infrastructure::rendering::{markdown_to_html, page_url, ViewModel};

/// Fields posted by the page editor
#[derive(Debug, Deserialize)]
pub struct SaveForm {
    title: Option<String>,
    id: Option<String>,
    markdown: Option<String>,
    #[serde(rename = "newPage")]
    new_page: Option<String>,
}

/// Fields posted by the "create page" box
#[derive(Debug, Deserialize)]
pub struct CreateForm {
    name: Option<String>,
}

/// Fields posted by the delete button
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    id: Option<String>,
}

fn required(value: Option<String>, field: &str) -> WikiResult<String> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(WikiError::Validation(format!("missing form field: {field}"))),
    }
}

/// `GET /`: sorted list of page names
pub async fn index(State(state): State<WikiState>) -> WikiResult<Html<String>> {
    let pages = state.store.fetch_all_pages().await?;

    let mut model = ViewModel::new();
    model.insert("title".to_string(), json!("Wiki home"));
    model.insert("pages".to_string(), json!(pages));

    Ok(Html(state.templates.render("index", &model)?))
}

/// `GET /wiki/:page`: view and edit a page, or start a new one
pub async fn page(
    State(state): State<WikiState>,
    Path(name): Path<String>,
) -> WikiResult<Html<String>> {
    let (id, raw_content, new_page) = match state.store.fetch_page(&name).await? {
        Some(page) => (page.id().value(), page.content().clone(), false),
        None => (PageId::UNSAVED, Markdown::empty_page(), true),
    };

    let mut model = ViewModel::new();
    model.insert("title".to_string(), json!(name));
    model.insert("id".to_string(), json!(id));
    model.insert(
        "newPage".to_string(),
        json!(if new_page { "yes" } else { "no" }),
    );
    model.insert(
        "content".to_string(),
        json!(markdown_to_html(raw_content.as_str())),
    );
    model.insert("rawContent".to_string(), json!(raw_content.into_string()));
    model.insert(
        "timestamp".to_string(),
        json!(chrono::Local::now().to_rfc2822()),
    );

    Ok(Html(state.templates.render("page", &model)?))
}

/// `POST /save`: create or update, then show the page
pub async fn save(State(state): State<WikiState>, Form(form): Form<SaveForm>) -> WikiResult<Redirect> {
    let title = required(form.title, "title")?;
    let markdown = Markdown::new(form.markdown.unwrap_or_default());

    if form.new_page.as_deref() == Some("yes") {
        state.store.create_page(&title, markdown).await?;
    } else {
        let id = PageId::parse(&required(form.id, "id")?)?;
        state.store.save_page(id, markdown).await?;
    }

    Ok(Redirect::to(&page_url(&title)))
}

/// `POST /create`: jump to the named page, or home if no name was given
pub async fn create(Form(form): Form<CreateForm>) -> Redirect {
    match form.name.as_deref() {
        Some(name) if !name.is_empty() => Redirect::to(&page_url(name)),
        _ => Redirect::to("/"),
    }
}

/// `POST /delete`: remove a page and go home
pub async fn delete(State(state): State<WikiState>, Form(form): Form<DeleteForm>) -> WikiResult<Redirect> {
    let id = PageId::parse(&required(form.id, "id")?)?;
    state.store.delete_page(id).await?;
    Ok(Redirect::to("/"))
}

/// `GET /api/pages`: every page as JSON
pub async fn export_pages(State(state): State<WikiState>) -> WikiResult<Json<Vec<Page>>> {
    Ok(Json(state.store.fetch_all_pages_data().await?))
}
