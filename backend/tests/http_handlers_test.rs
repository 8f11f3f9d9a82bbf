/// End-to-end tests of the wiki routes against an in-memory store
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;
use wiki_backend::application::{PageRepository, PageStore, PageStoreConfig};
use wiki_backend::domain::{DomainError, DomainResult, Entity, Markdown, Page, PageId};
use wiki_backend::http::{wiki_router, WikiState};
use wiki_backend::infrastructure::persistence::SqlitePageRepository;
use wiki_backend::infrastructure::rendering::{RenderError, TemplateRenderer, ViewModel};

struct Response {
    status: StatusCode,
    location: Option<String>,
    body: String,
}

async fn start_store() -> PageStore {
    PageStore::start(
        || Ok(SqlitePageRepository::new_in_memory()?),
        PageStoreConfig::default(),
    )
    .await
    .unwrap()
}

fn router(store: &PageStore) -> Router {
    wiki_router(WikiState::new(store.client()))
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    Response {
        status,
        location,
        body: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

async fn get(router: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(router, request).await
}

async fn post_form(router: &Router, uri: &str, form: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(router, request).await
}

/// Repository whose every operation fails once it is up
struct BrokenRepository;

impl PageRepository for BrokenRepository {
    fn initialize(&mut self) -> DomainResult<()> {
        Ok(())
    }

    fn fetch_all_pages(&self) -> DomainResult<Vec<String>> {
        Err(DomainError::storage("connection lost"))
    }

    fn fetch_all_pages_data(&self) -> DomainResult<Vec<Page>> {
        Err(DomainError::storage("connection lost"))
    }

    fn fetch_page(&self, _name: &str) -> DomainResult<Option<Page>> {
        Err(DomainError::storage("connection lost"))
    }

    fn fetch_page_by_id(&self, _id: PageId) -> DomainResult<Option<Page>> {
        Err(DomainError::storage("connection lost"))
    }

    fn create_page(&mut self, _name: &str, _content: &Markdown) -> DomainResult<()> {
        Err(DomainError::storage("connection lost"))
    }

    fn save_page(&mut self, _id: PageId, _content: &Markdown) -> DomainResult<()> {
        Err(DomainError::storage("connection lost"))
    }

    fn delete_page(&mut self, _id: PageId) -> DomainResult<()> {
        Err(DomainError::storage("connection lost"))
    }
}

/// Renderer that emits the template name and view model as JSON
struct ModelEcho;

impl TemplateRenderer for ModelEcho {
    fn render(&self, template: &str, model: &ViewModel) -> Result<String, RenderError> {
        Ok(serde_json::json!({ "template": template, "model": model }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_index_lists_pages_sorted() {
        let store = start_store().await;
        let client = store.client();
        client.create_page("Zulu", Markdown::new("z")).await.unwrap();
        client.create_page("Alpha", Markdown::new("a")).await.unwrap();
        let router = router(&store);

        let response = get(&router, "/").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("Wiki home"));
        let alpha = response.body.find("/wiki/Alpha").unwrap();
        let zulu = response.body.find("/wiki/Zulu").unwrap();
        assert!(alpha < zulu);
    }

    #[tokio::test]
    async fn test_existing_page_renders_markdown() {
        let store = start_store().await;
        let router = router(&store);

        let created = post_form(
            &router,
            "/save",
            "title=Sandbox&id=-1&markdown=%23+hi&newPage=yes",
        )
        .await;
        assert_eq!(created.status, StatusCode::SEE_OTHER);
        assert_eq!(created.location.as_deref(), Some("/wiki/Sandbox"));

        let response = get(&router, "/wiki/Sandbox").await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("<h1>hi</h1>"));
        assert!(response.body.contains("name=\"newPage\" value=\"no\""));
        assert!(!response.body.contains("name=\"id\" value=\"-1\""));
    }

    #[tokio::test]
    async fn test_unknown_page_shows_default_template() {
        let store = start_store().await;
        let router = router(&store);

        let response = get(&router, "/wiki/Unknown").await;

        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.contains("<h1>A new page</h1>"));
        assert!(response.body.contains("Feel-free to write in Markdown!"));
        assert!(response.body.contains("name=\"id\" value=\"-1\""));
        assert!(response.body.contains("name=\"newPage\" value=\"yes\""));
        assert!(!response.body.contains("action=\"/delete\""));
    }

    #[tokio::test]
    async fn test_delete_redirects_home_and_unlists_page() {
        let store = start_store().await;
        let client = store.client();
        client.create_page("Doomed", Markdown::new("bye")).await.unwrap();
        client.create_page("Kept", Markdown::new("stay")).await.unwrap();
        let id = client.fetch_page("Doomed").await.unwrap().unwrap().id().value();
        let router = router(&store);

        let response = post_form(&router, "/delete", &format!("id={id}")).await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location.as_deref(), Some("/"));

        let index = get(&router, "/").await;
        assert!(!index.body.contains("Doomed"));
        assert!(index.body.contains("Kept"));
    }

    #[tokio::test]
    async fn test_save_existing_page_updates_content() {
        let store = start_store().await;
        let client = store.client();
        client.create_page("Notes", Markdown::new("old")).await.unwrap();
        let id = client.fetch_page("Notes").await.unwrap().unwrap().id().value();
        let router = router(&store);

        let response = post_form(
            &router,
            "/save",
            &format!("title=Notes&id={id}&markdown=*new*&newPage=no"),
        )
        .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER);
        assert_eq!(response.location.as_deref(), Some("/wiki/Notes"));

        let page = client.fetch_page_by_id(PageId::new(id)).await.unwrap().unwrap();
        assert_eq!(page.content().as_str(), "*new*");
        assert_eq!(client.fetch_all_pages().await.unwrap(), vec!["Notes"]);
    }

    #[tokio::test]
    async fn test_save_redirect_encodes_title() {
        let store = start_store().await;
        let router = router(&store);

        let response = post_form(
            &router,
            "/save",
            "title=My+Page&id=-1&markdown=text&newPage=yes",
        )
        .await;
        assert_eq!(response.location.as_deref(), Some("/wiki/My%20Page"));

        let page = get(&router, "/wiki/My%20Page").await;
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("name=\"newPage\" value=\"no\""));
    }

    #[tokio::test]
    async fn test_save_with_malformed_id_is_bad_request() {
        let store = start_store().await;
        let router = router(&store);

        let response = post_form(
            &router,
            "/save",
            "title=Notes&id=abc&markdown=x&newPage=no",
        )
        .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        // The process keeps serving
        assert_eq!(get(&router, "/").await.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_with_missing_id_is_bad_request() {
        let store = start_store().await;
        let router = router(&store);

        let response = post_form(&router, "/delete", "").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_server_error() {
        let store = start_store().await;
        store
            .client()
            .create_page("Home", Markdown::new("a"))
            .await
            .unwrap();
        let router = router(&store);

        let response = post_form(
            &router,
            "/save",
            "title=Home&id=-1&markdown=b&newPage=yes",
        )
        .await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.body.contains("UNIQUE"));
    }

    #[tokio::test]
    async fn test_create_shortcut_redirects() {
        let store = start_store().await;
        let router = router(&store);

        let named = post_form(&router, "/create", "name=Fresh+Page").await;
        assert_eq!(named.status, StatusCode::SEE_OTHER);
        assert_eq!(named.location.as_deref(), Some("/wiki/Fresh%20Page"));

        let empty = post_form(&router, "/create", "name=").await;
        assert_eq!(empty.status, StatusCode::SEE_OTHER);
        assert_eq!(empty.location.as_deref(), Some("/"));

        let missing = post_form(&router, "/create", "").await;
        assert_eq!(missing.location.as_deref(), Some("/"));

        // No page was stored along the way
        assert!(store.client().fetch_all_pages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_returns_all_rows() {
        let store = start_store().await;
        let client = store.client();
        client.create_page("One", Markdown::new("1")).await.unwrap();
        client.create_page("Two", Markdown::new("2")).await.unwrap();
        let router = router(&store);

        let response = get(&router, "/api/pages").await;
        assert_eq!(response.status, StatusCode::OK);

        let rows: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "One");
        assert_eq!(rows[0]["content"], "1");
        assert!(rows[0]["id"].is_i64());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let store = start_store().await;
        let router = router(&store);

        let response = get(&router, "/nope").await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_storage_failure_becomes_server_error() {
        let store = PageStore::start(|| Ok(BrokenRepository), PageStoreConfig::default())
            .await
            .unwrap();
        let router = router(&store);

        assert_eq!(
            get(&router, "/").await.status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get(&router, "/wiki/Anything").await.status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            post_form(&router, "/delete", "id=1").await.status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            post_form(&router, "/save", "title=X&id=-1&markdown=x&newPage=yes")
                .await
                .status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get(&router, "/api/pages").await.status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_custom_renderer_receives_view_models() {
        let store = start_store().await;
        store
            .client()
            .create_page("Alpha", Markdown::new("*a*"))
            .await
            .unwrap();
        let router = wiki_router(WikiState::with_templates(store.client(), Arc::new(ModelEcho)));

        let index: serde_json::Value =
            serde_json::from_str(&get(&router, "/").await.body).unwrap();
        assert_eq!(index["template"], "index");
        assert_eq!(index["model"]["pages"], serde_json::json!(["Alpha"]));

        let existing: serde_json::Value =
            serde_json::from_str(&get(&router, "/wiki/Alpha").await.body).unwrap();
        assert_eq!(existing["template"], "page");
        assert_eq!(existing["model"]["newPage"], "no");
        assert_eq!(existing["model"]["rawContent"], "*a*");
        assert_eq!(existing["model"]["content"], "<p><em>a</em></p>\n");

        let fresh: serde_json::Value =
            serde_json::from_str(&get(&router, "/wiki/Fresh").await.body).unwrap();
        assert_eq!(fresh["model"]["newPage"], "yes");
        assert_eq!(fresh["model"]["id"], PageId::UNSAVED);
        assert_eq!(fresh["model"]["rawContent"], Markdown::EMPTY_PAGE);
        assert!(fresh["model"]["timestamp"].is_string());
    }
}
