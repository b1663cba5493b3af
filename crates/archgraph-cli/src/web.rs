//! HTTP front end for `archgraph serve`.
//!
//! The raw definition is read once at start-up and shared read-only; every
//! `/data` request builds, validates and filters its own project from it.
//!
//! | Path                 | Response                                             |
//! |----------------------|------------------------------------------------------|
//! | `/data[?subview=x]`  | project JSON, `ETag` over definition, subview, docs  |
//! | `/documents/<file>`  | file from the static documents folder                |
//! | anything else        | front-end assets (local folder or embedded page)     |

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use archgraph_core::grouping::{
    DependencyBucket, GroupNode, GroupingKey, applications_by_group, grouped_dependencies,
};
use archgraph_core::model::DependencyRef;
use archgraph_core::{Application, ProjectDefinition, ProjectLoader};
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, ETAG, HeaderValue, IF_NONE_MATCH};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use mime::Mime;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

/// Page served when no local template folder is configured.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");

// ---------------------------------------------------------------------------
// Static files
// ---------------------------------------------------------------------------

/// Read-only view of a folder of static documents.
#[derive(Debug, Clone)]
pub struct StaticDocuments {
    root: PathBuf,
}

impl StaticDocuments {
    /// Fails when `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("static documents folder {} does not exist", root.display());
        }
        Ok(Self { root })
    }

    /// File names directly inside the folder, sorted. Directories are skipped.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("failed to list {}", self.root.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Resolve a single file name. Anything but one plain path component is
    /// rejected.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => return None,
        }
        let path = self.root.join(name);
        path.is_file().then_some(path)
    }
}

/// Where front-end assets come from.
#[derive(Debug, Clone)]
pub enum Frontend {
    Embedded,
    Folder(PathBuf),
}

impl Frontend {
    /// Fails when the folder does not exist.
    pub fn folder(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("template folder {} does not exist", root.display());
        }
        Ok(Self::Folder(root))
    }
}

/// Map a URL path below `root` to a file, refusing `..` and absolute parts.
fn asset_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = url_path.trim_start_matches('/');
    let mut path = root.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if path.is_dir() {
        path.push("index.html");
    }
    path.is_file().then_some(path)
}

fn content_type_for(path: &Path) -> Mime {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html" | "htm") => mime::TEXT_HTML_UTF_8,
        Some("css") => mime::TEXT_CSS_UTF_8,
        Some("js" | "mjs") => mime::APPLICATION_JAVASCRIPT_UTF_8,
        Some("json") => mime::APPLICATION_JSON,
        Some("png") => mime::IMAGE_PNG,
        Some("jpg" | "jpeg") => mime::IMAGE_JPEG,
        Some("gif") => mime::IMAGE_GIF,
        Some("svg") => mime::IMAGE_SVG,
        Some("pdf") => mime::APPLICATION_PDF,
        Some("txt" | "md") => mime::TEXT_PLAIN_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Body of `GET /data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataResponse {
    pub name: String,
    pub available_sub_views: Vec<String>,
    pub applications_by_group: GroupNode,
    pub applications: Vec<ApplicationDto>,
    pub static_documentations: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDto {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technology: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: String,
    pub properties: BTreeMap<String, String>,
    pub dependencies: Vec<DependencyDto>,
    pub dependencies_grouped: Vec<DependencyBucket>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyDto {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl From<&DependencyRef> for DependencyDto {
    fn from(dep: &DependencyRef) -> Self {
        Self {
            target: dep.target.clone(),
            interface: dep.interface.clone(),
            relation: dep.relation.clone(),
        }
    }
}

fn application_dto(
    project: &archgraph_core::Project,
    app: &Application,
    key: GroupingKey,
) -> ApplicationDto {
    ApplicationDto {
        id: app.id.clone(),
        name: app.name.clone(),
        group: app.group.clone(),
        team: app.team.clone(),
        summary: app.summary.clone(),
        description: app.description.clone(),
        technology: app.technology.clone(),
        category: app.category.clone(),
        status: app.status.to_string(),
        properties: app.properties.clone(),
        dependencies: app.dependencies.iter().map(DependencyDto::from).collect(),
        dependencies_grouped: grouped_dependencies(project, app, key),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Everything a request handler needs. Built once, shared via `Arc`.
#[derive(Debug)]
pub struct AppState {
    pub definition: ProjectDefinition,
    pub loader: ProjectLoader,
    pub grouping_key: GroupingKey,
    pub documents: Option<StaticDocuments>,
    pub frontend: Frontend,
}

type HttpResponse = Response<Full<Bytes>>;

fn respond(status: StatusCode, content_type: &Mime, body: impl Into<Bytes>) -> HttpResponse {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

fn not_found() -> HttpResponse {
    respond(StatusCode::NOT_FOUND, &mime::TEXT_PLAIN_UTF_8, "not found")
}

fn error_json(message: &str) -> HttpResponse {
    let body = serde_json::json!({ "Error": message }).to_string();
    respond(
        StatusCode::INTERNAL_SERVER_ERROR,
        &mime::APPLICATION_JSON,
        body,
    )
}

/// Value of `name` in a query string, form-decoded.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Percent-decoded URL path segment. `None` when it is not valid UTF-8.
fn decode_path(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

fn document_names(state: &AppState) -> Result<Vec<String>> {
    state
        .documents
        .as_ref()
        .map_or_else(|| Ok(Vec::new()), StaticDocuments::list)
}

/// Build the `/data` body for one subview.
pub fn project_data(
    state: &AppState,
    subview: Option<&str>,
    static_documentations: Vec<String>,
) -> Result<DataResponse> {
    let loaded = state.loader.load_project(&state.definition, subview)?;
    let project = &loaded.project;
    Ok(DataResponse {
        name: project.name.clone(),
        available_sub_views: state.definition.subview_names(),
        applications_by_group: applications_by_group(project),
        applications: project
            .applications()
            .iter()
            .map(|app| application_dto(project, app, state.grouping_key))
            .collect(),
        static_documentations,
    })
}

fn data_action<B>(state: &AppState, req: &Request<B>) -> HttpResponse {
    let subview = query_param(req.uri().query(), "subview");
    let documents = match document_names(state) {
        Ok(documents) => documents,
        Err(err) => {
            warn!("listing static documents failed: {err:#}");
            return error_json(&format!("{err:#}"));
        }
    };
    let etag = state.definition.etag(subview.as_deref(), &documents);

    let not_modified = req
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));
    if not_modified {
        let mut response = respond(StatusCode::NOT_MODIFIED, &mime::APPLICATION_JSON, "");
        if let Ok(value) = HeaderValue::from_str(&etag) {
            response.headers_mut().insert(ETAG, value);
        }
        return response;
    }

    let data = match project_data(state, subview.as_deref(), documents) {
        Ok(data) => data,
        Err(err) => {
            warn!(subview = subview.as_deref().unwrap_or_default(), "data request failed: {err:#}");
            return error_json(&format!("{err:#}"));
        }
    };
    let body = match serde_json::to_vec(&data) {
        Ok(body) => body,
        Err(err) => return error_json(&err.to_string()),
    };
    let mut response = respond(StatusCode::OK, &mime::APPLICATION_JSON, body);
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(ETAG, value);
    }
    response
}

async fn serve_file(path: &Path) -> HttpResponse {
    match tokio::fs::read(path).await {
        Ok(bytes) => respond(StatusCode::OK, &content_type_for(path), bytes),
        Err(err) => {
            error!(path = %path.display(), "failed to read file: {err}");
            not_found()
        }
    }
}

async fn document_action(state: &AppState, name: &str) -> HttpResponse {
    let Some(path) = state.documents.as_ref().and_then(|docs| docs.resolve(name)) else {
        return not_found();
    };
    serve_file(&path).await
}

async fn index_action(state: &AppState, url_path: &str) -> HttpResponse {
    match &state.frontend {
        Frontend::Embedded => respond(StatusCode::OK, &mime::TEXT_HTML_UTF_8, INDEX_HTML),
        Frontend::Folder(root) => match asset_path(root, url_path) {
            Some(path) => serve_file(&path).await,
            None => not_found(),
        },
    }
}

/// Route one request.
pub async fn handle<B: Sync>(state: &AppState, req: &Request<B>) -> HttpResponse {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return respond(
            StatusCode::METHOD_NOT_ALLOWED,
            &mime::TEXT_PLAIN_UTF_8,
            "method not allowed",
        );
    }

    let path = req.uri().path();
    let response = if path == "/data" {
        data_action(state, req)
    } else if let Some(name) = path.strip_prefix("/documents/") {
        match decode_path(name) {
            Some(name) => document_action(state, &name).await,
            None => not_found(),
        }
    } else {
        match decode_path(path) {
            Some(path) => index_action(state, &path).await,
            None => not_found(),
        }
    };
    debug!(method = %req.method(), path, status = response.status().as_u16(), "request");
    response
}

/// Accept connections until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("archgraph listening on http://{addr}");

    loop {
        let (stream, remote_addr) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
        };

        let io = TokioIo::new(stream);
        let state = Arc::clone(&state);

        tokio::task::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let state = Arc::clone(&state);
                async move {
                    let (parts, _body) = req.into_parts();
                    let req = Request::from_parts(parts, ());
                    Ok::<_, Infallible>(handle(&state, &req).await)
                }
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection from {}: {}", remote_addr, err);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archgraph_core::definition::{Format, RawDefinition};
    use http_body_util::BodyExt;
    use tempfile::TempDir;

    const DEFINITION: &str = r"
name: Shop
applications:
  - id: cart
    group: shop
    team: orders
    dependencies:
      - stock.api
  - id: stock
    group: shop/inventory
    team: logistics
subviews:
  - name: orders
    include-teams: [orders]
";

    fn state(definition: &str, documents: Option<StaticDocuments>) -> AppState {
        let raw = RawDefinition::parse(definition, Format::Yaml, "test.yml").unwrap();
        let definition = ProjectDefinition::merge(vec![("test.yml".to_string(), raw)]).unwrap();
        AppState {
            definition,
            loader: ProjectLoader::strict(),
            grouping_key: GroupingKey::Group,
            documents,
            frontend: Frontend::Embedded,
        }
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn data_lists_applications_and_subviews() {
        let state = state(DEFINITION, None);
        let response = handle(&state, &get("/data")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(ETAG));

        let json = body_json(response).await;
        assert_eq!(json["name"], "Shop");
        assert_eq!(json["availableSubViews"], serde_json::json!(["orders"]));
        assert_eq!(json["applications"].as_array().unwrap().len(), 2);
        let cart = &json["applications"][0];
        assert_eq!(cart["id"], "cart");
        assert_eq!(cart["dependencies"][0]["interface"], "api");
        assert_eq!(cart["dependenciesGrouped"][0]["key"], "shop/inventory");
        assert!(json["staticDocumentations"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn data_applies_subview() {
        let state = state(DEFINITION, None);
        let json = body_json(handle(&state, &get("/data?subview=orders")).await).await;
        let ids: Vec<&str> = json["applications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["cart"]);
    }

    #[tokio::test]
    async fn data_errors_are_500_json() {
        let state = state(DEFINITION, None);
        let response = handle(&state, &get("/data?subview=nope")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(json["Error"].as_str().unwrap().contains("nope"));

        let broken = state_with_dangling();
        let response = handle(&broken, &get("/data")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn state_with_dangling() -> AppState {
        state(
            "name: Broken\napplications:\n  - id: a\n    dependencies: [ghost]\n",
            None,
        )
    }

    #[tokio::test]
    async fn matching_etag_is_not_modified() {
        let state = state(DEFINITION, None);
        let etag = state.definition.etag(None, &[]);
        let req = Request::builder()
            .uri("/data")
            .header(IF_NONE_MATCH, etag.as_str())
            .body(())
            .unwrap();
        let response = handle(&state, &req).await;
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let other = state.definition.etag(Some("orders"), &[]);
        assert_ne!(etag, other);
    }

    #[tokio::test]
    async fn new_document_invalidates_etag() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();
        let state = state(DEFINITION, Some(StaticDocuments::open(dir.path()).unwrap()));

        let first = handle(&state, &get("/data")).await;
        let etag = first.headers()[ETAG].clone();

        std::fs::write(dir.path().join("b.md"), "# B").unwrap();
        let req = Request::builder()
            .uri("/data")
            .header(IF_NONE_MATCH, etag.clone())
            .body(())
            .unwrap();
        let second = handle(&state, &req).await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_ne!(second.headers()[ETAG], etag);
        let json = body_json(second).await;
        assert_eq!(json["staticDocumentations"], serde_json::json!(["a.md", "b.md"]));
    }

    #[tokio::test]
    async fn documents_are_served_and_traversal_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("adr-1.md"), "# ADR").unwrap();
        std::fs::create_dir(dir.path().join("drafts")).unwrap();
        let docs = StaticDocuments::open(dir.path()).unwrap();
        assert_eq!(docs.list().unwrap(), vec!["adr-1.md"]);

        let state = state(DEFINITION, Some(docs));
        let response = handle(&state, &get("/documents/adr-1.md")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[CONTENT_TYPE],
            mime::TEXT_PLAIN_UTF_8.as_ref()
        );

        for uri in [
            "/documents/../Cargo.toml",
            "/documents/%2e%2e/Cargo.toml",
            "/documents/..%2FCargo.toml",
            "/documents/%FF.md",
            "/documents/drafts",
            "/documents/missing.md",
        ] {
            let response = handle(&state, &get(uri)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        let json = body_json(handle(&state, &get("/data")).await).await;
        assert_eq!(json["staticDocumentations"], serde_json::json!(["adr-1.md"]));
    }

    #[tokio::test]
    async fn other_paths_serve_frontend() {
        let state = state(DEFINITION, None);
        let response = handle(&state, &get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), INDEX_HTML.as_bytes());

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<p>local</p>").unwrap();
        let mut local = state;
        local.frontend = Frontend::folder(dir.path()).unwrap();
        let response = handle(&local, &get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = handle(&local, &get("/../secret")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_get_is_rejected() {
        let state = state(DEFINITION, None);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/data")
            .body(())
            .unwrap();
        assert_eq!(
            handle(&state, &req).await.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn query_params_are_decoded() {
        assert_eq!(
            query_param(Some("a=1&subview=team%20one"), "subview").as_deref(),
            Some("team one")
        );
        assert_eq!(query_param(Some("subview="), "subview"), None);
        assert_eq!(query_param(None, "subview"), None);
        assert_eq!(
            query_param(Some("subview=a+b%2Fc"), "subview").as_deref(),
            Some("a b/c")
        );
        assert_eq!(decode_path("adr%201.md").as_deref(), Some("adr 1.md"));
        assert_eq!(decode_path("100%").as_deref(), Some("100%"));
        assert_eq!(decode_path("%FF"), None);
    }
}
