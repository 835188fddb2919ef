use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderName, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::app_state::AppState;
use crate::cache::CachedBody;
use crate::extractor::{AddonPage, SearchEntry};
use crate::fetcher::fetch_page;
use crate::mirror::errors::MirrorError;
use crate::render::{render_addon_page, render_search_page};

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

pub async fn home(State(state): State<AppState>) -> Html<String> {
    Html(state.templates.home.render(&[]))
}

/// `/a/<addon>`: origin addon page, extracted, rewritten and re-rendered.
#[instrument(skip(state))]
pub async fn addon_page(
    State(state): State<AppState>,
    Path(addon): Path<String>,
) -> Result<Html<String>, MirrorError> {
    let url = state.config.catalog_url(&["addon", &addon]);
    let doc = fetch_page(url.as_str()).await?;

    let mut page = AddonPage::from_document(&doc, &state.selectors)?;
    page.rewrite_links(&state.rewriter)?;
    debug!(
        name = %page.name,
        screenshots = page.screenshots.len(),
        "extracted addon page"
    );

    Ok(Html(render_addon_page(&page, &state.templates.addon)))
}

/// `/s/?query=<q>`: origin search results, each linking to `/a/<id>`.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, MirrorError> {
    let mut url = state.config.catalog_url(&["search", ""]);
    url.query_pairs_mut().append_pair("q", &params.query);
    let doc = fetch_page(url.as_str()).await?;

    let mut entries = SearchEntry::from_document(&doc, &state.selectors)?;
    for entry in &mut entries {
        entry.rewrite_link(&state.rewriter);
    }
    debug!(results = entries.len(), "extracted search page");

    Ok(Html(render_search_page(
        &params.query,
        &entries,
        &state.templates.query,
    )))
}

/// `/p/<origin path>`: any origin resource, through the asset cache. The raw
/// request path is used so percent-encoding and the query survive untouched.
pub async fn proxy_asset(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, MirrorError> {
    let path = uri.path().strip_prefix("/p/").unwrap_or_default();
    let request = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let cached = state.assets.get_or_fetch(&request).await?;
    Ok(cached_response(cached))
}

/// `/g/<id>_<filename>`: a package download, through the package cache.
pub async fn package(
    State(state): State<AppState>,
    Path(package): Path<String>,
) -> Result<Response, MirrorError> {
    let cached = state.packages.get_or_fetch(&package).await?;
    Ok(cached_response(cached))
}

fn cached_response(cached: CachedBody) -> Response {
    let status = if cached.hit { "HIT" } else { "MISS" };
    (
        [
            (header::CONTENT_TYPE, content_type_for(cached.key.as_str())),
            (X_CACHE, status),
        ],
        cached.body,
    )
        .into_response()
}

/// Guess from the extension of the cached name; the origin's own header is
/// not stored.
pub fn content_type_for(key: &str) -> &'static str {
    let name = key.split('?').next().unwrap_or(key);
    let extension = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "html" | "htm" => "text/html; charset=utf-8",
        "xpi" => "application/x-xpinstall",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
