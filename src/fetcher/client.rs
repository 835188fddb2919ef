use crate::fetcher::{errors::FetchError, pipeline::process_response, types::RemoteDocument};
use bytes::{Bytes, BytesMut};
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder, Response, header};
use std::time::Duration;
use tracing::{debug, instrument};

const MAX_PAGE_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const MAX_ASSET_SIZE: u64 = 64 * 1024 * 1024; // 64MB, packages included
const USER_AGENT: &str = "foxmirror/0.1 (+https://github.com/foxmirror/foxmirror)";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("Failed to build HTTP client")
});

pub fn get_client() -> &'static Client {
    &HTTP_CLIENT
}

async fn send(url: &str, accept: &'static str) -> Result<Response, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .header(header::ACCEPT, accept)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http { status });
    }
    Ok(response)
}

fn check_declared_length(response: &Response, limit: u64) -> Result<(), FetchError> {
    match response.content_length() {
        Some(content_length) if content_length > limit => {
            Err(FetchError::BodyTooLarge(content_length))
        }
        _ => Ok(()),
    }
}

/// Buffer a page body. Oversized responses are abandoned as soon as they
/// cross `limit`, with or without a `Content-Length`.
async fn read_body(response: Response, limit: u64) -> Result<Bytes, FetchError> {
    check_declared_length(&response, limit)?;

    let mut stream = AssetStream::remote(response).with_limit(limit);
    let mut body = BytesMut::new();
    while let Some(chunk) = stream.chunk().await? {
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// Fetch an origin HTML page and decode it.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_page(url: &str) -> Result<RemoteDocument, FetchError> {
    let response = send(url, ACCEPT_HTML).await?;

    let final_url = response.url().clone();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(FetchError::UnsupportedContentType(content_type));
    }

    let body_bytes = read_body(response, MAX_PAGE_SIZE).await?;
    debug!(status = %status, bytes = body_bytes.len(), "fetched page");

    Ok(process_response(final_url, status, body_bytes, &content_type))
}

/// An origin resource body, handed out chunk by chunk so it can be written
/// to disk without ever being held in memory whole.
pub struct AssetStream {
    source: AssetSource,
    limit: u64,
    read: u64,
}

enum AssetSource {
    Remote(Response),
    Buffered(Option<Bytes>),
}

impl AssetStream {
    fn remote(response: Response) -> Self {
        Self {
            source: AssetSource::Remote(response),
            limit: u64::MAX,
            read: 0,
        }
    }

    /// A body that is already in memory, yielded as a single chunk.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            source: AssetSource::Buffered(Some(bytes.into())),
            limit: u64::MAX,
            read: 0,
        }
    }

    /// Cap the total body size at `limit` bytes.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Next chunk, `None` once the body is exhausted. Fails as soon as the
    /// running total crosses the size limit.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, FetchError> {
        let chunk = match &mut self.source {
            AssetSource::Remote(response) => response
                .chunk()
                .await
                .map_err(FetchError::from_reqwest_error)?,
            AssetSource::Buffered(bytes) => bytes.take(),
        };
        if let Some(chunk) = &chunk {
            self.read += chunk.len() as u64;
            if self.read > self.limit {
                return Err(FetchError::BodyTooLarge(self.read));
            }
        }
        Ok(chunk)
    }

    /// Bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }
}

/// Start fetching an arbitrary origin resource (image, package). The status
/// and declared length are checked up front; the body is left unread.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_asset(url: &str) -> Result<AssetStream, FetchError> {
    let response = send(url, "*/*").await?;
    check_declared_length(&response, MAX_ASSET_SIZE)?;
    debug!(length = ?response.content_length(), "streaming asset");
    Ok(AssetStream::remote(response).with_limit(MAX_ASSET_SIZE))
}
