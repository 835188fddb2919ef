use bytes::Bytes;
use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use reqwest::StatusCode;
use url::Url;

/// Character encoding a page was decoded with, and where it was learned from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charset {
    encoding: &'static Encoding,
    source: CharsetSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    /// `charset=` parameter of the `Content-Type` header.
    Header,
    /// `<meta charset>` or `<meta http-equiv="Content-Type">` in the document head.
    Meta,
    /// Statistical guess over the first bytes of the body.
    Detected,
}

impl Charset {
    pub fn new(encoding: &'static Encoding, source: CharsetSource) -> Self {
        Self { encoding, source }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn source(&self) -> CharsetSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// An origin HTML page, alive only for the request that fetched it.
#[derive(Debug)]
pub struct RemoteDocument {
    pub url_final: Url,
    pub status: StatusCode,
    pub body_raw: Bytes,
    pub body_utf8: String,
    pub charset: Charset,
    pub fetched_at: DateTime<Utc>,
}

impl RemoteDocument {
    /// Build a document from an already-decoded string. Used by tests and by
    /// callers that obtained the markup without going through [`fetch_page`].
    ///
    /// [`fetch_page`]: crate::fetcher::fetch_page
    pub fn from_utf8(url: Url, html: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            url_final: url,
            status: StatusCode::OK,
            body_raw: Bytes::from(html.clone()),
            body_utf8: html,
            charset: Charset::new(encoding_rs::UTF_8, CharsetSource::Header),
            fetched_at: Utc::now(),
        }
    }
}
