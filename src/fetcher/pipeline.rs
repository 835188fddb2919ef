use crate::fetcher::types::{Charset, CharsetSource, RemoteDocument};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

/// How far into the body we look for a `<meta>` charset declaration.
const META_SCAN_BYTES: usize = 4096;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

/// Turn a successful origin response into a [`RemoteDocument`].
///
/// Decoding never fails: pages with stray bytes are decoded with replacement
/// characters so that extraction still sees every well-formed field.
pub fn process_response(
    url_final: Url,
    status: StatusCode,
    body_bytes: Bytes,
    content_type: &str,
) -> RemoteDocument {
    let charset = detect_charset(content_type, &body_bytes);
    let body_utf8 = decode_to_utf8(&body_bytes, charset, &url_final);

    RemoteDocument {
        url_final,
        status,
        body_raw: body_bytes,
        body_utf8,
        charset,
        fetched_at: Utc::now(),
    }
}

fn label_to_encoding(regex: &Regex, haystack: &str) -> Option<&'static Encoding> {
    let label = regex.captures(haystack)?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

fn detect_charset(content_type: &str, body_bytes: &[u8]) -> Charset {
    if let Some(encoding) = label_to_encoding(&CHARSET_REGEX, content_type) {
        return Charset::new(encoding, CharsetSource::Header);
    }

    let head = &body_bytes[..body_bytes.len().min(META_SCAN_BYTES)];
    let head_str = String::from_utf8_lossy(head);
    for regex in [&*META_CHARSET_REGEX, &*META_HTTP_EQUIV_REGEX] {
        if let Some(encoding) = label_to_encoding(regex, &head_str) {
            return Charset::new(encoding, CharsetSource::Meta);
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(head, body_bytes.len() <= META_SCAN_BYTES);
    Charset::new(detector.guess(None, true), CharsetSource::Detected)
}

fn decode_to_utf8(body_bytes: &[u8], charset: Charset, url: &Url) -> String {
    let (decoded, used, had_errors) = charset.encoding().decode(body_bytes);
    if had_errors {
        warn!(
            url = %url,
            encoding = used.name(),
            "page contained malformed byte sequences; decoded lossily"
        );
    }
    decoded.into_owned()
}
