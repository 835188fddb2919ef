use foxmirror::fetcher::{CharsetSource, FetchError, fetch_asset, fetch_page};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{headers, method, path},
};

#[tokio::test]
async fn test_fetch_page_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/en-US/firefox/addon/tab-tamer"))
        .and(headers(
            "accept",
            vec!["text/html", "application/xhtml+xml", "application/xml;q=0.9", "*/*;q=0.8"],
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(
                    "<html><head><title>Test</title></head><body>Hello World</body></html>"
                        .as_bytes(),
                )
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/en-US/firefox/addon/tab-tamer", mock_server.uri());
    let result = fetch_page(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("Hello World"));
    assert_eq!(result.url_final.as_str(), url);
    assert_eq!(result.charset.source(), CharsetSource::Header);
}

#[tokio::test]
async fn test_fetch_page_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notfound"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/notfound", mock_server.uri());
    let result = fetch_page(&url).await;

    match result {
        Err(err @ FetchError::Http { .. }) => {
            assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
        }
        other => panic!("Expected HTTP 404 error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_page_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/error"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/error", mock_server.uri());
    let result = fetch_page(&url).await;

    // no retries: exactly one request reaches the origin
    match result {
        Err(FetchError::Http { status }) => assert_eq!(status.as_u16(), 500),
        other => panic!("Expected HTTP 500 error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_page_redirect() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/en-US/firefox/addon/old-name"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/en-US/firefox/addon/new-name/"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/en-US/firefox/addon/new-name/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("<html><body>Final page</body></html>".as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/en-US/firefox/addon/old-name", mock_server.uri());
    let result = fetch_page(&url).await.unwrap();

    assert!(result.status.is_success());
    assert!(result.body_utf8.contains("Final page"));
    assert!(result.url_final.as_str().ends_with("/new-name/"));
}

#[tokio::test]
async fn test_fetch_page_gzip_compression() {
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    let original_content =
        "<html><head><title>Compressed</title></head><body>This content is gzipped!</body></html>";

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(original_content.as_bytes()).unwrap();
    let compressed_data = encoder.finish().unwrap();

    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(compressed_data)
                .insert_header("Content-Type", "text/html; charset=utf-8")
                .insert_header("Content-Encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/gzipped", mock_server.uri());
    let result = fetch_page(&url).await.unwrap();

    assert!(result.body_utf8.contains("This content is gzipped!"));
}

#[tokio::test]
async fn test_fetch_page_legacy_charset() {
    let mock_server = MockServer::start().await;

    // "Café" in windows-1252
    let body = b"<html><body>Caf\xe9</body></html>".to_vec();
    Mock::given(method("GET"))
        .and(path("/latin"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .insert_header("Content-Type", "text/html; charset=windows-1252"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/latin", mock_server.uri());
    let result = fetch_page(&url).await.unwrap();

    assert!(result.body_utf8.contains("Café"));
    assert_eq!(result.charset.name(), "windows-1252");
}

#[tokio::test]
async fn test_fetch_page_unsupported_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/image"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0xFF, 0xD8, 0xFF]) // JPEG header
                .insert_header("Content-Type", "image/jpeg"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/image", mock_server.uri());
    let result = fetch_page(&url).await;

    match result {
        Err(FetchError::UnsupportedContentType(content_type)) => {
            assert_eq!(content_type, "image/jpeg");
        }
        other => panic!("Expected UnsupportedContentType error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_page_body_too_large() {
    let mock_server = MockServer::start().await;

    // 6MB > 5MB page limit
    let large_body = "x".repeat(6 * 1024 * 1024);

    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(large_body.as_bytes())
                .insert_header("Content-Type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/large", mock_server.uri());
    let result = fetch_page(&url).await;

    match result {
        Err(FetchError::BodyTooLarge(size)) => {
            assert!(size > 5 * 1024 * 1024);
        }
        other => panic!("Expected BodyTooLarge error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_invalid_url() {
    let result = fetch_page("not-a-valid-url").await;

    match result {
        Err(FetchError::InvalidUrl(_)) => {}
        other => panic!("Expected InvalidUrl error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_asset_returns_raw_bytes() {
    let mock_server = MockServer::start().await;

    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
    Mock::given(method("GET"))
        .and(path("/user-media/addon_icons/1/1-64.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png.clone())
                .insert_header("Content-Type", "image/png"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/user-media/addon_icons/1/1-64.png", mock_server.uri());
    let mut stream = fetch_asset(&url).await.unwrap();

    let mut body = Vec::new();
    while let Some(chunk) = stream.chunk().await.unwrap() {
        body.extend_from_slice(&chunk);
    }
    assert_eq!(body, png);
    assert_eq!(stream.bytes_read(), png.len() as u64);
}

#[tokio::test]
async fn test_asset_stream_stops_at_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 4096]))
        .mount(&mock_server)
        .await;

    let url = format!("{}/big.bin", mock_server.uri());
    let mut stream = fetch_asset(&url).await.unwrap().with_limit(1024);

    let result = loop {
        match stream.chunk().await {
            Ok(Some(_)) => continue,
            other => break other,
        }
    };
    assert!(matches!(result, Err(FetchError::BodyTooLarge(size)) if size > 1024));
}

#[tokio::test]
async fn test_fetch_asset_404() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/firefox/downloads/file/1/gone.xpi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/firefox/downloads/file/1/gone.xpi", mock_server.uri());
    let result = fetch_asset(&url).await;

    assert!(matches!(result, Err(FetchError::Http { status }) if status.as_u16() == 404));
}
