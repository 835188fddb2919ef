use std::fs;
use url::Url;

use crate::extractor::{AddonPage, SearchEntry, Selectors};
use crate::extractor::{ExtractError, FieldSelector, ExtractMode, SelectorTable, extract, parse_document};
use crate::fetcher::types::RemoteDocument;
use crate::rewrite::LinkRewriter;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn create_test_document(html: String, url: &str) -> RemoteDocument {
    RemoteDocument::from_utf8(Url::parse(url).unwrap(), html)
}

fn rewriter() -> LinkRewriter {
    LinkRewriter::new(Url::parse("https://addons.mozilla.org/").unwrap())
}

#[test]
fn test_extract_addon_page() {
    let selectors = Selectors::new().unwrap();
    let doc = create_test_document(
        fixture("addon.html"),
        "https://addons.mozilla.org/en-US/firefox/addon/tab-tamer",
    );
    let page = AddonPage::from_document(&doc, &selectors).unwrap();

    assert_eq!(page.name, "Tab Tamer");
    assert_eq!(page.developer, "Jo Doe");
    assert!(page.summary.starts_with("Keeps your tabs"));
    assert_eq!(page.users, "12,345");
    assert_eq!(page.reviews, "678 reviews");
    assert_eq!(page.stars, "4.5 Stars");
    assert!(page.description.starts_with("Sorts, groups & closes tabs."));
    assert_eq!(
        page.icon,
        "https://addons.mozilla.org/user-media/addon_icons/2731/2731463-64.png?modified=mcrushed"
    );
    // first download link wins
    assert_eq!(
        page.install_link,
        "https://addons.mozilla.org/firefox/downloads/file/4216633/tab_tamer-1.5.0.xpi"
    );
    assert_eq!(page.screenshots.len(), 2);
    assert!(page.screenshots[0].starts_with("<img"));
    assert!(page.more_info.contains("<dt>Version</dt><dd>1.5.0</dd>"));
    assert!(page.release_notes.contains("Fixed <b>everything</b>."));
}

#[test]
fn test_addon_links_point_at_mirror() {
    let selectors = Selectors::new().unwrap();
    let doc = create_test_document(
        fixture("addon.html"),
        "https://addons.mozilla.org/en-US/firefox/addon/tab-tamer",
    );
    let mut page = AddonPage::from_document(&doc, &selectors).unwrap();
    page.rewrite_links(&rewriter()).unwrap();

    assert_eq!(
        page.icon,
        "../p/user-media/addon_icons/2731/2731463-64.png?modified=mcrushed"
    );
    assert_eq!(page.install_link, "../g/4216633_tab_tamer-1.5.0.xpi");
    assert!(page.screenshots[0].contains(r#"src="../p/user-media/previews/full/1/1.png?modified=1""#));
    assert!(page.screenshots[1].contains(r#"src="../p/user-media/previews/full/1/2.png?modified=1""#));
    assert!(page.screenshots.iter().all(|s| !s.contains("https://addons.mozilla.org")));
}

#[test]
fn test_addon_without_developer() {
    let selectors = Selectors::new().unwrap();
    let doc = create_test_document(
        fixture("addon_no_developer.html"),
        "https://addons.mozilla.org/en-US/firefox/addon/solo",
    );
    let mut page = AddonPage::from_document(&doc, &selectors).unwrap();

    assert_eq!(page.name, "Solo Addon");
    assert_eq!(page.developer, "");
    assert_eq!(page.summary, "Does one thing.");
    // the first icon has no src; later icons are not consulted
    assert_eq!(page.icon, "");
    assert!(page.screenshots.is_empty());
    assert_eq!(page.more_info, "");
    assert_eq!(page.release_notes, "");

    page.rewrite_links(&rewriter()).unwrap();
    assert_eq!(page.install_link, "../g/99_solo-1.0.xpi");
}

#[test]
fn test_every_field_defaults_when_absent() {
    let selectors = Selectors::new().unwrap();
    let document = scraper::Html::parse_document("<html><body><p>nothing here</p></body></html>");
    let record = extract(&document, &selectors.addon_page);

    let expected: Vec<_> = selectors.addon_page.field_names().collect();
    let mut names: Vec<_> = record.names().collect();
    names.sort_unstable();
    let mut expected_sorted = expected.clone();
    expected_sorted.sort_unstable();
    assert_eq!(names, expected_sorted);
    assert!(expected.iter().all(|name| record.get(name).unwrap().is_empty()));

    let page = AddonPage::from_record(&record);
    assert_eq!(page, AddonPage::default());
}

#[test]
fn test_empty_document_is_an_error() {
    let doc = create_test_document("  \n ".to_string(), "https://addons.mozilla.org/");
    assert!(matches!(parse_document(&doc), Err(ExtractError::EmptyDocument(_))));
}

#[test]
fn test_first_match_wins() {
    let table = SelectorTable::compile(&[FieldSelector::first(
        "heading",
        "h2.x",
        ExtractMode::Text,
    )])
    .unwrap();
    let document = scraper::Html::parse_document(
        r#"<h2 class="x">one</h2><h2 class="x">two</h2>"#,
    );
    assert_eq!(extract(&document, &table).text("heading"), "one");
}

#[test]
fn test_invalid_selector_is_rejected() {
    let result = SelectorTable::compile(&[FieldSelector::first("bad", "h1[", ExtractMode::Text)]);
    assert!(matches!(
        result,
        Err(ExtractError::InvalidSelector { field: "bad", .. })
    ));
}

#[test]
fn test_extract_search_results() {
    let selectors = Selectors::new().unwrap();
    let doc = create_test_document(
        fixture("search.html"),
        "https://addons.mozilla.org/en-US/firefox/search/?q=tabs",
    );
    let mut entries = SearchEntry::from_document(&doc, &selectors).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].name, "Tab Stash");
    assert_eq!(entries[2].name, "Tree & Tabs");

    let rewriter = rewriter();
    for entry in &mut entries {
        entry.rewrite_link(&rewriter);
    }
    let links: Vec<_> = entries.iter().map(|e| e.link.as_str()).collect();
    assert_eq!(links, vec!["../a/tab-tamer", "../a/tab-stash", "../a/tree-tabs"]);
}

#[test]
fn test_search_entry_without_link_is_skipped() {
    let selectors = Selectors::new().unwrap();
    let html = r#"<div class="SearchResult-contents"><h2>Promoted</h2></div>
<div class="SearchResult-contents"><a class="SearchResult-link" href="/en-US/firefox/addon/a/">A</a></div>"#;
    let doc = create_test_document(html.to_string(), "https://addons.mozilla.org/");
    let entries = SearchEntry::from_document(&doc, &selectors).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "A");
}

#[test]
fn test_search_without_results() {
    let selectors = Selectors::new().unwrap();
    let doc = create_test_document(
        "<html><body><p>No results found.</p></body></html>".to_string(),
        "https://addons.mozilla.org/",
    );
    assert!(SearchEntry::from_document(&doc, &selectors).unwrap().is_empty());
}

#[test]
fn test_malformed_html() {
    let selectors = Selectors::new().unwrap();
    let doc = create_test_document(fixture("malformed.html"), "https://addons.mozilla.org/");
    let page = AddonPage::from_document(&doc, &selectors).unwrap();

    // Should handle malformed HTML gracefully
    assert_eq!(page.name, "Broken markup");
    assert_eq!(page.developer, "Someone");
    assert_eq!(page.stars, "3 Stars");
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            let selectors = Selectors::new().unwrap();
            let doc = create_test_document(html, "https://addons.mozilla.org/");
            if let Ok(mut page) = AddonPage::from_document(&doc, &selectors) {
                let _ = page.rewrite_links(&rewriter());
            }
            if let Ok(entries) = SearchEntry::from_document(&doc, &selectors) {
                prop_assert!(entries.iter().all(|e| !e.link.is_empty()));
            }
        }

        #[test]
        fn test_title_split_never_panics(title in ".*") {
            let (name, developer) = crate::extractor::addon::split_title(&title);
            prop_assert!(title.contains(name.as_str()) || name.is_empty());
            prop_assert!(title.contains(developer.as_str()) || developer.is_empty());
        }
    }
}
