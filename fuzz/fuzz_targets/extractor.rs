#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use foxmirror::extractor::{AddonPage, SearchEntry, Selectors};
use foxmirror::fetcher::types::RemoteDocument;
use foxmirror::rewrite::LinkRewriter;

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data).to_string();
    let origin = Url::parse("https://addons.mozilla.org/").unwrap();
    let doc = RemoteDocument::from_utf8(origin.clone(), html);
    let selectors = Selectors::new().unwrap();
    let rewriter = LinkRewriter::new(origin);

    // Extraction and rewriting must never panic, whatever the origin serves
    if let Ok(mut page) = AddonPage::from_document(&doc, &selectors) {
        let _ = page.rewrite_links(&rewriter);
    }
    if let Ok(mut entries) = SearchEntry::from_document(&doc, &selectors) {
        for entry in &mut entries {
            entry.rewrite_link(&rewriter);
        }
    }
});
