use scraper::Html;
use tracing::debug;

use crate::extractor::selectors::{Selectors, search};
use crate::extractor::{ExtractError, extract, parse_document};
use crate::fetcher::types::RemoteDocument;
use crate::rewrite::LinkRewriter;

/// One result of an origin search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub name: String,
    pub link: String,
}

impl SearchEntry {
    /// Read every result entry. Entries without a link lead nowhere and are
    /// skipped; a missing name renders as an empty anchor.
    pub fn from_document(
        doc: &RemoteDocument,
        selectors: &Selectors,
    ) -> Result<Vec<Self>, ExtractError> {
        let document = parse_document(doc)?;
        let page = extract(&document, &selectors.search_page);

        let entries = page
            .list(search::ENTRIES)
            .iter()
            .filter_map(|fragment| {
                let entry = extract(&Html::parse_fragment(fragment), &selectors.search_entry);
                let link = entry.text(search::LINK);
                if link.is_empty() {
                    debug!("search entry without a result link, skipping");
                    return None;
                }
                Some(Self {
                    name: entry.text(search::NAME).to_string(),
                    link: link.to_string(),
                })
            })
            .collect();
        Ok(entries)
    }

    pub fn rewrite_link(&mut self, rewriter: &LinkRewriter) {
        self.link = rewriter.rewrite_addon_link(&self.link);
    }
}
