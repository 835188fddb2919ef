use crate::extractor::model::ExtractedRecord;
use crate::extractor::selectors::{Selectors, addon};
use crate::extractor::{ExtractError, extract, parse_document};
use crate::fetcher::types::RemoteDocument;
use crate::rewrite::{LinkRewriter, PACKAGE_PREFIX, RewriteError};

const TITLE_SEPARATOR: &str = " by ";

/// Typed view over an addon page record, ready for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddonPage {
    pub name: String,
    pub developer: String,
    pub summary: String,
    pub users: String,
    pub reviews: String,
    pub stars: String,
    pub description: String,
    pub icon: String,
    pub install_link: String,
    pub screenshots: Vec<String>,
    pub more_info: String,
    pub release_notes: String,
}

/// Split `"<name> by <developer>"`. Either half may come back empty.
pub fn split_title(title: &str) -> (String, String) {
    let mut parts = title.split(TITLE_SEPARATOR);
    let name = parts.next().unwrap_or_default().trim().to_string();
    let developer = parts.next().unwrap_or_default().trim().to_string();
    (name, developer)
}

impl AddonPage {
    pub fn from_record(record: &ExtractedRecord) -> Self {
        let (name, developer) = split_title(record.text(addon::TITLE));
        Self {
            name,
            developer,
            summary: record.text(addon::SUMMARY).to_string(),
            users: record.text(addon::USERS).to_string(),
            reviews: record.text(addon::REVIEWS).to_string(),
            stars: record.text(addon::STARS).to_string(),
            description: record.text(addon::DESCRIPTION).to_string(),
            icon: record.text(addon::ICON).to_string(),
            install_link: record.text(addon::INSTALL_LINK).to_string(),
            screenshots: record.list(addon::SCREENSHOTS).to_vec(),
            more_info: record.text(addon::MORE_INFO).to_string(),
            release_notes: record.text(addon::RELEASE_NOTES).to_string(),
        }
    }

    /// Parse and extract an addon page in one go. Kept synchronous: the parsed
    /// tree is not `Send` and must not live across an await point.
    pub fn from_document(doc: &RemoteDocument, selectors: &Selectors) -> Result<Self, ExtractError> {
        let document = parse_document(doc)?;
        let record = extract(&document, &selectors.addon_page);
        Ok(Self::from_record(&record))
    }

    /// Point the icon, screenshots and install button at the mirror.
    ///
    /// An empty install link stays empty; a non-empty one that is not an
    /// origin download URL is an error, since it would become a cache key.
    pub fn rewrite_links(&mut self, rewriter: &LinkRewriter) -> Result<(), RewriteError> {
        self.icon = rewriter.rewrite_asset_url(&self.icon);
        for shot in &mut self.screenshots {
            *shot = rewriter.rewrite_fragment_sources(shot);
        }
        if !self.install_link.is_empty() {
            let package = rewriter.rewrite_download_url(&self.install_link)?;
            self.install_link = format!("{PACKAGE_PREFIX}{package}");
        }
        Ok(())
    }
}
