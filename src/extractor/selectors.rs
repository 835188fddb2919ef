//! Static selector tables describing which fields are read from origin pages.
//!
//! Tables are compiled once at startup and shared read-only; tests build their
//! own with [`SelectorTable::compile`].

use scraper::{ElementRef, Selector};

use crate::extractor::errors::ExtractError;
use crate::extractor::model::{FieldValue, normalize_whitespace};

/// How many matching nodes a field keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// First match in document order; later matches are ignored.
    First,
    /// Every match, in document order.
    All,
}

/// What is read from a matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractMode {
    /// Whitespace-normalised text content.
    Text,
    /// Value of the named attribute. A node without it counts as no match.
    Attr(&'static str),
    /// The node serialised back to HTML.
    Html,
}

impl ExtractMode {
    pub(crate) fn read(&self, element: ElementRef<'_>) -> Option<String> {
        match self {
            Self::Text => Some(normalize_whitespace(&element.text().collect::<String>())),
            Self::Attr(name) => element.value().attr(name).map(|v| v.trim().to_string()),
            Self::Html => Some(element.html()),
        }
    }
}

/// One named rule of a selector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelector {
    pub name: &'static str,
    pub css: &'static str,
    pub cardinality: Cardinality,
    pub mode: ExtractMode,
}

impl FieldSelector {
    pub const fn first(name: &'static str, css: &'static str, mode: ExtractMode) -> Self {
        Self {
            name,
            css,
            cardinality: Cardinality::First,
            mode,
        }
    }

    pub const fn all(name: &'static str, css: &'static str, mode: ExtractMode) -> Self {
        Self {
            name,
            css,
            cardinality: Cardinality::All,
            mode,
        }
    }

    /// Value assigned when the selector matches nothing.
    pub fn default_value(&self) -> FieldValue {
        match (self.cardinality, self.mode) {
            (Cardinality::All, _) => FieldValue::List(Vec::new()),
            (Cardinality::First, ExtractMode::Html) => FieldValue::Fragment(String::new()),
            (Cardinality::First, _) => FieldValue::Text(String::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledSelector {
    pub rule: FieldSelector,
    pub selector: Selector,
}

#[derive(Debug, Clone)]
pub struct SelectorTable {
    entries: Vec<CompiledSelector>,
}

impl SelectorTable {
    pub fn compile(rules: &[FieldSelector]) -> Result<Self, ExtractError> {
        let entries = rules
            .iter()
            .map(|rule| {
                let selector =
                    Selector::parse(rule.css).map_err(|e| ExtractError::InvalidSelector {
                        field: rule.name,
                        reason: e.to_string(),
                    })?;
                Ok(CompiledSelector {
                    rule: *rule,
                    selector,
                })
            })
            .collect::<Result<Vec<_>, ExtractError>>()?;
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledSelector> {
        self.entries.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.rule.name)
    }
}

/// Field names of the addon detail page.
pub mod addon {
    pub const TITLE: &str = "title";
    pub const SUMMARY: &str = "summary";
    pub const USERS: &str = "users";
    pub const REVIEWS: &str = "reviews";
    pub const STARS: &str = "stars";
    pub const INSTALL_LINK: &str = "install_link";
    pub const DESCRIPTION: &str = "description";
    pub const ICON: &str = "icon";
    pub const MORE_INFO: &str = "more_info";
    pub const RELEASE_NOTES: &str = "release_notes";
    pub const SCREENSHOTS: &str = "screenshots";
}

/// Field names of the search page and of a single search result.
pub mod search {
    pub const ENTRIES: &str = "entries";
    pub const NAME: &str = "name";
    pub const LINK: &str = "link";
}

pub const ADDON_PAGE: &[FieldSelector] = &[
    FieldSelector::first(addon::TITLE, "h1.AddonTitle", ExtractMode::Text),
    FieldSelector::first(addon::SUMMARY, "p.Addon-summary", ExtractMode::Text),
    FieldSelector::first(addon::USERS, "dd.MetadataCard-content", ExtractMode::Text),
    FieldSelector::first(
        addon::REVIEWS,
        "a.AddonMeta-reviews-content-link",
        ExtractMode::Text,
    ),
    FieldSelector::first(addon::STARS, "div.AddonMeta-rating-title", ExtractMode::Text),
    FieldSelector::first(
        addon::INSTALL_LINK,
        "a.InstallButtonWrapper-download-link",
        ExtractMode::Attr("href"),
    ),
    FieldSelector::first(
        addon::DESCRIPTION,
        "div.AddonDescription-contents",
        ExtractMode::Text,
    ),
    FieldSelector::first(addon::ICON, "img.Addon-icon-image", ExtractMode::Attr("src")),
    FieldSelector::first(addon::MORE_INFO, "dl.AddonMoreInfo-dl", ExtractMode::Html),
    FieldSelector::first(
        addon::RELEASE_NOTES,
        "section.AddonDescription-version-notes",
        ExtractMode::Html,
    ),
    FieldSelector::all(addon::SCREENSHOTS, "img.ScreenShots-image", ExtractMode::Html),
];

pub const SEARCH_PAGE: &[FieldSelector] = &[FieldSelector::all(
    search::ENTRIES,
    "div.SearchResult-contents",
    ExtractMode::Html,
)];

pub const SEARCH_ENTRY: &[FieldSelector] = &[
    FieldSelector::first(search::NAME, ".SearchResult-link", ExtractMode::Text),
    FieldSelector::first(search::LINK, "a.SearchResult-link", ExtractMode::Attr("href")),
];

/// Every table the mirror uses, compiled.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub addon_page: SelectorTable,
    pub search_page: SelectorTable,
    pub search_entry: SelectorTable,
}

impl Selectors {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            addon_page: SelectorTable::compile(ADDON_PAGE)?,
            search_page: SelectorTable::compile(SEARCH_PAGE)?,
            search_entry: SelectorTable::compile(SEARCH_ENTRY)?,
        })
    }
}
